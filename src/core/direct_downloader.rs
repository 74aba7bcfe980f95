use std::path::{Path, PathBuf};
use std::pin::Pin;

use biliget_core::fs_paths::ensure_parent_dir;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;

use crate::error::{PipelineError, Result};

type ChunkStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Raw media bytes, owned by exactly one holder at a time.
pub struct ByteStream {
    inner: ChunkStream,
}

impl ByteStream {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = std::io::Result<Bytes>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    pub fn from_response(response: reqwest::Response) -> Self {
        Self::new(response.bytes_stream().map(|r| r.map_err(std::io::Error::other)))
    }

    /// `None` at end of data; read failures become [`PipelineError::Stream`].
    pub async fn next_chunk(&mut self) -> Option<Result<Bytes>> {
        self.inner
            .next()
            .await
            .map(|r| r.map_err(|e| PipelineError::Stream(e.to_string())))
    }
}

impl std::fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteStream").finish_non_exhaustive()
    }
}

pub fn part_path_for(output: &Path) -> PathBuf {
    let mut part = output.as_os_str().to_owned();
    part.push(".part");
    PathBuf::from(part)
}

pub async fn open_stream(client: &reqwest::Client, url: &str) -> Result<ByteStream> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(PipelineError::remote_status(response.status(), url));
    }

    if let Some(ct) = response.headers().get("content-type") {
        if let Ok(ct_str) = ct.to_str() {
            if ct_str.contains("text/html") {
                return Err(PipelineError::Remote(
                    "server returned HTML instead of media, the URL may have expired".into(),
                ));
            }
        }
    }

    tracing::debug!(
        "[direct] stream opened, content-length {:?}",
        response.content_length()
    );
    Ok(ByteStream::from_response(response))
}

/// Drains `stream` into `output`. The bytes land in `<output>.part` and are
/// renamed into place only after they are flushed and synced.
pub async fn save_stream(mut stream: ByteStream, output: &Path, cleanup_partial: bool) -> Result<u64> {
    ensure_parent_dir(output).await?;
    let part_path = part_path_for(output);

    let result = write_part(&mut stream, &part_path).await;
    let written = match result {
        Ok(n) => n,
        Err(e) => {
            if cleanup_partial {
                let _ = tokio::fs::remove_file(&part_path).await;
            } else {
                tracing::warn!("[direct] partial download left at {}", part_path.display());
            }
            return Err(e);
        }
    };

    tokio::fs::rename(&part_path, output).await?;
    Ok(written)
}

async fn write_part(stream: &mut ByteStream, part_path: &Path) -> Result<u64> {
    let file = tokio::fs::File::create(part_path).await?;
    let mut file = tokio::io::BufWriter::with_capacity(256 * 1024, file);
    let mut written = 0u64;

    while let Some(chunk) = stream.next_chunk().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(e) => {
                file.flush().await?;
                return Err(e);
            }
        };
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.get_ref().sync_all().await?;
    Ok(written)
}

pub async fn download_to_file(
    client: &reqwest::Client,
    url: &str,
    output: &Path,
    cleanup_partial: bool,
) -> Result<u64> {
    let stream = open_stream(client, url).await?;
    let bytes = save_stream(stream, output, cleanup_partial).await?;
    tracing::info!("[direct] saved {} bytes to {}", bytes, output.display());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(parts: Vec<std::io::Result<&'static str>>) -> ByteStream {
        ByteStream::new(futures::stream::iter(
            parts
                .into_iter()
                .map(|r| r.map(|s| Bytes::from_static(s.as_bytes()))),
        ))
    }

    #[test]
    fn part_path_appends_suffix() {
        let output = Path::new("Intro.m4s");
        assert_eq!(part_path_for(output), PathBuf::from("Intro.m4s.part"));
    }

    #[test]
    fn part_path_nested() {
        let output = Path::new("download/BV1/Intro.m4s");
        assert_eq!(part_path_for(output), PathBuf::from("download/BV1/Intro.m4s.part"));
    }

    #[tokio::test]
    async fn save_stream_writes_and_renames() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("BV1").join("Intro.m4s");
        let stream = chunks(vec![Ok("hello "), Ok("world")]);

        let written = save_stream(stream, &output, false).await.unwrap();

        assert_eq!(written, 11);
        assert_eq!(tokio::fs::read(&output).await.unwrap(), b"hello world");
        assert!(!part_path_for(&output).exists());
    }

    #[tokio::test]
    async fn interrupted_stream_keeps_partial_by_default() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("Intro.m4s");
        let stream = chunks(vec![
            Ok("abc"),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ]);

        let err = save_stream(stream, &output, false).await.unwrap_err();

        assert!(matches!(err, PipelineError::Stream(_)));
        assert!(!output.exists());
        assert_eq!(tokio::fs::read(part_path_for(&output)).await.unwrap(), b"abc");
    }

    #[tokio::test]
    async fn interrupted_stream_cleanup_removes_partial() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("Intro.m4s");
        let stream = chunks(vec![Err(std::io::Error::other("boom"))]);

        assert!(save_stream(stream, &output, true).await.is_err());
        assert!(!part_path_for(&output).exists());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn download_to_file_from_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/audio1")
            .with_status(200)
            .with_header("content-type", "video/mp4")
            .with_body("m4s-bytes")
            .create_async()
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("BV_TEST1").join("Intro.m4s");
        let client = reqwest::Client::new();
        let url = format!("{}/audio1", server.url());

        let bytes = download_to_file(&client, &url, &output, false).await.unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, 9);
        assert_eq!(tokio::fs::read(&output).await.unwrap(), b"m4s-bytes");
    }

    #[tokio::test]
    async fn open_stream_rejects_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/gone")
            .with_status(403)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let err = open_stream(&client, &format!("{}/gone", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Remote(_)));
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn open_stream_rejects_html() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/expired")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<html></html>")
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let err = open_stream(&client, &format!("{}/expired", server.url()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("HTML"));
    }
}

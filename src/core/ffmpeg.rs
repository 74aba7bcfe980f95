use std::path::{Path, PathBuf};
use std::process::Stdio;

use biliget_core::fs_paths::ensure_parent_dir;
use biliget_core::models::settings::EncoderSettings;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::ChildStdin;

use crate::core::direct_downloader::ByteStream;
use crate::core::process;
use crate::error::{PipelineError, Result};

pub enum TranscodeInput {
    /// A completed file on disk.
    File(PathBuf),
    /// A live stream copied into the encoder's stdin.
    Stream(ByteStream),
}

pub struct TranscodeJob {
    pub input: TranscodeInput,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscodeState {
    Idle,
    Spawned,
    Streaming,
    Exited { success: bool },
}

#[derive(Debug, Clone)]
pub struct TranscodeOutcome {
    pub output: PathBuf,
    pub bytes_fed: Option<u64>,
    pub warnings: Vec<String>,
    pub state: TranscodeState,
}

#[derive(Debug, Clone)]
pub struct Transcoder {
    program: String,
    quality_args: Vec<String>,
    cleanup_partial: bool,
}

impl Transcoder {
    pub fn new(program: impl Into<String>, quality_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            quality_args,
            cleanup_partial: false,
        }
    }

    pub fn from_settings(settings: &EncoderSettings) -> Self {
        Self::new(settings.program.clone(), settings.quality_args.clone())
    }

    /// Delete the output file when the encoder fails.
    pub fn cleanup_partial(mut self, enabled: bool) -> Self {
        self.cleanup_partial = enabled;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub async fn is_available(&self) -> bool {
        process::is_available(&self.program).await
    }

    pub fn build_args(&self, input: &str, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-i".to_string(),
            input.to_string(),
        ];
        args.extend(self.quality_args.iter().cloned());
        args.push(output.to_string_lossy().into_owned());
        args
    }

    pub async fn run(&self, job: TranscodeJob) -> Result<TranscodeOutcome> {
        let TranscodeJob { input, output } = job;
        let mut state = TranscodeState::Idle;
        ensure_parent_dir(&output).await?;

        let (input_arg, stream) = match input {
            TranscodeInput::File(path) => {
                tokio::fs::metadata(&path).await?;
                (path.to_string_lossy().into_owned(), None)
            }
            TranscodeInput::Stream(stream) => ("pipe:0".to_string(), Some(stream)),
        };

        let args = self.build_args(&input_arg, &output);
        tracing::debug!("[ffmpeg] {} {}", self.program, args.join(" "));

        let mut child = process::command(&self.program)
            .args(&args)
            .stdin(if stream.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PipelineError::Transcode {
                message: format!("failed to spawn {}: {}", self.program, e),
                diagnostics: String::new(),
            })?;
        state = advance(state, TranscodeState::Spawned);

        let stdin = child.stdin.take();
        let stderr = child.stderr.take();

        if stream.is_some() {
            state = advance(state, TranscodeState::Streaming);
        }

        let feed = async move {
            match (stream, stdin) {
                (Some(stream), Some(stdin)) => feed_stdin(stream, stdin).await.map(Some),
                _ => Ok(None),
            }
        };
        let drain = async move {
            let mut buf = Vec::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_end(&mut buf).await;
            }
            String::from_utf8_lossy(&buf).trim().to_string()
        };

        let (fed, diagnostics) = tokio::join!(feed, drain);

        let status = child.wait().await.map_err(|e| PipelineError::Transcode {
            message: format!("failed to wait for {}: {}", self.program, e),
            diagnostics: diagnostics.clone(),
        })?;
        state = advance(state, TranscodeState::Exited {
            success: status.success(),
        });

        let outcome = match fed {
            Err(e) => Err(e),
            Ok(_) if !status.success() => Err(PipelineError::Transcode {
                message: format!("{} exited with {}", self.program, status),
                diagnostics,
            }),
            Ok(bytes_fed) => {
                let warnings: Vec<String> = diagnostics
                    .lines()
                    .filter(|l| !l.trim().is_empty())
                    .map(str::to_string)
                    .collect();
                for line in &warnings {
                    tracing::warn!("[ffmpeg] {}", line);
                }
                Ok(TranscodeOutcome {
                    output: output.clone(),
                    bytes_fed,
                    warnings,
                    state,
                })
            }
        };

        if outcome.is_err() && self.cleanup_partial {
            let _ = tokio::fs::remove_file(&output).await;
        }

        outcome
    }
}

fn advance(from: TranscodeState, to: TranscodeState) -> TranscodeState {
    tracing::trace!("[ffmpeg] {:?} -> {:?}", from, to);
    to
}

/// Copies the stream into stdin, then closes it so the encoder sees end of input.
async fn feed_stdin(mut stream: ByteStream, mut stdin: ChildStdin) -> Result<u64> {
    let mut fed = 0u64;

    while let Some(chunk) = stream.next_chunk().await {
        let chunk = chunk?;
        match stdin.write_all(&chunk).await {
            Ok(()) => fed += chunk.len() as u64,
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                tracing::debug!("[ffmpeg] encoder closed stdin after {} bytes", fed);
                return Ok(fed);
            }
            Err(e) => return Err(e.into()),
        }
    }

    if let Err(e) = stdin.shutdown().await {
        if e.kind() != std::io::ErrorKind::BrokenPipe {
            return Err(e.into());
        }
    }
    drop(stdin);
    Ok(fed)
}

#[cfg(all(test, unix))]
pub(crate) mod test_support {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Copies its `-i` input (file or stdin) to the last argument.
    pub const COPY_ENCODER: &str = r#"#!/bin/sh
in=""
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -i) in="$2"; shift 2 ;;
    *) out="$1"; shift ;;
  esac
done
if [ "$in" = "pipe:0" ]; then
  cat > "$out"
else
  cp "$in" "$out"
fi
"#;

    /// Writes a few bytes to the output, complains on stderr and exits 1.
    pub const FAILING_ENCODER: &str = r#"#!/bin/sh
for a in "$@"; do out="$a"; done
printf 'partial' > "$out"
echo "invalid data" >&2
exit 1
"#;

    /// Succeeds, but leaves a note on stderr.
    pub const NOISY_ENCODER: &str = r#"#!/bin/sh
for a in "$@"; do out="$a"; done
printf 'ok' > "$out"
echo "Guessed Channel Layout: stereo" >&2
"#;

    pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}

pub mod api;

use async_trait::async_trait;
use biliget_core::models::media::{MediaLocation, Part};
use biliget_core::models::settings::{AppSettings, AudioSelection};

use crate::core::direct_downloader::{self, ByteStream};
use crate::core::filename::sanitize_file_name;
use crate::core::http_client;
use crate::error::{PipelineError, Result};
use crate::platforms::traits::AudioPlatform;

use self::api::{Envelope, PageEntry, PlayUrlData, FNVAL_DASH};

pub struct BilibiliClient {
    client: reqwest::Client,
    api_base: String,
    selection: AudioSelection,
}

impl BilibiliClient {
    pub fn new(settings: &AppSettings) -> Result<Self> {
        let client = http_client::build_client(&settings.auth, &settings.proxy)?;
        Ok(Self::with_client(
            client,
            &settings.api.base_url,
            settings.download.audio_selection,
        ))
    }

    pub fn with_client(client: reqwest::Client, api_base: &str, selection: AudioSelection) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            selection,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Envelope<T>> {
        let url = format!("{}{}", self.api_base, path);
        let response = self.client.get(&url).query(query).send().await?;

        if !response.status().is_success() {
            return Err(PipelineError::remote_status(response.status(), &url));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn part_from_entry(position: usize, entry: PageEntry) -> Part {
    let index = if entry.page > 0 {
        entry.page
    } else {
        position as u32 + 1
    };
    let name = sanitize_file_name(entry.part.trim());
    let display_name = if name.is_empty() {
        format!("P{}", index)
    } else {
        name
    };
    Part {
        index,
        media_id: entry.cid.to_string(),
        display_name,
        duration_seconds: entry.duration,
    }
}

#[async_trait]
impl AudioPlatform for BilibiliClient {
    fn name(&self) -> &str {
        "bilibili"
    }

    async fn resolve_parts(&self, video_id: &str) -> Result<Vec<Part>> {
        let envelope: Envelope<Vec<PageEntry>> = self
            .get_json("/x/player/pagelist", &[("bvid", video_id.to_string())])
            .await?;

        let entries = envelope
            .into_data("pagelist")?
            .ok_or_else(|| PipelineError::Remote(format!("pagelist returned no data for {}", video_id)))?;

        if entries.is_empty() {
            return Err(PipelineError::NotFound(format!("{} has no parts", video_id)));
        }

        let parts: Vec<Part> = entries
            .into_iter()
            .enumerate()
            .map(|(i, e)| part_from_entry(i, e))
            .collect();

        tracing::info!("[bilibili] {} resolved to {} part(s)", video_id, parts.len());
        Ok(parts)
    }

    async fn locate_audio(&self, video_id: &str, part: &Part) -> Result<MediaLocation> {
        let envelope: Envelope<PlayUrlData> = self
            .get_json(
                "/x/player/wbi/playurl",
                &[
                    ("fnval", FNVAL_DASH.to_string()),
                    ("bvid", video_id.to_string()),
                    ("cid", part.media_id.clone()),
                ],
            )
            .await?;

        let candidates = api::audio_candidates(envelope.into_data("playurl")?);
        tracing::debug!(
            "[bilibili] {} cid {} offers {} audio stream(s)",
            video_id,
            part.media_id,
            candidates.len()
        );

        let picked = api::select_audio(candidates, self.selection).ok_or_else(|| {
            PipelineError::NotFound(format!(
                "no audio stream for {} cid {}",
                video_id, part.media_id
            ))
        })?;

        tracing::debug!(
            "[bilibili] picked audio id {} ({} bps, {})",
            picked.id,
            picked.bandwidth,
            picked.codecs
        );
        Ok(MediaLocation::from(picked))
    }

    async fn open_stream(&self, location: &MediaLocation) -> Result<ByteStream> {
        direct_downloader::open_stream(&self.client, &location.url).await
    }
}

use biliget_core::models::media::AudioCandidate;
use biliget_core::models::settings::AudioSelection;
use serde::Deserialize;

use crate::error::{PipelineError, Result};

/// Separated DASH audio/video streams (fnval bits 16 | 64 | 128 | 256 | 512 | 1024 | 2048).
pub const FNVAL_DASH: u32 = 4048;

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn into_data(self, what: &str) -> Result<Option<T>> {
        if self.code != 0 {
            return Err(PipelineError::Remote(format!(
                "{} failed with code {}: {}",
                what, self.code, self.message
            )));
        }
        Ok(self.data)
    }
}

#[derive(Debug, Deserialize)]
pub struct PageEntry {
    pub cid: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub part: String,
    #[serde(default)]
    pub duration: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PlayUrlData {
    pub dash: Option<Dash>,
}

#[derive(Debug, Deserialize)]
pub struct Dash {
    #[serde(default)]
    pub audio: Option<Vec<DashAudio>>,
}

#[derive(Debug, Deserialize)]
pub struct DashAudio {
    #[serde(default)]
    pub id: u32,
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    #[serde(rename = "backupUrl", default)]
    pub backup_url: Option<Vec<String>>,
    #[serde(default)]
    pub bandwidth: u64,
    #[serde(default)]
    pub codecs: String,
}

impl From<DashAudio> for AudioCandidate {
    fn from(a: DashAudio) -> Self {
        Self {
            id: a.id,
            base_url: a.base_url,
            backup_urls: a.backup_url.unwrap_or_default(),
            bandwidth: a.bandwidth,
            codecs: a.codecs,
        }
    }
}

pub fn audio_candidates(data: Option<PlayUrlData>) -> Vec<AudioCandidate> {
    data.and_then(|d| d.dash)
        .and_then(|d| d.audio)
        .unwrap_or_default()
        .into_iter()
        .map(AudioCandidate::from)
        .collect()
}

pub fn select_audio(
    candidates: Vec<AudioCandidate>,
    selection: AudioSelection,
) -> Option<AudioCandidate> {
    match selection {
        AudioSelection::First => candidates.into_iter().next(),
        AudioSelection::HighestBandwidth => {
            let mut best: Option<AudioCandidate> = None;
            for c in candidates {
                if best.as_ref().map_or(true, |b| c.bandwidth > b.bandwidth) {
                    best = Some(c);
                }
            }
            best
        }
    }
}

use serde::{Deserialize, Serialize};

/// One page of a multi-part video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Part {
    pub index: u32,
    pub media_id: String,
    pub display_name: String,
    pub duration_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioCandidate {
    pub id: u32,
    pub base_url: String,
    pub backup_urls: Vec<String>,
    pub bandwidth: u64,
    pub codecs: String,
}

/// Short-lived direct URL for a part's audio. Used once, never refreshed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaLocation {
    pub url: String,
    pub backup_urls: Vec<String>,
}

impl From<AudioCandidate> for MediaLocation {
    fn from(candidate: AudioCandidate) -> Self {
        Self {
            url: candidate.base_url,
            backup_urls: candidate.backup_urls,
        }
    }
}

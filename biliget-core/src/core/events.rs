use serde::Serialize;

use crate::models::media::Part;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Locating,
    Fetching,
    Transcoding,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum PartStatus {
    Queued,
    Active { stage: Stage },
    Complete { output: String },
    Failed { message: String },
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartEvent {
    pub video_id: String,
    pub index: u32,
    pub name: String,
    pub status: PartStatus,
}

pub trait EventEmitter: Send + Sync + Clone + 'static {
    fn emit_parts(&self, video_id: &str, parts: &[Part]);
    fn emit_part(&self, event: &PartEvent);
}

use async_trait::async_trait;
use biliget_core::models::media::{MediaLocation, Part};

use crate::core::direct_downloader::ByteStream;
use crate::error::Result;

#[async_trait]
pub trait AudioPlatform: Send + Sync {
    fn name(&self) -> &str;
    async fn resolve_parts(&self, video_id: &str) -> Result<Vec<Part>>;
    async fn locate_audio(&self, video_id: &str, part: &Part) -> Result<MediaLocation>;
    async fn open_stream(&self, location: &MediaLocation) -> Result<ByteStream>;
}

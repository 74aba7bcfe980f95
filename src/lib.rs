use std::sync::Arc;

use crate::core::ffmpeg::Transcoder;
use crate::core::orchestrator::{Orchestrator, PipelineConfig};
use crate::core::reporter::{summarize, LogEmitter};
use crate::core::url_parser::parse_input;
use crate::error::PipelineError;
use crate::platforms::bilibili::BilibiliClient;
use crate::platforms::traits::AudioPlatform;

pub mod cli;
pub mod core;
pub mod error;
pub mod platforms;
pub mod storage;

pub use cli::Cli;

/// Returns whether every part of the video completed.
pub async fn run(cli: Cli) -> anyhow::Result<bool> {
    if cli.init_config {
        return init_config(&cli);
    }

    let mut settings = storage::config::load_settings(cli.config.as_deref())?;
    cli.apply_overrides(&mut settings);

    let raw = cli.video_input().await?;
    let input = parse_input(&raw)
        .ok_or_else(|| PipelineError::Config(format!("no video identifier in {:?}", raw)))?;

    let transcoder = Transcoder::from_settings(&settings.encoder);
    if !transcoder.is_available().await {
        tracing::warn!(
            "[ffmpeg] '{}' did not answer -version, transcoding will likely fail",
            transcoder.program()
        );
    }

    let platform: Arc<dyn AudioPlatform> = Arc::new(BilibiliClient::new(&settings)?);
    let mut config = PipelineConfig::from_settings(&settings.download);
    config.only_page = input.page;

    tracing::debug!(
        "[pipeline] {} mode={} policy={} -> {}",
        input.video_id,
        config.mode,
        config.policy,
        config.output_root.display()
    );

    let orchestrator = Orchestrator::new(platform, transcoder, config, LogEmitter);
    let report = orchestrator.run(&input.video_id).await?;

    println!("{}", summarize(&report));
    Ok(report.all_succeeded())
}

fn init_config(cli: &Cli) -> anyhow::Result<bool> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(storage::config::default_store_path);
    let mut settings = if path.exists() {
        storage::config::read_settings(&path)?
    } else {
        Default::default()
    };
    cli.apply_overrides(&mut settings);
    storage::config::save_settings(&path, &settings)?;
    println!("{}", path.display());
    Ok(true)
}

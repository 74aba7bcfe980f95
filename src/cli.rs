use std::path::PathBuf;

use biliget_core::models::settings::{AppSettings, AudioSelection, ConcurrencyPolicy, PipelineMode};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Extract the audio track of every part of a Bilibili video.
#[derive(Parser, Debug, Default)]
#[command(name = "biliget", version, about)]
pub struct Cli {
    /// Video identifier (BV...) or video URL; prompted for when omitted
    pub video: Option<String>,

    /// Settings file (defaults to $BILIGET_CONFIG, ./biliget.json, then the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// buffered | piped
    #[arg(long)]
    pub mode: Option<PipelineMode>,

    /// sequential | concurrent
    #[arg(long)]
    pub policy: Option<ConcurrencyPolicy>,

    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Encoder executable
    #[arg(long)]
    pub encoder: Option<String>,

    /// first | highest-bandwidth
    #[arg(long)]
    pub select: Option<AudioSelection>,

    /// Suffix colliding part names with " (n)" instead of overwriting
    #[arg(long)]
    pub disambiguate: bool,

    /// Remove partially written files when a part fails
    #[arg(long)]
    pub cleanup_partial: bool,

    /// Write the effective settings to --config (or the user config dir) and exit
    #[arg(long)]
    pub init_config: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn apply_overrides(&self, settings: &mut AppSettings) {
        let download = &mut settings.download;
        if let Some(mode) = self.mode {
            download.mode = mode;
        }
        if let Some(policy) = self.policy {
            download.policy = Some(policy);
        }
        if let Some(dir) = &self.output_dir {
            download.output_root = dir.clone();
        }
        if let Some(selection) = self.select {
            download.audio_selection = selection;
        }
        if self.disambiguate {
            download.disambiguate_names = true;
        }
        if self.cleanup_partial {
            download.cleanup_partial = true;
        }
        if let Some(encoder) = &self.encoder {
            settings.encoder.program = encoder.clone();
        }
    }

    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::INFO,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }

    pub async fn video_input(&self) -> anyhow::Result<String> {
        if let Some(video) = &self.video {
            return Ok(video.trim().to_string());
        }
        let mut stdout = tokio::io::stdout();
        stdout.write_all(b"Video (BV id or URL): ").await?;
        stdout.flush().await?;

        let mut line = String::new();
        BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
        Ok(line.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "biliget",
            "BV1xx411c7mD",
            "--mode",
            "piped",
            "--policy",
            "sequential",
            "--select",
            "highest-bandwidth",
            "--disambiguate",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.video.as_deref(), Some("BV1xx411c7mD"));
        assert_eq!(cli.mode, Some(PipelineMode::Piped));
        assert_eq!(cli.policy, Some(ConcurrencyPolicy::Sequential));
        assert_eq!(cli.select, Some(AudioSelection::HighestBandwidth));
        assert!(cli.disambiguate);
        assert_eq!(cli.log_level(), tracing::Level::TRACE);
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["biliget", "BV1", "--mode", "turbo"]).is_err());
    }

    #[test]
    fn overrides_only_what_was_given() {
        let mut settings = AppSettings::default();
        settings.encoder.program = "/usr/local/bin/ffmpeg".into();

        let cli = Cli {
            mode: Some(PipelineMode::Piped),
            output_dir: Some(PathBuf::from("/data/audio")),
            cleanup_partial: true,
            ..Default::default()
        };
        cli.apply_overrides(&mut settings);

        assert_eq!(settings.download.mode, PipelineMode::Piped);
        assert_eq!(settings.download.policy, None);
        assert_eq!(settings.download.effective_policy(), ConcurrencyPolicy::Concurrent);
        assert_eq!(settings.download.output_root, PathBuf::from("/data/audio"));
        assert!(settings.download.cleanup_partial);
        assert!(!settings.download.disambiguate_names);
        assert_eq!(settings.encoder.program, "/usr/local/bin/ffmpeg");
    }

    #[tokio::test]
    async fn video_argument_is_trimmed() {
        let cli = Cli {
            video: Some("  BV1abc \n".into()),
            ..Default::default()
        };
        assert_eq!(cli.video_input().await.unwrap(), "BV1abc");
    }
}

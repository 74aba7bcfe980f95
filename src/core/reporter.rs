use biliget_core::core::events::{EventEmitter, PartEvent, PartStatus};
use biliget_core::models::media::Part;

use crate::core::orchestrator::{PartResult, RunReport};

/// Emits pipeline progress as tracing events.
#[derive(Clone, Default)]
pub struct LogEmitter;

impl EventEmitter for LogEmitter {
    fn emit_parts(&self, video_id: &str, parts: &[Part]) {
        for part in parts {
            tracing::info!(
                "[pipeline] {} P{} cid={} \"{}\"",
                video_id,
                part.index,
                part.media_id,
                part.display_name
            );
        }
    }

    fn emit_part(&self, event: &PartEvent) {
        match &event.status {
            PartStatus::Queued => {
                tracing::debug!("[pipeline] P{} {} queued", event.index, event.name)
            }
            PartStatus::Active { stage } => {
                tracing::info!("[pipeline] P{} {} {:?}", event.index, event.name, stage)
            }
            PartStatus::Complete { output } => {
                tracing::info!("[pipeline] P{} {} done -> {}", event.index, event.name, output)
            }
            PartStatus::Failed { message } => {
                tracing::error!("[pipeline] P{} {} failed: {}", event.index, event.name, message)
            }
            PartStatus::Skipped => {
                tracing::warn!("[pipeline] P{} {} skipped", event.index, event.name)
            }
        }
    }
}

pub fn summarize(report: &RunReport) -> String {
    let mut lines = vec![format!(
        "{}: {}/{} part(s) completed",
        report.video_id,
        report.completed(),
        report.outcomes.len()
    )];
    for outcome in &report.outcomes {
        let status = match &outcome.result {
            PartResult::Completed => format!("ok   {}", outcome.paths.output.display()),
            PartResult::Failed(e) => match e.diagnostics() {
                Some(d) if !d.is_empty() => format!("FAIL {} ({})", e, d.lines().last().unwrap_or(d)),
                _ => format!("FAIL {}", e),
            },
            PartResult::Skipped => "skip".to_string(),
        };
        lines.push(format!("  P{} {}: {}", outcome.part.index, outcome.part.display_name, status));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::orchestrator::PartOutcome;
    use crate::error::PipelineError;
    use biliget_core::fs_paths::part_paths;
    use std::path::Path;

    fn outcome(index: u32, name: &str, result: PartResult) -> PartOutcome {
        PartOutcome {
            part: Part {
                index,
                media_id: index.to_string(),
                display_name: name.into(),
                duration_seconds: None,
            },
            paths: part_paths(Path::new("download"), "BV1", name, "m4s", "mp3"),
            result,
        }
    }

    #[test]
    fn summary_lists_every_part() {
        let report = RunReport {
            video_id: "BV1".into(),
            outcomes: vec![
                outcome(1, "Intro", PartResult::Completed),
                outcome(
                    2,
                    "Main",
                    PartResult::Failed(PipelineError::Transcode {
                        message: "ffmpeg exited with exit status: 1".into(),
                        diagnostics: "some header\ninvalid data".into(),
                    }),
                ),
                outcome(3, "Outro", PartResult::Skipped),
            ],
        };

        let text = summarize(&report);

        assert!(text.starts_with("BV1: 1/3 part(s) completed"));
        assert!(text.contains("P1 Intro: ok"));
        assert!(text.contains("(invalid data)"));
        assert!(text.contains("P3 Outro: skip"));
    }
}

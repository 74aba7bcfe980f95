use std::path::PathBuf;
use std::sync::Arc;

use biliget_core::core::events::{EventEmitter, PartEvent, PartStatus, Stage};
use biliget_core::fs_paths::{part_paths, PartPaths};
use biliget_core::models::media::Part;
use biliget_core::models::settings::{ConcurrencyPolicy, DownloadSettings, PipelineMode};

use crate::core::direct_downloader;
use crate::core::ffmpeg::{TranscodeInput, TranscodeJob, Transcoder};
use crate::core::filename::disambiguate;
use crate::error::{PipelineError, Result};
use crate::platforms::traits::AudioPlatform;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub output_root: PathBuf,
    pub intermediate_ext: String,
    pub output_ext: String,
    pub mode: PipelineMode,
    pub policy: ConcurrencyPolicy,
    pub disambiguate_names: bool,
    pub cleanup_partial: bool,
    pub only_page: Option<u32>,
}

impl PipelineConfig {
    pub fn from_settings(settings: &DownloadSettings) -> Self {
        Self {
            output_root: settings.output_root.clone(),
            intermediate_ext: settings.intermediate_ext.clone(),
            output_ext: settings.output_ext.clone(),
            mode: settings.mode,
            policy: settings.effective_policy(),
            disambiguate_names: settings.disambiguate_names,
            cleanup_partial: settings.cleanup_partial,
            only_page: None,
        }
    }
}

#[derive(Debug)]
pub enum PartResult {
    Completed,
    Failed(PipelineError),
    Skipped,
}

#[derive(Debug)]
pub struct PartOutcome {
    pub part: Part,
    pub paths: PartPaths,
    pub result: PartResult,
}

impl PartOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.result, PartResult::Completed)
    }
}

/// Every part's outcome, in resolver order.
#[derive(Debug)]
pub struct RunReport {
    pub video_id: String,
    pub outcomes: Vec<PartOutcome>,
}

impl RunReport {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(PartOutcome::is_success)
    }

    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Part, &PipelineError)> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            PartResult::Failed(e) => Some((&o.part, e)),
            _ => None,
        })
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, PartResult::Skipped))
            .count()
    }
}

#[derive(Clone)]
struct Unit {
    video_id: String,
    part: Part,
    paths: PartPaths,
}

struct Shared<E: EventEmitter> {
    platform: Arc<dyn AudioPlatform>,
    transcoder: Transcoder,
    emitter: E,
    mode: PipelineMode,
    cleanup_partial: bool,
}

impl<E: EventEmitter> Shared<E> {
    fn emit(&self, unit: &Unit, status: PartStatus) {
        self.emitter.emit_part(&PartEvent {
            video_id: unit.video_id.clone(),
            index: unit.part.index,
            name: unit.part.display_name.clone(),
            status,
        });
    }

    async fn run_part(&self, unit: &Unit) -> Result<()> {
        self.emit(unit, PartStatus::Active { stage: Stage::Locating });
        let location = self
            .platform
            .locate_audio(&unit.video_id, &unit.part)
            .await?;

        self.emit(unit, PartStatus::Active { stage: Stage::Fetching });
        let stream = self.platform.open_stream(&location).await?;

        let input = match self.mode {
            PipelineMode::Buffered => {
                direct_downloader::save_stream(stream, &unit.paths.intermediate, self.cleanup_partial)
                    .await?;
                TranscodeInput::File(unit.paths.intermediate.clone())
            }
            PipelineMode::Piped => TranscodeInput::Stream(stream),
        };

        self.emit(unit, PartStatus::Active { stage: Stage::Transcoding });
        self.transcoder
            .run(TranscodeJob {
                input,
                output: unit.paths.output.clone(),
            })
            .await?;
        Ok(())
    }

    fn settle(&self, unit: Unit, result: Result<()>) -> PartOutcome {
        let result = match result {
            Ok(()) => {
                self.emit(
                    &unit,
                    PartStatus::Complete {
                        output: unit.paths.output.to_string_lossy().into_owned(),
                    },
                );
                PartResult::Completed
            }
            Err(e) => {
                self.emit(
                    &unit,
                    PartStatus::Failed {
                        message: e.to_string(),
                    },
                );
                PartResult::Failed(e)
            }
        };
        PartOutcome {
            part: unit.part,
            paths: unit.paths,
            result,
        }
    }
}

pub struct Orchestrator<E: EventEmitter> {
    shared: Arc<Shared<E>>,
    config: PipelineConfig,
}

impl<E: EventEmitter> Orchestrator<E> {
    pub fn new(
        platform: Arc<dyn AudioPlatform>,
        transcoder: Transcoder,
        config: PipelineConfig,
        emitter: E,
    ) -> Self {
        let transcoder = transcoder.cleanup_partial(config.cleanup_partial);
        Self {
            shared: Arc::new(Shared {
                platform,
                transcoder,
                emitter,
                mode: config.mode,
                cleanup_partial: config.cleanup_partial,
            }),
            config,
        }
    }

    /// Fails only when the parts cannot be resolved; per-part failures land in the report.
    pub async fn run(&self, video_id: &str) -> Result<RunReport> {
        let mut parts = self.shared.platform.resolve_parts(video_id).await?;

        if let Some(page) = self.config.only_page {
            parts.retain(|p| p.index == page);
            if parts.is_empty() {
                return Err(PipelineError::NotFound(format!(
                    "{} has no page {}",
                    video_id, page
                )));
            }
        }

        self.shared.emitter.emit_parts(video_id, &parts);
        let units = self.plan(video_id, parts);
        for unit in &units {
            self.shared.emit(unit, PartStatus::Queued);
        }

        tracing::info!(
            "[pipeline] {} part(s) of {}, mode {}, policy {}",
            units.len(),
            video_id,
            self.config.mode,
            self.config.policy
        );

        let outcomes = match self.config.policy {
            ConcurrencyPolicy::Sequential => self.run_sequential(units).await,
            ConcurrencyPolicy::Concurrent => self.run_concurrent(units).await,
        };

        Ok(RunReport {
            video_id: video_id.to_string(),
            outcomes,
        })
    }

    fn plan(&self, video_id: &str, parts: Vec<Part>) -> Vec<Unit> {
        let names: Vec<String> = parts.iter().map(|p| p.display_name.clone()).collect();
        let stems = if self.config.disambiguate_names {
            disambiguate(&names)
        } else {
            names
        };

        parts
            .into_iter()
            .zip(stems)
            .map(|(part, stem)| Unit {
                video_id: video_id.to_string(),
                paths: part_paths(
                    &self.config.output_root,
                    video_id,
                    &stem,
                    &self.config.intermediate_ext,
                    &self.config.output_ext,
                ),
                part,
            })
            .collect()
    }

    async fn run_sequential(&self, units: Vec<Unit>) -> Vec<PartOutcome> {
        let mut outcomes = Vec::with_capacity(units.len());
        let mut aborted = false;

        for unit in units {
            if aborted {
                self.shared.emit(&unit, PartStatus::Skipped);
                outcomes.push(PartOutcome {
                    part: unit.part,
                    paths: unit.paths,
                    result: PartResult::Skipped,
                });
                continue;
            }

            let result = self.shared.run_part(&unit).await;
            if result.is_err() {
                aborted = true;
            }
            outcomes.push(self.shared.settle(unit, result));
        }

        outcomes
    }

    async fn run_concurrent(&self, units: Vec<Unit>) -> Vec<PartOutcome> {
        let mut join_set = tokio::task::JoinSet::new();
        let mut slots: Vec<(Unit, Option<PartOutcome>)> = Vec::with_capacity(units.len());

        for (i, unit) in units.into_iter().enumerate() {
            slots.push((unit.clone(), None));
            let shared = self.shared.clone();
            join_set.spawn(async move {
                let result = shared.run_part(&unit).await;
                (i, shared.settle(unit, result))
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((i, outcome)) => slots[i].1 = Some(outcome),
                Err(e) => tracing::error!("[pipeline] part task aborted: {}", e),
            }
        }

        // A task that panicked never settled its part.
        slots
            .into_iter()
            .map(|(unit, outcome)| match outcome {
                Some(outcome) => outcome,
                None => {
                    let err = PipelineError::Aborted(format!(
                        "part {} ended without a result",
                        unit.part.index
                    ));
                    self.shared.settle(unit, Err(err))
                }
            })
            .collect()
    }
}

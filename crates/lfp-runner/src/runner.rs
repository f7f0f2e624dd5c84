//! Concurrent pipeline execution across a session's probes
//!
//! Each probe runs its pipeline to a terminal outcome on a bounded worker
//! pool. Outcomes are collected centrally into a [`RunReport`]; a probe's
//! failure is recorded, never propagated to its siblings. Only
//! configuration and missing-input errors abort the whole run, and both
//! happen before the first probe starts.

use crate::sink::{RecordingSink, ShapeExpectation};
use crate::source::{AnnotationSource, RecordingSource};
use lfp_core::{LfpError, LfpResult, ProbeId};
use lfp_processing::{ProbeOutcome, ProbePipeline, SkipReason, SubsamplingConfig};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

const DEFAULT_MAX_WORKERS: usize = 4;

/// Terminal status of one probe within a run report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ProbeStatus {
    /// Transformed and persisted
    Done { channels: usize, samples: usize },
    /// Excluded from output, with the policy reason
    Skipped { reason: SkipReason },
    /// Pipeline or persistence failure, with the underlying cause
    Failed { error: String },
}

/// One probe's entry in the run report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeReport {
    pub probe: ProbeId,
    pub status: ProbeStatus,
}

/// Aggregated outcome of one session run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub session_id: String,
    pub outcomes: Vec<ProbeReport>,
}

impl RunReport {
    pub fn done_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ProbeStatus::Done { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ProbeStatus::Skipped { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ProbeStatus::Failed { .. }))
            .count()
    }

    /// True when no probe failed (skips are an expected outcome)
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }
}

/// Fans the per-probe pipeline out across a session
pub struct PipelineRunner {
    pipeline: Arc<ProbePipeline>,
    max_workers: usize,
}

impl PipelineRunner {
    /// Build a runner from a configuration; all configuration errors
    /// surface here, before any probe starts.
    pub fn new(config: SubsamplingConfig) -> LfpResult<Self> {
        Ok(Self {
            pipeline: Arc::new(ProbePipeline::new(config)?),
            max_workers: DEFAULT_MAX_WORKERS,
        })
    }

    /// Bound the worker pool; clamped to at least one worker.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Run every probe of a session to completion and collect the report.
    pub async fn run(
        &self,
        session_id: &str,
        source: Arc<dyn RecordingSource>,
        annotations: Arc<dyn AnnotationSource>,
        sink: Arc<dyn RecordingSink>,
    ) -> LfpResult<RunReport> {
        let probes = source.probes();
        if probes.is_empty() {
            return Err(LfpError::MissingInput {
                reason: format!("no probe recordings found for session {}", session_id),
            });
        }

        info!(session = session_id, probes = probes.len(), workers = self.max_workers,
              "starting subsampling run");

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut handles = Vec::with_capacity(probes.len());
        for probe in probes {
            let semaphore = Arc::clone(&semaphore);
            let pipeline = Arc::clone(&self.pipeline);
            let source = Arc::clone(&source);
            let annotations = Arc::clone(&annotations);
            let sink = Arc::clone(&sink);
            let session = session_id.to_string();

            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("worker semaphore closed");
                tokio::task::spawn_blocking(move || {
                    process_probe(
                        pipeline.as_ref(),
                        source.as_ref(),
                        annotations.as_ref(),
                        sink.as_ref(),
                        &session,
                        probe,
                    )
                })
                .await
                .unwrap_or_else(|join_err| ProbeStatus::Failed {
                    error: format!("probe task panicked: {}", join_err),
                })
            });
            handles.push((probe, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (probe, handle) in handles {
            let status = handle.await.unwrap_or_else(|join_err| ProbeStatus::Failed {
                error: format!("probe task panicked: {}", join_err),
            });
            outcomes.push(ProbeReport { probe, status });
        }

        let report = RunReport {
            session_id: session_id.to_string(),
            outcomes,
        };
        info!(session = session_id, done = report.done_count(),
              skipped = report.skipped_count(), failed = report.failed_count(),
              "subsampling run finished");
        Ok(report)
    }
}

/// One probe, start to finish: read, transform, persist, verify.
fn process_probe(
    pipeline: &ProbePipeline,
    source: &dyn RecordingSource,
    annotations: &dyn AnnotationSource,
    sink: &dyn RecordingSink,
    session_id: &str,
    probe: ProbeId,
) -> ProbeStatus {
    let recording = match source.read(probe) {
        Ok(recording) => recording,
        Err(err) => {
            error!(probe = %probe, error = %err, "failed to read recording");
            return ProbeStatus::Failed { error: err.to_string() };
        }
    };
    let raw_channels = recording.num_channels();
    let raw_samples = recording.num_samples();
    let probe_annotations = annotations.annotations(probe);

    match pipeline.run(probe, &recording, &probe_annotations) {
        ProbeOutcome::Done(output) => {
            // The post-write check re-derives the expectation from the raw
            // shapes and factors rather than trusting the pipeline output.
            let config = pipeline.config();
            let expected = ShapeExpectation {
                channels: raw_channels / config.spatial_factor,
                samples: raw_samples / config.temporal_factor,
            };

            let persisted = sink
                .write(session_id, probe, &output)
                .and_then(|_| sink.verify(session_id, probe, &expected));
            match persisted {
                Ok(()) => {
                    info!(probe = %probe, channels = output.num_channels(),
                          samples = output.num_samples(), "probe persisted");
                    ProbeStatus::Done {
                        channels: output.num_channels(),
                        samples: output.num_samples(),
                    }
                }
                Err(err) => {
                    error!(probe = %probe, error = %err, "persistence failed");
                    ProbeStatus::Failed { error: err.to_string() }
                }
            }
        }
        ProbeOutcome::Skipped(reason) => {
            warn!(probe = %probe, reason = %reason, "probe skipped");
            ProbeStatus::Skipped { reason }
        }
        ProbeOutcome::Failed(err) => ProbeStatus::Failed { error: err.to_string() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemoryRecordingSink;
    use crate::source::{MemoryAnnotationSource, MemoryRecordingSource};
    use lfp_core::Recording;
    use lfp_processing::ReferenceMode;
    use lfp_simulation::{surface_annotations, LfpSimulator, SimulationConfig};

    fn simulated_recording(seed: u64, num_samples: usize, probe: ProbeId) -> Recording {
        let config = SimulationConfig {
            channel_count: 32,
            num_samples,
            seed: Some(seed),
            ..SimulationConfig::default()
        };
        LfpSimulator::new(config).unwrap().generate(probe).unwrap()
    }

    fn annotation_run_fixture() -> (MemoryRecordingSource, MemoryAnnotationSource) {
        let mut source = MemoryRecordingSource::new();
        let mut annotations = MemoryAnnotationSource::new();
        for (seed, letter) in [(1u64, 'A'), (2, 'B'), (3, 'C')] {
            let probe = ProbeId::from_letter(letter).unwrap();
            source.insert(probe, simulated_recording(seed, 2000, probe));
        }
        // Probes A and C are registered; B never went through registration.
        for letter in ['A', 'C'] {
            let probe = ProbeId::from_letter(letter).unwrap();
            annotations.insert(probe, surface_annotations(probe, 32, 20));
        }
        (source, annotations)
    }

    #[tokio::test]
    async fn test_mixed_session_run() {
        let (source, annotations) = annotation_run_fixture();
        let sink = Arc::new(MemoryRecordingSink::new());
        let runner = PipelineRunner::new(SubsamplingConfig::default()).unwrap();

        let report = runner
            .run(
                "626791_2022-08-16",
                Arc::new(source),
                Arc::new(annotations),
                sink.clone() as Arc<dyn RecordingSink>,
            )
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.done_count(), 2);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.failed_count(), 0);
        assert!(report.is_success());

        // Probe order follows the source's stable ordering.
        let letters: Vec<char> = report.outcomes.iter().map(|o| o.probe.letter()).collect();
        assert_eq!(letters, vec!['A', 'B', 'C']);
        assert_eq!(
            report.outcomes[1].status,
            ProbeStatus::Skipped { reason: SkipReason::NoReferenceAvailable }
        );

        // 32 channels / 4 and 2000 samples / 2.
        let probe_a = ProbeId::from_letter('A').unwrap();
        let stored = sink.get("626791_2022-08-16", probe_a).unwrap();
        assert_eq!(stored.num_channels(), 8);
        assert_eq!(stored.num_samples(), 1000);
        assert!(sink.get("626791_2022-08-16", ProbeId::from_letter('B').unwrap()).is_none());
    }

    #[tokio::test]
    async fn test_failed_probe_does_not_abort_siblings() {
        let mut source = MemoryRecordingSource::new();
        for (seed, letter, samples) in [(1u64, 'A', 2000usize), (2, 'B', 2001), (3, 'C', 2000)] {
            let probe = ProbeId::from_letter(letter).unwrap();
            source.insert(probe, simulated_recording(seed, samples, probe));
        }

        let mut config = SubsamplingConfig::default();
        config.reference_mode = ReferenceMode::Disabled;
        let runner = PipelineRunner::new(config).unwrap();
        let sink = Arc::new(MemoryRecordingSink::new());

        let report = runner
            .run(
                "session-poisoned",
                Arc::new(source),
                Arc::new(MemoryAnnotationSource::empty()),
                sink.clone() as Arc<dyn RecordingSink>,
            )
            .await
            .unwrap();

        assert_eq!(report.done_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert!(!report.is_success());

        // The poisoned probe carries the shape diagnostics; siblings landed.
        match &report.outcomes[1].status {
            ProbeStatus::Failed { error } => {
                assert!(error.contains("2001"), "unexpected error: {}", error);
                assert!(error.contains("not divisible"), "unexpected error: {}", error);
            }
            other => panic!("expected ProbeB to fail, got {:?}", other),
        }
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_source_aborts_before_any_probe() {
        let runner = PipelineRunner::new(SubsamplingConfig::default()).unwrap();
        let sink = Arc::new(MemoryRecordingSink::new());

        let result = runner
            .run(
                "empty-session",
                Arc::new(MemoryRecordingSource::new()),
                Arc::new(MemoryAnnotationSource::empty()),
                sink.clone() as Arc<dyn RecordingSink>,
            )
            .await;

        assert!(matches!(result, Err(LfpError::MissingInput { .. })));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_rerun_overwrites_previous_outputs() {
        let (source, annotations) = annotation_run_fixture();
        let source = Arc::new(source);
        let annotations = Arc::new(annotations);
        let sink = Arc::new(MemoryRecordingSink::new());
        let runner = PipelineRunner::new(SubsamplingConfig::default()).unwrap();

        let first = runner
            .run("session-1", source.clone(), annotations.clone(), sink.clone() as Arc<dyn RecordingSink>)
            .await
            .unwrap();
        let second = runner
            .run("session-1", source, annotations, sink.clone() as Arc<dyn RecordingSink>)
            .await
            .unwrap();

        assert_eq!(first.done_count(), second.done_count());
        // Same (session, probe) keys, so the store does not grow.
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test]
    async fn test_verify_failure_surfaces_as_probe_failure() {
        // A sink that acknowledges writes but cannot verify them.
        struct UnverifiableSink;
        impl RecordingSink for UnverifiableSink {
            fn write(&self, _: &str, _: ProbeId, _: &Recording) -> LfpResult<()> {
                Ok(())
            }
            fn verify(&self, _: &str, probe: ProbeId, _: &ShapeExpectation) -> LfpResult<()> {
                Err(LfpError::SinkFailure {
                    reason: format!("stored output for {} is unreadable", probe),
                })
            }
        }

        let (source, annotations) = annotation_run_fixture();
        let runner = PipelineRunner::new(SubsamplingConfig::default()).unwrap();
        let report = runner
            .run(
                "session-1",
                Arc::new(source),
                Arc::new(annotations),
                Arc::new(UnverifiableSink),
            )
            .await
            .unwrap();

        assert_eq!(report.done_count(), 0);
        assert_eq!(report.failed_count(), 2);
        assert_eq!(report.skipped_count(), 1);
        match &report.outcomes[0].status {
            ProbeStatus::Failed { error } => assert!(error.contains("unreadable")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_config_aborts_before_run() {
        let mut config = SubsamplingConfig::default();
        config.spatial_factor = 0;
        assert!(matches!(
            PipelineRunner::new(config),
            Err(LfpError::InvalidConfig { .. })
        ));
    }
}

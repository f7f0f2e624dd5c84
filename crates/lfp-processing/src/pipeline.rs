//! Per-probe pipeline: selection, referencing, subsampling, filtering
//!
//! One probe's recording moves through a fixed stage order with shape
//! invariants checked at every boundary. A probe either finishes (Done),
//! is skipped because no reference could be resolved (Skipped), or fails
//! on an invariant violation (Failed). Probes never affect each other.

use crate::config::{ReferenceMode, SubsamplingConfig};
use crate::filter::HighpassFilter;
use crate::reference::ReferenceSubtractor;
use crate::resample::Resampler;
use crate::selector::{ChannelSelector, ReferenceResolution, SkipReason};
use crate::shape;
use crate::transform::RecordingTransform;
use lfp_core::{ChannelAnnotation, LfpError, LfpResult, ProbeId, Recording};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, error, warn};

/// Stages of one probe's pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Init,
    ChannelSelected,
    Referenced,
    ReferenceSkipped,
    SpatiallySubsampled,
    TemporallySubsampled,
    Filtered,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Init => "init",
            PipelineStage::ChannelSelected => "channel-selected",
            PipelineStage::Referenced => "referenced",
            PipelineStage::ReferenceSkipped => "reference-skipped",
            PipelineStage::SpatiallySubsampled => "spatially-subsampled",
            PipelineStage::TemporallySubsampled => "temporally-subsampled",
            PipelineStage::Filtered => "filtered",
            PipelineStage::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// Terminal result of one probe's pipeline
#[derive(Debug, Clone)]
pub enum ProbeOutcome {
    /// Transformed recording ready for persistence
    Done(Recording),
    /// Probe excluded from output; referencing was requested but unavailable
    Skipped(SkipReason),
    /// Invariant violation or stage failure; siblings are unaffected
    Failed(LfpError),
}

impl ProbeOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, ProbeOutcome::Done(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ProbeOutcome::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ProbeOutcome::Failed(_))
    }
}

/// Runs the full transform chain for single probes
pub struct ProbePipeline {
    config: SubsamplingConfig,
    overrides: BTreeMap<ProbeId, usize>,
    selector: ChannelSelector,
    resampler: Resampler,
    highpass: HighpassFilter,
}

impl ProbePipeline {
    /// Build a pipeline from a validated configuration.
    ///
    /// All configuration errors surface here, before any probe starts.
    pub fn new(config: SubsamplingConfig) -> LfpResult<Self> {
        config.validate()?;
        let overrides = config.explicit_overrides()?;
        let selector = ChannelSelector::new(config.spatial_factor)?;
        let resampler = Resampler::new(config.temporal_factor)?;
        let highpass = HighpassFilter::new(config.highpass_cutoff_hz)?;

        Ok(Self {
            config,
            overrides,
            selector,
            resampler,
            highpass,
        })
    }

    pub fn config(&self) -> &SubsamplingConfig {
        &self.config
    }

    /// Process one probe's recording to a terminal outcome.
    pub fn run(
        &self,
        probe: ProbeId,
        recording: &Recording,
        annotations: &[ChannelAnnotation],
    ) -> ProbeOutcome {
        match self.execute(probe, recording, annotations) {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(probe = %probe, error = %err, "probe pipeline failed");
                ProbeOutcome::Failed(err)
            }
        }
    }

    fn execute(
        &self,
        probe: ProbeId,
        recording: &Recording,
        annotations: &[ChannelAnnotation],
    ) -> LfpResult<ProbeOutcome> {
        let num_channels = recording.num_channels();
        let num_samples = recording.num_samples();
        let mut stage = PipelineStage::Init;
        debug!(probe = %probe, stage = %stage, channels = num_channels, samples = num_samples,
               "probe pipeline started");

        // Channel selection: keep-set plus reference resolution. The keep-set
        // length is validated against exact divisibility up front so a bad
        // channel count fails before any data is touched.
        let keep = self.selector.keep_indices(num_channels);
        let expected_channels = self.selector.validated_keep_count(num_channels)?;
        shape::expect_count("spatial subsampling", expected_channels, keep.len())?;

        let reference = match self.config.reference_mode {
            ReferenceMode::Disabled => None,
            ReferenceMode::Annotations => {
                match self.selector.reference_from_annotations(probe, annotations, num_channels) {
                    ReferenceResolution::Resolved(indices) => Some(indices),
                    ReferenceResolution::Unavailable(reason) => {
                        warn!(probe = %probe, reason = %reason, "skipping probe");
                        return Ok(ProbeOutcome::Skipped(reason));
                    }
                }
            }
            ReferenceMode::Explicit => {
                match self.selector.reference_from_overrides(probe, &self.overrides, num_channels)? {
                    ReferenceResolution::Resolved(indices) => Some(indices),
                    ReferenceResolution::Unavailable(reason) => {
                        warn!(probe = %probe, reason = %reason, "skipping probe");
                        return Ok(ProbeOutcome::Skipped(reason));
                    }
                }
            }
        };
        self.advance(probe, &mut stage, PipelineStage::ChannelSelected);

        let referenced = match reference {
            Some(indices) => {
                let subtractor = ReferenceSubtractor::new(indices)?;
                let output = self.run_stage(probe, &subtractor, recording)?;
                self.advance(probe, &mut stage, PipelineStage::Referenced);
                output
            }
            None => {
                self.advance(probe, &mut stage, PipelineStage::ReferenceSkipped);
                recording.clone()
            }
        };

        let sliced = referenced.select_channels(&keep)?;
        shape::expect_count("spatial subsampling", expected_channels, sliced.num_channels())?;
        self.advance(probe, &mut stage, PipelineStage::SpatiallySubsampled);

        let expected_samples =
            shape::exact_div("temporal subsampling", num_samples, self.config.temporal_factor)?;
        let resampled = self.run_stage(probe, &self.resampler, &sliced)?;
        shape::expect_count("temporal subsampling", expected_samples, resampled.num_samples())?;
        shape::expect_count("spatial subsampling", expected_channels, resampled.num_channels())?;
        self.advance(probe, &mut stage, PipelineStage::TemporallySubsampled);

        let filtered = self.run_stage(probe, &self.highpass, &resampled)?;
        shape::expect_count("highpass filtering", expected_samples, filtered.num_samples())?;
        shape::expect_count("highpass filtering", expected_channels, filtered.num_channels())?;
        self.advance(probe, &mut stage, PipelineStage::Filtered);

        self.advance(probe, &mut stage, PipelineStage::Done);
        Ok(ProbeOutcome::Done(filtered))
    }

    fn advance(&self, probe: ProbeId, stage: &mut PipelineStage, next: PipelineStage) {
        *stage = next;
        debug!(probe = %probe, stage = %stage, "stage complete");
    }

    fn run_stage(
        &self,
        probe: ProbeId,
        transform: &dyn RecordingTransform,
        input: &Recording,
    ) -> LfpResult<Recording> {
        debug!(probe = %probe, transform = transform.name(),
               channels = input.num_channels(), samples = input.num_samples(),
               "applying transform");
        transform.apply(input)
    }
}

//! Core trait for recording-to-recording transforms

use lfp_core::{LfpResult, Recording};

/// A pure transform over one probe's recording.
///
/// Transforms never mutate their input; each stage returns a new logical
/// [`Recording`]. Shape expectations are enforced by the pipeline after
/// each stage, not by the transforms themselves.
pub trait RecordingTransform: Send + Sync {
    /// Stage name used in logs and shape-mismatch errors
    fn name(&self) -> &'static str;

    /// Apply the transform to a recording
    fn apply(&self, input: &Recording) -> LfpResult<Recording>;
}

//! Common-median referencing
//!
//! For every time point the median across the reference channels is
//! computed and subtracted from all channels ("global" common-median
//! referencing). The reference channels sit in non-neural tissue, so the
//! median estimates shared noise rather than signal.

use crate::transform::RecordingTransform;
use lfp_core::{LfpError, LfpResult, Recording};

/// Subtracts the per-sample median of a fixed reference-channel set
#[derive(Debug, Clone)]
pub struct ReferenceSubtractor {
    reference_channels: Vec<usize>,
}

impl ReferenceSubtractor {
    /// Create a subtractor over the given reference channel indices.
    pub fn new(reference_channels: Vec<usize>) -> LfpResult<Self> {
        if reference_channels.is_empty() {
            return Err(LfpError::InvalidReference {
                reason: "reference channel set is empty".to_string(),
            });
        }
        Ok(Self { reference_channels })
    }

    /// The channel indices used as reference
    pub fn reference_channels(&self) -> &[usize] {
        &self.reference_channels
    }

    fn validate_against(&self, input: &Recording) -> LfpResult<()> {
        let n = input.num_channels();
        for &idx in &self.reference_channels {
            if idx >= n {
                return Err(LfpError::InvalidReference {
                    reason: format!(
                        "reference channel {} is absent from the recording ({} channels)",
                        idx, n
                    ),
                });
            }
        }
        Ok(())
    }
}

impl RecordingTransform for ReferenceSubtractor {
    fn name(&self) -> &'static str {
        "common-median referencing"
    }

    fn apply(&self, input: &Recording) -> LfpResult<Recording> {
        self.validate_against(input)?;

        let num_channels = input.num_channels();
        let num_samples = input.num_samples();
        let mut data = Vec::with_capacity(num_samples * num_channels);
        let mut scratch = vec![0.0_f32; self.reference_channels.len()];

        for t in 0..num_samples {
            let frame = input.frame(t);
            for (slot, &idx) in scratch.iter_mut().zip(&self.reference_channels) {
                *slot = frame[idx];
            }
            let reference = median(&mut scratch);
            data.extend(frame.iter().map(|&v| v - reference));
        }

        Recording::new(input.channel_ids().to_vec(), input.sampling_rate(), data)
    }
}

/// Median of a scratch slice; reorders the slice.
fn median(values: &mut [f32]) -> f32 {
    values.sort_unstable_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}

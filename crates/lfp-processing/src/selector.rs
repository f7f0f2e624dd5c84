//! Channel selection: spatial keep-set and reference-channel resolution
//!
//! The keep-set is a pure stride over the channel axis. The reference set
//! is a policy decision: everything at or beyond the surface boundary is
//! non-neural tissue and can serve as a common reference. The boundary
//! comes either from anatomical annotations or from an explicit per-probe
//! override.

use crate::shape;
use lfp_core::{ChannelAnnotation, LfpError, LfpResult, ProbeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Channels this far above the last in-brain channel are still treated as
/// transition tissue and excluded from the reference set.
pub const REFERENCE_MARGIN: usize = 10;

/// Why a probe was skipped rather than processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// No usable annotations, or no channels beyond the surface boundary
    NoReferenceAvailable,
    /// Explicit reference mode and the probe is absent from the override map
    ProbeNotInOverrides,
    /// An annotation group label names more than one probe
    AmbiguousProbeLabel,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::NoReferenceAvailable => "no-reference-available",
            SkipReason::ProbeNotInOverrides => "probe-not-in-overrides",
            SkipReason::AmbiguousProbeLabel => "ambiguous-probe-label",
        };
        write!(f, "{}", reason)
    }
}

/// Outcome of reference-channel resolution for one probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceResolution {
    /// Channel indices to use as the common reference
    Resolved(Vec<usize>),
    /// No valid reference; the caller must skip, never silently reference
    Unavailable(SkipReason),
}

/// Computes spatial keep-sets and reference-channel sets
#[derive(Debug, Clone)]
pub struct ChannelSelector {
    spatial_factor: usize,
    reference_margin: usize,
}

impl ChannelSelector {
    pub fn new(spatial_factor: usize) -> LfpResult<Self> {
        if spatial_factor == 0 {
            return Err(LfpError::InvalidConfig {
                reason: "spatial factor must be at least 1".to_string(),
            });
        }
        Ok(Self {
            spatial_factor,
            reference_margin: REFERENCE_MARGIN,
        })
    }

    /// Replace the surface margin (tests and calibration only)
    pub fn with_margin(mut self, margin: usize) -> Self {
        self.reference_margin = margin;
        self
    }

    /// Indices kept by spatial subsampling: 0, S, 2S, ...
    ///
    /// Always returns the natural stride subsequence of length `ceil(N/S)`;
    /// divisibility is enforced separately by [`ChannelSelector::validated_keep_count`].
    pub fn keep_indices(&self, num_channels: usize) -> Vec<usize> {
        (0..num_channels).step_by(self.spatial_factor).collect()
    }

    /// Keep-set size for a validated run; fails unless N divides evenly by S.
    pub fn validated_keep_count(&self, num_channels: usize) -> LfpResult<usize> {
        shape::exact_div("spatial subsampling", num_channels, self.spatial_factor)
    }

    /// Resolve the reference set from anatomical annotations.
    ///
    /// The boundary is the maximum channel index among in-brain channels
    /// plus the surface margin; every channel at or beyond it is reference.
    /// Missing or unmatched annotations yield an `Unavailable` resolution,
    /// which the caller treats as a skip.
    pub fn reference_from_annotations(
        &self,
        probe: ProbeId,
        annotations: &[ChannelAnnotation],
        num_channels: usize,
    ) -> ReferenceResolution {
        let mut probe_rows = Vec::new();
        for annotation in annotations {
            match annotation.belongs_to(probe) {
                Ok(true) => probe_rows.push(annotation),
                Ok(false) => {}
                Err(_) => {
                    return ReferenceResolution::Unavailable(SkipReason::AmbiguousProbeLabel)
                }
            }
        }

        if probe_rows.is_empty() {
            return ReferenceResolution::Unavailable(SkipReason::NoReferenceAvailable);
        }

        let deepest_in_brain = probe_rows
            .iter()
            .filter(|row| !row.is_outside_brain())
            .map(|row| row.channel_index)
            .max();

        let boundary = match deepest_in_brain {
            Some(index) => index + self.reference_margin,
            // Every annotated channel is outside the brain; nothing to clean.
            None => return ReferenceResolution::Unavailable(SkipReason::NoReferenceAvailable),
        };

        if boundary >= num_channels {
            return ReferenceResolution::Unavailable(SkipReason::NoReferenceAvailable);
        }

        ReferenceResolution::Resolved((boundary..num_channels).collect())
    }

    /// Resolve the reference set from the canonicalized override map.
    pub fn reference_from_overrides(
        &self,
        probe: ProbeId,
        overrides: &BTreeMap<ProbeId, usize>,
        num_channels: usize,
    ) -> LfpResult<ReferenceResolution> {
        let start = match overrides.get(&probe) {
            Some(&index) => index,
            None => {
                return Ok(ReferenceResolution::Unavailable(
                    SkipReason::ProbeNotInOverrides,
                ))
            }
        };

        if start >= num_channels {
            return Err(LfpError::InvalidReference {
                reason: format!(
                    "override index {} for {} is out of bounds ({} channels)",
                    start, probe, num_channels
                ),
            });
        }

        Ok(ReferenceResolution::Resolved((start..num_channels).collect()))
    }
}

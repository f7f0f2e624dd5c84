//! Recording and annotation sources
//!
//! The runner never touches a filesystem or a container format directly;
//! it reads per-probe recordings and anatomical annotations through these
//! traits. In-memory implementations back the tests and demos.

use lfp_core::{ChannelAnnotation, LfpError, LfpResult, ProbeId, Recording};
use std::collections::BTreeMap;

/// Provides per-probe recordings for one session
pub trait RecordingSource: Send + Sync {
    /// Probes this source can read, in a stable order
    fn probes(&self) -> Vec<ProbeId>;

    /// Read one probe's recording; `ProbeNotFound` when backing data is
    /// absent or unreadable
    fn read(&self, probe: ProbeId) -> LfpResult<Recording>;
}

/// Provides anatomical annotations for one session.
///
/// An empty return is a normal state, not an error; not every session has
/// been through anatomical registration.
pub trait AnnotationSource: Send + Sync {
    fn annotations(&self, probe: ProbeId) -> Vec<ChannelAnnotation>;
}

/// In-memory recording source
#[derive(Debug, Default)]
pub struct MemoryRecordingSource {
    recordings: BTreeMap<ProbeId, Recording>,
}

impl MemoryRecordingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, probe: ProbeId, recording: Recording) {
        self.recordings.insert(probe, recording);
    }
}

impl RecordingSource for MemoryRecordingSource {
    fn probes(&self) -> Vec<ProbeId> {
        self.recordings.keys().copied().collect()
    }

    fn read(&self, probe: ProbeId) -> LfpResult<Recording> {
        self.recordings
            .get(&probe)
            .cloned()
            .ok_or_else(|| LfpError::ProbeNotFound {
                probe: probe.to_string(),
            })
    }
}

/// In-memory annotation source
#[derive(Debug, Default)]
pub struct MemoryAnnotationSource {
    annotations: BTreeMap<ProbeId, Vec<ChannelAnnotation>>,
}

impl MemoryAnnotationSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source with no annotations at all (unregistered session)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, probe: ProbeId, annotations: Vec<ChannelAnnotation>) {
        self.annotations.insert(probe, annotations);
    }
}

impl AnnotationSource for MemoryAnnotationSource {
    fn annotations(&self, probe: ProbeId) -> Vec<ChannelAnnotation> {
        self.annotations.get(&probe).cloned().unwrap_or_default()
    }
}

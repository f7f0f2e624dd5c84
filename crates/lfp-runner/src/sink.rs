//! Recording sinks
//!
//! Persistence target for transformed recordings, namespaced by session and
//! probe so concurrent writers never collide. Writes use overwrite
//! semantics: re-running a session replaces its previous outputs.

use lfp_core::{LfpError, LfpResult, ProbeId, Recording};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Shapes the raw input and the subsampling factors imply for an output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeExpectation {
    pub channels: usize,
    pub samples: usize,
}

/// Accepts transformed recordings for persistence
pub trait RecordingSink: Send + Sync {
    /// Persist one probe's transformed recording, replacing any previous
    /// output for the same `(session, probe)` pair
    fn write(&self, session_id: &str, probe: ProbeId, recording: &Recording) -> LfpResult<()>;

    /// Re-check a persisted recording against the shapes the factors imply.
    ///
    /// Sinks that cannot re-read what they wrote keep this default no-op.
    fn verify(
        &self,
        session_id: &str,
        probe: ProbeId,
        expected: &ShapeExpectation,
    ) -> LfpResult<()> {
        let _ = (session_id, probe, expected);
        Ok(())
    }
}

/// In-memory sink with overwrite semantics and full verification
#[derive(Debug, Default)]
pub struct MemoryRecordingSink {
    store: Mutex<BTreeMap<(String, ProbeId), Recording>>,
}

impl MemoryRecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve a persisted recording, if any
    pub fn get(&self, session_id: &str, probe: ProbeId) -> Option<Recording> {
        self.store
            .lock()
            .ok()?
            .get(&(session_id.to_string(), probe))
            .cloned()
    }

    /// Number of persisted recordings across all sessions
    pub fn len(&self) -> usize {
        self.store.lock().map(|store| store.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordingSink for MemoryRecordingSink {
    fn write(&self, session_id: &str, probe: ProbeId, recording: &Recording) -> LfpResult<()> {
        let mut store = self.store.lock().map_err(|_| LfpError::SinkFailure {
            reason: "sink store poisoned".to_string(),
        })?;
        store.insert((session_id.to_string(), probe), recording.clone());
        Ok(())
    }

    fn verify(
        &self,
        session_id: &str,
        probe: ProbeId,
        expected: &ShapeExpectation,
    ) -> LfpResult<()> {
        let stored = self.get(session_id, probe).ok_or_else(|| LfpError::SinkFailure {
            reason: format!("no persisted output for {} / {}", session_id, probe),
        })?;

        if stored.num_channels() != expected.channels {
            return Err(LfpError::ShapeMismatch {
                stage: "sink verification",
                expected: expected.channels,
                actual: stored.num_channels(),
            });
        }
        if stored.num_samples() != expected.samples {
            return Err(LfpError::ShapeMismatch {
                stage: "sink verification",
                expected: expected.samples,
                actual: stored.num_samples(),
            });
        }
        Ok(())
    }
}

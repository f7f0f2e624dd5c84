//! LFP-Runner: concurrent per-session execution
//!
//! Source/sink seams to the outside world and the bounded worker pool that
//! fans the per-probe pipeline out across a session's probes, collecting
//! every outcome into a run report.

pub mod runner;
pub mod sink;
pub mod source;

pub use runner::{PipelineRunner, ProbeReport, ProbeStatus, RunReport};
pub use sink::{MemoryRecordingSink, RecordingSink, ShapeExpectation};
pub use source::{
    AnnotationSource, MemoryAnnotationSource, MemoryRecordingSource, RecordingSource,
};

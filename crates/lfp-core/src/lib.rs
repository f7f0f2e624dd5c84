//! LFP-Core: Foundation types for LFP subsampling
//!
//! Recording container, probe identity, anatomical annotations, and the
//! error taxonomy shared by the processing and runner crates.

pub mod error;
pub mod probe;
pub mod recording;

pub use error::{LfpError, LfpResult};
pub use probe::*;
pub use recording::*;

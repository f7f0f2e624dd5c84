//! Shape validation shared by every subsampling stage
//!
//! One rounding policy for the whole pipeline: validated runs require exact
//! divisibility. A count that does not divide evenly by its factor fails
//! loudly with the expected quotient and remainder, never silently floors.

use lfp_core::{LfpError, LfpResult};

/// Divide `total` by `factor`, requiring an exact division.
pub fn exact_div(stage: &'static str, total: usize, factor: usize) -> LfpResult<usize> {
    if factor == 0 {
        return Err(LfpError::InvalidConfig {
            reason: format!("{}: factor must be at least 1", stage),
        });
    }
    if total % factor != 0 {
        return Err(LfpError::InexactDivision { stage, total, factor });
    }
    Ok(total / factor)
}

/// Require an observed count to equal the count the factors imply.
pub fn expect_count(stage: &'static str, expected: usize, actual: usize) -> LfpResult<()> {
    if expected != actual {
        return Err(LfpError::ShapeMismatch { stage, expected, actual });
    }
    Ok(())
}

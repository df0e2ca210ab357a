//! Trend and risk score computation.
//!
//! Everything here is pure: inputs come from the pipeline, outputs go into
//! the snapshot.

mod score;
mod trend;

pub use score::*;
pub use trend::*;

//! nstore-eval - YCSB evaluation driver for the N-Store storage engines
//!
//! This is the main crate that ties the sweep pipeline to its configuration
//! and provides the `nstore-eval` command-line driver.

pub use nstore_eval_bench as bench;
pub use nstore_eval_common as common;

/// Re-export common types and utilities
pub mod prelude {
    pub use crate::bench::*;
    pub use crate::common::*;
}

//! Region-level roll-up of storefront sales exports.
//!
//! Raw per-country App Store and Google Play exports are reshaped to long
//! form, mapped to regions, summed per (Date, Region) and written as one
//! unified `.xlsx` report.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod pipeline;
pub mod process;
pub mod region;
pub mod report;
pub mod table;

pub use diagnostics::{Outcome, Reporter, Warning};
pub use error::{PipelineError, Result};
pub use pipeline::Platform;
pub use report::{Report, UnifiedRecord};

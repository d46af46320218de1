//! Report derivations.
//!
//! The storage layer produces grouped sums; this module turns them into
//! percentages, averages and savings figures.

pub mod service;
pub mod types;


pub use service::{MonthlySummaryInput, ReportService};
pub use types::*;

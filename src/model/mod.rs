//! Analysis data model
//!
//! This module defines the records produced by an analysis run and the
//! status lifecycle shared with the storage layer.

mod analysis;
mod status;

pub use analysis::{AnalysisResult, BrokenLinkEntry, HeadingCounts, HtmlVersion};
pub use status::AnalysisStatus;

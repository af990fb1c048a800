//! Analysis result records

use crate::model::AnalysisStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// HTML version signal derived from the root `html` element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HtmlVersion {
    #[serde(rename = "HTML5")]
    Html5,
    #[default]
    Unknown,
}

impl HtmlVersion {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Html5 => "HTML5",
            Self::Unknown => "Unknown",
        }
    }

    /// Anything unrecognized reads back as `Unknown`
    pub fn from_db_string(s: &str) -> Self {
        match s {
            "HTML5" => Self::Html5,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for HtmlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Number of `h1`..`h6` elements in a document
///
/// Serialized as a level-to-count map: `{"1": 2, "2": 0, ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "BTreeMap<u8, u32>", from = "BTreeMap<u8, u32>")]
pub struct HeadingCounts([u32; 6]);

impl HeadingCounts {
    pub const LEVELS: std::ops::RangeInclusive<u8> = 1..=6;

    pub fn from_levels(counts: [u32; 6]) -> Self {
        Self(counts)
    }

    /// Count for heading level 1..=6; other levels read as 0
    pub fn get(&self, level: u8) -> u32 {
        Self::index(level).map(|i| self.0[i]).unwrap_or(0)
    }

    pub fn set(&mut self, level: u8, count: u32) {
        if let Some(i) = Self::index(level) {
            self.0[i] = count;
        }
    }

    pub fn increment(&mut self, level: u8) {
        if let Some(i) = Self::index(level) {
            self.0[i] += 1;
        }
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    pub fn as_array(&self) -> [u32; 6] {
        self.0
    }

    fn index(level: u8) -> Option<usize> {
        Self::LEVELS
            .contains(&level)
            .then(|| usize::from(level) - 1)
    }
}

impl From<HeadingCounts> for BTreeMap<u8, u32> {
    fn from(counts: HeadingCounts) -> Self {
        HeadingCounts::LEVELS
            .map(|level| (level, counts.get(level)))
            .collect()
    }
}

/// Missing levels read as 0; levels outside 1..=6 are dropped
impl From<BTreeMap<u8, u32>> for HeadingCounts {
    fn from(map: BTreeMap<u8, u32>) -> Self {
        let mut counts = Self::default();
        for (level, count) in map {
            counts.set(level, count);
        }
        counts
    }
}

/// A link whose liveness probe failed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokenLinkEntry {
    /// Absolute URL that was probed
    pub url: String,

    /// HTTP status of the probe response, 0 when no response was received
    pub status_code: u16,
}

impl BrokenLinkEntry {
    pub fn new(url: impl Into<String>, status_code: u16) -> Self {
        Self {
            url: url.into(),
            status_code,
        }
    }

    /// True when the probe never got an HTTP response
    pub fn is_transport_failure(&self) -> bool {
        self.status_code == 0
    }
}

/// Structured analysis of one webpage
///
/// A fresh value is built for every run. Error results keep only the
/// address, the status and the failure message; every other field stays
/// at its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub url: String,
    pub title: String,
    pub html_version: HtmlVersion,
    pub heading_counts: HeadingCounts,
    pub internal_link_count: u32,
    pub external_link_count: u32,
    pub broken_links: Vec<BrokenLinkEntry>,
    pub login_form_detected: bool,
    pub status: AnalysisStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AnalysisResult {
    /// A placeholder result for a freshly submitted address
    pub fn queued(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            html_version: HtmlVersion::Unknown,
            heading_counts: HeadingCounts::default(),
            internal_link_count: 0,
            external_link_count: 0,
            broken_links: Vec::new(),
            login_form_detected: false,
            status: AnalysisStatus::Queued,
            error_message: None,
        }
    }

    /// An error result carrying nothing beyond the status and its cause
    pub fn failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: AnalysisStatus::Error,
            error_message: Some(message.into()),
            ..Self::queued(url)
        }
    }

    pub fn broken_link_count(&self) -> u32 {
        self.broken_links.len() as u32
    }

    pub fn total_link_count(&self) -> u32 {
        self.internal_link_count + self.external_link_count
    }
}

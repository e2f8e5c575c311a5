// Time series as persisted in the network record store

use super::SampleCount;

/// One recorded sample: a formatted minute label and the count measured for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplePoint {
    pub label: String,
    pub count: SampleCount,
}

/// A named series. Points are kept in insertion order; the store never
/// reorders or deduplicates, so a duplicate label is just a trailing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRecord {
    pub title: String,
    pub points: Vec<SamplePoint>,
}

impl SeriesRecord {
    pub fn empty() -> Self {
        Self {
            title: String::new(),
            points: Vec::new(),
        }
    }
}

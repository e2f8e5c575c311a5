// Tag codec for stored series records: [label, value] pairs after the header
// region. Values are decimal counts or the "NaN" sentinel for missing data;
// this is the only place that text encoding lives.

use crate::models::{SampleCount, SamplePoint};
use crate::relay_client::HEADER_TAGS;

pub(super) const MISSING_SENTINEL: &str = "NaN";

pub(super) fn encode_count(count: SampleCount) -> String {
    match count {
        SampleCount::Known(n) => n.to_string(),
        SampleCount::Unknown => MISSING_SENTINEL.to_string(),
    }
}

/// The sentinel and anything unparsable decode as missing data; "0" stays a
/// real zero.
pub(super) fn decode_count(value: &str) -> SampleCount {
    if value == MISSING_SENTINEL {
        return SampleCount::Unknown;
    }
    value
        .parse::<u64>()
        .map(SampleCount::Known)
        .unwrap_or(SampleCount::Unknown)
}

/// Point history of a stored tag sequence: everything after the header
/// region. A sequence too short to carry a header has no readable points.
pub(super) fn decode_points(tags: &[(String, String)]) -> Vec<SamplePoint> {
    if tags.len() < HEADER_TAGS {
        return Vec::new();
    }
    tags[HEADER_TAGS..]
        .iter()
        .map(|(label, value)| SamplePoint {
            label: label.clone(),
            count: decode_count(value),
        })
        .collect()
}

pub(super) fn encode_points(points: &[SamplePoint]) -> Vec<(String, String)> {
    points
        .iter()
        .map(|p| (p.label.clone(), encode_count(p.count)))
        .collect()
}

/// Header sanity check: the first slot of a well-formed record names its key.
pub(super) fn header_matches(tags: &[(String, String)], key: &str) -> bool {
    tags.first()
        .is_some_and(|(label, value)| label == "d" && value == key)
}

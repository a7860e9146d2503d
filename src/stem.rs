//! Splits a file stem into its base text and the trailing `_YYYYMMDD_HHMMSS`
//! timestamp and `_vN` version markers.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::Timestamp;

static VERSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)_v([0-9]+)$").unwrap());
static TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\-_]([0-9]{8})[\-_]([0-9]{6})\s*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStem {
    pub base_raw: String,
    pub timestamp: Option<Timestamp>,
    pub version: Option<u64>,
}

impl ParsedStem {
    /// Inverse of [`parse`] for the recognized suffix grammar.
    pub fn to_stem(&self) -> String {
        let mut stem = self.base_raw.clone();
        if let Some(ts) = &self.timestamp {
            stem.push('_');
            stem.push_str(ts.as_str());
        }
        if let Some(version) = self.version {
            stem.push_str(&format!("_v{version}"));
        }
        stem
    }
}

/// The version marker is removed first, since it may follow a timestamp.
pub fn parse(stem: &str) -> ParsedStem {
    let (rest, version) = strip_version(stem);
    let (base_raw, timestamp) = strip_timestamp(rest);
    ParsedStem {
        base_raw: base_raw.to_string(),
        timestamp,
        version,
    }
}

pub fn strip_version(stem: &str) -> (&str, Option<u64>) {
    let Some(caps) = VERSION.captures(stem) else {
        return (stem, None);
    };
    // Markers too large for u64 are left in the base.
    let Ok(version) = caps[1].parse::<u64>() else {
        return (stem, None);
    };
    let start = caps.get(0).map(|m| m.start()).unwrap_or(stem.len());
    (&stem[..start], Some(version))
}

pub fn strip_timestamp(stem: &str) -> (&str, Option<Timestamp>) {
    let Some(caps) = TIMESTAMP.captures(stem) else {
        return (stem, None);
    };
    let start = caps.get(0).map(|m| m.start()).unwrap_or(stem.len());
    (&stem[..start], Timestamp::from_parts(&caps[1], &caps[2]))
}

use std::collections::HashSet;
use std::fmt;
use std::time::SystemTime;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Production time of an export, kept as `YYYYMMDD_HHMMSS`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    /// Both parts must be ASCII digits, 8 and 6 long.
    pub fn from_parts(date: &str, time: &str) -> Option<Self> {
        let digits = |part: &str, len: usize| {
            part.len() == len && part.chars().all(|ch| ch.is_ascii_digit())
        };
        if digits(date, 8) && digits(time, 6) {
            Some(Self(format!("{date}_{time}")))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `YYYYMMDDHHMMSS` as an integer, so later timestamps compare greater.
    pub fn sort_key(&self) -> u64 {
        self.0
            .chars()
            .filter(|ch| ch.is_ascii_digit())
            .fold(0u64, |acc, ch| acc * 10 + u64::from(ch as u8 - b'0'))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A `.csv` file found by a directory scan.
#[derive(Debug, Clone)]
pub struct RawFile {
    pub path: Utf8PathBuf,
    pub modified: SystemTime,
}

impl RawFile {
    pub fn new(path: impl Into<Utf8PathBuf>, modified: SystemTime) -> Self {
        Self {
            path: path.into(),
            modified,
        }
    }

    pub fn stem(&self) -> &str {
        self.path.file_stem().unwrap_or_default()
    }

    pub fn file_name(&self) -> &str {
        self.path.file_name().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameEntry {
    pub source: Utf8PathBuf,
    pub destination: Utf8PathBuf,
}

impl RenameEntry {
    pub fn is_change(&self) -> bool {
        self.source.file_name() != self.destination.file_name()
    }
}

/// Source to destination mapping for every scanned file, in planning order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenamePlan {
    pub entries: Vec<RenameEntry>,
}

impl RenamePlan {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries whose destination name differs from the current one.
    pub fn changes(&self) -> impl Iterator<Item = &RenameEntry> {
        self.entries.iter().filter(|entry| entry.is_change())
    }

    pub fn destination_of(&self, source: &Utf8Path) -> Option<&Utf8Path> {
        self.entries
            .iter()
            .find(|entry| entry.source == source)
            .map(|entry| entry.destination.as_path())
    }

    /// No two distinct sources share a destination.
    pub fn is_collision_free(&self) -> bool {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .all(|entry| seen.insert(entry.destination.as_path()))
    }
}

/// Step of the two-phase rename: sources to temporaries, then temporaries to
/// destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenamePhase {
    Temporary,
    Destination,
}

impl fmt::Display for RenamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenamePhase::Temporary => write!(f, "temporary"),
            RenamePhase::Destination => write!(f, "destination"),
        }
    }
}

/// A rename that was performed, or would be in a dry run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedRename {
    pub from: Utf8PathBuf,
    pub to: Utf8PathBuf,
}

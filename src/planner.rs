//! Groups exports of the same dataset, orders each group by recency and assigns
//! `base.csv`, `base_v2.csv`, ... so that no two files share a destination.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use camino::Utf8PathBuf;
use tracing::debug;

use crate::domain::{RawFile, RenameEntry, RenamePlan};
use crate::identifier::to_sql_identifier;
use crate::semantic::shorten;
use crate::stem::{self, ParsedStem};

#[derive(Debug, Clone)]
pub struct NormalizedRecord {
    pub file: RawFile,
    pub parsed: ParsedStem,
    pub base_semantic: String,
    pub base_sql: String,
}

impl NormalizedRecord {
    pub fn from_raw(file: RawFile) -> Self {
        let parsed = stem::parse(file.stem());
        let base_semantic = shorten(&parsed.base_raw);
        let base_sql = to_sql_identifier(&base_semantic);
        Self {
            file,
            parsed,
            base_semantic,
            base_sql,
        }
    }

    pub fn group_key(&self, drop_timestamp: bool) -> String {
        match (&self.parsed.timestamp, drop_timestamp) {
            (Some(ts), false) => format!("{}_{ts}", self.base_sql),
            _ => self.base_sql.clone(),
        }
    }

    fn timestamp_key(&self) -> u64 {
        self.parsed
            .timestamp
            .as_ref()
            .map(|ts| ts.sort_key())
            .unwrap_or(0)
    }

    /// Most recent first: timestamp, then modification time, then file name.
    fn recency_order(&self, other: &Self) -> Ordering {
        other
            .timestamp_key()
            .cmp(&self.timestamp_key())
            .then_with(|| other.file.modified.cmp(&self.file.modified))
            .then_with(|| name_order(self, other))
    }
}

fn name_order(a: &NormalizedRecord, b: &NormalizedRecord) -> Ordering {
    let (a, b) = (a.file.file_name(), b.file.file_name());
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

pub fn normalize_all(files: Vec<RawFile>) -> Vec<NormalizedRecord> {
    files.into_iter().map(NormalizedRecord::from_raw).collect()
}

pub fn plan(records: &[NormalizedRecord], drop_timestamp: bool) -> RenamePlan {
    let mut ordered: Vec<&NormalizedRecord> = records.iter().collect();
    ordered.sort_by(|a, b| name_order(a, b));

    // Groups keep first-appearance order so collision handling is reproducible.
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&NormalizedRecord>)> = Vec::new();
    for record in ordered {
        let key = record.group_key(drop_timestamp);
        match group_index.get(&key) {
            Some(&idx) => groups[idx].1.push(record),
            None => {
                group_index.insert(key.clone(), groups.len());
                groups.push((key, vec![record]));
            }
        }
    }

    let mut entries = Vec::with_capacity(records.len());
    for (base, mut members) in groups {
        members.sort_by(|a, b| a.recency_order(b));
        for (idx, record) in members.into_iter().enumerate() {
            let mut stem_final = if idx == 0 {
                base.clone()
            } else {
                format!("{base}_v{}", idx + 1)
            };
            if drop_timestamp {
                stem_final = stem::strip_timestamp(&stem_final).0.to_string();
            }
            entries.push(RenameEntry {
                source: record.file.path.clone(),
                destination: record.file.path.with_file_name(format!("{stem_final}.csv")),
            });
        }
    }

    resolve_collisions(&mut entries);
    debug!(files = entries.len(), "planned destinations");
    RenamePlan { entries }
}

/// Later entries that land on an already allocated name move to the next free
/// `_vN` of their base; the counter per base only moves forward.
fn resolve_collisions(entries: &mut [RenameEntry]) {
    let mut used: HashSet<Utf8PathBuf> = HashSet::new();
    let mut next_version: HashMap<Utf8PathBuf, u64> = HashMap::new();

    for entry in entries.iter_mut() {
        if used.insert(entry.destination.clone()) {
            continue;
        }
        let stem = entry.destination.file_stem().unwrap_or_default();
        let base = stem::strip_version(stem).0.to_string();
        let counter_key = entry.destination.with_file_name(&base);
        let mut n = next_version.get(&counter_key).copied().unwrap_or(2);
        let alternative = loop {
            let candidate = entry.destination.with_file_name(format!("{base}_v{n}.csv"));
            n += 1;
            if !used.contains(&candidate) {
                break candidate;
            }
        };
        next_version.insert(counter_key, n);
        debug!(
            source = %entry.source,
            planned = %entry.destination,
            resolved = %alternative,
            "destination collision"
        );
        used.insert(alternative.clone());
        entry.destination = alternative;
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;

    fn record(name: &str, mtime_secs: u64) -> NormalizedRecord {
        NormalizedRecord::from_raw(RawFile::new(
            format!("data/{name}"),
            SystemTime::UNIX_EPOCH + Duration::from_secs(mtime_secs),
        ))
    }

    fn destination<'a>(plan: &'a RenamePlan, name: &str) -> &'a str {
        let source = Utf8PathBuf::from(format!("data/{name}"));
        plan.destination_of(&source)
            .and_then(|path| path.file_name())
            .unwrap()
    }

    #[test]
    fn newest_timestamp_gets_unversioned_name() {
        let records = vec![
            record("dataset_20250101_000000.csv", 10),
            record("dataset_20250102_000000.csv", 5),
        ];
        let plan = plan(&records, true);
        assert_eq!(destination(&plan, "dataset_20250102_000000.csv"), "dataset.csv");
        assert_eq!(
            destination(&plan, "dataset_20250101_000000.csv"),
            "dataset_v2.csv"
        );
    }

    #[test]
    fn keeping_timestamps_keeps_groups_apart() {
        let records = vec![
            record("dataset_20250101_000000.csv", 10),
            record("dataset_20250102_000000.csv", 5),
        ];
        let plan = plan(&records, false);
        assert_eq!(
            destination(&plan, "dataset_20250101_000000.csv"),
            "dataset_20250101_000000.csv"
        );
        assert_eq!(plan.changes().count(), 0);
    }

    #[test]
    fn modification_time_breaks_timestamp_ties() {
        let records = vec![record("Temperatura media.csv", 100), record("temperatura_media.csv", 200)];
        let plan = plan(&records, true);
        assert_eq!(destination(&plan, "temperatura_media.csv"), "temp_med.csv");
        assert_eq!(destination(&plan, "Temperatura media.csv"), "temp_med_v2.csv");
    }

    #[test]
    fn file_name_breaks_remaining_ties() {
        let records = vec![record("b_x.csv", 1), record("B x.csv", 1), record("a_x.csv", 1)];
        let plan = plan(&records, true);
        assert_eq!(destination(&plan, "B x.csv"), "b_x.csv");
        assert_eq!(destination(&plan, "b_x.csv"), "b_x_v2.csv");
        assert_eq!(destination(&plan, "a_x.csv"), "a_x.csv");
    }

    #[test]
    fn cross_group_collision_moves_to_next_free_version() {
        // "foo v2" is not a version marker, so it forms its own group "foo_v2",
        // which sorts first and takes foo_v2.csv before group "foo" asks for it.
        let records = vec![
            record("foo.csv", 2),
            record("Foo.csv", 1),
            record("foo v2.csv", 1),
        ];
        let plan = plan(&records, true);
        assert!(plan.is_collision_free());
        assert_eq!(destination(&plan, "foo.csv"), "foo.csv");
        assert_eq!(destination(&plan, "foo v2.csv"), "foo_v2.csv");
        assert_eq!(destination(&plan, "Foo.csv"), "foo_v3.csv");
    }

    #[test]
    fn planning_is_deterministic_and_order_independent() {
        let mut records = vec![
            record("Concentración de ozono (O3) al percentil 95_20250101_000000.csv", 3),
            record("o3_perc95.csv", 9),
            record("Concentración_de_ozono_O3_al_percentil_95.csv", 9),
            record("Temperatura media_20250914_230910.csv", 1),
            record("notes.csv", 4),
        ];
        let first = plan(&records, true);
        records.reverse();
        let second = plan(&records, true);
        let mut a = first.entries.clone();
        let mut b = second.entries.clone();
        a.sort_by(|x, y| x.source.cmp(&y.source));
        b.sort_by(|x, y| x.source.cmp(&y.source));
        assert_eq!(a, b);
        assert_eq!(plan(&records, true), second);
        assert!(first.is_collision_free());
    }

    #[test]
    fn many_duplicates_stay_collision_free() {
        let mut records = Vec::new();
        for day in 1..=9 {
            records.push(record(&format!("x_2025010{day}_000000.csv"), day));
            records.push(record(&format!("x_v{day}.csv"), day));
        }
        records.push(record("x_v2_v3.csv", 1));
        for drop in [true, false] {
            let plan = plan(&records, drop);
            assert_eq!(plan.len(), records.len());
            assert!(plan.is_collision_free(), "collision with drop_timestamp={drop}");
        }
    }

    #[test]
    fn empty_input_gives_empty_plan() {
        assert!(plan(&[], true).is_empty());
    }

    #[test]
    fn canonical_input_has_no_changes() {
        let records = vec![record("o3_perc95.csv", 1), record("temp_med.csv", 1)];
        assert_eq!(plan(&records, true).changes().count(), 0);
    }
}

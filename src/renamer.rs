//! Two-phase application of a [`RenamePlan`].
//!
//! Every changing file is first moved to a reserved temporary name, then from
//! the temporary to its destination, so cycles in the plan cannot overwrite a
//! file that is still waiting for its own rename. A journal in the target
//! directory records the mapping until both phases finish; [`Renamer::recover`]
//! uses it to roll back an interrupted first phase or complete an interrupted
//! second one.

use std::collections::HashSet;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::{AppliedRename, RenameEntry, RenamePhase, RenamePlan};
use crate::error::CanonError;
use crate::fs_util::to_utf8;
use crate::stem::strip_version;

pub const TEMP_PREFIX: &str = ".__tmp__";
pub const TEMP_SUFFIX: &str = "__.csv";
pub const JOURNAL_FILE: &str = ".csv-canon-journal.json";

const TEMP_RANDOM_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameMode {
    Apply,
    /// Report the changes without touching the disk.
    Simulate,
}

pub fn is_temporary_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct JournalEntry {
    source: Utf8PathBuf,
    temporary: Utf8PathBuf,
    destination: Utf8PathBuf,
    /// Set once the source is known to sit at `temporary`.
    #[serde(default)]
    moved: bool,
}

impl JournalEntry {
    /// An empty file the source never reached.
    fn holds_placeholder(&self) -> Result<bool, CanonError> {
        if self.moved {
            return Ok(false);
        }
        let metadata = fs::metadata(self.temporary.as_std_path())
            .map_err(|err| CanonError::Filesystem(format!("stat {}: {err}", self.temporary)))?;
        Ok(metadata.len() == 0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RenameJournal {
    phase: RenamePhase,
    entries: Vec<JournalEntry>,
}

impl RenameJournal {
    fn path(dir: &Utf8Path) -> Utf8PathBuf {
        dir.join(JOURNAL_FILE)
    }

    fn load(dir: &Utf8Path) -> Result<Option<Self>, CanonError> {
        let path = Self::path(dir);
        if !path.as_std_path().exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| CanonError::Journal(format!("read {path}: {err}")))?;
        let journal = serde_json::from_str(&content)
            .map_err(|err| CanonError::Journal(format!("parse {path}: {err}")))?;
        Ok(Some(journal))
    }

    /// Written to a sibling temp file and persisted over the old journal.
    fn store(&self, dir: &Utf8Path) -> Result<(), CanonError> {
        let mut temp = tempfile::Builder::new()
            .prefix(".csv-canon-journal")
            .tempfile_in(dir.as_std_path())
            .map_err(|err| CanonError::Journal(err.to_string()))?;
        serde_json::to_writer_pretty(&mut temp, self)
            .map_err(|err| CanonError::Journal(err.to_string()))?;
        temp.as_file()
            .sync_all()
            .map_err(|err| CanonError::Journal(err.to_string()))?;
        temp.persist(Self::path(dir).as_std_path())
            .map_err(|err| CanonError::Journal(err.to_string()))?;
        Ok(())
    }

    fn remove(dir: &Utf8Path) -> Result<(), CanonError> {
        let path = Self::path(dir);
        fs::remove_file(path.as_std_path())
            .map_err(|err| CanonError::Journal(format!("remove {path}: {err}")))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Recovery {
    /// Temporary file and the name it was restored to.
    pub restored: Vec<AppliedRename>,
    /// Temporary-pattern files no journal accounts for. Left in place.
    pub orphans: Vec<Utf8PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Renamer {
    dir: Utf8PathBuf,
}

impl Renamer {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Applies the changing entries of `plan` and returns the renames that
    /// happened, with the destination actually used.
    pub fn apply(
        &self,
        plan: &RenamePlan,
        mode: RenameMode,
    ) -> Result<Vec<AppliedRename>, CanonError> {
        let changes: Vec<&RenameEntry> = plan.changes().collect();
        if changes.is_empty() {
            debug!("nothing to rename");
            return Ok(Vec::new());
        }

        if mode == RenameMode::Simulate {
            return Ok(changes
                .into_iter()
                .map(|entry| AppliedRename {
                    from: entry.source.clone(),
                    to: entry.destination.clone(),
                })
                .collect());
        }

        let mut journal = RenameJournal {
            phase: RenamePhase::Temporary,
            entries: self.reserve_temporaries(&changes)?,
        };
        journal.store(&self.dir)?;

        for idx in 0..journal.entries.len() {
            let entry = &journal.entries[idx];
            if let Err(err) = fs::rename(entry.source.as_std_path(), entry.temporary.as_std_path())
            {
                let failure = CanonError::RenameFailed {
                    phase: RenamePhase::Temporary,
                    from: entry.source.clone(),
                    to: entry.temporary.clone(),
                    message: err.to_string(),
                    renamed: idx,
                    stranded: idx,
                };
                self.release_placeholders(&mut journal, idx)?;
                return Err(failure);
            }
            debug!(source = %entry.source, temporary = %entry.temporary, "moved to temporary");
            journal.entries[idx].moved = true;
        }

        journal.phase = RenamePhase::Destination;
        journal.store(&self.dir)?;

        let total = journal.entries.len();
        let mut planned: HashSet<Utf8PathBuf> = journal
            .entries
            .iter()
            .map(|entry| entry.destination.clone())
            .collect();
        let mut applied = Vec::with_capacity(total);
        for (idx, entry) in journal.entries.iter().enumerate() {
            planned.remove(&entry.destination);
            let target = free_destination(&entry.destination, &planned);
            fs::rename(entry.temporary.as_std_path(), target.as_std_path()).map_err(|err| {
                CanonError::RenameFailed {
                    phase: RenamePhase::Destination,
                    from: entry.temporary.clone(),
                    to: target.clone(),
                    message: err.to_string(),
                    renamed: idx,
                    stranded: total - idx,
                }
            })?;
            debug!(from = %entry.source, to = %target, "renamed");
            applied.push(AppliedRename {
                from: entry.source.clone(),
                to: target,
            });
        }

        RenameJournal::remove(&self.dir)?;
        Ok(applied)
    }

    /// Creates one empty placeholder per change so the random names stay
    /// reserved until phase one moves the sources over them.
    fn reserve_temporaries(
        &self,
        changes: &[&RenameEntry],
    ) -> Result<Vec<JournalEntry>, CanonError> {
        let mut entries: Vec<JournalEntry> = Vec::with_capacity(changes.len());
        for change in changes {
            match reserve_temporary(&self.dir) {
                Ok(temporary) => entries.push(JournalEntry {
                    source: change.source.clone(),
                    temporary,
                    destination: change.destination.clone(),
                    moved: false,
                }),
                Err(err) => {
                    for entry in &entries {
                        let _ = fs::remove_file(entry.temporary.as_std_path());
                    }
                    return Err(err);
                }
            }
        }
        Ok(entries)
    }

    /// Drops the placeholders from entry `from` on, which phase one never
    /// filled, and narrows the journal to the entries that did move.
    fn release_placeholders(
        &self,
        journal: &mut RenameJournal,
        from: usize,
    ) -> Result<(), CanonError> {
        for entry in journal.entries.drain(from..) {
            if let Err(err) = fs::remove_file(entry.temporary.as_std_path()) {
                warn!(temporary = %entry.temporary, error = %err, "could not remove placeholder");
            }
        }
        if journal.entries.is_empty() {
            RenameJournal::remove(&self.dir)
        } else {
            journal.store(&self.dir)
        }
    }

    pub fn has_pending_journal(&self) -> bool {
        RenameJournal::path(&self.dir).as_std_path().exists()
    }

    /// Finishes or rolls back a rename interrupted in a previous run.
    pub fn recover(&self) -> Result<Recovery, CanonError> {
        let mut restored = Vec::new();

        if let Some(journal) = RenameJournal::load(&self.dir)? {
            warn!(phase = %journal.phase, entries = journal.entries.len(), "found interrupted rename");
            match journal.phase {
                RenamePhase::Temporary => {
                    let mut pending: HashSet<Utf8PathBuf> = journal
                        .entries
                        .iter()
                        .filter(|entry| entry.temporary.as_std_path().exists())
                        .map(|entry| entry.source.clone())
                        .collect();
                    for entry in &journal.entries {
                        if !entry.temporary.as_std_path().exists() {
                            continue;
                        }
                        pending.remove(&entry.source);
                        if entry.holds_placeholder()? {
                            fs::remove_file(entry.temporary.as_std_path()).map_err(|err| {
                                CanonError::Filesystem(format!("remove {}: {err}", entry.temporary))
                            })?;
                            debug!(temporary = %entry.temporary, "removed unused placeholder");
                            continue;
                        }
                        let target = free_destination(&entry.source, &pending);
                        if target != entry.source {
                            warn!(source = %entry.source, restored = %target, "source name reused since the move");
                        }
                        self.restore(&entry.temporary, &target, RenamePhase::Temporary)?;
                        restored.push(AppliedRename {
                            from: entry.temporary.clone(),
                            to: target,
                        });
                    }
                }
                RenamePhase::Destination => {
                    let mut planned: HashSet<Utf8PathBuf> = journal
                        .entries
                        .iter()
                        .filter(|entry| entry.temporary.as_std_path().exists())
                        .map(|entry| entry.destination.clone())
                        .collect();
                    for entry in &journal.entries {
                        if !entry.temporary.as_std_path().exists() {
                            continue;
                        }
                        planned.remove(&entry.destination);
                        let target = free_destination(&entry.destination, &planned);
                        self.restore(&entry.temporary, &target, RenamePhase::Destination)?;
                        restored.push(AppliedRename {
                            from: entry.temporary.clone(),
                            to: target,
                        });
                    }
                }
            }
            RenameJournal::remove(&self.dir)?;
        }

        let orphans = self.find_orphans()?;
        for orphan in &orphans {
            warn!(path = %orphan, "temporary file not covered by any journal, leaving it in place");
        }

        Ok(Recovery { restored, orphans })
    }

    fn restore(&self, from: &Utf8Path, to: &Utf8Path, phase: RenamePhase) -> Result<(), CanonError> {
        fs::rename(from.as_std_path(), to.as_std_path()).map_err(|err| CanonError::RenameFailed {
            phase,
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            message: err.to_string(),
            renamed: 0,
            stranded: 1,
        })?;
        info!(from = %from, to = %to, "recovered");
        Ok(())
    }

    /// Top-level files matching the temporary-name pattern.
    pub fn find_orphans(&self) -> Result<Vec<Utf8PathBuf>, CanonError> {
        let entries = fs::read_dir(self.dir.as_std_path())
            .map_err(|err| CanonError::Filesystem(format!("read dir {}: {err}", self.dir)))?;
        let mut orphans = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| CanonError::Filesystem(err.to_string()))?;
            let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else {
                continue;
            };
            if path.file_name().is_some_and(is_temporary_name) && path.as_std_path().is_file() {
                orphans.push(path);
            }
        }
        orphans.sort();
        Ok(orphans)
    }
}

fn reserve_temporary(dir: &Utf8Path) -> Result<Utf8PathBuf, CanonError> {
    let placeholder = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .rand_bytes(TEMP_RANDOM_LEN)
        .tempfile_in(dir.as_std_path())
        .map_err(|err| CanonError::Filesystem(format!("reserve temporary in {dir}: {err}")))?;
    let path = placeholder
        .into_temp_path()
        .keep()
        .map_err(|err| CanonError::Filesystem(err.to_string()))?;
    to_utf8(&path)
}

/// `destination` itself when free, otherwise the next `_vN` of its base that
/// exists neither on disk nor among the destinations still to be written.
fn free_destination(destination: &Utf8Path, planned: &HashSet<Utf8PathBuf>) -> Utf8PathBuf {
    if !destination.as_std_path().exists() {
        return destination.to_path_buf();
    }
    let stem = destination.file_stem().unwrap_or_default();
    let (base, _) = strip_version(stem);
    let extension = destination.extension().unwrap_or("csv");
    let mut version = 2u64;
    loop {
        let candidate = destination.with_file_name(format!("{base}_v{version}.{extension}"));
        if !candidate.as_std_path().exists() && !planned.contains(&candidate) {
            warn!(planned = %destination, actual = %candidate, "destination taken, using next version");
            return candidate;
        }
        version += 1;
    }
}

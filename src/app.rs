use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ResolvedConfig;
use crate::domain::AppliedRename;
use crate::error::CanonError;
use crate::expected::{ExpectedTotals, ScopeFilter};
use crate::fs_util::{self, ensure_directory};
use crate::matcher::{compute_extras, compute_missing};
use crate::planner::{normalize_all, plan};
use crate::renamer::{RenameMode, Renamer};
use crate::report::{ScopeMissing, total_missing, write_report};

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardizeOptions {
    pub drop_timestamp: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StandardizeResult {
    pub dir: Utf8PathBuf,
    pub dry_run: bool,
    pub changes: Vec<AppliedRename>,
    /// Renames completed or rolled back from an interrupted earlier run.
    pub recovered: Vec<AppliedRename>,
    pub orphans: Vec<Utf8PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissingResult {
    pub dir: Utf8PathBuf,
    pub scope: ScopeFilter,
    pub sections: Vec<ScopeMissing>,
    pub extras: Vec<String>,
    pub total_missing: usize,
    pub report_path: Utf8PathBuf,
}

impl MissingResult {
    pub fn is_complete(&self) -> bool {
        self.total_missing == 0 && self.extras.is_empty()
    }

    /// 0 when every expected dataset is present and nothing extra is, 2 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.is_complete() { 0 } else { 2 }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtensionCount {
    pub extension: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountResult {
    pub dir: Utf8PathBuf,
    pub total: usize,
    pub by_extension: Vec<ExtensionCount>,
    pub csv: usize,
    pub expected: ExpectedTotals,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecoverResult {
    pub dir: Utf8PathBuf,
    pub restored: Vec<AppliedRename>,
    pub orphans: Vec<Utf8PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn event(&self, _event: ProgressEvent) {}
}

#[derive(Debug, Clone)]
pub struct App {
    config: ResolvedConfig,
}

impl App {
    pub fn new(config: ResolvedConfig) -> Self {
        Self { config }
    }

    /// Directory to operate on: the given one, else the configured default,
    /// else the working directory.
    pub fn target_dir(&self, dir: Option<Utf8PathBuf>) -> Utf8PathBuf {
        dir.or_else(|| self.config.default_dir.clone())
            .unwrap_or_else(|| Utf8PathBuf::from("."))
    }

    pub fn standardize(
        &self,
        dir: &Utf8Path,
        options: StandardizeOptions,
        sink: &dyn ProgressSink,
    ) -> Result<StandardizeResult, CanonError> {
        ensure_directory(dir)?;
        let renamer = Renamer::new(dir);

        let (recovered, orphans) = if options.dry_run {
            if renamer.has_pending_journal() {
                warn!(dir = %dir, "interrupted rename pending; run recover before applying");
            }
            (Vec::new(), renamer.find_orphans()?)
        } else {
            let recovery = renamer.recover()?;
            (recovery.restored, recovery.orphans)
        };

        sink.event(ProgressEvent {
            message: format!("phase=Scan; listing csv files in {dir}"),
        });
        let files = fs_util::list_csv_files(dir)?;
        let records = normalize_all(files);

        sink.event(ProgressEvent {
            message: format!("phase=Plan; {} files", records.len()),
        });
        let rename_plan = plan(&records, options.drop_timestamp);
        info!(
            files = rename_plan.len(),
            changes = rename_plan.changes().count(),
            "planned renames"
        );

        let mode = if options.dry_run {
            RenameMode::Simulate
        } else {
            RenameMode::Apply
        };
        sink.event(ProgressEvent {
            message: if options.dry_run {
                "phase=Simulate; no files will be touched".to_string()
            } else {
                "phase=Rename; applying".to_string()
            },
        });
        let changes = renamer.apply(&rename_plan, mode)?;

        Ok(StandardizeResult {
            dir: dir.to_path_buf(),
            dry_run: options.dry_run,
            changes,
            recovered,
            orphans,
        })
    }

    /// Compares the CSV files under `dir` with the expected lists of the
    /// selected scopes and writes `missingfiles.txt` into `dir`.
    pub fn missing_files(
        &self,
        dir: &Utf8Path,
        scope: ScopeFilter,
        sink: &dyn ProgressSink,
    ) -> Result<MissingResult, CanonError> {
        ensure_directory(dir)?;

        sink.event(ProgressEvent {
            message: format!("phase=Scan; collecting csv names under {dir}"),
        });
        let present = fs_util::collect_csv_names(dir)?;

        let selected = self.config.catalog.selected(scope);
        let mut sections = Vec::with_capacity(selected.len());
        let mut expected_all: Vec<&str> = Vec::new();
        for (section_scope, titles) in selected {
            sections.push(ScopeMissing {
                scope: section_scope,
                missing: compute_missing(titles, &present),
            });
            expected_all.extend(titles.iter().map(String::as_str));
        }
        let extras = compute_extras(&expected_all, &present);
        let missing_count = total_missing(&sections);

        sink.event(ProgressEvent {
            message: "phase=Report; writing missingfiles.txt".to_string(),
        });
        let report_path = write_report(dir, &sections, &extras)?;
        info!(
            missing = missing_count,
            extras = extras.len(),
            report = %report_path,
            "checked expected datasets"
        );

        Ok(MissingResult {
            dir: dir.to_path_buf(),
            scope,
            sections,
            extras,
            total_missing: missing_count,
            report_path,
        })
    }

    pub fn count_files(&self, dir: &Utf8Path) -> Result<CountResult, CanonError> {
        ensure_directory(dir)?;
        let count = fs_util::count_files(dir)?;
        let csv = count.count_for(".csv");
        Ok(CountResult {
            dir: dir.to_path_buf(),
            total: count.total,
            by_extension: count
                .by_extension
                .into_iter()
                .map(|(extension, count)| ExtensionCount { extension, count })
                .collect(),
            csv,
            expected: self.config.catalog.totals(),
        })
    }

    pub fn recover(&self, dir: &Utf8Path) -> Result<RecoverResult, CanonError> {
        ensure_directory(dir)?;
        let recovery = Renamer::new(dir).recover()?;
        Ok(RecoverResult {
            dir: dir.to_path_buf(),
            restored: recovery.restored,
            orphans: recovery.orphans,
        })
    }
}

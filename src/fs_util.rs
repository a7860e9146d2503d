use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::warn;

use crate::domain::RawFile;
use crate::error::CanonError;
use crate::renamer::is_temporary_name;

/// Bucket for files without an extension in [`count_files`].
pub const NO_EXTENSION: &str = "(sin extensión)";

pub fn ensure_directory(dir: &Utf8Path) -> Result<(), CanonError> {
    if dir.as_std_path().is_dir() {
        Ok(())
    } else {
        Err(CanonError::InvalidDirectory(dir.to_path_buf()))
    }
}

pub fn is_csv(path: &Utf8Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

fn is_hidden(path: &Utf8Path) -> bool {
    path.file_name()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Top-level `.csv` files of `dir`, sorted by lowercase name. Hidden files,
/// which include in-flight temporaries, are skipped.
pub fn list_csv_files(dir: &Utf8Path) -> Result<Vec<RawFile>, CanonError> {
    let entries = fs::read_dir(dir.as_std_path())
        .map_err(|err| CanonError::Filesystem(format!("read dir {dir}: {err}")))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| CanonError::Filesystem(err.to_string()))?;
        let Some(path) = utf8_or_warn(&entry.path()) else {
            continue;
        };
        if !path.as_std_path().is_file() || is_hidden(&path) || !is_csv(&path) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|meta| meta.modified())
            .unwrap_or_else(|_| SystemTime::now());
        files.push(RawFile::new(path, modified));
    }

    files.sort_by(|a, b| {
        a.file_name()
            .to_lowercase()
            .cmp(&b.file_name().to_lowercase())
            .then_with(|| a.file_name().cmp(b.file_name()))
    });
    Ok(files)
}

/// Names of every `.csv` file under `dir`, recursively. Rename temporaries
/// are left out.
pub fn collect_csv_names(dir: &Utf8Path) -> Result<Vec<String>, CanonError> {
    let mut names = Vec::new();
    for path in walk_files(dir)? {
        if !is_csv(&path) {
            continue;
        }
        if let Some(name) = path.file_name().filter(|name| !is_temporary_name(name)) {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileCount {
    pub total: usize,
    /// Extension (with leading dot, lowercase) and count, most frequent first.
    pub by_extension: Vec<(String, usize)>,
}

impl FileCount {
    pub fn count_for(&self, extension: &str) -> usize {
        self.by_extension
            .iter()
            .find(|(ext, _)| ext == extension)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }
}

pub fn count_files(dir: &Utf8Path) -> Result<FileCount, CanonError> {
    let files = walk_files(dir)?;
    let mut buckets: HashMap<String, usize> = HashMap::new();
    for path in &files {
        let ext = path
            .extension()
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .unwrap_or_else(|| NO_EXTENSION.to_string());
        *buckets.entry(ext).or_default() += 1;
    }
    let mut by_extension: Vec<(String, usize)> = buckets.into_iter().collect();
    by_extension.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(FileCount {
        total: files.len(),
        by_extension,
    })
}

fn walk_files(root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, CanonError> {
    let mut items = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = fs::read_dir(dir.as_std_path())
            .map_err(|err| CanonError::Filesystem(format!("read dir {dir}: {err}")))?;
        for entry in entries {
            let entry = entry.map_err(|err| CanonError::Filesystem(err.to_string()))?;
            let Some(path) = utf8_or_warn(&entry.path()) else {
                continue;
            };
            if path.as_std_path().is_dir() {
                stack.push(path);
            } else if path.as_std_path().is_file() {
                items.push(path);
            }
        }
    }
    Ok(items)
}

fn utf8_or_warn(path: &Path) -> Option<Utf8PathBuf> {
    match Utf8PathBuf::from_path_buf(path.to_path_buf()) {
        Ok(path) => Some(path),
        Err(path) => {
            warn!(path = %path.display(), "skipping non UTF-8 path");
            None
        }
    }
}

pub fn to_utf8(path: &Path) -> Result<Utf8PathBuf, CanonError> {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).map_err(CanonError::NonUtf8Path)
}

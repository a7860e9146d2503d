use std::path::PathBuf;

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

use crate::domain::RenamePhase;

#[derive(Debug, Error, Diagnostic)]
pub enum CanonError {
    #[error("target directory does not exist or is not a directory: {0}")]
    InvalidDirectory(Utf8PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),

    #[error("rename journal error: {0}")]
    Journal(String),

    #[error(
        "rename failed in {phase} phase: {from} -> {to}: {message} \
         ({renamed} renamed in this phase, {stranded} left under temporary names)"
    )]
    #[diagnostic(help(
        "run `csv-canon recover` on the directory to restore or complete the interrupted renames"
    ))]
    RenameFailed {
        phase: RenamePhase,
        from: Utf8PathBuf,
        to: Utf8PathBuf,
        message: String,
        renamed: usize,
        stranded: usize,
    },
}

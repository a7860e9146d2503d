use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::CanonError;
use crate::expected::Scope;

pub const REPORT_FILE: &str = "missingfiles.txt";
pub const RULE_WIDTH: usize = 72;

/// Titles of one scope without a matching file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeMissing {
    pub scope: Scope,
    pub missing: Vec<String>,
}

pub fn total_missing(sections: &[ScopeMissing]) -> usize {
    sections.iter().map(|section| section.missing.len()).sum()
}

pub fn render_report(
    dir: &Utf8Path,
    generated: DateTime<Local>,
    sections: &[ScopeMissing],
    extras: &[String],
) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let mut lines = vec![
        format!(
            "REPORTE DE ARCHIVOS FALTANTES - generado {}",
            generated.format("%Y-%m-%d %H:%M:%S")
        ),
        format!("Carpeta analizada: {dir}"),
        heavy.clone(),
    ];

    for section in sections {
        lines.push(format!(
            "[{}]  Faltantes: {}",
            section.scope.module_label(),
            section.missing.len()
        ));
        if section.missing.is_empty() {
            lines.push(" - (sin faltantes)".to_string());
        } else {
            lines.extend(section.missing.iter().map(|title| format!(" - {title}")));
        }
        lines.push(String::new());
    }

    lines.push(light);
    lines.push(format!("TOTAL FALTANTES: {}", total_missing(sections)));
    lines.push(heavy.clone());
    lines.push(String::new());
    lines.push("ARCHIVOS CSV EXTRA (no esperados)".to_string());
    lines.push(format!("Total extras: {}", extras.len()));
    if extras.is_empty() {
        lines.push(" - (sin extras)".to_string());
    } else {
        let mut sorted = extras.to_vec();
        sorted.sort();
        lines.extend(sorted.iter().map(|name| format!(" - {name}")));
    }
    lines.push(heavy);

    lines.join("\n")
}

/// Writes `missingfiles.txt` into `dir`, replacing any previous report.
pub fn write_report(
    dir: &Utf8Path,
    sections: &[ScopeMissing],
    extras: &[String],
) -> Result<Utf8PathBuf, CanonError> {
    let path = dir.join(REPORT_FILE);
    let content = render_report(dir, Local::now(), sections, extras);
    fs::write(path.as_std_path(), content)
        .map_err(|err| CanonError::Filesystem(format!("write {path}: {err}")))?;
    Ok(path)
}

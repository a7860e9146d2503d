use std::io::{self, Write};

use serde::Serialize;

use crate::app::{
    CountResult, MissingResult, ProgressEvent, ProgressSink, RecoverResult, StandardizeResult,
};
use crate::domain::AppliedRename;
use crate::fs_util::NO_EXTENSION;

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_standardize(result: &StandardizeResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_missing(result: &MissingResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_count(result: &CountResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_recover(result: &RecoverResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

pub struct HumanOutput;

impl ProgressSink for HumanOutput {
    fn event(&self, event: ProgressEvent) {
        eprintln!("{DIM}{}{RESET}", event.message);
    }
}

impl HumanOutput {
    pub fn print_standardize(result: &StandardizeResult) {
        for rename in &result.recovered {
            println!("{YELLOW}recovered {}{RESET}", arrow(rename));
        }
        for orphan in &result.orphans {
            println!("{RED}orphaned temporary: {orphan}{RESET}");
        }

        if result.changes.is_empty() {
            println!("{GREEN}Nothing to rename in {}{RESET}", result.dir);
            return;
        }

        let (verb, color) = if result.dry_run {
            ("would rename", CYAN)
        } else {
            ("renamed", GREEN)
        };
        for rename in &result.changes {
            println!("{color}{}{RESET}", arrow(rename));
        }
        println!("{color}{} files {verb}{RESET}", result.changes.len());
    }

    pub fn print_missing(result: &MissingResult) {
        let heavy = "=".repeat(72);
        println!("{heavy}");
        println!("{CYAN}🔎 Verificación de faltantes{RESET}");
        println!("📁 Carpeta: {}", result.dir);
        println!("{heavy}");
        for section in &result.sections {
            let color = if section.missing.is_empty() { GREEN } else { YELLOW };
            println!();
            println!(
                "{color}{}: faltantes = {}{RESET}",
                section.scope.module_label(),
                section.missing.len()
            );
            for (idx, title) in section.missing.iter().enumerate() {
                println!("  {:02}. {title}", idx + 1);
            }
        }
        println!();
        println!("{}", "-".repeat(72));
        println!("TOTAL FALTANTES: {}", result.total_missing);
        println!("CSV EXTRAS (no esperados): {}", result.extras.len());
        let mut extras = result.extras.clone();
        extras.sort();
        for name in &extras {
            println!("{YELLOW}  - {name}{RESET}");
        }
        println!("{heavy}");
        println!();
        println!("📝 Archivo generado: {}", result.report_path);
    }

    pub fn print_count(result: &CountResult) {
        let heavy = "=".repeat(60);
        let light = "-".repeat(60);
        println!("{heavy}");
        println!("{CYAN}📂 Contador de archivos{RESET}");
        println!("{heavy}");
        println!("📁 Carpeta objetivo : {}", result.dir);
        println!("🔢 Total de archivos: {}", result.total);
        println!("{light}");
        if !result.by_extension.is_empty() {
            println!("📑 Por extensión:");
            for entry in &result.by_extension {
                let color = if entry.extension == NO_EXTENSION { DIM } else { RESET };
                println!("{color}  - {}: {}{RESET}", entry.extension, entry.count);
            }
            println!("{light}");
        }
        println!("📦 Esperados (listas):");
        println!("  - Aire : {}", result.expected.aire);
        println!("  - Agua : {}", result.expected.agua);
        println!("  - Total: {}", result.expected.total);
        let color = if result.csv >= result.expected.total { GREEN } else { YELLOW };
        println!(
            "{color}📊 Progreso CSV: {}/{}{RESET}",
            result.csv, result.expected.total
        );
        println!("{heavy}");
    }

    pub fn print_recover(result: &RecoverResult) {
        if result.restored.is_empty() && result.orphans.is_empty() {
            println!("{GREEN}No interrupted renames in {}{RESET}", result.dir);
            return;
        }
        for rename in &result.restored {
            println!("{GREEN}restored {}{RESET}", arrow(rename));
        }
        for orphan in &result.orphans {
            println!("{RED}orphaned temporary (left in place): {orphan}{RESET}");
        }
    }
}

fn arrow(rename: &AppliedRename) -> String {
    format!(
        "{} -> {}",
        rename.from.file_name().unwrap_or(rename.from.as_str()),
        rename.to.file_name().unwrap_or(rename.to.as_str())
    )
}

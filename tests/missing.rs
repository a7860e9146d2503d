use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use csv_canon::app::{App, NoProgress};
use csv_canon::config::{Config, ConfigLoader, ExpectedLists, ResolvedConfig};
use csv_canon::error::CanonError;
use csv_canon::expected::{EXPECTED_DATASETS_AGUA, EXPECTED_DATASETS_AIRE, Scope, ScopeFilter};
use csv_canon::report::REPORT_FILE;

fn utf8_tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    (temp, root)
}

fn small_catalog() -> App {
    let config = Config {
        expected: ExpectedLists {
            aire: Some(vec!["Temperatura media".to_string()]),
            agua: Some(vec!["Nivel medio del mar".to_string()]),
        },
        ..Config::default()
    };
    App::new(ConfigLoader::resolve_config(config))
}

#[test]
fn complete_directory_exits_zero() {
    let (_temp, root) = utf8_tempdir();
    fs::create_dir(root.join("agua")).unwrap();
    fs::write(root.join("Temperatura_media_20250101_000000.csv"), "x").unwrap();
    fs::write(root.join("agua/Nivel medio del mar.csv"), "x").unwrap();
    fs::write(root.join("notes.txt"), "x").unwrap();

    let result = small_catalog()
        .missing_files(&root, ScopeFilter::All, &NoProgress)
        .unwrap();

    assert_eq!(result.exit_code(), 0);
    assert_eq!(result.total_missing, 0);
    assert!(result.extras.is_empty());

    let report = fs::read_to_string(root.join(REPORT_FILE)).unwrap();
    assert!(report.starts_with("REPORTE DE ARCHIVOS FALTANTES - generado "));
    assert!(report.contains(&format!("Carpeta analizada: {root}")));
    assert!(report.contains("[Módulo VBA - Estado - Aire]  Faltantes: 0\n - (sin faltantes)"));
    assert!(report.contains("TOTAL FALTANTES: 0"));
    assert!(report.contains("Total extras: 0\n - (sin extras)"));
}

#[test]
fn missing_and_extra_files_exit_two() {
    let (_temp, root) = utf8_tempdir();
    fs::write(root.join("Temperatura_media.csv"), "x").unwrap();
    fs::write(root.join("otro.csv"), "x").unwrap();

    let result = small_catalog()
        .missing_files(&root, ScopeFilter::All, &NoProgress)
        .unwrap();

    assert_eq!(result.exit_code(), 2);
    assert_eq!(result.sections.len(), 2);
    assert_eq!(result.sections[0].scope, Scope::Aire);
    assert!(result.sections[0].missing.is_empty());
    assert_eq!(result.sections[1].missing, vec!["Nivel medio del mar"]);
    assert_eq!(result.extras, vec!["otro.csv"]);

    let report = fs::read_to_string(&result.report_path).unwrap();
    assert!(report.contains("[Módulo VBA - Estado - Agua]  Faltantes: 1\n - Nivel medio del mar\n"));
    assert!(report.contains("TOTAL FALTANTES: 1"));
    assert!(report.contains("Total extras: 1\n - otro.csv"));
}

#[test]
fn scope_filter_limits_titles_and_extras() {
    let (_temp, root) = utf8_tempdir();
    fs::write(root.join("Temperatura media.csv"), "x").unwrap();
    fs::write(root.join("nivel_medio_del_mar.csv"), "x").unwrap();

    let result = small_catalog()
        .missing_files(&root, ScopeFilter::Aire, &NoProgress)
        .unwrap();

    assert_eq!(result.sections.len(), 1);
    assert_eq!(result.total_missing, 0);
    // Files of unselected scopes count as extras.
    assert_eq!(result.extras, vec!["nivel_medio_del_mar.csv"]);
    assert_eq!(result.exit_code(), 2);
}

#[test]
fn empty_directory_misses_every_built_in_title() {
    let (_temp, root) = utf8_tempdir();

    let result = App::new(ResolvedConfig::default())
        .missing_files(&root, ScopeFilter::All, &NoProgress)
        .unwrap();

    assert_eq!(
        result.total_missing,
        EXPECTED_DATASETS_AIRE.len() + EXPECTED_DATASETS_AGUA.len()
    );
    assert_eq!(result.sections[1].missing[0], EXPECTED_DATASETS_AGUA[0]);
    assert_eq!(result.exit_code(), 2);
}

#[test]
fn missing_directory_is_rejected() {
    let (_temp, root) = utf8_tempdir();
    let file = root.join("file.csv");
    fs::write(&file, "x").unwrap();

    let err = small_catalog()
        .missing_files(&file, ScopeFilter::All, &NoProgress)
        .unwrap_err();

    assert_matches!(err, CanonError::InvalidDirectory(path) if path == file);
}

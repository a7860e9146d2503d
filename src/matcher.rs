//! Compares the CSV files present in a directory against expected dataset titles.
//!
//! A file satisfies a title when, after NFC composition and lowercasing, its
//! name is `{title}.csv` or `{safe_name(title)}.csv`, or starts with
//! `{title}_` or `{safe_name(title)}_` (the downloader appends a timestamp).
//! Diacritics are compared as written.

use serde::Serialize;

use crate::expected::{Scope, match_key, safe_name};

/// The four accepted spellings of one expected title, pre-normalized.
struct TitlePatterns {
    exact: [String; 2],
    prefix: [String; 2],
}

impl TitlePatterns {
    fn new(title: &str) -> Self {
        let safe = safe_name(title);
        Self {
            exact: [
                match_key(&format!("{title}.csv")),
                match_key(&format!("{safe}.csv")),
            ],
            prefix: [
                match_key(&format!("{title}_")),
                match_key(&format!("{safe}_")),
            ],
        }
    }

    fn is_satisfied_by(&self, normalized_name: &str) -> bool {
        self.exact.iter().any(|exact| exact == normalized_name)
            || self
                .prefix
                .iter()
                .any(|prefix| normalized_name.starts_with(prefix.as_str()))
    }
}

pub fn is_satisfied(title: &str, filename: &str) -> bool {
    TitlePatterns::new(title).is_satisfied_by(&match_key(filename))
}

/// Expected titles without a satisfying file, in input order.
pub fn compute_missing<T: AsRef<str>, F: AsRef<str>>(expected: &[T], present: &[F]) -> Vec<String> {
    let present: Vec<String> = present.iter().map(|name| match_key(name.as_ref())).collect();
    let mut missing = Vec::new();
    for title in expected {
        let title: &str = title.as_ref();
        let patterns = TitlePatterns::new(title);
        if !present.iter().any(|name| patterns.is_satisfied_by(name)) {
            missing.push(title.to_string());
        }
    }
    missing
}

/// Present file names matching none of the expected titles, in input order.
pub fn compute_extras<T: AsRef<str>, F: AsRef<str>>(
    expected_all: &[T],
    present: &[F],
) -> Vec<String> {
    let patterns: Vec<TitlePatterns> = expected_all
        .iter()
        .map(|title| TitlePatterns::new(title.as_ref()))
        .collect();
    let mut extras = Vec::new();
    for name in present {
        let name: &str = name.as_ref();
        let normalized = match_key(name);
        if !patterns.iter().any(|p| p.is_satisfied_by(&normalized)) {
            extras.push(name.to_string());
        }
    }
    extras
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub scope: Scope,
    pub missing: Vec<String>,
    pub extras: Vec<String>,
}

impl MatchResult {
    pub fn compute<T: AsRef<str>, F: AsRef<str>>(scope: Scope, expected: &[T], present: &[F]) -> Self {
        Self {
            scope,
            missing: compute_missing(expected, present),
            extras: compute_extras(expected, present),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.extras.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamped_export_satisfies_title() {
        let expected = ["Temperatura media"];
        let present = ["Temperatura_media_20250101_000000.csv"];
        assert!(compute_missing(&expected, &present).is_empty());
        assert!(compute_extras(&expected, &present).is_empty());
    }

    #[test]
    fn raw_and_safe_exact_names_match() {
        assert!(is_satisfied("Temperatura media", "Temperatura media.csv"));
        assert!(is_satisfied(
            "Volumen del embalse, según embalse",
            "volumen_del_embalse_según_embalse.csv"
        ));
        assert!(is_satisfied(
            "Concentración de ozono (O3) al percentil 95",
            "Concentración de ozono (O3) al percentil 95_20250101_000000.csv"
        ));
    }

    #[test]
    fn diacritics_are_significant_but_composition_is_not() {
        assert!(!is_satisfied("Radiación global media", "Radiacion_global_media.csv"));
        assert!(is_satisfied(
            "Radiación global media",
            "RADIACIO\u{301}N_GLOBAL_MEDIA_20250101_000000.csv"
        ));
    }

    #[test]
    fn prefix_requires_separator() {
        // "Temperatura media" must not claim "Temperatura mediana".
        assert!(!is_satisfied("Temperatura media", "Temperatura_mediana.csv"));
    }

    #[test]
    fn shared_prefixes_can_satisfy_several_titles() {
        let expected = ["Temperatura media", "Temperatura media mensual"];
        let present = ["Temperatura_media_mensual_20250101_000000.csv"];
        assert!(compute_missing(&expected, &present).is_empty());
    }

    #[test]
    fn empty_inputs() {
        let expected = ["A", "B"];
        let none: [&str; 0] = [];
        assert_eq!(compute_missing(&expected, &none), vec!["A", "B"]);
        assert!(compute_extras(&expected, &none).is_empty());
        assert!(compute_missing(&none, &["a.csv"]).is_empty());
        assert_eq!(compute_extras(&none, &["a.csv"]), vec!["a.csv"]);
    }

    #[test]
    fn every_title_is_missing_or_satisfied() {
        let expected = [
            "Temperatura media",
            "Nivel medio del mar",
            "Cantidad de agua caída",
            "Índice UV-B promedio",
        ];
        let present = [
            "Nivel_medio_del_mar_20240101_101010.csv",
            "Índice_UV-B_promedio.csv",
            "unrelated.csv",
        ];
        let missing = compute_missing(&expected, &present);
        for title in expected {
            let satisfied = present.iter().any(|name| is_satisfied(title, name));
            assert_ne!(satisfied, missing.iter().any(|m| m == title), "{title}");
        }
        assert_eq!(missing, vec!["Temperatura media", "Cantidad de agua caída"]);
        assert_eq!(compute_extras(&expected, &present), vec!["unrelated.csv"]);
    }

    #[test]
    fn match_result_completeness() {
        let result = MatchResult::compute(Scope::Agua, &["Nivel medio del mar"], &["nivel medio del mar.csv"]);
        assert!(result.is_complete());
    }
}

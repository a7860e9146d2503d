//! Master lists of the datasets each module is expected to export.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Aire,
    Agua,
}

impl Scope {
    pub const ALL: [Scope; 2] = [Scope::Aire, Scope::Agua];

    pub fn module_label(self) -> &'static str {
        match self {
            Scope::Aire => "Módulo VBA - Estado - Aire",
            Scope::Agua => "Módulo VBA - Estado - Agua",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Aire => write!(f, "aire"),
            Scope::Agua => write!(f, "agua"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScopeFilter {
    #[default]
    All,
    Aire,
    Agua,
}

impl ScopeFilter {
    pub fn scopes(self) -> Vec<Scope> {
        match self {
            ScopeFilter::All => Scope::ALL.to_vec(),
            ScopeFilter::Aire => vec![Scope::Aire],
            ScopeFilter::Agua => vec![Scope::Agua],
        }
    }
}

pub const EXPECTED_DATASETS_AIRE: &[&str] = &[
    "Temperatura máxima absoluta",
    "Temperatura mínima absoluta",
    "Temperatura media",
    "Temperatura máxima media",
    "Temperatura mínima media",
    "Humedad relativa media mensual",
    "Radiación global media",
    "Índice UV-B promedio",
    "Concentración de Material Particulado fino respirable (MP2,5) media mensual",
    "Concentración de Material Particulado fino respirable (MP2,5) máxima horaria anual",
    "Concentración de Material Particulado fino respirable (MP2,5) mínima horaria anual",
    "Concentración de Material Particulado fino respirable (MP2,5) al Percentil 50",
    "Concentración de Material Particulado fino respirable (MP2,5) al Percentil 90",
    "Concentración de Material Particulado fino respirable (MP2,5) al Percentil 95",
    "Concentración de Material Particulado fino respirable (MP2,5) al Percentil 98",
    "Concentración de material particulado respirable (MP10) media mensual",
    "Concentración de material particulado respirable (MP10) máxima horaria anual",
    "Concentración de material particulado respirable (MP10) mínima horaria anual",
    "Concentración de material particulado respirable (MP10) al percentil 50",
    "Concentración de material particulado respirable (MP10) al percentil 90",
    "Concentración de material particulado respirable (MP10) al percentil 95",
    "Concentración de material particulado respirable (MP10) al percentil 98",
    "Concentración de ozono (O3) media mensual",
    "Concentración de ozono (O3) máxima horaria anual",
    "Concentración de ozono (O3) mínima horaria anual",
    "Concentración de ozono (O3) al percentil 50",
    "Concentración de ozono (O3) al percentil 90",
    "Concentración de ozono (O3) al percentil 95",
    "Concentración de ozono (O3) al percentil 98",
    "Concentración de ozono (O3) al percentil 99",
    "Concentración de dióxido de azufre (SO2) media mensual",
    "Concentración de dióxido de azufre (SO2) máxima horaria anual",
    "Concentración de dióxido de azufre (SO2) mínima anual",
    "Concentración de dióxido de azufre (SO2) al percentil 50",
    "Concentración de dióxido de azufre (SO2) al percentil 90",
    "Concentración de dióxido de azufre (SO2) al percentil 95",
    "Concentración de dióxido de azufre (SO2) al percentil 99",
    "Concentración de dióxido de nitrógeno (NO2) media mensual",
    "Concentración de dióxido de nitrógeno (NO2) máxima horaria anual",
    "Concentración de dióxido de nitrógeno (NO2) mínima horaria anual",
    "Concentración de dióxido de nitrógeno (NO2) al percentil 50",
    "Concentración de dióxido de nitrógeno (NO2) al percentil 90",
    "Concentración de Dióxido de Nitrógeno (NO2) al percentil 98",
    "Concentración de dióxido de nitrógeno (NO2) al percentil 99",
    "Concentración de monóxido de carbono (CO) media mensual",
    "Concentración de monóxido de carbono (CO) máxima horaria anual",
    "Concentración de monóxido de carbono (CO) mínima horaria anual",
    "Concentración de monóxido de carbono (CO) al percentil 50",
    "Concentración de monóxido de carbono (CO) al percentil 90",
    "Concentración de monóxido de carbono (CO) al percentil 95",
    "Concentración de monóxido de carbono (CO) al percentil 98",
    "Concentración de monóxido de carbono (CO) al percentil 99",
    "Concentración de monóxido de nitrógeno (NO) media mensua",
    "Concentración de monóxido de nitrógeno (NO) máxima horaria anual",
    "Concentración de monóxido de nitrógeno (NO) mínima horaria anual",
    "Concentración de monóxido de nitrógeno (NO) al percentil 50",
    "Concentración de monóxido de nitrógeno (NO) al percentil 90",
    "Concentración de monóxido de nitrógeno (NO) al percentil 98",
    "Concentración de monóxido de nitrógeno (NO) al percentil 99",
    "Concentración de óxidos de nitrógeno (NOx) media mensual",
    "Concentración de óxidos de nitrógeno (NOx) máxima horaria anual",
    "Concentración de óxidos de nitrógeno (NOx) mínima horaria anual",
    "Concentración de óxidos de nitrógeno (NOx) al percentil 50",
    "Concentración de óxidos de nitrógeno (NOx) al percentil 90",
    "Concentración de óxidos de nitrógeno (NOx) al percentil 98",
    "Concentración de óxidos de nitrógeno (NOx) al percentil 99",
    "Concentración de dióxido de azufre (SO2) al percentil 98",
    "Concentración de dióxido de nitrógeno (NO2) al percentil 95",
    "Concentración de monóxido de nitrógeno (NO) al percentil 95",
    "Concentración de óxidos de nitrógeno (NOx) al percentil 95",
    "Número de eventos de olas de calor",
];

pub const EXPECTED_DATASETS_AGUA: &[&str] = &[
    "Caudal medio de aguas corrientes",
    "Volumen del embalse, según embalse",
    "Nivel estático de aguas subterráneas",
    "Cantidad de agua caída",
    "Altura de nieve equivalente en agua",
    "Evaporación real, según estación",
    "Número de glaciares, según cuenca hidrográfica",
    "Superficie de glaciares, según cuenca hidrográfica",
    "Volumen de hielo glaciar estimado, según cuenca hidrográfica",
    "Volumen de agua de glaciares estimada, según cuenca hidrográfica",
    "Nivel medio del mar",
    "Temperatura superficial del mar",
    "Concentración de metales disueltos en la matriz acuosa",
    "Concentración de coliformes fecales en matriz acuosa",
    "Concentración de metales totales en la matriz sedimentaria",
    "Concentración de coliformes fecales en matriz biológica",
];

/// Expected titles per scope. Built once and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedCatalog {
    aire: Vec<String>,
    agua: Vec<String>,
}

impl Default for ExpectedCatalog {
    fn default() -> Self {
        Self::new(
            owned_titles(EXPECTED_DATASETS_AIRE),
            owned_titles(EXPECTED_DATASETS_AGUA),
        )
    }
}

impl ExpectedCatalog {
    pub fn new(aire: Vec<String>, agua: Vec<String>) -> Self {
        Self { aire, agua }
    }

    pub fn datasets(&self, scope: Scope) -> &[String] {
        match scope {
            Scope::Aire => &self.aire,
            Scope::Agua => &self.agua,
        }
    }

    pub fn selected(&self, filter: ScopeFilter) -> Vec<(Scope, &[String])> {
        filter
            .scopes()
            .into_iter()
            .map(|scope| (scope, self.datasets(scope)))
            .collect()
    }

    pub fn totals(&self) -> ExpectedTotals {
        ExpectedTotals {
            aire: self.aire.len(),
            agua: self.agua.len(),
            total: self.aire.len() + self.agua.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpectedTotals {
    pub aire: usize,
    pub agua: usize,
    pub total: usize,
}

pub fn owned_titles(titles: &[&str]) -> Vec<String> {
    titles.iter().map(|title| title.to_string()).collect()
}

/// File-name prefix the downloader saves a title under: spaces become `_`,
/// parentheses and commas are dropped, diacritics stay.
pub fn safe_name(title: &str) -> String {
    title
        .replace(' ', "_")
        .replace(['(', ')', ','], "")
}

/// Case-insensitive comparison form that keeps diacritics.
pub fn match_key(text: &str) -> String {
    text.nfc().collect::<String>().to_lowercase()
}

//! Domain abbreviations that shorten verbose dataset titles while keeping the
//! pollutant, statistic, period and scope that tell datasets apart.
//!
//! Rules run in table order over ASCII-folded, lowercase text with `_` and
//! whitespace collapsed to single spaces. Order is load-bearing: pollutant names
//! are rewritten before the statistical words, and compound statistics
//! ("maxima horaria anual") sit before the bare words they contain.

use std::sync::LazyLock;

use regex::Regex;

use crate::identifier::{asciiize, to_snake_ascii};

const RULES: &[(&str, &str)] = &[
    // uninformative heading
    (r"^\s*concentracion\s+de\s+", ""),
    // pollutants
    (r"\bozono\s*(?:\((?:o3)\)|\s+o3)?\b", "o3"),
    (r"dioxido\s+de\s+azufre\s*(?:\((?:so2)\)|\s+so2)?\b", "so2"),
    (r"dioxido\s+de\s+nitrogeno\s*(?:\((?:no2)\)|\s+no2)?\b", "no2"),
    (r"oxidos\s+de\s+nitrogeno\s*(?:\((?:nox)\)|\s+nox)?\b", "nox"),
    (r"monoxido\s+de\s+carbono\s*(?:\((?:co)\)|\s+co)?\b", "co"),
    (r"monoxido\s+de\s+nitrogeno\s*(?:\((?:no)\)|\s+no)?\b", "no"),
    (
        r"material\s+particulado(?:\s+fino)?\s+respirable\s*(?:\(\s*mp\s*2[,\.]?\s*5\s*\)|mp\s*2[,\.]?\s*5|mp\s*25|mp25)\b",
        "mp25",
    ),
    (
        r"material\s+particulado\s+respirable\s*(?:\(\s*mp\s*10\s*\)|mp\s*10|mp10)\b",
        "mp10",
    ),
    (
        r"material\s+particulado\s+fino\s+respirable\s*\(mp\s*2[,\.]?\s*5\)",
        "mp25",
    ),
    // statistics and periods
    (r"\bmensua\b", "mensual"),
    (r"\b(?:al|a\s+el)?\s*percentil\s*([0-9]+)\b", "perc${1}"),
    (r"\bmedia\s+mensual\b", "med_mens"),
    (r"\bpromedio\b", "prom"),
    (r"\bmedia\b", "med"),
    (r"\bmensual\b", "mens"),
    (r"\banual\b", "anual"),
    (r"\bmaxima\s+horaria\s+anual\b", "max_hor_anual"),
    (r"\bminima\s+horaria\s+anual\b", "min_hor_anual"),
    (r"\bmaxima\s+horaria\b", "max_hor"),
    (r"\bminima\s+horaria\b", "min_hor"),
    (r"\bmaxima\b", "max"),
    (r"\bminima\b", "min"),
    // common variables
    (r"\btemperatura\b", "temp"),
    (r"\bhumedad\s+relativa\b", "humedad_rel"),
    (r"\bradiacion\s+global\b", "rad_global"),
    (r"\bindice\s+uv[-_ ]?b\b", "uvb"),
    (r"\bnumero\s+de\s+\b", "num_"),
    (r"\bevaporacion\s+real\b", "evaporacion_real"),
    // "segun ..." scopes
    (r"\bsegun\s+cuenca(?:\s+hidrografica)?\b", "por_cuenca"),
    (r"\bsegun\s+estacion\b", "por_estacion"),
    (r"\bsegun\s+embalse\b", "por_embalse"),
    // hydrology
    (r"\bcantidad\s+de\s+agua\s+ca[ií]da\b", "cantidad_de_agua_caida"),
    (
        r"\baltura\s+de\s+nieve\s+equivalente\s+en\s+agua\b",
        "altura_nieve_equivalente_en_agua",
    ),
];

/// Pollutant tokens that double rule application can leave repeated at the
/// start of a name (`co_co_`, `so2so2_`). Alternation order matters: `no2`
/// and `nox` must be tried before `no`.
const DUP_PREFIX_TOKENS: &[&str] = &["co", "no2", "o3", "nox", "no", "so2", "mp10", "mp25"];

static COMPILED_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|(pattern, replacement)| (Regex::new(pattern).unwrap(), *replacement))
        .collect()
});

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[_\s]+").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static MP_DOT_25: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(mp\s*2\.5\)").unwrap());
static CUENCA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bcuenca\b").unwrap());
static ESTACION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bestacion\b").unwrap());
static EMBALSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bembalse\b").unwrap());

#[derive(Debug, Default, Clone, Copy)]
struct ScopeHints {
    cuenca: bool,
    estacion: bool,
    embalse: bool,
}

impl ScopeHints {
    fn detect(text: &str) -> Self {
        Self {
            cuenca: CUENCA.is_match(text) && text.contains("hidrograf"),
            estacion: ESTACION.is_match(text),
            embalse: EMBALSE.is_match(text),
        }
    }

    fn reinstate(self, mut text: String) -> String {
        for (present, marker) in [
            (self.cuenca, "por_cuenca"),
            (self.estacion, "por_estacion"),
            (self.embalse, "por_embalse"),
        ] {
            if present && !text.contains(marker) {
                text = format!("{text} {marker}");
            }
        }
        text
    }
}

/// Shortens a dataset title to snake_case text. Callers still pass the result
/// through [`crate::identifier::to_sql_identifier`].
pub fn shorten(raw_title: &str) -> String {
    if raw_title.is_empty() {
        return String::new();
    }

    let folded = asciiize(raw_title).to_lowercase();
    let spaced = SEPARATORS.replace_all(folded.trim(), " ");
    let mut text = spaced.trim().to_string();

    let hints = ScopeHints::detect(&text);
    text = MP_DOT_25.replace_all(&text, "(mp2,5)").into_owned();

    for (pattern, replacement) in COMPILED_RULES.iter() {
        if pattern.is_match(&text) {
            text = pattern.replace_all(&text, *replacement).into_owned();
        }
    }

    let text = WHITESPACE.replace_all(&text, " ").trim().to_string();
    let text = hints.reinstate(text);

    let mut out = to_snake_ascii(&text);
    if out.is_empty() {
        out = to_snake_ascii(raw_title);
    }
    collapse_dup_prefix(&out)
}

/// `co_co_max` -> `co_max`, `o3o3` -> `o3_`.
fn collapse_dup_prefix(text: &str) -> String {
    for token in DUP_PREFIX_TOKENS {
        let Some(mut rest) = text.strip_prefix(token) else {
            continue;
        };
        let mut repeated = false;
        loop {
            let candidate = rest.strip_prefix('_').unwrap_or(rest);
            match candidate.strip_prefix(token) {
                Some(after) => {
                    rest = after;
                    repeated = true;
                }
                None => break,
            }
        }
        if repeated {
            let rest = rest.strip_prefix('_').unwrap_or(rest);
            return format!("{token}_{rest}");
        }
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::to_sql_identifier;

    #[test]
    fn ozone_percentile() {
        let short = shorten("Concentración de Ozono (O3) al Percentil 95");
        assert_eq!(short, "o3_perc95");
    }

    #[test]
    fn sulfur_dioxide_hourly_annual_max() {
        let short = shorten("Concentración de dióxido de azufre (SO2) máxima horaria anual");
        assert_eq!(short, "so2_max_hor_anual");
    }

    #[test]
    fn fine_particulate_monthly_mean() {
        let short = shorten(
            "Concentración de Material Particulado fino respirable (MP2,5) media mensual",
        );
        assert_eq!(short, "mp25_med_mens");
    }

    #[test]
    fn dotted_fine_particulate_is_normalized_first() {
        let short = shorten("Material particulado fino respirable (MP 2.5) al percentil 98");
        assert!(short.starts_with("mp25"), "{short}");
        assert!(short.ends_with("perc98"), "{short}");
    }

    #[test]
    fn nitric_oxide_misspelled_month() {
        let short = shorten("Concentración de monóxido de nitrógeno (NO) media mensua");
        assert_eq!(short, "no_med_mens");
    }

    #[test]
    fn nitrogen_oxides_are_not_mistaken_for_nitric_oxide() {
        let short = shorten("Concentración de óxidos de nitrógeno (NOx) al percentil 99");
        assert_eq!(short, "nox_perc99");
    }

    #[test]
    fn common_variables() {
        assert_eq!(shorten("Temperatura máxima absoluta"), "temp_max_absoluta");
        assert_eq!(shorten("Temperatura media"), "temp_med");
        assert_eq!(
            shorten("Humedad relativa media mensual"),
            "humedad_rel_med_mens"
        );
        assert_eq!(shorten("Índice UV-B promedio"), "uvb_prom");
        assert_eq!(
            shorten("Número de eventos de olas de calor"),
            "num_eventos_de_olas_de_calor"
        );
    }

    #[test]
    fn scope_phrases_become_por_markers() {
        assert_eq!(
            shorten("Número de glaciares, según cuenca hidrográfica"),
            "num_glaciares_por_cuenca"
        );
        assert_eq!(
            shorten("Volumen del embalse, según embalse"),
            "volumen_del_embalse_por_embalse"
        );
        assert_eq!(
            shorten("Evaporación real, según estación"),
            "evaporacion_real_por_estacion"
        );
    }

    #[test]
    fn scope_is_reinstated_when_rules_drop_it() {
        let short = shorten("Caudal por estación");
        assert_eq!(short, "caudal_por_estacion_por_estacion");
        let short = shorten("Glaciares de la cuenca hidrográfica");
        assert!(short.ends_with("por_cuenca"), "{short}");
    }

    #[test]
    fn underscored_stems_are_reduced_like_titles() {
        assert_eq!(
            shorten("Concentración_de_ozono_O3_al_percentil_50"),
            shorten("Concentración de ozono (O3) al percentil 50")
        );
    }

    #[test]
    fn unmatched_titles_pass_through_normalized() {
        assert_eq!(shorten("Nivel medio del mar"), "nivel_medio_del_mar");
        assert_eq!(shorten(""), "");
    }

    #[test]
    fn symbol_only_title_falls_back_to_raw() {
        assert_eq!(shorten("()"), "");
    }

    #[test]
    fn duplicated_pollutant_prefix_collapses() {
        assert_eq!(collapse_dup_prefix("co_co_max"), "co_max");
        assert_eq!(collapse_dup_prefix("so2so2_med"), "so2_med");
        assert_eq!(collapse_dup_prefix("no_no_no_x"), "no_x");
        assert_eq!(collapse_dup_prefix("nox_nox"), "nox_");
        assert_eq!(collapse_dup_prefix("nox_max"), "nox_max");
        assert_eq!(collapse_dup_prefix("cobre"), "cobre");
    }

    #[test]
    fn shortened_titles_stay_distinct() {
        let titles = [
            "Concentración de ozono (O3) al percentil 50",
            "Concentración de ozono (O3) al percentil 90",
            "Concentración de ozono (O3) máxima horaria anual",
            "Concentración de ozono (O3) mínima horaria anual",
            "Concentración de ozono (O3) media mensual",
        ];
        let mut idents: Vec<String> = titles
            .iter()
            .map(|title| to_sql_identifier(&shorten(title)))
            .collect();
        idents.sort();
        idents.dedup();
        assert_eq!(idents.len(), titles.len());
    }
}

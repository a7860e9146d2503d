//! ASCII snake_case identifiers that are safe as PostgreSQL table names.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// PostgreSQL truncates identifiers longer than this.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Substituted when nothing usable survives normalization.
pub const PLACEHOLDER: &str = "t";

/// Prepended to identifiers starting with a digit or equal to a keyword.
pub const ESCAPE_PREFIX: &str = "t_";

pub const RESERVED_KEYWORDS: &[&str] = &[
    "user", "table", "select", "where", "group", "order", "limit", "offset", "insert", "update",
    "delete", "having", "join", "on", "from", "into", "as", "and", "or", "not", "by", "in", "is",
    "null", "true", "false",
];

static DIGIT_COMMA_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]),([0-9])").unwrap());

pub fn is_reserved(token: &str) -> bool {
    RESERVED_KEYWORDS.contains(&token)
}

/// Decomposes and drops combining marks: "Índice" becomes "Indice".
pub fn asciiize(text: &str) -> String {
    text.nfkd().filter(|ch| !is_combining_mark(*ch)).collect()
}

/// Lowercase ASCII with every run of other characters turned into a single `_`,
/// trimmed of leading and trailing underscores.
pub fn to_snake_ascii(text: &str) -> String {
    let folded = asciiize(text).to_lowercase();
    let mut out = String::with_capacity(folded.len());
    let mut pending_separator = false;
    for ch in folded.trim().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(ch);
        } else {
            pending_separator = true;
        }
    }
    out
}

pub fn to_sql_identifier(raw: &str) -> String {
    to_sql_identifier_with_len(raw, MAX_IDENTIFIER_LEN)
}

/// Never fails: empty or all-symbol input yields [`PLACEHOLDER`]. The result is
/// stable under a second application.
pub fn to_sql_identifier_with_len(raw: &str, max_len: usize) -> String {
    let raw = DIGIT_COMMA_DIGIT.replace_all(raw, "${1}_${2}");
    let mut ident = to_snake_ascii(&raw);
    if ident.is_empty() {
        ident = PLACEHOLDER.to_string();
    }
    let starts_with_digit = ident.starts_with(|ch: char| ch.is_ascii_digit());
    if starts_with_digit || is_reserved(&ident) {
        ident = format!("{ESCAPE_PREFIX}{ident}");
    }
    fit_len(&mut ident, max_len);
    // Truncation can land on a keyword ("on x" at 2 bytes).
    if is_reserved(&ident) {
        ident = format!("{ESCAPE_PREFIX}{ident}");
        fit_len(&mut ident, max_len);
    }
    if ident.is_empty() {
        ident = PLACEHOLDER.to_string();
    }
    ident
}

fn fit_len(ident: &mut String, max_len: usize) {
    // ASCII only at this point, so byte truncation is char truncation.
    ident.truncate(max_len.max(1));
    let trimmed = ident.trim_end_matches('_').len();
    ident.truncate(trimmed);
}

//! Text folding shared by header matching, searching and classification.
//!
//! Folding lowercases, applies NFKC, and strips combining marks so that
//! `"RADICACIÓN"`, `"radicacion"` and `"Radicación"` compare equal.

use unicode_normalization::UnicodeNormalization;

/// Lowercase, NFKC, strip accents.
pub fn fold(s: &str) -> String {
    let lower = s.to_lowercase();
    let nfkc = lower.nfkc().collect::<String>();
    strip_accents(&nfkc)
}

fn strip_accents(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

fn is_combining_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036F}').contains(&c)
}

/// Fold a column header down to its alphanumeric skeleton.
///
/// `"FECHA RADICACIÓN"`, `"fecha_radicacion"` and `"Fecha-Radicación "`
/// all become `"fecharadicacion"`.
pub fn fold_header(s: &str) -> String {
    fold(s).chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Split folded text into search tokens, dropping punctuation, tokens
/// shorter than two characters, and any token present in `stopwords`
/// (which must already be folded).
pub fn tokenize(s: &str, stopwords: &[String]) -> Vec<String> {
    let folded = fold(s);
    let mut tokens: Vec<String> = Vec::new();
    for raw in folded.split(|c: char| !c.is_alphanumeric()) {
        if raw.chars().count() < 2 {
            continue;
        }
        if stopwords.iter().any(|w| w == raw) {
            continue;
        }
        if !tokens.iter().any(|t| t == raw) {
            tokens.push(raw.to_string());
        }
    }
    tokens
}

/// Trim and collapse internal whitespace; empty input yields `None`.
pub fn clean_value(s: &str) -> Option<String> {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_strips_accents_and_case() {
        assert_eq!(fold("RADICACIÓN"), "radicacion");
        assert_eq!(fold("¿Cuántas?"), "¿cuantas?");
        assert_eq!(fold("Peña"), "pena");
    }

    #[test]
    fn header_folding_ignores_separators() {
        assert_eq!(fold_header("FECHA RADICACIÓN"), "fecharadicacion");
        assert_eq!(fold_header("fecha_radicacion"), fold_header("Fecha-Radicación "));
    }

    #[test]
    fn tokenize_dedups_and_drops_stopwords() {
        let stop = vec!["de".to_string(), "la".to_string()];
        let tokens = tokenize("Reparación de la vía, VÍA principal", &stop);
        assert_eq!(tokens, vec!["reparacion", "via", "principal"]);
    }

    #[test]
    fn clean_value_collapses_whitespace() {
        assert_eq!(clean_value("  Ana   María "), Some("Ana María".to_string()));
        assert_eq!(clean_value("   "), None);
    }
}

//! Search-term suggestions drawn from the store's category vocabulary.
//!
//! The vocabulary is every distinct `classification`, `status` and
//! `responsible_unit` value, deduplicated on its folded form. Frequencies
//! are summed across the three attributes. It is built once per store
//! generation, on the first suggestion request.

use std::collections::HashMap;

use crate::models::Record;
use crate::store::RecordStore;
use crate::text::fold;

/// Suggestion tuning.
#[derive(Debug, Clone)]
pub struct SuggestParams {
    /// Fragments shorter than this (in characters, after trimming) yield
    /// no suggestions.
    pub min_fragment_len: usize,
    pub max_suggestions: usize,
}

impl Default for SuggestParams {
    fn default() -> Self {
        Self {
            min_fragment_len: 2,
            max_suggestions: 10,
        }
    }
}

#[derive(Debug, Clone)]
struct Term {
    display: String,
    folded: String,
    frequency: usize,
}

/// Distinct category values, most frequent first.
#[derive(Debug, Clone, Default)]
pub(crate) struct Vocabulary {
    terms: Vec<Term>,
}

impl Vocabulary {
    pub(crate) fn build(records: &[Record]) -> Self {
        // folded -> (display spelling counts, total)
        let mut seen: HashMap<String, (HashMap<&str, usize>, usize)> = HashMap::new();
        for r in records {
            for value in [&r.classification, &r.status, &r.responsible_unit]
                .into_iter()
                .flatten()
            {
                let entry = seen.entry(fold(value)).or_default();
                *entry.0.entry(value.as_str()).or_insert(0) += 1;
                entry.1 += 1;
            }
        }

        let mut terms: Vec<Term> = seen
            .into_iter()
            .map(|(folded, (spellings, frequency))| {
                let display = spellings
                    .into_iter()
                    .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
                    .map(|(s, _)| s.to_string())
                    .unwrap_or_else(|| folded.clone());
                Term {
                    display,
                    folded,
                    frequency,
                }
            })
            .collect();

        terms.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then_with(|| a.folded.cmp(&b.folded))
                .then_with(|| a.display.cmp(&b.display))
        });
        log::debug!("suggestion vocabulary built: {} terms", terms.len());
        Self { terms }
    }

    fn matching<'a>(&'a self, needle: &'a str) -> impl Iterator<Item = &'a Term> + 'a {
        self.terms.iter().filter(move |t| t.folded.contains(needle))
    }
}

/// Up to `max_suggestions` category values containing `fragment`, most
/// frequent first, ties alphabetical.
pub fn suggest(store: &RecordStore, fragment: &str, params: &SuggestParams) -> Vec<String> {
    let fragment = fragment.trim();
    if fragment.chars().count() < params.min_fragment_len {
        return Vec::new();
    }
    let needle = fold(fragment);
    if needle.is_empty() {
        return Vec::new();
    }
    store
        .vocabulary()
        .matching(&needle)
        .take(params.max_suggestions)
        .map(|t| t.display.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_store;

    #[test]
    fn short_fragments_yield_nothing() {
        let store = sample_store();
        assert!(suggest(&store, "q", &SuggestParams::default()).is_empty());
        assert!(suggest(&store, "   ", &SuggestParams::default()).is_empty());
    }

    #[test]
    fn suggestions_are_ranked_by_frequency() {
        let store = sample_store();
        let got = suggest(&store, "se", &SuggestParams::default());
        assert_eq!(
            got,
            vec![
                "Secretaría de Infraestructura",
                "Secretaría de Ambiente",
                "Secretaría de Gobierno",
            ]
        );
    }

    #[test]
    fn matching_is_accent_insensitive_and_bounded() {
        let store = sample_store();
        assert_eq!(
            suggest(&store, "peticion", &SuggestParams::default()),
            vec!["Petición"]
        );
        let one = SuggestParams {
            max_suggestions: 1,
            ..SuggestParams::default()
        };
        assert_eq!(suggest(&store, "secretar", &one).len(), 1);
    }

    #[test]
    fn spellings_merge_under_one_term() {
        let mut a = Record::new("1");
        a.status = Some("Resuelta".into());
        let mut b = Record::new("2");
        b.status = Some("RESUELTA".into());
        let mut c = Record::new("3");
        c.classification = Some("Resuelta".into());
        let store = RecordStore::build(1, vec![a, b, c], None);
        assert_eq!(suggest(&store, "res", &SuggestParams::default()), vec!["Resuelta"]);
    }
}

//! Built-in guide to the request forms the engine understands.
//!
//! Returned for help requests (`"ayuda"`, `"help"`, ...) and by
//! `pqrs help-queries`. The content is static; it does not depend on the
//! loaded records.

use serde::Serialize;

use crate::classify::Strategy;
use crate::models::CanonicalField;

/// One strategy and a request that routes to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyHelp {
    pub strategy: Strategy,
    pub description: &'static str,
    pub example: &'static str,
}

/// One combined-filter criterion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionHelp {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryHelp {
    pub strategies: Vec<StrategyHelp>,
    pub filter_criteria: Vec<CriterionHelp>,
    pub sort_fields: Vec<&'static str>,
    pub examples: Vec<&'static str>,
}

pub fn query_help() -> QueryHelp {
    let strategy =
        |strategy: Strategy, description: &'static str, example: &'static str| StrategyHelp {
            strategy,
            description,
            example,
        };
    let criterion =
        |name: &'static str, description: &'static str| CriterionHelp { name, description };

    QueryHelp {
        strategies: vec![
            strategy(
                Strategy::ExactLookup,
                "The whole request is a case id; returns that record.",
                "2024-00451",
            ),
            strategy(
                Strategy::DateRange,
                "Two dates in the request; records filed between them, inclusive.",
                "quejas entre 01/01/2024 y 31/03/2024",
            ),
            strategy(
                Strategy::NameMatch,
                "A name cue followed by a name fragment; partial, accent-insensitive.",
                "a nombre de María Gómez",
            ),
            strategy(
                Strategy::Aggregate,
                "A counting or statistics cue; counts by status, classification and period.",
                "¿Cuántas PQRS hay por estado?",
            ),
            strategy(
                Strategy::FreeText,
                "Anything else; words matched against the narrative and note columns.",
                "huecos en la vía principal",
            ),
            strategy(
                Strategy::Combined,
                "Only through a hint or `pqrs filter`; every criterion must hold.",
                "pqrs filter --status pendiente --from 2024-01-01",
            ),
            strategy(Strategy::Help, "This guide.", "ayuda"),
        ],
        filter_criteria: vec![
            criterion("text", "every word appears in the narrative or a note column"),
            criterion("case_id", "exact case id"),
            criterion("requester_name", "every word appears in the requester name"),
            criterion("filed_from", "filed on or after this date"),
            criterion("filed_to", "filed on or before this date"),
            criterion("classification", "classification contains this value"),
            criterion("status", "status contains this value"),
            criterion("responsible_unit", "responsible unit contains this value"),
            criterion("neighborhood", "neighborhood contains this value"),
        ],
        sort_fields: CanonicalField::ALL.iter().map(|f| f.as_str()).collect(),
        examples: vec![
            "pqrs query \"2024-00451\"",
            "pqrs query \"solicitante Pérez\"",
            "pqrs query \"entre 01/01/2024 y 31/03/2024\"",
            "pqrs query \"estadísticas\"",
            "pqrs filter --classification queja --sort-by case_id --order asc",
            "pqrs export --status pendiente --format csv --output pendientes.csv",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::QueryClassifier;

    #[test]
    fn every_strategy_is_described_once() {
        let help = query_help();
        for s in [
            Strategy::ExactLookup,
            Strategy::FreeText,
            Strategy::NameMatch,
            Strategy::DateRange,
            Strategy::Combined,
            Strategy::Aggregate,
            Strategy::Help,
        ] {
            assert_eq!(help.strategies.iter().filter(|h| h.strategy == s).count(), 1, "{}", s);
        }
        assert_eq!(help.sort_fields.len(), CanonicalField::ALL.len());
        assert_eq!(help.filter_criteria.len(), 9);
    }

    #[test]
    fn classifiable_examples_route_to_their_strategy() {
        let classifier = QueryClassifier::with_defaults().unwrap();
        for h in query_help().strategies {
            if h.strategy == Strategy::Combined {
                continue;
            }
            let q = classifier.classify(h.example, None).unwrap();
            assert_eq!(q.strategy, h.strategy, "example '{}'", h.example);
        }
    }
}

//! # PQRS Query Core
//!
//! Shared, I/O-free logic for PQRS Query: the canonical record model, the
//! column normalizer, the generation-versioned record store, the query
//! classifier, the search strategies, statistics, search-term
//! suggestions, and the built-in query guide.
//!
//! This crate never touches the filesystem. Source readers live in the
//! application crate and hand raw rows to [`normalize`]; everything from
//! there on can be exercised against a [`store::RecordStore`] built in
//! memory.

pub mod aggregate;
pub mod classify;
pub mod dispatch;
pub mod error;
pub mod help;
pub mod models;
pub mod normalize;
pub mod search;
pub mod store;
pub mod suggest;
pub mod text;

pub use error::{EngineError, Result};

#[cfg(test)]
pub(crate) mod testutil {
    use chrono::NaiveDate;

    use crate::models::Record;
    use crate::store::RecordStore;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        id: &str,
        name: Option<&str>,
        filed: Option<NaiveDate>,
        narrative: &str,
        classification: &str,
        status: &str,
        unit: Option<&str>,
        neighborhood: Option<&str>,
    ) -> Record {
        let mut r = Record::new(id);
        r.requester_name = name.map(str::to_string);
        r.filed_date = filed;
        r.narrative_text = Some(narrative.to_string());
        r.classification = Some(classification.to_string());
        r.status = Some(status.to_string());
        r.responsible_unit = unit.map(str::to_string);
        r.neighborhood = neighborhood.map(str::to_string);
        r
    }

    /// Five records in load order; the last one is undated and nameless.
    pub fn sample_store() -> RecordStore {
        let records = vec![
            record(
                "2024-00451",
                Some("Ana María Gómez"),
                Some(date(2024, 1, 15)),
                "Reparación de la vía principal del barrio, hay huecos profundos",
                "Queja",
                "Resuelta",
                Some("Secretaría de Infraestructura"),
                Some("El Centro"),
            ),
            record(
                "2024-00452",
                Some("Carlos Pérez"),
                Some(date(2024, 2, 3)),
                "Solicitud de poda de árboles en el parque",
                "Petición",
                "Pendiente",
                Some("Secretaría de Ambiente"),
                Some("La Floresta"),
            ),
            record(
                "2024-00453",
                Some("Ana Lucía Torres"),
                Some(date(2024, 2, 20)),
                "Queja por ruido de establecimiento nocturno en la vía",
                "Queja",
                "En trámite",
                Some("Secretaría de Gobierno"),
                Some("El Centro"),
            ),
            record(
                "2023-00990",
                Some("Pedro Gómez"),
                Some(date(2023, 12, 28)),
                "Reclamo por cobro de alumbrado público",
                "Reclamo",
                "Resuelta",
                Some("Secretaría de Infraestructura"),
                None,
            ),
            record(
                "2024-00460",
                None,
                None,
                "Sugerencia para mejorar la señalización vial",
                "Sugerencia",
                "Pendiente",
                None,
                Some("San José"),
            ),
        ];
        RecordStore::build(1, records, None)
    }
}

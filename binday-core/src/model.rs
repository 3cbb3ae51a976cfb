//! Domain data structures for sources and fetched collection schedules.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Built-in council sources supported by the application.
pub enum Sources {
    /// Gateshead Council, UK.
    Gateshead,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for a data source known to binday.
pub struct SourceId(pub String);

impl SourceId {
    /// Build an identifier, normalizing to the lower-case slug used by the registry.
    #[must_use]
    pub fn new<S: AsRef<str>>(slug: S) -> Self {
        SourceId(slug.as_ref().trim().to_lowercase())
    }
}

impl fmt::Display for Sources {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slug = match self {
            Sources::Gateshead => "gateshead",
        };
        write!(formatter, "{slug}")
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<Sources> for SourceId {
    fn from(source: Sources) -> Self {
        SourceId(source.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Metadata describing a source and its human-friendly name.
pub struct SourceMeta {
    /// Unique identifier.
    pub id: SourceId,
    /// Display name of the council.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One upcoming pickup as printed by the source.
pub struct CollectionRecord {
    /// Day-of-month plus weekday name, e.g. "10 Thursday". Never carries a year.
    pub day_and_weekday: String,
    /// Full month name taken from the enclosing month header, e.g. "April".
    pub month_name: String,
    /// Canonical waste label after normalization, e.g. "Household Waste".
    pub waste_type: String,
    /// Colour descriptor of the bin, or `"unknown"` for unmapped labels.
    pub display_colour: String,
    /// Absolute URL with more information about this collection type.
    pub detail_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Successful outcome of a schedule fetch.
pub struct FetchResult {
    /// Resolved address, e.g. "1 Test Street, AB1 2CD".
    pub address_text: String,
    /// Collections in document order. An empty list means nothing is scheduled.
    #[serde(rename = "schedule")]
    pub collections: Vec<CollectionRecord>,
}

impl FetchResult {
    /// Whether the source reported no upcoming collections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FetchResult {
        FetchResult {
            address_text: "1 Test Street, AB1 2CD".to_owned(),
            collections: vec![
                CollectionRecord {
                    day_and_weekday: "10 Thursday".to_owned(),
                    month_name: "April".to_owned(),
                    waste_type: "Household Waste".to_owned(),
                    display_colour: "green".to_owned(),
                    detail_link: Some("https://www.gateshead.gov.uk/household".to_owned()),
                },
                CollectionRecord {
                    day_and_weekday: "17 Thursday".to_owned(),
                    month_name: "April".to_owned(),
                    waste_type: "Mystery".to_owned(),
                    display_colour: "unknown".to_owned(),
                    detail_link: None,
                },
            ],
        }
    }

    #[test]
    fn fetch_result_uses_schedule_key() {
        let value = serde_json::to_value(sample()).expect("serializes");
        assert!(value.get("schedule").is_some_and(serde_json::Value::is_array));
        assert_eq!(value["address_text"], "1 Test Street, AB1 2CD");
        assert!(value.get("collections").is_none());
    }

    #[test]
    fn fetch_result_survives_json_round_trip() {
        let original = sample();
        let json = serde_json::to_string(&original).expect("serializes");
        let decoded: FetchResult = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(decoded, original);
    }

    #[test]
    fn source_ids_are_lower_case_slugs() {
        assert_eq!(SourceId::new(" Gateshead "), SourceId::from(Sources::Gateshead));
    }
}

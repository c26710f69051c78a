//! Locating the result array inside a raw envelope and mapping records.
//!
//! Lookup order: `data` as an array, `data.<plural>`, then a bare top-level
//! array and a top-level `<plural>` field for older backends.

use cardsearch_core::autofill::first_text;
use cardsearch_core::{EntityType, SearchResult};
use serde_json::Value;

pub const UNKNOWN_NAME: &str = "Unknown";

pub fn locate_records(envelope: &Value, entity: EntityType) -> Option<&Vec<Value>> {
    let plural = entity.plural();
    let data = envelope.get("data");
    data.and_then(Value::as_array)
        .or_else(|| data.and_then(|d| d.get(plural)).and_then(Value::as_array))
        .or_else(|| envelope.as_array())
        .or_else(|| envelope.get(plural).and_then(Value::as_array))
}

/// Ordered display-name candidates per entity type.
pub fn display_fields(entity: EntityType) -> &'static [&'static str] {
    match entity {
        EntityType::Set => &["setName", "name"],
        EntityType::SetProduct => &["productName", "setProductName", "name"],
        EntityType::Card => &["cardName", "name"],
        EntityType::Product => &["productName", "name"],
    }
}

/// Map one raw record. `None` when the record carries no usable id.
pub fn normalize_record(entity: EntityType, record: &Value) -> Option<SearchResult> {
    let id = first_text(record, &["_id", "id"])?;
    let display_name = first_text(record, display_fields(entity)).unwrap_or_else(|| UNKNOWN_NAME.to_string());
    Some(SearchResult { id, display_name, kind: entity, data: record.clone() })
}

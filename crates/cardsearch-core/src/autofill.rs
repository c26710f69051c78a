//! Conventional field extraction from a result's raw `data` payload.
//!
//! Backends disagree on field names, so every accessor walks a short list of
//! candidates and returns `None` rather than failing when nothing matches.

use serde::Serialize;
use serde_json::Value;

use crate::types::{EntityType, SearchResult};

/// Dependent form fields that a selection can populate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutofillFields {
    pub set_name: Option<String>,
    pub year: Option<String>,
    pub card_number: Option<String>,
    pub variety: Option<String>,
    pub category: Option<String>,
}

impl AutofillFields {
    pub fn from_result(result: &SearchResult) -> Self {
        let data = &result.data;
        let set_name = first_text(data, &["setName"])
            .or_else(|| data.get("set").and_then(|s| first_text(s, &["setName", "name"])))
            .or_else(|| (result.kind == EntityType::Set).then(|| first_text(data, &["name"])).flatten());
        Self {
            set_name,
            year: first_text(data, &["year", "releaseYear"]),
            card_number: first_text(data, &["cardNumber", "number"]),
            variety: first_text(data, &["variety"]),
            category: first_text(data, &["category", "productType"]),
        }
    }

    /// Fill gaps in `self` from `other` (child fields win, parent fills blanks).
    pub fn or(self, other: Self) -> Self {
        Self {
            set_name: self.set_name.or(other.set_name),
            year: self.year.or(other.year),
            card_number: self.card_number.or(other.card_number),
            variety: self.variety.or(other.variety),
            category: self.category.or(other.category),
        }
    }

    pub fn is_empty(&self) -> bool { *self == Self::default() }
}

/// First candidate field holding a non-empty string or a number.
pub fn first_text(data: &Value, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|name| match data.get(*name)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(kind: EntityType, data: Value) -> SearchResult {
        SearchResult { id: "x".into(), display_name: "X".into(), kind, data }
    }

    #[test]
    fn card_fields_tolerate_missing_and_numeric_values() {
        let r = result(EntityType::Card, json!({"cardName": "Charizard", "number": 4, "set": {"name": "Base Set"}, "year": 1999}));
        let f = AutofillFields::from_result(&r);
        assert_eq!(f.set_name.as_deref(), Some("Base Set"));
        assert_eq!(f.card_number.as_deref(), Some("4"));
        assert_eq!(f.year.as_deref(), Some("1999"));
        assert_eq!(f.variety, None);
    }

    #[test]
    fn set_record_uses_its_own_name() {
        let r = result(EntityType::Set, json!({"name": "Jungle", "releaseYear": "1999"}));
        let f = AutofillFields::from_result(&r);
        assert_eq!(f.set_name.as_deref(), Some("Jungle"));
        assert_eq!(f.year.as_deref(), Some("1999"));
    }

    #[test]
    fn or_prefers_self() {
        let child = AutofillFields { card_number: Some("4".into()), ..Default::default() };
        let parent = AutofillFields { set_name: Some("Base".into()), card_number: Some("9".into()), ..Default::default() };
        let merged = child.or(parent);
        assert_eq!(merged.card_number.as_deref(), Some("4"));
        assert_eq!(merged.set_name.as_deref(), Some("Base"));
        assert!(!merged.is_empty());
    }
}

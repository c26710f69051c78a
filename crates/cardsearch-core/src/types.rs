//! Domain types shared by executors, the cache and the search engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Key/value constraints forwarded to executors (e.g. `setId`).
///
/// Ordered so that the same filters always produce the same cache key.
pub type Filters = BTreeMap<String, String>;

/// The four searchable domains. The set is closed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum EntityType {
    Set,
    SetProduct,
    Card,
    Product,
}

impl EntityType {
    pub const ALL: [EntityType; 4] = [Self::Set, Self::SetProduct, Self::Card, Self::Product];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::SetProduct => "setProduct",
            Self::Card => "card",
            Self::Product => "product",
        }
    }

    /// Plural used both for endpoint paths and for nested envelope fields.
    pub fn plural(self) -> &'static str {
        match self {
            Self::Set => "sets",
            Self::SetProduct => "setProducts",
            Self::Card => "cards",
            Self::Product => "products",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for EntityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()) || t.plural().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidConfig(format!("unknown entity type '{s}'")))
    }
}

/// A normalized hit from any entity executor.
///
/// - `id`: unique within `kind`, not across kinds
/// - `display_name`: label used for ranking; never empty
/// - `kind`: the executor that produced it (serialized as `type`)
/// - `data`: the raw backend record, read by convention (see `autofill`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub kind: EntityType,
    pub data: serde_json::Value,
}

impl SearchResult {
    /// Identity across types: `(kind, id)`.
    pub fn key(&self) -> (EntityType, &str) { (self.kind, &self.id) }

    /// String view of a top-level field of the raw record, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(serde_json::Value::as_str)
    }
}

/// How a dispatch fans out and post-processes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    /// All scoped executors in parallel, concatenated, truncated.
    Basic,
    /// `Basic` behind the query cache.
    #[default]
    Optimized,
    /// Parent type until a parent is selected, then child type filtered by it.
    Hierarchical,
    /// `Basic` plus relevance ranking before truncation.
    Autocomplete,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Optimized => "optimized",
            Self::Hierarchical => "hierarchical",
            Self::Autocomplete => "autocomplete",
        }
    }

    pub fn uses_cache(self) -> bool { !matches!(self, Self::Basic) }

    pub fn ranks(self) -> bool { matches!(self, Self::Autocomplete | Self::Hierarchical) }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "optimized" => Ok(Self::Optimized),
            "hierarchical" => Ok(Self::Hierarchical),
            "autocomplete" => Ok(Self::Autocomplete),
            other => Err(Error::InvalidConfig(format!("unknown strategy '{other}'"))),
        }
    }
}

/// Parent→child pairing used by the hierarchical strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HierarchyMode {
    #[serde(rename = "set-card")]
    SetCard,
    #[serde(rename = "set-setProduct")]
    SetSetProduct,
    #[serde(rename = "setProduct-product")]
    SetProductProduct,
}

impl HierarchyMode {
    pub fn parent_type(self) -> EntityType {
        match self {
            Self::SetCard | Self::SetSetProduct => EntityType::Set,
            Self::SetProductProduct => EntityType::SetProduct,
        }
    }

    pub fn child_type(self) -> EntityType {
        match self {
            Self::SetCard => EntityType::Card,
            Self::SetSetProduct => EntityType::SetProduct,
            Self::SetProductProduct => EntityType::Product,
        }
    }

    /// Filter key carrying the parent id into child searches.
    pub fn parent_id_field(self) -> &'static str {
        match self.parent_type() {
            EntityType::SetProduct => "setProductId",
            _ => "setId",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SetCard => "set-card",
            Self::SetSetProduct => "set-setProduct",
            Self::SetProductProduct => "setProduct-product",
        }
    }
}

impl fmt::Display for HierarchyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for HierarchyMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::SetCard, Self::SetSetProduct, Self::SetProductProduct]
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidConfig(format!("unknown hierarchy mode '{s}'")))
    }
}

pub const DEFAULT_LIMIT: usize = 50;

/// What a single dispatch searches. `types` keeps caller priority order;
/// that order is the tie-break once results are ranked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeConfig {
    pub types: Vec<EntityType>,
    pub limit: usize,
    #[serde(default)]
    pub filters: Filters,
}

impl ScopeConfig {
    pub fn new(types: impl IntoIterator<Item = EntityType>) -> Self {
        let mut seen = Vec::new();
        for t in types { if !seen.contains(&t) { seen.push(t); } }
        Self { types: seen, limit: DEFAULT_LIMIT, filters: Filters::new() }
    }

    pub fn with_limit(mut self, limit: usize) -> Self { self.limit = limit; self }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }
}

impl Default for ScopeConfig {
    fn default() -> Self { Self::new(EntityType::ALL) }
}

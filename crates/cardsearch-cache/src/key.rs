use std::fmt;

use cardsearch_core::{EntityType, Filters, ScopeConfig, Strategy};

/// Canonical cache key. Entity types are sorted and deduplicated so scope
/// order never changes the key; the query is trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub query: String,
    pub types: Vec<EntityType>,
    pub strategy: Strategy,
    pub parent_id: Option<String>,
    pub filters: Filters,
}

impl CacheKey {
    pub fn new(
        query: &str,
        types: &[EntityType],
        strategy: Strategy,
        parent_id: Option<&str>,
        filters: &Filters,
    ) -> Self {
        let mut types = types.to_vec();
        types.sort_unstable();
        types.dedup();
        Self {
            query: query.trim().to_string(),
            types,
            strategy,
            parent_id: parent_id.map(str::to_string),
            filters: filters.clone(),
        }
    }

    pub fn for_scope(query: &str, scope: &ScopeConfig, strategy: Strategy, parent_id: Option<&str>) -> Self {
        Self::new(query, &scope.types, strategy, parent_id, &scope.filters)
    }

    pub fn covers(&self, entity: EntityType) -> bool { self.types.contains(&entity) }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types: Vec<&str> = self.types.iter().map(|t| t.as_str()).collect();
        write!(f, "{}:{}:[{}]", self.strategy, self.query, types.join(","))?;
        if let Some(p) = &self.parent_id { write!(f, "@{p}")?; }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::{BuildHasher, BuildHasherDefault};
    use twox_hash::XxHash64;

    #[test]
    fn type_order_does_not_change_key_or_hash() {
        let a = CacheKey::new("char", &[EntityType::Card, EntityType::Set], Strategy::Optimized, None, &Filters::new());
        let b = CacheKey::new(" char ", &[EntityType::Set, EntityType::Card, EntityType::Set], Strategy::Optimized, None, &Filters::new());
        assert_eq!(a, b);
        let build = BuildHasherDefault::<XxHash64>::default();
        assert_eq!(build.hash_one(&a), build.hash_one(&b));
    }

    #[test]
    fn parent_and_strategy_separate_keys() {
        let base = CacheKey::new("char", &[EntityType::Card], Strategy::Hierarchical, Some("S1"), &Filters::new());
        let other_parent = CacheKey::new("char", &[EntityType::Card], Strategy::Hierarchical, Some("S2"), &Filters::new());
        let other_strategy = CacheKey::new("char", &[EntityType::Card], Strategy::Autocomplete, Some("S1"), &Filters::new());
        assert_ne!(base, other_parent);
        assert_ne!(base, other_strategy);
        assert_eq!(base.to_string(), "hierarchical:char:[card]@S1");
    }
}

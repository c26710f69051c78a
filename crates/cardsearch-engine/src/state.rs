use std::time::Duration;

use cardsearch_core::config::Settings;
use cardsearch_core::{EntityType, HierarchyMode, ScopeConfig, SearchResult, Strategy};
use serde::Serialize;

use crate::hierarchy::HierarchicalState;

/// Per-field search behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub strategy: Strategy,
    pub scope: ScopeConfig,
    pub min_length: usize,
    pub debounce: Duration,
    pub hierarchy: Option<HierarchyMode>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Optimized,
            scope: ScopeConfig::default(),
            min_length: 2,
            debounce: Duration::from_millis(300),
            hierarchy: None,
        }
    }
}

impl SessionConfig {
    pub fn new(strategy: Strategy, types: impl IntoIterator<Item = EntityType>) -> Self {
        Self { strategy, scope: ScopeConfig::new(types), ..Self::default() }
    }

    /// Autocomplete preset: ranked, one character, 150 ms.
    pub fn autocomplete(types: impl IntoIterator<Item = EntityType>) -> Self {
        Self { min_length: 1, debounce: Duration::from_millis(150), ..Self::new(Strategy::Autocomplete, types) }
    }

    pub fn hierarchical(mode: HierarchyMode) -> Self {
        Self {
            hierarchy: Some(mode),
            ..Self::new(Strategy::Hierarchical, [mode.parent_type(), mode.child_type()])
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let search = &settings.search;
        let (min_length, debounce_ms) = match search.strategy {
            Strategy::Autocomplete => (settings.autocomplete.min_length, settings.autocomplete.debounce_ms),
            _ => (search.min_length, search.debounce_ms),
        };
        Self {
            strategy: search.strategy,
            scope: ScopeConfig::new(search.types.iter().copied()).with_limit(search.limit),
            min_length,
            debounce: Duration::from_millis(debounce_ms),
            hierarchy: search.hierarchy,
        }
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self { self.min_length = min_length; self }

    pub fn with_debounce(mut self, debounce: Duration) -> Self { self.debounce = debounce; self }

    pub fn with_limit(mut self, limit: usize) -> Self { self.scope.limit = limit; self }
}

/// Raw and stabilized query text plus the length gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    pub raw: String,
    pub debounced: String,
    pub min_length: usize,
}

impl QueryState {
    pub fn new(min_length: usize) -> Self { Self { min_length, ..Self::default() } }

    /// No search runs below the minimum trimmed length, or on blank input.
    pub fn is_searchable(&self) -> bool {
        let trimmed = self.debounced.trim();
        !trimmed.is_empty() && trimmed.chars().count() >= self.min_length
    }

    pub fn clear(&mut self) {
        self.raw.clear();
        self.debounced.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchySnapshot {
    pub mode: HierarchyMode,
    pub parent_selected: Option<SearchResult>,
    pub child_results: Vec<SearchResult>,
}

impl From<&HierarchicalState> for HierarchySnapshot {
    fn from(h: &HierarchicalState) -> Self {
        Self { mode: h.mode(), parent_selected: h.parent().cloned(), child_results: h.children().to_vec() }
    }
}

/// What the UI renders. Published after every processed command.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub query: String,
    pub debounced_query: String,
    pub results: Vec<SearchResult>,
    pub loading: bool,
    pub error: Option<String>,
    pub hierarchy: Option<HierarchySnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", 0, false)]
    #[case("   ", 1, false)]
    #[case("a", 2, false)]
    #[case(" a ", 1, true)]
    #[case("ab", 2, true)]
    #[case("é", 2, false)]
    fn length_gate(#[case] debounced: &str, #[case] min: usize, #[case] searchable: bool) {
        let q = QueryState { raw: debounced.into(), debounced: debounced.into(), min_length: min };
        assert_eq!(q.is_searchable(), searchable);
    }

    #[test]
    fn autocomplete_settings_override_search_defaults() {
        let mut settings = Settings::default();
        settings.search.strategy = Strategy::Autocomplete;
        let config = SessionConfig::from_settings(&settings);
        assert_eq!(config.min_length, 1);
        assert_eq!(config.debounce, Duration::from_millis(150));
        assert_eq!(config.scope.limit, 50);
    }

    #[test]
    fn hierarchical_preset_scopes_both_levels() {
        let config = SessionConfig::hierarchical(HierarchyMode::SetCard);
        assert_eq!(config.strategy, Strategy::Hierarchical);
        assert_eq!(config.scope.types, vec![EntityType::Set, EntityType::Card]);
        assert_eq!(config.min_length, 2);
    }
}

//! Strategy dispatch: resolve the scope, consult the cache, fan out to the
//! executors concurrently and post-process the merged results.

use std::collections::HashMap;
use std::sync::Arc;

use cardsearch_cache::{CacheKey, QueryCache};
use cardsearch_core::traits::SearchApi;
use cardsearch_core::{EntityType, Error, ScopeConfig, Strategy};
use cardsearch_exec::EntityExecutor;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::aggregate::Aggregate;
use crate::hierarchy::HierarchicalState;
use crate::rank::rank_owned;

/// The concrete work a dispatch will do once strategy and hierarchy are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSearch {
    pub strategy: Strategy,
    pub query: String,
    pub scope: ScopeConfig,
    pub parent_id: Option<String>,
}

impl ResolvedSearch {
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::for_scope(&self.query, &self.scope, self.strategy, self.parent_id.as_deref())
    }
}

pub struct Dispatcher {
    executors: HashMap<EntityType, EntityExecutor>,
    cache: QueryCache<Aggregate>,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn SearchApi>) -> Self { Self::with_cache(api, QueryCache::default()) }

    pub fn with_cache(api: Arc<dyn SearchApi>, cache: QueryCache<Aggregate>) -> Self {
        Self::from_executors(EntityExecutor::all(api), cache)
    }

    pub fn from_executors(executors: Vec<EntityExecutor>, cache: QueryCache<Aggregate>) -> Self {
        Self { executors: executors.into_iter().map(|e| (e.entity(), e)).collect(), cache }
    }

    pub fn cache(&self) -> &QueryCache<Aggregate> { &self.cache }

    /// Apply the strategy's scoping rules. Hierarchical dispatch narrows to the
    /// parent type, or to the child type filtered by the selected parent.
    pub fn resolve(
        &self,
        strategy: Strategy,
        query: &str,
        scope: &ScopeConfig,
        hierarchy: Option<&HierarchicalState>,
    ) -> ResolvedSearch {
        let mut scope = scope.clone();
        let mut parent_id = None;
        if strategy == Strategy::Hierarchical {
            match hierarchy {
                Some(h) => match h.parent() {
                    None => scope.types = vec![h.mode().parent_type()],
                    Some(parent) => {
                        scope.types = vec![h.mode().child_type()];
                        scope.filters.insert(h.mode().parent_id_field().to_string(), parent.id.clone());
                        parent_id = Some(parent.id.clone());
                    }
                },
                None => {
                    warn!("hierarchical dispatch without hierarchy state; nothing to search");
                    scope.types.clear();
                }
            }
        }
        ResolvedSearch { strategy, query: query.trim().to_string(), scope, parent_id }
    }

    pub async fn dispatch(
        &self,
        strategy: Strategy,
        query: &str,
        scope: &ScopeConfig,
        hierarchy: Option<&HierarchicalState>,
    ) -> Arc<Aggregate> {
        self.run(self.resolve(strategy, query, scope, hierarchy), false).await
    }

    /// Dispatch a resolved search. `force` skips cached entries but still
    /// stores the fresh outcome.
    pub async fn run(&self, search: ResolvedSearch, force: bool) -> Arc<Aggregate> {
        if search.scope.types.is_empty() {
            debug!(query = %search.query, "empty scope; skipping dispatch");
            return Arc::new(Aggregate::default());
        }
        let fetch = self.fan_out(&search);
        let merged = if !search.strategy.uses_cache() {
            Arc::new(fetch.await)
        } else if force {
            self.cache.refresh(search.cache_key(), fetch).await
        } else {
            self.cache.get_or_fetch(search.cache_key(), move || fetch).await
        };
        Arc::new(shape(&search, &merged))
    }

    pub fn invalidate(&self, search: &ResolvedSearch) -> bool { self.cache.invalidate(&search.cache_key()) }

    fn fan_out(&self, search: &ResolvedSearch) -> impl std::future::Future<Output = Aggregate> + Send + 'static {
        let planned: Vec<(EntityType, Option<EntityExecutor>)> =
            search.scope.types.iter().map(|t| (*t, self.executors.get(t).cloned())).collect();
        let ResolvedSearch { strategy, query, scope, .. } = search.clone();
        async move {
            debug!(%strategy, %query, types = ?scope.types, "dispatching");
            let calls = planned.into_iter().map(|(entity, executor)| {
                let query = query.clone();
                let filters = scope.filters.clone();
                async move {
                    let outcome = match executor {
                        Some(exec) => exec.search(&query, &filters).await,
                        None => Err(Error::InvalidConfig(format!("no executor registered for {entity}"))),
                    };
                    (entity, outcome)
                }
            });
            Aggregate::merge(join_all(calls).await)
        }
    }
}

/// Per-caller view of a merged aggregate. The cache holds the full merge,
/// so scope order, ranking and the limit are applied on every dispatch.
fn shape(search: &ResolvedSearch, merged: &Aggregate) -> Aggregate {
    let mut aggregate = merged.clone();
    let priority = |kind: EntityType| search.scope.types.iter().position(|t| *t == kind).unwrap_or(usize::MAX);
    aggregate.results.sort_by_key(|r| priority(r.kind));
    if search.strategy.ranks() {
        aggregate.results = rank_owned(aggregate.results, &search.query);
    }
    aggregate.truncate(search.scope.limit);
    aggregate
}

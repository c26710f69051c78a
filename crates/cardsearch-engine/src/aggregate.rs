use cardsearch_cache::Cacheable;
use cardsearch_core::{EntityType, Result, SearchResult};
use cardsearch_exec::ExecutorFailure;
use tracing::warn;

/// Merged outcome of one dispatch.
///
/// `results` follow scope order (then ranking, when the strategy ranks).
/// `failures` lists executors that errored; their siblings' results remain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    pub results: Vec<SearchResult>,
    pub failures: Vec<ExecutorFailure>,
    pub queried: Vec<EntityType>,
}

impl Aggregate {
    /// Merge per-executor outcomes, given in scope order.
    pub fn merge(parts: Vec<(EntityType, Result<Vec<SearchResult>>)>) -> Self {
        let mut merged = Self::default();
        for (entity, outcome) in parts {
            merged.queried.push(entity);
            match outcome {
                Ok(results) => merged.results.extend(results),
                Err(e) => {
                    warn!(%entity, error = %e, "executor failed");
                    merged.failures.push(ExecutorFailure::new(entity, &e));
                }
            }
        }
        merged
    }

    pub fn truncate(&mut self, limit: usize) { self.results.truncate(limit); }

    pub fn is_total_failure(&self) -> bool { !self.failures.is_empty() && self.failures.len() == self.queried.len() }

    pub fn is_partial_failure(&self) -> bool { !self.failures.is_empty() && !self.is_total_failure() }

    /// Message for the UI: the first failure reason, marked when partial.
    pub fn error(&self) -> Option<String> {
        let first = self.failures.first()?;
        if self.is_total_failure() {
            Some(first.message.clone())
        } else {
            Some(format!("some searches failed ({} of {}): {}", self.failures.len(), self.queried.len(), first.message))
        }
    }
}

impl Cacheable for Aggregate {
    fn cacheable(&self) -> bool { self.failures.is_empty() }
}

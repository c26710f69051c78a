use std::fmt;
use std::sync::Arc;

use cardsearch_core::traits::SearchApi;
use cardsearch_core::{EntityType, Error, Filters, Result, SearchResult};
use tracing::{debug, warn};

use crate::envelope::{locate_records, normalize_record};

/// Searches a single entity type. One network request per call, no retries.
#[derive(Clone)]
pub struct EntityExecutor {
    entity: EntityType,
    api: Arc<dyn SearchApi>,
}

impl EntityExecutor {
    pub fn new(entity: EntityType, api: Arc<dyn SearchApi>) -> Self { Self { entity, api } }

    /// One executor per entity type, all sharing `api`.
    pub fn all(api: Arc<dyn SearchApi>) -> Vec<Self> {
        EntityType::ALL.into_iter().map(|t| Self::new(t, api.clone())).collect()
    }

    pub fn entity(&self) -> EntityType { self.entity }

    pub async fn search(&self, query: &str, filters: &Filters) -> Result<Vec<SearchResult>> {
        let envelope = self.api.search(self.entity, query, filters).await?;
        let records = locate_records(&envelope, self.entity).ok_or_else(|| Error::Decode {
            entity: self.entity,
            message: format!("no result array under data or data.{}", self.entity.plural()),
        })?;
        let mut results = Vec::with_capacity(records.len());
        for record in records {
            match normalize_record(self.entity, record) {
                Some(r) => results.push(r),
                None => warn!(entity = %self.entity, "skipping record without _id/id"),
            }
        }
        debug!(entity = %self.entity, query, hits = results.len(), "executor finished");
        Ok(results)
    }
}

impl fmt::Debug for EntityExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityExecutor").field("entity", &self.entity).finish_non_exhaustive()
    }
}

/// A failed executor, kept as a value so siblings are unaffected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorFailure {
    pub entity: EntityType,
    pub message: String,
}

impl ExecutorFailure {
    pub fn new(entity: EntityType, err: &Error) -> Self { Self { entity, message: err.to_string() } }
}

impl fmt::Display for ExecutorFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.message) }
}

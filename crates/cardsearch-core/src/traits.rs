use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::{EntityType, Filters};

/// Entity search endpoints the engine consumes but does not implement.
///
/// Every call returns the raw JSON envelope; its shape differs by entity and
/// backend version, so callers must locate the result array themselves.
#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn search_sets(&self, query: &str, filters: &Filters) -> Result<Value>;
    async fn search_set_products(&self, query: &str, filters: &Filters) -> Result<Value>;
    async fn search_cards(&self, query: &str, filters: &Filters) -> Result<Value>;
    async fn search_products(&self, query: &str, filters: &Filters) -> Result<Value>;

    async fn search(&self, entity: EntityType, query: &str, filters: &Filters) -> Result<Value> {
        match entity {
            EntityType::Set => self.search_sets(query, filters).await,
            EntityType::SetProduct => self.search_set_products(query, filters).await,
            EntityType::Card => self.search_cards(query, filters).await,
            EntityType::Product => self.search_products(query, filters).await,
        }
    }
}

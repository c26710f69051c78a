//! reqwest-backed [`SearchApi`]: `GET {base}/api/search/{plural}?query=..&<filters>`.

use std::time::Duration;

use async_trait::async_trait;
use cardsearch_core::config::ApiSettings;
use cardsearch_core::traits::SearchApi;
use cardsearch_core::{EntityType, Error, Filters, Result};
use serde_json::Value;
use tracing::debug;

pub struct HttpSearchApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSearchApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_millis(ApiSettings::default().timeout_ms))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::builder().timeout(timeout).build().unwrap_or_default(),
        }
    }

    pub fn from_settings(api: &ApiSettings) -> Self {
        Self::with_timeout(api.base_url.clone(), Duration::from_millis(api.timeout_ms))
    }

    pub fn endpoint(&self, entity: EntityType) -> String {
        format!("{}/api/search/{}", self.base_url, entity.plural())
    }

    async fn fetch(&self, entity: EntityType, query: &str, filters: &Filters) -> Result<Value> {
        let url = self.endpoint(entity);
        debug!(%url, query, ?filters, "GET");
        let response = self
            .client
            .get(&url)
            .query(&[("query", query)])
            .query(filters)
            .send()
            .await
            .map_err(|e| Error::Network { entity, message: e.to_string() })?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status { entity, status: status.as_u16() });
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| Error::Decode { entity, message: e.to_string() })
    }
}

#[async_trait]
impl SearchApi for HttpSearchApi {
    async fn search_sets(&self, query: &str, filters: &Filters) -> Result<Value> {
        self.fetch(EntityType::Set, query, filters).await
    }

    async fn search_set_products(&self, query: &str, filters: &Filters) -> Result<Value> {
        self.fetch(EntityType::SetProduct, query, filters).await
    }

    async fn search_cards(&self, query: &str, filters: &Filters) -> Result<Value> {
        self.fetch(EntityType::Card, query, filters).await
    }

    async fn search_products(&self, query: &str, filters: &Filters) -> Result<Value> {
        self.fetch(EntityType::Product, query, filters).await
    }
}

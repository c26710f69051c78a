#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use cardsearch_core::traits::SearchApi;
use cardsearch_core::{EntityType, Error, Filters, Result, SearchResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub entity: EntityType,
    pub query: String,
    pub filters: Filters,
}

enum Reply {
    Records(Vec<Value>),
    Fail(u16),
}

/// In-memory backend. Records every call, answers per entity type with the
/// envelope shape that entity's real endpoint uses, and can delay or fail.
#[derive(Default)]
pub struct FakeApi {
    replies: Mutex<HashMap<EntityType, Reply>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    pub fn reply(self: &Arc<Self>, entity: EntityType, records: Vec<Value>) -> Arc<Self> {
        self.replies.lock().unwrap().insert(entity, Reply::Records(records));
        self.clone()
    }

    pub fn fail(self: &Arc<Self>, entity: EntityType, status: u16) -> Arc<Self> {
        self.replies.lock().unwrap().insert(entity, Reply::Fail(status));
        self.clone()
    }

    /// Delay responses to `query` by `delay`.
    pub fn delay(self: &Arc<Self>, query: &str, delay: Duration) -> Arc<Self> {
        self.delays.lock().unwrap().insert(query.to_string(), delay);
        self.clone()
    }

    pub fn calls(&self) -> Vec<Call> { self.calls.lock().unwrap().clone() }

    pub fn call_count(&self) -> usize { self.calls.lock().unwrap().len() }

    pub fn queries(&self) -> Vec<String> { self.calls().into_iter().map(|c| c.query).collect() }

    async fn answer(&self, entity: EntityType, query: &str, filters: &Filters) -> Result<Value> {
        self.calls.lock().unwrap().push(Call { entity, query: query.to_string(), filters: filters.clone() });
        let delay = self.delays.lock().unwrap().get(query).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let records = match self.replies.lock().unwrap().get(&entity) {
            None => Vec::new(),
            Some(Reply::Fail(status)) => return Err(Error::Status { entity, status: *status }),
            Some(Reply::Records(records)) => records
                .iter()
                .filter(|r| matches_filters(r, filters))
                .map(|r| tag_query(r, query))
                .collect(),
        };
        Ok(match entity {
            EntityType::Set => json!({"success": true, "data": records}),
            EntityType::SetProduct => json!({"data": {"setProducts": records}}),
            EntityType::Card => json!({"data": {"cards": records, "total": 0}}),
            EntityType::Product => json!({"products": records}),
        })
    }
}

fn matches_filters(record: &Value, filters: &Filters) -> bool {
    filters.iter().all(|(k, v)| record.get(k).and_then(Value::as_str) == Some(v.as_str()))
}

/// Stamp the query into the record so tests can tell responses apart.
fn tag_query(record: &Value, query: &str) -> Value {
    let mut record = record.clone();
    if let Some(obj) = record.as_object_mut() {
        obj.insert("matchedQuery".into(), Value::String(query.to_string()));
    }
    record
}

#[async_trait]
impl SearchApi for FakeApi {
    async fn search_sets(&self, q: &str, f: &Filters) -> Result<Value> { self.answer(EntityType::Set, q, f).await }
    async fn search_set_products(&self, q: &str, f: &Filters) -> Result<Value> { self.answer(EntityType::SetProduct, q, f).await }
    async fn search_cards(&self, q: &str, f: &Filters) -> Result<Value> { self.answer(EntityType::Card, q, f).await }
    async fn search_products(&self, q: &str, f: &Filters) -> Result<Value> { self.answer(EntityType::Product, q, f).await }
}

pub fn set_record(id: &str, name: &str) -> Value { json!({"_id": id, "setName": name, "year": 1999}) }

pub fn card_record(id: &str, name: &str, set_id: &str) -> Value {
    json!({"_id": id, "cardName": name, "setId": set_id, "cardNumber": "4"})
}

pub fn names(results: &[SearchResult]) -> Vec<&str> { results.iter().map(|r| r.display_name.as_str()).collect() }

//! cardsearch-exec
//!
//! Entity search executors: one per entity type, each issuing a single call
//! through a [`SearchApi`](cardsearch_core::traits::SearchApi) and normalizing
//! whatever envelope comes back into [`SearchResult`](cardsearch_core::SearchResult)s.
//! `http` holds the reqwest-backed collaborator used outside of tests.

pub mod envelope;
pub mod executor;
pub mod http;

pub use envelope::{locate_records, normalize_record};
pub use executor::{EntityExecutor, ExecutorFailure};
pub use http::HttpSearchApi;

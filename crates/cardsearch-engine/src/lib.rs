//! cardsearch-engine
//!
//! Debounced, cache-backed, hierarchical search over the four entity types.
//! `Dispatcher` fans a query out to the executors; `SessionHandle` drives one
//! search field (query state, stale-response discarding, parent/child
//! selection) from a single tokio task.

pub mod aggregate;
pub mod dispatcher;
pub mod hierarchy;
pub mod rank;
pub mod schedule;
pub mod session;
pub mod state;

pub use aggregate::Aggregate;
pub use dispatcher::{Dispatcher, ResolvedSearch};
pub use hierarchy::{Autofill, HierarchicalState, Phase};
pub use rank::{rank, score};
pub use schedule::{Debouncer, ManualScheduler, ScheduleHandle, Scheduler, TokioScheduler};
pub use session::{SessionCallbacks, SessionHandle};
pub use state::{HierarchySnapshot, QueryState, SessionConfig, SessionSnapshot};

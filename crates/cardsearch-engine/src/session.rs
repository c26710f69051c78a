//! One search field driven by a single tokio task.
//!
//! UI calls become `Command`s on an unbounded channel; the task owns all
//! state and publishes a `SessionSnapshot` through a `watch` channel after
//! each command. Every raw-query change bumps `ticket` so late debounce
//! emissions are ignored, and every search bumps `generation` so responses
//! that were superseded while in flight are dropped.

use std::sync::Arc;

use cardsearch_core::{Error, Result, SearchResult};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::aggregate::Aggregate;
use crate::dispatcher::{Dispatcher, ResolvedSearch};
use crate::hierarchy::{Autofill, HierarchicalState};
use crate::schedule::{Debouncer, Scheduler, TokioScheduler};
use crate::state::{HierarchySnapshot, QueryState, SessionConfig, SessionSnapshot};

type SelectFn = Arc<dyn Fn(&SearchResult) + Send + Sync>;
type AutofillFn = Arc<dyn Fn(&Autofill) + Send + Sync>;

/// Hooks fired from the session task on selection.
#[derive(Clone, Default)]
pub struct SessionCallbacks {
    on_select: Option<SelectFn>,
    on_autofill: Option<AutofillFn>,
}

impl SessionCallbacks {
    /// Fired for selections that do not belong to the session's hierarchy
    /// levels (every selection when the session has none).
    pub fn on_select(mut self, f: impl Fn(&SearchResult) + Send + Sync + 'static) -> Self {
        self.on_select = Some(Arc::new(f));
        self
    }

    pub fn on_autofill(mut self, f: impl Fn(&Autofill) + Send + Sync + 'static) -> Self {
        self.on_autofill = Some(Arc::new(f));
        self
    }
}

impl std::fmt::Debug for SessionCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCallbacks")
            .field("on_select", &self.on_select.is_some())
            .field("on_autofill", &self.on_autofill.is_some())
            .finish()
    }
}

enum Command {
    SetQuery(String),
    ClearQuery,
    Refetch,
    Select(SearchResult),
    ClearResults,
    SetParent(Option<SearchResult>),
    Reset,
    Debounced { ticket: u64, value: String },
    Completed { generation: u64, outcome: Arc<Aggregate> },
    Shutdown,
}

struct Session {
    config: SessionConfig,
    dispatcher: Arc<Dispatcher>,
    callbacks: SessionCallbacks,
    query: QueryState,
    results: Vec<SearchResult>,
    loading: bool,
    error: Option<String>,
    hierarchy: Option<HierarchicalState>,
    debouncer: Debouncer<(u64, String)>,
    ticket: u64,
    generation: u64,
    last_search: Option<ResolvedSearch>,
    commands: mpsc::WeakUnboundedSender<Command>,
    snapshot: watch::Sender<SessionSnapshot>,
}

impl Session {
    fn handle(&mut self, command: Command) {
        match command {
            Command::SetQuery(raw) => self.set_query(raw),
            Command::ClearQuery => self.clear_query(),
            Command::Refetch => self.search(true),
            Command::Select(result) => self.select(result),
            Command::ClearResults => self.clear_results(),
            Command::SetParent(Some(parent)) => self.select_parent(parent),
            Command::SetParent(None) | Command::Reset => self.reset(),
            Command::Debounced { ticket, value } => {
                if ticket != self.ticket {
                    debug!(ticket, current = self.ticket, "ignoring superseded debounce emission");
                    return;
                }
                self.query.debounced = value;
                self.search(false);
            }
            Command::Completed { generation, outcome } => self.complete(generation, &outcome),
            Command::Shutdown => {}
        }
    }

    fn set_query(&mut self, raw: String) {
        if raw == self.query.raw {
            return;
        }
        self.ticket += 1;
        self.query.raw = raw.clone();
        if raw.is_empty() {
            self.debouncer.flush((self.ticket, raw));
        } else {
            self.debouncer.update((self.ticket, raw));
        }
    }

    fn clear_query(&mut self) {
        self.debouncer.cancel();
        self.ticket += 1;
        self.generation += 1;
        self.query.clear();
        self.clear_outcome();
    }

    fn clear_outcome(&mut self) {
        self.results.clear();
        self.loading = false;
        self.error = None;
    }

    fn search(&mut self, force: bool) {
        self.generation += 1;
        if !self.query.is_searchable() {
            self.last_search = None;
            self.clear_outcome();
            return;
        }
        let resolved = self.dispatcher.resolve(
            self.config.strategy,
            &self.query.debounced,
            &self.config.scope,
            self.hierarchy.as_ref(),
        );
        self.loading = true;
        self.error = None;
        self.last_search = Some(resolved.clone());

        let generation = self.generation;
        let dispatcher = self.dispatcher.clone();
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let outcome = dispatcher.run(resolved, force).await;
            if let Some(tx) = commands.upgrade() {
                let _ = tx.send(Command::Completed { generation, outcome });
            }
        });
    }

    fn complete(&mut self, generation: u64, outcome: &Aggregate) {
        if generation != self.generation {
            debug!(generation, current = self.generation, "discarding stale response");
            return;
        }
        self.loading = false;
        self.results = outcome.results.clone();
        self.error = outcome.error();
    }

    fn clear_results(&mut self) {
        if let Some(search) = self.last_search.take() {
            self.dispatcher.invalidate(&search);
        }
        self.generation += 1;
        self.clear_outcome();
    }

    /// Hierarchy levels go to the state machine; anything else is a plain selection.
    fn select(&mut self, result: SearchResult) {
        match self.hierarchy.as_ref().map(HierarchicalState::mode) {
            Some(mode) if result.kind == mode.parent_type() => self.select_parent(result),
            Some(mode) if result.kind == mode.child_type() => self.select_child(result),
            _ => {
                if let Some(on_select) = &self.callbacks.on_select {
                    on_select(&result);
                }
            }
        }
    }

    fn select_parent(&mut self, parent: SearchResult) {
        let Some(hierarchy) = self.hierarchy.as_mut() else {
            warn!(id = %parent.id, "parent selected on a session without hierarchy; ignoring");
            return;
        };
        info!(mode = %hierarchy.mode().as_str(), parent = %parent.id, "parent selected");
        let autofill = hierarchy.select_parent(parent);
        self.clear_query();
        self.autofill(&autofill);
    }

    fn select_child(&mut self, child: SearchResult) {
        let Some(hierarchy) = self.hierarchy.as_mut() else { return };
        match hierarchy.select_child(child) {
            Ok(autofill) => self.autofill(&autofill),
            Err(e) => warn!(error = %e, "child selection ignored"),
        }
    }

    fn autofill(&self, autofill: &Autofill) {
        if let Some(on_autofill) = &self.callbacks.on_autofill {
            on_autofill(autofill);
        }
    }

    fn reset(&mut self) {
        if let Some(hierarchy) = self.hierarchy.as_mut() {
            hierarchy.reset();
        }
        self.last_search = None;
        self.clear_query();
    }

    fn view(&self) -> SessionSnapshot {
        SessionSnapshot {
            query: self.query.raw.clone(),
            debounced_query: self.query.debounced.clone(),
            results: self.results.clone(),
            loading: self.loading,
            error: self.error.clone(),
            hierarchy: self.hierarchy.as_ref().map(HierarchySnapshot::from),
        }
    }

    fn publish(&self) {
        let next = self.view();
        self.snapshot.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

/// Cloneable front end for a running session. Commands are fire-and-forget;
/// outcomes show up in the snapshot.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Start a session on the tokio timer.
    pub fn new(config: SessionConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self::spawn(config, dispatcher, Arc::new(TokioScheduler), SessionCallbacks::default())
    }

    /// Start a session task. Must be called within a tokio runtime.
    pub fn spawn(
        config: SessionConfig,
        dispatcher: Arc<Dispatcher>,
        scheduler: Arc<dyn Scheduler>,
        callbacks: SessionCallbacks,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let hierarchy = config.hierarchy.map(HierarchicalState::new);
        let initial = SessionSnapshot { hierarchy: hierarchy.as_ref().map(HierarchySnapshot::from), ..SessionSnapshot::default() };
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);

        let sink = tx.downgrade();
        let debouncer = Debouncer::new(scheduler, config.debounce, move |(ticket, value): (u64, String)| {
            if let Some(tx) = sink.upgrade() {
                let _ = tx.send(Command::Debounced { ticket, value });
            }
        });

        let mut session = Session {
            query: QueryState::new(config.min_length),
            config,
            dispatcher,
            callbacks,
            results: Vec::new(),
            loading: false,
            error: None,
            hierarchy,
            debouncer,
            ticket: 0,
            generation: 0,
            last_search: None,
            commands: tx.downgrade(),
            snapshot: snapshot_tx,
        };

        tokio::spawn(async move {
            info!(strategy = %session.config.strategy, types = ?session.config.scope.types, "search session started");
            while let Some(command) = rx.recv().await {
                if matches!(command, Command::Shutdown) {
                    break;
                }
                session.handle(command);
                session.publish();
            }
            session.debouncer.cancel();
            info!("search session stopped");
        });

        Self { commands: tx, snapshot: snapshot_rx }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("{}", Error::SessionClosed);
        }
    }

    pub fn set_query(&self, raw: impl Into<String>) { self.send(Command::SetQuery(raw.into())) }

    pub fn clear_query(&self) { self.send(Command::ClearQuery) }

    /// Re-run the current debounced query, bypassing and then overwriting the cache.
    pub fn refetch(&self) { self.send(Command::Refetch) }

    pub fn select_result(&self, result: SearchResult) { self.send(Command::Select(result)) }

    /// Drop the current results and their cache entry.
    pub fn clear_results(&self) { self.send(Command::ClearResults) }

    pub fn set_parent(&self, parent: Option<SearchResult>) { self.send(Command::SetParent(parent)) }

    pub fn reset(&self) { self.send(Command::Reset) }

    pub fn snapshot(&self) -> SessionSnapshot { self.snapshot.borrow().clone() }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> { self.snapshot.clone() }

    /// Wait until a published snapshot satisfies `pred`.
    pub async fn wait_for(&self, pred: impl FnMut(&SessionSnapshot) -> bool) -> Result<SessionSnapshot> {
        let mut rx = self.snapshot.clone();
        let snapshot = rx.wait_for(pred).await.map_err(|_| Error::SessionClosed)?;
        Ok(snapshot.clone())
    }

    /// Stop the session task and wait for it to exit. A pending debounce is
    /// cancelled without emitting.
    pub async fn shutdown(&self) {
        self.send(Command::Shutdown);
        self.commands.closed().await;
    }
}

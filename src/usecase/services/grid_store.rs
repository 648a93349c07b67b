//! Owns the grid's page state and fetched rows.
//!
//! Every fetch is tagged with the version of the page state it was issued
//! for. A completion is applied only while that version is still current and
//! the store has not been shut down; anything else is a stale completion and
//! is dropped. Refetch requests that arrive while a fetch for the current
//! version is in flight collapse into a single follow-up fetch. A fetch whose
//! caller is dropped mid-flight releases its in-flight slot, so later
//! refetches are not coalesced into a fetch that will never settle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::domain::entities::column::ColumnDescriptor;
use crate::domain::entities::page::PageState;
use crate::domain::entities::row::Row;
use crate::platform::desktop::blocking::run_blocking;
use crate::usecase::ports::table_source::{ChangeEvent, SourceError, TableSource};
use crate::usecase::services::column_projector::project;
use crate::usecase::services::query_translator::{to_count_descriptor, to_query_descriptor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Rows(SourceError),
    Unavailable(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Rows(err) => write!(f, "failed to load rows: {err}"),
            FetchError::Unavailable(message) => write!(f, "data source unavailable: {message}"),
        }
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// The page state moved on, or the store shut down, before completion.
    Discarded,
    /// Folded into the fetch already in flight for the same page state.
    Coalesced,
}

/// Read-only view handed to consumers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridSnapshot {
    pub page_state: PageState,
    pub rows: Vec<Row>,
    pub columns: Vec<ColumnDescriptor>,
    pub total: Option<u64>,
    pub loading: bool,
    pub phase: GridPhase,
    pub last_error: Option<FetchError>,
    pub version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlight {
    version: u64,
    ticket: u64,
}

#[derive(Default)]
struct StoreState {
    page_state: PageState,
    version: u64,
    rows: Vec<Row>,
    columns: Vec<ColumnDescriptor>,
    total: Option<u64>,
    phase: GridPhase,
    last_error: Option<FetchError>,
    /// Phase of the last settled fetch; restored when a fetch is cancelled.
    settled_phase: GridPhase,
    in_flight: Option<InFlight>,
    next_ticket: u64,
    refetch_pending: bool,
    torn_down: bool,
}

impl StoreState {
    fn begin_fetch(&mut self) -> u64 {
        self.next_ticket += 1;
        self.in_flight = Some(InFlight {
            version: self.version,
            ticket: self.next_ticket,
        });
        self.phase = GridPhase::Loading;
        self.next_ticket
    }

    fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            page_state: self.page_state.clone(),
            rows: self.rows.clone(),
            columns: self.columns.clone(),
            total: self.total,
            loading: self.in_flight.is_some(),
            phase: self.phase,
            last_error: self.last_error.clone(),
            version: self.version,
        }
    }
}

struct Shared {
    source: Arc<dyn TableSource>,
    table: String,
    known_columns: Vec<ColumnDescriptor>,
    state: Mutex<StoreState>,
    snapshots: watch::Sender<GridSnapshot>,
}

enum Settled {
    Done(Result<FetchOutcome, FetchError>),
    FollowUp,
}

#[derive(Clone)]
pub struct GridStore {
    shared: Arc<Shared>,
}

impl GridStore {
    pub fn new(
        source: Arc<dyn TableSource>,
        table: impl Into<String>,
        known_columns: Vec<ColumnDescriptor>,
    ) -> Self {
        Self::with_page_state(source, table, known_columns, PageState::default())
    }

    pub fn with_page_state(
        source: Arc<dyn TableSource>,
        table: impl Into<String>,
        known_columns: Vec<ColumnDescriptor>,
        page_state: PageState,
    ) -> Self {
        let state = StoreState {
            page_state,
            ..StoreState::default()
        };
        let (snapshots, _) = watch::channel(state.snapshot());
        Self {
            shared: Arc::new(Shared {
                source,
                table: table.into(),
                known_columns,
                state: Mutex::new(state),
                snapshots,
            }),
        }
    }

    pub fn table(&self) -> &str {
        &self.shared.table
    }

    pub fn known_columns(&self) -> &[ColumnDescriptor] {
        &self.shared.known_columns
    }

    pub fn snapshot(&self) -> GridSnapshot {
        self.lock().snapshot()
    }

    pub fn watch(&self) -> watch::Receiver<GridSnapshot> {
        self.shared.snapshots.subscribe()
    }

    /// Replaces the page state wholesale and fetches it.
    pub async fn set_page_state(&self, page_state: PageState) -> Result<FetchOutcome, FetchError> {
        let (version, ticket) = {
            let mut state = self.lock();
            if state.torn_down {
                return Ok(FetchOutcome::Discarded);
            }
            state.page_state = page_state;
            state.version += 1;
            state.refetch_pending = false;
            let ticket = state.begin_fetch();
            self.publish(&state);
            (state.version, ticket)
        };
        self.drive(version, ticket).await
    }

    /// Re-reads the current page state without changing it.
    pub async fn refetch(&self) -> Result<FetchOutcome, FetchError> {
        let (version, ticket) = {
            let mut state = self.lock();
            if state.torn_down {
                return Ok(FetchOutcome::Discarded);
            }
            if state.in_flight.map(|fetch| fetch.version) == Some(state.version) {
                state.refetch_pending = true;
                tracing::trace!(table = %self.shared.table, version = state.version, "refetch coalesced");
                return Ok(FetchOutcome::Coalesced);
            }
            let ticket = state.begin_fetch();
            self.publish(&state);
            (state.version, ticket)
        };
        self.drive(version, ticket).await
    }

    pub async fn on_external_change_notification(&self) -> Result<FetchOutcome, FetchError> {
        self.refetch().await
    }

    /// Forwards change events for this table into refetches until the
    /// returned subscription is cancelled.
    pub fn subscribe_to_changes(&self) -> ChangeSubscription {
        let receiver = self.shared.source.subscribe(&self.shared.table);
        let active = Arc::new(AtomicBool::new(true));
        let handle = tokio::spawn(listen(self.clone(), receiver, active.clone()));
        ChangeSubscription {
            active,
            handle: Some(handle),
        }
    }

    /// Teardown: results of fetches still in flight are no longer applied
    /// and no new fetch is issued.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        state.torn_down = true;
        state.in_flight = None;
        state.refetch_pending = false;
        self.publish(&state);
    }

    async fn drive(&self, version: u64, ticket: u64) -> Result<FetchOutcome, FetchError> {
        let _release = FetchGuard {
            store: self,
            ticket,
        };
        loop {
            let page_state = self.lock().page_state.clone();
            let (rows, total) = self.fetch(version, &page_state).await;
            match self.settle(version, rows, total) {
                Settled::Done(outcome) => return outcome,
                Settled::FollowUp => continue,
            }
        }
    }

    async fn fetch(
        &self,
        version: u64,
        page_state: &PageState,
    ) -> (Result<Vec<Row>, FetchError>, Result<u64, FetchError>) {
        let query = to_query_descriptor(&self.shared.table, page_state);
        let count = to_count_descriptor(&self.shared.table, page_state);
        let (first, last) = query.range();
        tracing::debug!(
            table = %self.shared.table,
            version,
            first,
            last,
            filtered = !query.filter.is_match_all(),
            "fetch issued"
        );
        let rows_source = self.shared.source.clone();
        let count_source = self.shared.source.clone();

        let (rows, total) = tokio::join!(
            run_blocking(move || rows_source.select(&query)),
            run_blocking(move || count_source.count(&count)),
        );

        let rows = match rows {
            Ok(result) => result.map_err(FetchError::Rows),
            Err(err) => Err(FetchError::Unavailable(err.to_string())),
        };
        let total = match total {
            Ok(result) => result.map_err(FetchError::Rows),
            Err(err) => Err(FetchError::Unavailable(err.to_string())),
        };
        (rows, total)
    }

    fn settle(
        &self,
        version: u64,
        rows: Result<Vec<Row>, FetchError>,
        total: Result<u64, FetchError>,
    ) -> Settled {
        let mut state = self.lock();
        if state.torn_down || state.version != version {
            tracing::trace!(table = %self.shared.table, version, current = state.version, "stale fetch discarded");
            return Settled::Done(Ok(FetchOutcome::Discarded));
        }

        let outcome = match rows {
            Ok(rows) => {
                state.total = match total {
                    Ok(total) => Some(total),
                    Err(err) => {
                        tracing::warn!(table = %self.shared.table, version, error = %err, "count fetch failed");
                        None
                    }
                };
                state.columns = project(rows.first(), &self.shared.known_columns);
                tracing::debug!(table = %self.shared.table, version, rows = rows.len(), total = ?state.total, "fetch applied");
                state.rows = rows;
                state.phase = GridPhase::Loaded;
                state.settled_phase = GridPhase::Loaded;
                state.last_error = None;
                Ok(FetchOutcome::Applied)
            }
            Err(err) => {
                tracing::error!(table = %self.shared.table, version, error = %err, "row fetch failed");
                state.phase = GridPhase::Error;
                state.settled_phase = GridPhase::Error;
                state.last_error = Some(err.clone());
                Err(err)
            }
        };

        if state.refetch_pending {
            state.refetch_pending = false;
            self.publish(&state);
            return Settled::FollowUp;
        }

        state.in_flight = None;
        self.publish(&state);
        Settled::Done(outcome)
    }

    fn publish(&self, state: &StoreState) {
        self.shared.snapshots.send_replace(state.snapshot());
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the in-flight slot if the fetch holding `ticket` is dropped before
/// it settles.
struct FetchGuard<'a> {
    store: &'a GridStore,
    ticket: u64,
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.store.lock();
        if state.in_flight.map(|fetch| fetch.ticket) != Some(self.ticket) {
            return;
        }
        tracing::debug!(table = %self.store.shared.table, ticket = self.ticket, "fetch cancelled");
        state.in_flight = None;
        state.refetch_pending = false;
        let settled = state.settled_phase;
        state.phase = settled;
        self.store.publish(&state);
    }
}

async fn listen(
    store: GridStore,
    mut receiver: broadcast::Receiver<ChangeEvent>,
    active: Arc<AtomicBool>,
) {
    loop {
        match receiver.recv().await {
            Ok(event) if event.table != store.shared.table => continue,
            Ok(event) => {
                tracing::trace!(table = %event.table, kind = ?event.kind, at = %event.at, "change notification");
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::trace!(table = %store.shared.table, skipped, "change feed lagged");
            }
            Err(RecvError::Closed) => break,
        }
        // Everything already queued is covered by the fetch below.
        while receiver.try_recv().is_ok() {}
        if !active.load(Ordering::Acquire) {
            break;
        }
        if let Err(err) = store.on_external_change_notification().await {
            tracing::debug!(table = %store.shared.table, error = %err, "notification refetch failed");
        }
    }
}

/// Registration on the remote change feed.
pub struct ChangeSubscription {
    active: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ChangeSubscription {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        self.active.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for ChangeSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

//! Dashboard state machine.
//!
//! Holds the add-form draft, the cached symbol list and one
//! `idle -> pending -> {success | error}` machine per action (add, delete,
//! send report). The state lock is never held across a backend call: an
//! action flips to `pending` under the lock, then a spawned task makes the
//! call and re-locks to record the outcome. A second click on a pending
//! action is a no-op, and a caller that goes away mid-call cannot leave the
//! action stuck in `pending`.

pub mod mutation;
pub mod query;
pub mod view;

use std::sync::Arc;

use chrono_tz::Tz;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::SymbolApi;
use crate::models::{normalize_code, ListedSymbol, ReportAck, StockSymbol, SymbolId};

pub use mutation::{ActionError, ActionStatus, MutationState, SkipReason};
pub use query::{QueryCache, QueryKey};
pub use view::{ActionView, ConfirmPrompt, Controls, DashboardView, ListStatus, SymbolRow};

#[derive(Debug, Default)]
struct DashboardState {
    cache: QueryCache<QueryKey, Vec<StockSymbol>>,
    draft: String,
    add: MutationState<StockSymbol>,
    delete: MutationState<SymbolId>,
    send: MutationState<ReportAck>,
    confirm: Option<StockSymbol>,
}

impl DashboardState {
    fn symbols(&self) -> &[StockSymbol] {
        self.cache
            .data(&QueryKey::Symbols)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn list_status(&self) -> (ListStatus, Option<String>) {
        match self.cache.get(&QueryKey::Symbols) {
            Some(entry) if entry.data.is_some() => (ListStatus::Loaded, entry.error.clone()),
            Some(entry) if entry.error.is_some() && !entry.fetching => {
                (ListStatus::Error, entry.error.clone())
            }
            _ => (ListStatus::Loading, None),
        }
    }
}

pub struct Dashboard {
    api: Arc<dyn SymbolApi>,
    timezone: Tz,
    state: Arc<Mutex<DashboardState>>,
    fetch_lock: Mutex<()>,
}

/// Wait for an action task. The task owns the backend call and the final
/// state transition, so dropping this future leaves both running.
async fn join<T>(task: JoinHandle<Result<T, ActionError>>) -> Result<T, ActionError> {
    task.await
        .map_err(|e| ActionError::Task(e.to_string()))?
}

impl Dashboard {
    pub fn new(api: Arc<dyn SymbolApi>, timezone: Tz) -> Self {
        Self {
            api,
            timezone,
            state: Arc::new(Mutex::new(DashboardState::default())),
            fetch_lock: Mutex::new(()),
        }
    }

    /// Cached list if fresh, otherwise one fetch shared by all concurrent
    /// callers. Returns the list as known after the fetch; a failed fetch
    /// leaves the previous snapshot in place.
    pub async fn symbols(&self) -> Vec<StockSymbol> {
        self.refresh().await;
        self.state.lock().await.symbols().to_vec()
    }

    /// Refetch the list when it is stale.
    pub async fn refresh(&self) {
        if self.state.lock().await.cache.is_fresh(&QueryKey::Symbols) {
            debug!("Symbol list cache hit");
            return;
        }

        let _fetching = self.fetch_lock.lock().await;
        let generation = {
            let mut state = self.state.lock().await;
            // Another caller may have completed the fetch while we waited.
            if state.cache.is_fresh(&QueryKey::Symbols) {
                return;
            }
            state.cache.begin_fetch(&QueryKey::Symbols)
        };

        let result = self.api.list_symbols().await;

        let mut state = self.state.lock().await;
        let result = match result {
            Ok(symbols) => {
                debug!("Fetched {} symbols", symbols.len());
                Ok(symbols)
            }
            Err(e) => {
                warn!("❌ Failed to load symbol list: {}", e);
                Err(e.user_message())
            }
        };
        state.cache.store(&QueryKey::Symbols, generation, result);
    }

    pub async fn invalidate(&self) {
        self.state.lock().await.cache.invalidate(&QueryKey::Symbols);
    }

    pub async fn set_draft(&self, text: &str) {
        self.state.lock().await.draft = text.to_string();
    }

    pub async fn draft(&self) -> String {
        self.state.lock().await.draft.clone()
    }

    /// Replace the draft with `input` and submit it.
    pub async fn add_symbol(&self, input: &str) -> Result<StockSymbol, ActionError> {
        self.set_draft(input).await;
        self.submit_add().await
    }

    /// Submit the current draft. Blank drafts and submissions while an add is
    /// pending never reach the backend. On success the draft is cleared and
    /// the list invalidated; on failure the draft is kept as typed.
    pub async fn submit_add(&self) -> Result<StockSymbol, ActionError> {
        let code = {
            let mut state = self.state.lock().await;
            let code = normalize_code(&state.draft)
                .ok_or(ActionError::Skipped(SkipReason::BlankCode))?;
            if !state.add.begin() {
                return Err(ActionError::Skipped(SkipReason::AlreadyPending));
            }
            code
        };

        let api = Arc::clone(&self.api);
        let shared = Arc::clone(&self.state);
        join(tokio::spawn(async move {
            let result = api.create_symbol(&code).await;

            let mut state = shared.lock().await;
            match result {
                Ok(symbol) => {
                    info!("✅ Added symbol {} (id {})", symbol.code, symbol.id);
                    state.add.settle(Ok(symbol.clone()));
                    state.draft.clear();
                    state.cache.invalidate(&QueryKey::Symbols);
                    Ok(symbol)
                }
                Err(e) => {
                    warn!("❌ Failed to add symbol {}: {}", code, e);
                    state.add.settle(Err(e.user_message()));
                    Err(e.into())
                }
            }
        }))
        .await
    }

    /// Open the delete confirmation for a listed symbol and return its prompt.
    pub async fn request_delete(&self, id: &SymbolId) -> Result<ConfirmPrompt, ActionError> {
        let mut state = self.state.lock().await;
        let symbol = state
            .symbols()
            .iter()
            .find(|s| s.id.matches(id))
            .cloned()
            .ok_or(ActionError::Skipped(SkipReason::UnknownSymbol))?;
        let prompt = ConfirmPrompt::for_symbol(&symbol);
        state.confirm = Some(symbol);
        Ok(prompt)
    }

    pub async fn cancel_delete(&self) {
        self.state.lock().await.confirm = None;
    }

    /// Delete `id`. Only valid while its confirmation prompt is open.
    pub async fn confirm_delete(&self, id: &SymbolId) -> Result<(), ActionError> {
        let symbol = {
            let mut state = self.state.lock().await;
            let symbol = match &state.confirm {
                Some(symbol) if symbol.id.matches(id) => symbol.clone(),
                _ => return Err(ActionError::Skipped(SkipReason::NotConfirmed)),
            };
            if !state.delete.begin() {
                return Err(ActionError::Skipped(SkipReason::AlreadyPending));
            }
            state.confirm = None;
            symbol
        };

        let api = Arc::clone(&self.api);
        let shared = Arc::clone(&self.state);
        join(tokio::spawn(async move {
            let result = api.delete_symbol(&symbol.id).await;

            let mut state = shared.lock().await;
            match result {
                Ok(()) => {
                    info!("🗑️ Deleted symbol {} (id {})", symbol.code, symbol.id);
                    state.delete.settle(Ok(symbol.id));
                    state.cache.invalidate(&QueryKey::Symbols);
                    Ok(())
                }
                Err(e) => {
                    warn!("❌ Failed to delete symbol {}: {}", symbol.code, e);
                    state.delete.settle(Err(e.user_message()));
                    Err(e.into())
                }
            }
        }))
        .await
    }

    /// Trigger the report and wait for the acknowledgement.
    pub async fn send_report(&self) -> Result<ReportAck, ActionError> {
        join(self.spawn_send_report().await?).await
    }

    /// Like `send_report`, but returns as soon as the action is `pending`
    /// and lets the call run on its own task.
    pub async fn spawn_send_report(
        &self,
    ) -> Result<JoinHandle<Result<ReportAck, ActionError>>, ActionError> {
        {
            let mut state = self.state.lock().await;
            if state.symbols().is_empty() {
                return Err(ActionError::Skipped(SkipReason::EmptyList));
            }
            if !state.send.begin() {
                return Err(ActionError::Skipped(SkipReason::AlreadyPending));
            }
            info!("📧 Sending report for {} symbols...", state.symbols().len());
        }

        let api = Arc::clone(&self.api);
        let shared = Arc::clone(&self.state);
        Ok(tokio::spawn(async move {
            let result = api.send_report().await;

            let mut state = shared.lock().await;
            match result {
                Ok(ack) => {
                    info!("✅ Report accepted: {}", ack.message);
                    state.send.settle(Ok(ack.clone()));
                    Ok(ack)
                }
                Err(e) => {
                    warn!("❌ Failed to send report: {}", e);
                    state.send.settle(Err(e.user_message()));
                    Err(e.into())
                }
            }
        }))
    }

    /// Suggestions for the add form. Not cached.
    pub async fn suggest(&self, query: &str) -> Result<Vec<ListedSymbol>, ActionError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.api.search_symbols(query).await?)
    }

    pub async fn view(&self) -> DashboardView {
        let state = self.state.lock().await;
        let (list_status, list_error) = state.list_status();
        let rows = view::rows(state.symbols(), self.timezone);
        let add = view::action_view(&state.add);
        let delete = view::action_view(&state.delete);
        let send = view::send_view(&state.send);
        let controls = view::controls(&state.draft, !rows.is_empty(), &add, &delete, &send);

        DashboardView {
            list_status,
            list_error,
            rows,
            draft: state.draft.clone(),
            add,
            delete,
            send,
            controls,
            confirm_delete: state.confirm.as_ref().map(ConfirmPrompt::for_symbol),
        }
    }
}

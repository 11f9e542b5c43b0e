use chrono_tz::Tz;
use serde::Serialize;

use super::mutation::{ActionStatus, MutationState};
use crate::models::{ReportAck, StockSymbol, SymbolId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStatus {
    Loading,
    Loaded,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolRow {
    pub index: usize,
    pub id: SymbolId,
    pub code: String,
    pub added_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionView {
    pub status: ActionStatus,
    pub message: Option<String>,
}

impl ActionView {
    pub fn is_pending(&self) -> bool {
        self.status == ActionStatus::Pending
    }

    pub fn is_success(&self) -> bool {
        self.status == ActionStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == ActionStatus::Error
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub input_enabled: bool,
    pub add_enabled: bool,
    pub delete_enabled: bool,
    pub send_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmPrompt {
    pub id: SymbolId,
    pub code: String,
    pub prompt: String,
}

impl ConfirmPrompt {
    pub fn for_symbol(symbol: &StockSymbol) -> Self {
        Self {
            id: symbol.id.clone(),
            code: symbol.code.clone(),
            prompt: format!("Xác nhận xóa {}?", symbol.code),
        }
    }
}

/// Everything the page needs to render, detached from the live state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub list_status: ListStatus,
    pub list_error: Option<String>,
    pub rows: Vec<SymbolRow>,
    pub draft: String,
    pub add: ActionView,
    pub delete: ActionView,
    pub send: ActionView,
    pub controls: Controls,
    pub confirm_delete: Option<ConfirmPrompt>,
}

impl DashboardView {
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.list_status == ListStatus::Loading
    }

    pub fn list_failed(&self) -> bool {
        self.list_status == ListStatus::Error
    }

    /// The page keeps polling while something is still in flight.
    pub fn needs_refresh(&self) -> bool {
        self.is_loading() || self.send.is_pending()
    }
}

pub(crate) fn rows(symbols: &[StockSymbol], tz: Tz) -> Vec<SymbolRow> {
    symbols
        .iter()
        .enumerate()
        .map(|(i, symbol)| SymbolRow {
            index: i + 1,
            id: symbol.id.clone(),
            code: symbol.code.clone(),
            added_at: symbol.added_at(tz),
        })
        .collect()
}

pub(crate) fn action_view<T>(state: &MutationState<T>) -> ActionView {
    ActionView {
        status: state.status(),
        message: state.error().map(str::to_string),
    }
}

pub(crate) fn send_view(state: &MutationState<ReportAck>) -> ActionView {
    ActionView {
        status: state.status(),
        message: state
            .data()
            .map(|ack| ack.message.clone())
            .or_else(|| state.error().map(str::to_string)),
    }
}

pub(crate) fn controls(
    draft: &str,
    has_symbols: bool,
    add: &ActionView,
    delete: &ActionView,
    send: &ActionView,
) -> Controls {
    Controls {
        input_enabled: !add.is_pending(),
        add_enabled: !add.is_pending() && !draft.trim().is_empty(),
        delete_enabled: !delete.is_pending(),
        send_enabled: !send.is_pending() && has_symbols,
    }
}

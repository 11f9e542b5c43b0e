use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use tokio::sync::{Mutex, Semaphore};

use crate::client::{ApiResult, SymbolApi};
use crate::error::ApiError;
use crate::models::{normalize_code, ListedSymbol, ReportAck, StockSymbol, SymbolId};

/// In-memory backend with the same duplicate and missing-id answers as the
/// real service. Counts every call so tests can assert what was sent.
pub struct FakeSymbolApi {
    pub symbols: Mutex<Vec<StockSymbol>>,
    pub listed: Mutex<Vec<ListedSymbol>>,
    pub next_id: AtomicI64,
    pub list_calls: AtomicU64,
    pub create_calls: AtomicU64,
    pub delete_calls: AtomicU64,
    pub send_calls: AtomicU64,
    pub search_calls: AtomicU64,
    fail_list: Mutex<Option<(StatusCode, String)>>,
    fail_create: Mutex<Option<(StatusCode, String)>>,
    fail_send: Mutex<Option<(StatusCode, String)>>,
    create_gate: Mutex<Option<Arc<Semaphore>>>,
    delete_gate: Mutex<Option<Arc<Semaphore>>>,
    report_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl Default for FakeSymbolApi {
    fn default() -> Self {
        Self {
            symbols: Mutex::new(Vec::new()),
            listed: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            list_calls: AtomicU64::new(0),
            create_calls: AtomicU64::new(0),
            delete_calls: AtomicU64::new(0),
            send_calls: AtomicU64::new(0),
            search_calls: AtomicU64::new(0),
            fail_list: Mutex::new(None),
            fail_create: Mutex::new(None),
            fail_send: Mutex::new(None),
            create_gate: Mutex::new(None),
            delete_gate: Mutex::new(None),
            report_gate: Mutex::new(None),
        }
    }
}

impl FakeSymbolApi {
    pub const REPORT_MESSAGE: &'static str =
        "Report generation started. Check your email in 1-2 minutes.";

    pub fn with_codes(codes: &[&str]) -> Self {
        let fake = Self::default();
        let symbols: Vec<StockSymbol> = codes
            .iter()
            .map(|code| fake.record(code.to_string()))
            .collect();
        Self {
            symbols: Mutex::new(symbols),
            ..fake
        }
    }

    fn record(&self, code: String) -> StockSymbol {
        StockSymbol {
            id: SymbolId::Int(self.next_id.fetch_add(1, Ordering::SeqCst)),
            code,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    pub async fn fail_next_list(&self, status: StatusCode, message: &str) {
        *self.fail_list.lock().await = Some((status, message.to_string()));
    }

    pub async fn fail_next_create(&self, status: StatusCode, message: &str) {
        *self.fail_create.lock().await = Some((status, message.to_string()));
    }

    pub async fn fail_next_send(&self, status: StatusCode, message: &str) {
        *self.fail_send.lock().await = Some((status, message.to_string()));
    }

    /// Make `create_symbol` wait for a permit on the returned semaphore.
    pub async fn hold_creates(&self) -> Arc<Semaphore> {
        Self::close_gate(&self.create_gate).await
    }

    /// Make `delete_symbol` wait for a permit on the returned semaphore.
    pub async fn hold_deletes(&self) -> Arc<Semaphore> {
        Self::close_gate(&self.delete_gate).await
    }

    /// Make `send_report` wait for a permit on the returned semaphore.
    pub async fn hold_reports(&self) -> Arc<Semaphore> {
        Self::close_gate(&self.report_gate).await
    }

    async fn close_gate(slot: &Mutex<Option<Arc<Semaphore>>>) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *slot.lock().await = Some(gate.clone());
        gate
    }

    async fn pass_gate(slot: &Mutex<Option<Arc<Semaphore>>>) {
        let gate = slot.lock().await.clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }

    async fn scripted_failure(slot: &Mutex<Option<(StatusCode, String)>>) -> ApiResult<()> {
        match slot.lock().await.take() {
            Some((status, message)) => Err(ApiError::Http { status, message }),
            None => Ok(()),
        }
    }
}

fn bad_request(message: String) -> ApiError {
    ApiError::Http {
        status: StatusCode::BAD_REQUEST,
        message,
    }
}

#[async_trait]
impl SymbolApi for FakeSymbolApi {
    async fn list_symbols(&self) -> ApiResult<Vec<StockSymbol>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Self::scripted_failure(&self.fail_list).await?;
        Ok(self.symbols.lock().await.clone())
    }

    async fn create_symbol(&self, code: &str) -> ApiResult<StockSymbol> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Self::pass_gate(&self.create_gate).await;
        Self::scripted_failure(&self.fail_create).await?;
        let code = normalize_code(code).ok_or_else(|| bad_request("Code is required".to_string()))?;

        let mut symbols = self.symbols.lock().await;
        if symbols.iter().any(|s| s.code == code) {
            return Err(bad_request(format!("Symbol {} already exists", code)));
        }
        let symbol = self.record(code);
        symbols.push(symbol.clone());
        Ok(symbol)
    }

    async fn delete_symbol(&self, id: &SymbolId) -> ApiResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        Self::pass_gate(&self.delete_gate).await;
        let mut symbols = self.symbols.lock().await;
        let before = symbols.len();
        symbols.retain(|s| &s.id != id);
        if symbols.len() == before {
            return Err(ApiError::Http {
                status: StatusCode::NOT_FOUND,
                message: "Symbol not found".to_string(),
            });
        }
        Ok(())
    }

    async fn send_report(&self) -> ApiResult<ReportAck> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        Self::pass_gate(&self.report_gate).await;
        Self::scripted_failure(&self.fail_send).await?;
        Ok(ReportAck {
            message: Self::REPORT_MESSAGE.to_string(),
        })
    }

    async fn search_symbols(&self, query: &str) -> ApiResult<Vec<ListedSymbol>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let query = query.trim().to_uppercase();
        Ok(self
            .listed
            .lock()
            .await
            .iter()
            .filter(|l| l.symbol.contains(&query))
            .take(10)
            .cloned()
            .collect())
    }
}

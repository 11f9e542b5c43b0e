use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::models::{normalize_code, ListedSymbol, NewSymbol, ReportAck, StockSymbol, SymbolId};

pub type ApiResult<T> = Result<T, ApiError>;

/// The backend operations the dashboard depends on.
#[async_trait]
pub trait SymbolApi: Send + Sync {
    async fn list_symbols(&self) -> ApiResult<Vec<StockSymbol>>;

    async fn create_symbol(&self, code: &str) -> ApiResult<StockSymbol>;

    async fn delete_symbol(&self, id: &SymbolId) -> ApiResult<()>;

    /// Triggers the e-mail report. The backend may take 30-60s; no timeout
    /// or retry is applied here.
    async fn send_report(&self) -> ApiResult<ReportAck>;

    async fn search_symbols(&self, query: &str) -> ApiResult<Vec<ListedSymbol>>;
}

/// REST client for the stock report backend.
#[derive(Debug, Clone)]
pub struct StockReportClient {
    base_url: String,
    client: Client,
}

impl StockReportClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-2xx response into `ApiError::Http`, keeping the body text.
    async fn check(response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_response(status, &body);
        warn!("Backend returned {}: {}", status, err);
        Err(err)
    }

    async fn json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SymbolApi for StockReportClient {
    async fn list_symbols(&self) -> ApiResult<Vec<StockSymbol>> {
        debug!("GET {}/api/symbols", self.base_url);
        let response = self.client.get(self.url("/api/symbols")).send().await?;
        Self::json(response).await
    }

    async fn create_symbol(&self, code: &str) -> ApiResult<StockSymbol> {
        let code = normalize_code(code)
            .ok_or_else(|| ApiError::Validation("Code is required".to_string()))?;
        debug!("POST {}/api/symbols code={}", self.base_url, code);
        let response = self
            .client
            .post(self.url("/api/symbols"))
            .json(&NewSymbol { code })
            .send()
            .await?;
        Self::json(response).await
    }

    async fn delete_symbol(&self, id: &SymbolId) -> ApiResult<()> {
        debug!("DELETE {}/api/symbols/{}", self.base_url, id);
        let response = self
            .client
            .delete(self.url(&format!("/api/symbols/{}", id)))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn send_report(&self) -> ApiResult<ReportAck> {
        debug!("POST {}/api/report/send", self.base_url);
        let response = self.client.post(self.url("/api/report/send")).send().await?;
        Self::json(response).await
    }

    async fn search_symbols(&self, query: &str) -> ApiResult<Vec<ListedSymbol>> {
        let query = query.trim().to_uppercase();
        let response = self
            .client
            .get(self.url("/api/search-symbols"))
            .query(&[("q", query.as_str())])
            .send()
            .await?;
        Self::json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_dropped() {
        let client = StockReportClient::new("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(client.url("/api/symbols"), "http://localhost:5000/api/symbols");
    }

    #[tokio::test]
    async fn test_blank_code_is_rejected_before_sending() {
        // Nothing listens on port 9; a request would fail as Network, not Validation.
        let client = StockReportClient::new("http://127.0.0.1:9");
        let err = client.create_symbol("   ").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}

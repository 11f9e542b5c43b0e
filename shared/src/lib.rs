pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fake;
pub mod models;

pub use client::{ApiResult, StockReportClient, SymbolApi};
pub use config::Config;
pub use dashboard::{ActionError, Dashboard, DashboardView, SkipReason};
pub use error::ApiError;
pub use fake::FakeSymbolApi;
pub use models::*;

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Backend-assigned identifier of a tracked symbol.
///
/// The REST contract documents an integer, but deployed backends have been
/// seen to hand out UUID strings, so both are accepted and echoed back as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SymbolId {
    Int(i64),
    Text(String),
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolId::Int(id) => write!(f, "{}", id),
            SymbolId::Text(id) => f.write_str(id),
        }
    }
}

impl SymbolId {
    /// Same id regardless of whether either side arrived as a number or as a
    /// numeric string (URL path segments are always text).
    pub fn matches(&self, other: &SymbolId) -> bool {
        match (self, other) {
            (SymbolId::Int(a), SymbolId::Int(b)) => a == b,
            (SymbolId::Text(a), SymbolId::Text(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl From<i64> for SymbolId {
    fn from(id: i64) -> Self {
        SymbolId::Int(id)
    }
}

impl From<&str> for SymbolId {
    fn from(id: &str) -> Self {
        match id.parse::<i64>() {
            Ok(n) => SymbolId::Int(n),
            Err(_) => SymbolId::Text(id.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSymbol {
    pub id: SymbolId,
    pub code: String,
    pub created_at: String,
}

impl StockSymbol {
    /// `created_at` rendered in `tz` the way the dashboard table shows it.
    pub fn added_at(&self, tz: Tz) -> String {
        format_created_at(&self.created_at, tz)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSymbol {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportAck {
    pub message: String,
}

/// One entry of the exchange listing used for code suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListedSymbol {
    pub symbol: String,
    #[serde(rename = "organName", default)]
    pub organ_name: Option<String>,
}

/// Trim and uppercase a ticker code. Returns `None` when nothing is left.
pub fn normalize_code(raw: &str) -> Option<String> {
    let code = raw.trim();
    if code.is_empty() {
        None
    } else {
        Some(code.to_uppercase())
    }
}

pub const ADDED_AT_FORMAT: &str = "%H:%M:%S %-d/%-m/%Y";

/// Parse an RFC 3339 or naive ISO-8601 timestamp (naive means UTC) and
/// format it in `tz`. Unparseable input is returned unchanged.
pub fn format_created_at(raw: &str, tz: Tz) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.with_timezone(&tz).format(ADDED_AT_FORMAT).to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

use chrono_tz::Tz;
use dotenv::dotenv;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_DASHBOARD_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_TIMEZONE: &str = "Asia/Ho_Chi_Minh";
pub const DEFAULT_REPORT_SCHEDULE_NOTE: &str =
    "Báo cáo tự động: Mỗi ngày 4 giờ chiều (Thứ 2 - Thứ 6)";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub dashboard_addr: String,
    pub timezone: Tz,
    pub report_schedule_note: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv().ok();

        let timezone = std::env::var("TIMEZONE").unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string());

        Ok(Config {
            api_base_url: std::env::var("API_URL")
                .or_else(|_| std::env::var("NEXT_PUBLIC_API_URL"))
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            dashboard_addr: std::env::var("DASHBOARD_ADDR")
                .unwrap_or_else(|_| DEFAULT_DASHBOARD_ADDR.to_string()),
            timezone: parse_timezone(&timezone)?,
            report_schedule_note: std::env::var("REPORT_SCHEDULE_NOTE")
                .unwrap_or_else(|_| DEFAULT_REPORT_SCHEDULE_NOTE.to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            dashboard_addr: DEFAULT_DASHBOARD_ADDR.to_string(),
            timezone: chrono_tz::Asia::Ho_Chi_Minh,
            report_schedule_note: DEFAULT_REPORT_SCHEDULE_NOTE.to_string(),
        }
    }
}

fn parse_timezone(name: &str) -> Result<Tz, anyhow::Error> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("Invalid TIMEZONE {:?}: {}", name, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("Asia/Ho_Chi_Minh").unwrap(), chrono_tz::Asia::Ho_Chi_Minh);
        assert_eq!(parse_timezone(" UTC ").unwrap(), chrono_tz::UTC);
        assert!(parse_timezone("Mars/Olympus").is_err());
    }

    #[test]
    fn test_default_points_at_local_backend() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://localhost:5000");
        assert_eq!(config.timezone, chrono_tz::Asia::Ho_Chi_Minh);
    }
}

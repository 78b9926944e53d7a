//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Sportsbook Odds (The Odds API) ===
    /// API key for the odds provider. Only needed by commands that fetch odds.
    #[serde(default)]
    pub odds_api_key: Option<String>,

    /// Odds API base URL.
    #[serde(default = "default_odds_api_url")]
    pub odds_api_url: String,

    /// Bookmaker regions to request.
    #[serde(default = "default_odds_regions")]
    pub odds_regions: String,

    /// Sport key processed by this run.
    #[serde(default = "default_sport")]
    pub sport: String,

    /// Freshness window for cached odds, in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    // === Prediction Market (Gamma API) ===
    /// Gamma events endpoint.
    #[serde(default = "default_gamma_api_url")]
    pub gamma_api_url: String,

    /// Events per Gamma page.
    #[serde(default = "default_gamma_page_limit")]
    pub gamma_page_limit: usize,

    // === Snapshots & Report ===
    /// Prediction-market snapshot path.
    #[serde(default = "default_polymarket_snapshot")]
    pub polymarket_snapshot_path: PathBuf,

    /// Sportsbook snapshot path.
    #[serde(default = "default_sportsbook_snapshot")]
    pub sportsbook_snapshot_path: PathBuf,

    /// Directory holding the report of the latest run.
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,

    // === Stake Sizing ===
    /// Stake placed on the sportsbook leg, in the base currency.
    #[serde(default = "default_initial_stake")]
    pub initial_stake: Decimal,

    /// Currency of the sportsbook account.
    #[serde(default = "default_base_currency")]
    pub base_currency: String,

    /// Currency of the prediction market account.
    #[serde(default = "default_quote_currency")]
    pub quote_currency: String,

    /// Base→quote rate used when the live lookup fails.
    #[serde(default = "default_fallback_rate")]
    pub fallback_conversion_rate: Decimal,

    /// Exchange rate service base URL (base currency is appended).
    #[serde(default = "default_exchange_rate_url")]
    pub exchange_rate_url: String,

    // === Matching ===
    /// Maximum distance between the two sources' start times, in seconds.
    #[serde(default = "default_match_window")]
    pub match_window_secs: i64,

    // === Network ===
    /// Timeout applied to every outbound HTTP request.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_ms: u64,

    // === Server Configuration ===
    /// HTTP server port for the odds server.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_odds_api_url() -> String {
    "https://api.the-odds-api.com/v4".to_string()
}

fn default_odds_regions() -> String {
    "us".to_string()
}

fn default_sport() -> String {
    "basketball_nba".to_string()
}

fn default_cache_ttl() -> u64 {
    15 * 60
}

fn default_gamma_api_url() -> String {
    "https://gamma-api.polymarket.com/events".to_string()
}

fn default_gamma_page_limit() -> usize {
    100
}

fn default_polymarket_snapshot() -> PathBuf {
    PathBuf::from("jsonOutputs/nbaEvents.json")
}

fn default_sportsbook_snapshot() -> PathBuf {
    PathBuf::from("jsonOutputs/miraNBAEvents.json")
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("arbOutput")
}

fn default_initial_stake() -> Decimal {
    Decimal::new(100, 0) // 100 CAD
}

fn default_base_currency() -> String {
    "CAD".to_string()
}

fn default_quote_currency() -> String {
    "USD".to_string()
}

fn default_fallback_rate() -> Decimal {
    Decimal::new(73, 2) // 0.73
}

fn default_exchange_rate_url() -> String {
    "https://api.exchangerate-api.com/v4/latest".to_string()
}

fn default_match_window() -> i64 {
    3600
}

fn default_http_timeout() -> u64 {
    5000
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            odds_api_key: None,
            odds_api_url: default_odds_api_url(),
            odds_regions: default_odds_regions(),
            sport: default_sport(),
            cache_ttl_secs: default_cache_ttl(),
            gamma_api_url: default_gamma_api_url(),
            gamma_page_limit: default_gamma_page_limit(),
            polymarket_snapshot_path: default_polymarket_snapshot(),
            sportsbook_snapshot_path: default_sportsbook_snapshot(),
            report_dir: default_report_dir(),
            initial_stake: default_initial_stake(),
            base_currency: default_base_currency(),
            quote_currency: default_quote_currency(),
            fallback_conversion_rate: default_fallback_rate(),
            exchange_rate_url: default_exchange_rate_url(),
            match_window_secs: default_match_window(),
            http_timeout_ms: default_http_timeout(),
            port: default_port(),
            rust_log: default_log_level(),
            verbose: false,
        }
    }
}

/// Upper bound on the second-valued durations (one year).
pub const MAX_DURATION_SECS: i64 = 365 * 24 * 60 * 60;

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_stake <= Decimal::ZERO {
            return Err("INITIAL_STAKE must be positive".to_string());
        }

        if self.fallback_conversion_rate <= Decimal::ZERO {
            return Err("FALLBACK_CONVERSION_RATE must be positive".to_string());
        }

        if self.cache_ttl_secs == 0 || self.cache_ttl_secs > MAX_DURATION_SECS as u64 {
            return Err(format!(
                "CACHE_TTL_SECS must be between 1 and {MAX_DURATION_SECS}"
            ));
        }

        if self.gamma_page_limit == 0 {
            return Err("GAMMA_PAGE_LIMIT must be greater than 0".to_string());
        }

        if !(0..=MAX_DURATION_SECS).contains(&self.match_window_secs) {
            return Err(format!(
                "MATCH_WINDOW_SECS must be between 0 and {MAX_DURATION_SECS}"
            ));
        }

        if self.base_currency.trim().is_empty() || self.quote_currency.trim().is_empty() {
            return Err("BASE_CURRENCY and QUOTE_CURRENCY are required".to_string());
        }

        Ok(())
    }

    /// Odds API key, required by commands that hit the upstream provider.
    pub fn require_odds_api_key(&self) -> Result<&str, crate::error::OddsError> {
        self.odds_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(crate::error::OddsError::MissingApiKey)
    }

    /// Outbound HTTP timeout.
    pub fn http_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.http_timeout_ms)
    }

    /// Odds cache freshness window.
    pub fn cache_ttl(&self) -> chrono::Duration {
        i64::try_from(self.cache_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

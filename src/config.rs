//! Configuration module for walletwatch.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_BASE_RPC: &str = "https://mainnet.base.org";
pub const DEFAULT_PRICE_API_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

/// Server configuration loaded from environment variables.
#[derive(Clone)]
pub struct ServerConfig {
    /// HTTP port for the web server (default: 3000)
    pub http_port: u16,
    /// Path to the SQLite database file (default: "walletwatch.db")
    pub db_path: String,
    /// Label shown on snapshots (default: "Base Mainnet")
    pub network_name: String,
    pub primary_rpc: String,
    pub secondary_rpc: Option<String>,
    pub rpc_timeout_secs: u64,
    pub rpc_health_ttl_secs: u64,
    pub report_ttl_secs: u64,
    pub price_api_url: String,
    pub price_asset_id: String,
    pub price_currency: String,
    pub price_timeout_secs: u64,
    pub price_cache_ttl_secs: u64,
    pub low_gas_threshold: f64,
    pub critical_gas_threshold: f64,
    pub alert_score_threshold: u32,
    /// Number of history rows fed into the trend computation
    pub trend_window: usize,
    /// Number of history rows shown on the dashboard and by default on the API
    pub history_limit: usize,
    pub private_key: Option<String>,
    /// Address to watch directly, bypassing key derivation
    pub watch_address: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 3000,
            db_path: "walletwatch.db".to_string(),
            network_name: "Base Mainnet".to_string(),
            primary_rpc: DEFAULT_BASE_RPC.to_string(),
            secondary_rpc: None,
            rpc_timeout_secs: 10,
            rpc_health_ttl_secs: 30,
            report_ttl_secs: 60,
            price_api_url: DEFAULT_PRICE_API_URL.to_string(),
            price_asset_id: "ethereum".to_string(),
            price_currency: "usd".to_string(),
            price_timeout_secs: 10,
            price_cache_ttl_secs: 60,
            low_gas_threshold: 0.002,
            critical_gas_threshold: 0.001,
            alert_score_threshold: 70,
            trend_window: 10,
            history_limit: 20,
            private_key: None,
            watch_address: None,
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_port", &self.http_port)
            .field("db_path", &self.db_path)
            .field("network_name", &self.network_name)
            .field("primary_rpc", &self.primary_rpc)
            .field("secondary_rpc", &self.secondary_rpc)
            .field("report_ttl_secs", &self.report_ttl_secs)
            .field("price_cache_ttl_secs", &self.price_cache_ttl_secs)
            .field("rpc_health_ttl_secs", &self.rpc_health_ttl_secs)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("watch_address", &self.watch_address)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `HTTP_PORT`, `DB_PATH`, `NETWORK_NAME`
    /// - `BASE_RPC`, `BASE_RPC_2`, `RPC_TIMEOUT_SECONDS`, `RPC_HEALTH_TTL`
    /// - `REPORT_TTL_SECONDS`, `TREND_WINDOW`, `HISTORY_LIMIT`
    /// - `PRICE_API_URL`, `PRICE_ASSET_ID`, `PRICE_CURRENCY`,
    ///   `PRICE_TIMEOUT_SECONDS`, `PRICE_CACHE_TTL`
    /// - `LOW_GAS_THRESHOLD_ETH`, `CRITICAL_GAS_THRESHOLD_ETH`, `ALERT_SCORE_THRESHOLD`
    /// - `BASE_PRIVATE_KEY`, `WATCH_ADDRESS`
    ///
    /// Unparsable values keep their defaults.
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let text = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = text("HTTP_PORT") {
            set_parsed(&mut cfg.http_port, "HTTP_PORT", &v);
        }
        if let Some(v) = text("DB_PATH") {
            cfg.db_path = v;
        }
        if let Some(v) = text("NETWORK_NAME") {
            cfg.network_name = v;
        }
        if let Some(v) = text("BASE_RPC") {
            cfg.primary_rpc = v;
        }
        cfg.secondary_rpc = text("BASE_RPC_2");
        if let Some(v) = text("RPC_TIMEOUT_SECONDS") {
            set_parsed(&mut cfg.rpc_timeout_secs, "RPC_TIMEOUT_SECONDS", &v);
        }
        if let Some(v) = text("RPC_HEALTH_TTL") {
            set_parsed(&mut cfg.rpc_health_ttl_secs, "RPC_HEALTH_TTL", &v);
        }
        if let Some(v) = text("REPORT_TTL_SECONDS") {
            set_parsed(&mut cfg.report_ttl_secs, "REPORT_TTL_SECONDS", &v);
        }
        if let Some(v) = text("TREND_WINDOW") {
            set_parsed(&mut cfg.trend_window, "TREND_WINDOW", &v);
        }
        if let Some(v) = text("HISTORY_LIMIT") {
            set_parsed(&mut cfg.history_limit, "HISTORY_LIMIT", &v);
        }
        if let Some(v) = text("PRICE_API_URL") {
            cfg.price_api_url = v;
        }
        if let Some(v) = text("PRICE_ASSET_ID") {
            cfg.price_asset_id = v;
        }
        if let Some(v) = text("PRICE_CURRENCY") {
            cfg.price_currency = v;
        }
        if let Some(v) = text("PRICE_TIMEOUT_SECONDS") {
            set_parsed(&mut cfg.price_timeout_secs, "PRICE_TIMEOUT_SECONDS", &v);
        }
        if let Some(v) = text("PRICE_CACHE_TTL") {
            set_parsed(&mut cfg.price_cache_ttl_secs, "PRICE_CACHE_TTL", &v);
        }
        if let Some(v) = text("LOW_GAS_THRESHOLD_ETH") {
            set_parsed(&mut cfg.low_gas_threshold, "LOW_GAS_THRESHOLD_ETH", &v);
        }
        if let Some(v) = text("CRITICAL_GAS_THRESHOLD_ETH") {
            set_parsed(&mut cfg.critical_gas_threshold, "CRITICAL_GAS_THRESHOLD_ETH", &v);
        }
        if let Some(v) = text("ALERT_SCORE_THRESHOLD") {
            set_parsed(&mut cfg.alert_score_threshold, "ALERT_SCORE_THRESHOLD", &v);
        }
        cfg.private_key = text("BASE_PRIVATE_KEY");
        cfg.watch_address = text("WATCH_ADDRESS");

        cfg
    }
}

fn set_parsed<T: FromStr>(slot: &mut T, key: &str, raw: &str) {
    match raw.parse() {
        Ok(v) => *slot = v,
        Err(_) => tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw),
    }
}

//! Report snapshot types.

use super::cards::ActionCard;
use crate::analysis::Trend;
use crate::node::{EndpointRole, NodeHealth, RpcHealth};

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const MODEL_ID: &str = "text-report-v1";
pub const STATUS_TEXT_MODE: &str = "text-mode";
pub const STATUS_ERROR: &str = "error";

/// Configured cache TTLs in seconds, echoed on every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheTtls {
    pub report_ttl: u64,
    pub price_cache_ttl: u64,
}

/// One materialised report. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSnapshot {
    /// Second precision, serialised as RFC 3339 with `Z`.
    pub created_at: DateTime<Utc>,
    pub address: String,
    pub network: String,
    pub rpc_used: EndpointRole,
    pub block_number: u64,
    pub balance_eth: f64,
    /// `None` when the price feed was unavailable.
    pub eth_price_usd: Option<f64>,
    pub trend: Trend,
    pub trend_pct: f64,
    pub score: u8,
    pub alerts: Vec<String>,
    pub recommendations: Vec<String>,
    pub ai_status: String,
    pub model_id: String,
    pub report_text: String,
    pub cards: Vec<ActionCard>,
    pub rpc_health: RpcHealth,
    pub cache: CacheTtls,
}

impl ReportSnapshot {
    /// Stand-in shown by the dashboard when report generation failed.
    pub fn placeholder(error: &str, network: &str, primary_rpc: &str, cache: CacheTtls) -> Self {
        Self {
            created_at: super::now_seconds(),
            address: "Demo mode".to_string(),
            network: network.to_string(),
            rpc_used: EndpointRole::Primary,
            block_number: 0,
            balance_eth: 0.0,
            eth_price_usd: None,
            trend: Trend::Undefined,
            trend_pct: 0.0,
            score: 0,
            alerts: Vec::new(),
            recommendations: Vec::new(),
            ai_status: STATUS_ERROR.to_string(),
            model_id: MODEL_ID.to_string(),
            report_text: format!("Recovered error: {}", error),
            cards: Vec::new(),
            rpc_health: RpcHealth::select(NodeHealth::unknown(primary_rpc), None),
            cache,
        }
    }

    /// Wallet value in fiat; zero when no price was available.
    pub fn balance_usd(&self) -> f64 {
        self.balance_eth * self.eth_price_usd.unwrap_or(0.0)
    }
}

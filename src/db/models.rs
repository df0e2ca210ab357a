//! Database model types.

use serde::Serialize;

/// A persisted report row as shown in the history views.
///
/// Columns introduced by later migrations are null on older rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub created_at: String,
    pub address: String,
    pub network: String,
    pub rpc_used: Option<String>,
    pub block_number: Option<i64>,
    pub balance_eth: f64,
    pub eth_price_usd: Option<f64>,
    pub score: Option<i64>,
    pub trend: Option<String>,
    pub model_id: Option<String>,
}

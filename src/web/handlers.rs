//! HTTP request handlers.

use super::AppState;
use crate::db::HistoryRecord;
use crate::node::NodeHealth;
use crate::report::{ReportError, ReportSnapshot};

use askama::Template;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

const MAX_HISTORY_LIMIT: usize = 500;

// ============================================================================
// API: Report
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<ReportSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn report_response(result: Result<ReportSnapshot, ReportError>) -> Response {
    match result {
        Ok(payload) => Json(StatusResponse {
            ok: true,
            payload: Some(payload),
            error: None,
        })
        .into_response(),
        Err(e) => {
            tracing::error!("Report generation failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse {
                    ok: false,
                    payload: None,
                    error: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

pub async fn handle_status(State(state): State<AppState>) -> impl IntoResponse {
    report_response(state.pipeline.generate_report(false).await)
}

pub async fn handle_force(State(state): State<AppState>) -> impl IntoResponse {
    report_response(state.pipeline.generate_report(true).await)
}

// ============================================================================
// API: History
// ============================================================================

/// `limit` stays raw text so a bad value gets the JSON error shape.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn parse_limit(
    query: Result<Query<HistoryQuery>, QueryRejection>,
    default: usize,
) -> Result<usize, String> {
    let Query(query) = query.map_err(|e| e.body_text())?;
    match query.limit.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| format!("invalid limit: {}", raw)),
    }
}

pub async fn handle_history(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> impl IntoResponse {
    let limit = match parse_limit(query, state.config.history_limit) {
        Ok(limit) => limit.min(MAX_HISTORY_LIMIT),
        Err(error) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(HistoryResponse {
                    ok: false,
                    history: None,
                    error: Some(error),
                }),
            )
                .into_response();
        }
    };

    match state.store.fetch_history(limit) {
        Ok(history) => Json(HistoryResponse {
            ok: true,
            history: Some(history),
            error: None,
        })
        .into_response(),
        Err(e) => {
            tracing::error!("History query failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HistoryResponse {
                    ok: false,
                    history: None,
                    error: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Liveness
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthzResponse {
    pub ok: bool,
    pub ts: String,
}

pub async fn handle_healthz() -> impl IntoResponse {
    Json(HealthzResponse {
        ok: true,
        ts: crate::report::now_seconds().to_rfc3339_opts(SecondsFormat::Secs, true),
    })
}

// ============================================================================
// Dashboard
// ============================================================================

/// One endpoint row of the node-health table.
pub struct NodeRow {
    pub role: &'static str,
    pub url: String,
    pub status: &'static str,
    pub latency: String,
    pub block: String,
    pub error: String,
}

impl NodeRow {
    fn new(role: &'static str, health: &NodeHealth) -> Self {
        Self {
            role,
            url: health.url.clone(),
            status: if health.ok { "ok" } else { "down" },
            latency: health
                .latency_ms
                .map(|ms| format!("{} ms", ms))
                .unwrap_or_else(|| "-".to_string()),
            block: health.block.map(|b| b.to_string()).unwrap_or_else(|| "-".to_string()),
            error: health.error.clone().unwrap_or_default(),
        }
    }
}

/// One row of the history table, pre-formatted for display.
pub struct HistoryRow {
    pub id: i64,
    pub created_at: String,
    pub rpc_used: String,
    pub block: String,
    pub balance: String,
    pub price: String,
    pub score: String,
    pub trend: String,
}

impl From<&HistoryRecord> for HistoryRow {
    fn from(r: &HistoryRecord) -> Self {
        let dash = || "-".to_string();
        Self {
            id: r.id,
            created_at: r.created_at.clone(),
            rpc_used: r.rpc_used.clone().unwrap_or_else(dash),
            block: r.block_number.map(|b| b.to_string()).unwrap_or_else(dash),
            balance: format!("{:.5}", r.balance_eth),
            price: r.eth_price_usd.map(|p| format!("${:.2}", p)).unwrap_or_else(dash),
            score: r.score.map(|s| s.to_string()).unwrap_or_else(dash),
            trend: r.trend.clone().unwrap_or_else(dash),
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage<'a> {
    pub title: &'a str,
    pub ok: bool,
    pub error_msg: String,
    pub report: &'a ReportSnapshot,
    pub created_at: String,
    pub price: String,
    pub balance_usd: String,
    pub nodes: Vec<NodeRow>,
    pub history: Vec<HistoryRow>,
    pub stored_count: i64,
    pub alert_threshold: u32,
    pub low_gas: f64,
    pub critical_gas: f64,
    pub has_rpc2: bool,
}

pub async fn handle_dashboard(State(state): State<AppState>) -> impl IntoResponse {
    let (report, error_msg) = match state.pipeline.generate_report(false).await {
        Ok(report) => (report, String::new()),
        Err(e) => {
            tracing::error!("Dashboard falling back to placeholder: {}", e);
            let placeholder = ReportSnapshot::placeholder(
                &e.to_string(),
                &state.config.network_name,
                &state.config.primary_rpc,
                state.pipeline.cache_ttls(),
            );
            (placeholder, e.to_string())
        }
    };

    let history = state
        .store
        .fetch_history(state.config.history_limit)
        .unwrap_or_else(|e| {
            tracing::warn!("Dashboard history unavailable: {}", e);
            Vec::new()
        });
    let stored_count = state.store.count_reports().unwrap_or(0);

    let mut nodes = vec![NodeRow::new("primary", &report.rpc_health.primary)];
    if let Some(secondary) = &report.rpc_health.secondary {
        nodes.push(NodeRow::new("secondary", secondary));
    }

    let thresholds = state.pipeline.thresholds();
    let page = DashboardPage {
        title: "walletwatch dashboard",
        ok: error_msg.is_empty(),
        error_msg,
        report: &report,
        created_at: report.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        price: report
            .eth_price_usd
            .map(|p| format!("${:.2}", p))
            .unwrap_or_else(|| "unavailable".to_string()),
        balance_usd: format!("${:.2}", report.balance_usd()),
        nodes,
        history: history.iter().map(HistoryRow::from).collect(),
        stored_count,
        alert_threshold: thresholds.alert_score,
        low_gas: thresholds.low_balance,
        critical_gas: thresholds.critical_balance,
        has_rpc2: state.pipeline.has_secondary(),
    };

    match page.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Dashboard template failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

// ============================================================================
// Static Assets
// ============================================================================

pub async fn handle_favicon() -> impl IntoResponse {
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
        <rect x="12" y="28" width="76" height="52" rx="10" fill="#0052ff"/>
        <circle cx="70" cy="54" r="8" fill="white"/>
    </svg>"##;

    (
        [(axum::http::header::CONTENT_TYPE, "image/svg+xml")],
        svg
    )
}

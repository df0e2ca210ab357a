//! SQLite database store implementation.

use chrono::SecondsFormat;
use rusqlite::{params, Connection, Result as SqlResult};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use super::models::*;
use crate::report::ReportSnapshot;

/// Database error types.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Database lock poisoned")]
    LockPoisoned,
}

/// Columns that may be missing from tables created by older releases.
const REPORT_COLUMNS: &[(&str, &str)] = &[
    ("rpc_used", "rpc_used TEXT"),
    ("block_number", "block_number INTEGER"),
    ("eth_price_usd", "eth_price_usd REAL"),
    ("score", "score INTEGER"),
    ("trend", "trend TEXT"),
    ("alerts_json", "alerts_json TEXT"),
    ("recommendations_json", "recommendations_json TEXT"),
    ("model_id", "model_id TEXT"),
    ("report_text", "report_text TEXT"),
];

/// Thread-safe database store.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Create a new store with the given database path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    /// Create the schema and add any columns an older table lacks.
    fn init(&self) -> Result<(), DbError> {
        let conn = self.conn()?;

        conn.execute_batch(include_str!("../../migrations/000001_init.up.sql"))
            .map_err(|e| DbError::Migration(format!("Migration 1 failed: {}", e)))?;

        let existing: HashSet<String> = {
            let mut stmt = conn.prepare("PRAGMA table_info(reports)")?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(1))?
                .collect::<SqlResult<HashSet<_>>>()?;
            names
        };

        for (name, ddl) in REPORT_COLUMNS {
            if !existing.contains(*name) {
                tracing::info!("Adding missing column reports.{}", name);
                conn.execute_batch(&format!("ALTER TABLE reports ADD COLUMN {};", ddl))
                    .map_err(|e| DbError::Migration(format!("adding column {} failed: {}", name, e)))?;
            }
        }

        Ok(())
    }

    /// Append a snapshot and return its row id.
    pub fn insert_report(&self, report: &ReportSnapshot) -> Result<i64, DbError> {
        let alerts_json = serde_json::to_string(&report.alerts)?;
        let recommendations_json = serde_json::to_string(&report.recommendations)?;
        let block_number = i64::try_from(report.block_number).unwrap_or(i64::MAX);

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO reports (
                created_at, address, network, rpc_used, block_number,
                balance_eth, eth_price_usd, score, trend,
                alerts_json, recommendations_json, model_id, report_text
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                report.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                report.address,
                report.network,
                report.rpc_used.as_str(),
                block_number,
                report.balance_eth,
                report.eth_price_usd,
                report.score as i64,
                report.trend.as_str(),
                alerts_json,
                recommendations_json,
                report.model_id,
                report.report_text,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent `limit` rows, newest first by insertion id.
    pub fn fetch_history(&self, limit: usize) -> Result<Vec<HistoryRecord>, DbError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, created_at, address, network, rpc_used, block_number,
                    balance_eth, eth_price_usd, score, trend, model_id
             FROM reports ORDER BY id DESC LIMIT ?1",
        )?;

        let records = stmt
            .query_map(params![limit], |row| {
                Ok(HistoryRecord {
                    id: row.get(0)?,
                    created_at: row.get(1)?,
                    address: row.get(2)?,
                    network: row.get(3)?,
                    rpc_used: row.get(4)?,
                    block_number: row.get(5)?,
                    balance_eth: row.get(6)?,
                    eth_price_usd: row.get(7)?,
                    score: row.get(8)?,
                    trend: row.get(9)?,
                    model_id: row.get(10)?,
                })
            })?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(records)
    }

    /// Total number of stored snapshots.
    pub fn count_reports(&self) -> Result<i64, DbError> {
        let conn = self.conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM reports", [], |r| r.get(0))?)
    }
}

//! Report pipeline: gathers node, price and history data into a snapshot.

mod cards;
mod model;
mod narrative;

pub use cards::*;
pub use model::*;
pub use narrative::*;

use crate::analysis::{compute_score, compute_trend, Thresholds};
use crate::cache::TtlCell;
use crate::config::ServerConfig;
use crate::db::{DbError, Store};
use crate::fallback::or_sentinel;
use crate::node::HealthMonitor;
use crate::price::PriceFeed;
use crate::wallet::AddressResolver;

use chrono::{DateTime, SubsecRound, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Report generation error types.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("report store error: {0}")]
    Store(#[from] DbError),
}

/// Current UTC time truncated to whole seconds.
pub fn now_seconds() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Settings the pipeline reads on every run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub network: String,
    pub report_ttl: Duration,
    pub trend_window: usize,
    pub thresholds: Thresholds,
}

impl From<&ServerConfig> for PipelineSettings {
    fn from(cfg: &ServerConfig) -> Self {
        Self {
            network: cfg.network_name.clone(),
            report_ttl: Duration::from_secs(cfg.report_ttl_secs),
            trend_window: cfg.trend_window,
            thresholds: Thresholds::from(cfg),
        }
    }
}

/// Builds, persists and caches report snapshots.
pub struct ReportPipeline {
    settings: PipelineSettings,
    wallet: Arc<dyn AddressResolver>,
    monitor: HealthMonitor,
    price: PriceFeed,
    store: Arc<Store>,
    last_report: TtlCell<ReportSnapshot>,
}

impl ReportPipeline {
    pub fn new(
        settings: PipelineSettings,
        wallet: Arc<dyn AddressResolver>,
        monitor: HealthMonitor,
        price: PriceFeed,
        store: Arc<Store>,
    ) -> Self {
        let last_report = TtlCell::new(settings.report_ttl);
        Self {
            settings,
            wallet,
            monitor,
            price,
            store,
            last_report,
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.settings.thresholds
    }

    pub fn has_secondary(&self) -> bool {
        self.monitor.has_secondary()
    }

    pub fn cache_ttls(&self) -> CacheTtls {
        CacheTtls {
            report_ttl: self.settings.report_ttl.as_secs(),
            price_cache_ttl: self.price.ttl().as_secs(),
        }
    }

    /// Return the cached report while it is fresh, otherwise build a new one.
    ///
    /// `force` always builds and persists a new snapshot.
    pub async fn generate_report(&self, force: bool) -> Result<ReportSnapshot, ReportError> {
        self.last_report
            .try_get_or_refresh(force, || self.build_report())
            .await
    }

    async fn build_report(&self) -> Result<ReportSnapshot, ReportError> {
        let address = self.wallet.resolve_address();

        let rpc_health = self.monitor.check_health().await;
        let rpc_used = rpc_health.using;
        let client = self.monitor.client(rpc_used);

        let (block_number, balance_eth, price) = tokio::join!(
            or_sentinel("block number read", client.block_number(), 0),
            or_sentinel("balance read", client.balance_ether(&address), 0.0),
            self.price.get_price(),
        );
        let price_ok = price > 0.0;

        let history = self.store.fetch_history(self.settings.trend_window)?;
        let trend = compute_trend(&history, price);

        let thresholds = &self.settings.thresholds;
        let outcome = compute_score(balance_eth, price, &rpc_health, &trend, price_ok, thresholds);

        let cards = build_action_cards(&address, balance_eth, outcome.score, thresholds);
        let report_text = render_report(&NarrativeInput {
            address: &address,
            balance_eth,
            price_usd: if price_ok { price } else { 0.0 },
            score: outcome.score,
            trend: &trend,
            alerts: &outcome.alerts,
            recommendations: &outcome.recommendations,
        });

        let snapshot = ReportSnapshot {
            created_at: now_seconds(),
            address,
            network: self.settings.network.clone(),
            rpc_used,
            block_number,
            balance_eth,
            eth_price_usd: price_ok.then_some(price),
            trend: trend.trend,
            trend_pct: trend.pct,
            score: outcome.score,
            alerts: outcome.alerts,
            recommendations: outcome.recommendations,
            ai_status: STATUS_TEXT_MODE.to_string(),
            model_id: MODEL_ID.to_string(),
            report_text,
            cards,
            rpc_health,
            cache: self.cache_ttls(),
        };

        let id = self.store.insert_report(&snapshot)?;
        tracing::info!(
            "Stored report #{} for {} (score {}, trend {}, rpc {})",
            id,
            short_address(&snapshot.address),
            snapshot.score,
            snapshot.trend,
            snapshot.rpc_used
        );

        Ok(snapshot)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Trend;
    use crate::node::testing::{healthy_node, DEAD_ENDPOINT};
    use crate::node::{EndpointRole, RpcClient};
    use crate::wallet::FixedAddress;
    use serde_json::json;
    use tempfile::NamedTempFile;
    use tokio_test::assert_ok;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ADDRESS: &str = "0x845E03a741372F5b10626354898C124237c44917";
    // 0.0005 ether, below the critical threshold.
    const CRITICAL_BALANCE_WEI: &str = "0x1c6bf52634000";
    // 5 ether
    const HEALTHY_BALANCE_WEI: &str = "0x4563918244f40000";

    struct Harness {
        pipeline: ReportPipeline,
        store: Arc<Store>,
        _db: NamedTempFile,
    }

    async fn price_server(body: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(body).mount(&server).await;
        server
    }

    async fn quoting(price: f64) -> MockServer {
        price_server(
            ResponseTemplate::new(200).set_body_json(json!({ "ethereum": { "usd": price } })),
        )
        .await
    }

    fn harness(primary: &str, secondary: Option<&str>, price_url: &str) -> Harness {
        let db = NamedTempFile::new().unwrap();
        let store = Arc::new(Store::new(db.path()).unwrap());
        let timeout = Duration::from_secs(2);
        let monitor = HealthMonitor::new(
            RpcClient::new(primary, timeout).unwrap(),
            secondary.map(|url| RpcClient::new(url, timeout).unwrap()),
            Duration::from_secs(30),
        );
        let price = PriceFeed::new(price_url, "ethereum", "usd", timeout, Duration::from_secs(60))
            .unwrap();
        let settings = PipelineSettings {
            network: "Base Mainnet".to_string(),
            report_ttl: Duration::from_secs(60),
            trend_window: 10,
            thresholds: Thresholds::default(),
        };
        let pipeline = ReportPipeline::new(
            settings,
            Arc::new(FixedAddress(ADDRESS.to_string())),
            monitor,
            price,
            store.clone(),
        );
        Harness {
            pipeline,
            store,
            _db: db,
        }
    }

    #[tokio::test]
    async fn test_healthy_report() {
        let node = healthy_node("0x2a", HEALTHY_BALANCE_WEI).await;
        let price = quoting(3000.0).await;
        let h = harness(&node.uri(), None, &price.uri());

        let report = assert_ok!(h.pipeline.generate_report(false).await);
        assert_eq!(report.address, ADDRESS);
        assert_eq!(report.block_number, 42);
        assert_eq!(report.balance_eth, 5.0);
        assert_eq!(report.eth_price_usd, Some(3000.0));
        assert_eq!(report.rpc_used, EndpointRole::Primary);
        assert_eq!(report.score, 0);
        assert!(report.alerts.is_empty());
        assert_eq!(report.trend, Trend::Undefined);
        assert_eq!(report.model_id, MODEL_ID);
        assert_eq!(report.cards.len(), 1);
        assert!(report.report_text.contains("$15000.00 USD"));
        assert_eq!(report.created_at.timestamp_subsec_nanos(), 0);
        assert_eq!(h.store.count_reports().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cached_within_ttl_writes_one_row() {
        let node = healthy_node("0x2a", HEALTHY_BALANCE_WEI).await;
        let price = quoting(3000.0).await;
        let h = harness(&node.uri(), None, &price.uri());

        let first = h.pipeline.generate_report(false).await.unwrap();
        let second = h.pipeline.generate_report(false).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(h.store.count_reports().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_force_writes_new_row() {
        let node = healthy_node("0x2a", HEALTHY_BALANCE_WEI).await;
        let price = quoting(3000.0).await;
        let h = harness(&node.uri(), None, &price.uri());

        h.pipeline.generate_report(false).await.unwrap();
        h.pipeline.generate_report(true).await.unwrap();
        assert_eq!(h.store.count_reports().unwrap(), 2);

        // The forced report replaces the cached one.
        h.pipeline.generate_report(false).await.unwrap();
        assert_eq!(h.store.count_reports().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_trend_uses_stored_prices() {
        let node = healthy_node("0x2a", HEALTHY_BALANCE_WEI).await;
        let price = quoting(3000.0).await;
        let h = harness(&node.uri(), None, &price.uri());

        let mut older = testing::sample_snapshot();
        older.eth_price_usd = Some(2000.0);
        h.store.insert_report(&older).unwrap();

        let report = h.pipeline.generate_report(false).await.unwrap();
        assert_eq!(report.trend, Trend::Rising);
        assert!((report.trend_pct - 50.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_trend_reads_only_the_configured_window() {
        let node = healthy_node("0x2a", HEALTHY_BALANCE_WEI).await;
        let price = quoting(3000.0).await;
        let h = harness(&node.uri(), None, &price.uri());

        // Oldest row falls outside the 10-row window.
        let mut seeded = vec![500.0, 2000.0];
        seeded.extend([2500.0; 9]);
        for p in seeded {
            let mut row = testing::sample_snapshot();
            row.eth_price_usd = Some(p);
            h.store.insert_report(&row).unwrap();
        }

        let report = h.pipeline.generate_report(false).await.unwrap();
        assert_eq!(report.trend, Trend::Rising);
        // Baseline is the 10th-newest price, 2000.
        assert!((report.trend_pct - 50.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_malformed_price_degrades() {
        let node = healthy_node("0x2a", HEALTHY_BALANCE_WEI).await;
        let price = price_server(ResponseTemplate::new(200).set_body_string("<html>oops")).await;
        let h = harness(&node.uri(), None, &price.uri());

        let report = assert_ok!(h.pipeline.generate_report(false).await);
        assert_eq!(report.eth_price_usd, None);
        assert_eq!(report.score, 15);
        assert_eq!(report.alerts, vec!["ETH price unavailable."]);
        assert!(report.report_text.contains("$0.00 USD"));

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["eth_price_usd"].is_null());
    }

    #[tokio::test]
    async fn test_both_endpoints_down() {
        let price = quoting(3000.0).await;
        let h = harness(DEAD_ENDPOINT, Some("http://127.0.0.1:2"), &price.uri());

        let report = assert_ok!(h.pipeline.generate_report(false).await);
        assert_eq!(report.rpc_used, EndpointRole::Primary);
        assert!(!report.rpc_health.primary.ok);
        assert!(!report.rpc_health.secondary.as_ref().unwrap().ok);
        assert_eq!(report.balance_eth, 0.0);
        assert_eq!(report.block_number, 0);
        // 45 (critical balance) + 50 (primary down)
        assert_eq!(report.score, 95);
        assert!(report.alerts.contains(&"Primary RPC unavailable.".to_string()));
        assert_eq!(report.cards.len(), 3);
    }

    #[tokio::test]
    async fn test_secondary_serves_reads_when_primary_down() {
        let node = healthy_node("0x2a", CRITICAL_BALANCE_WEI).await;
        let price = quoting(3000.0).await;
        let h = harness(DEAD_ENDPOINT, Some(&node.uri()), &price.uri());

        let report = h.pipeline.generate_report(false).await.unwrap();
        assert_eq!(report.rpc_used, EndpointRole::Secondary);
        assert_eq!(report.block_number, 42);
        assert!((report.balance_eth - 0.0005).abs() < 1e-12);
        assert_eq!(report.score, 95);
        assert_eq!(report.alerts.len(), 3);
        assert_eq!(report.alerts[2], "High score (95): attention required.");
    }

    #[test]
    fn test_placeholder_is_well_formed() {
        let ttls = CacheTtls {
            report_ttl: 60,
            price_cache_ttl: 60,
        };
        let p = ReportSnapshot::placeholder("disk full", "Base Mainnet", "https://rpc", ttls);
        assert_eq!(p.ai_status, STATUS_ERROR);
        assert_eq!(p.report_text, "Recovered error: disk full");
        assert_eq!(p.eth_price_usd, None);
        assert_eq!(p.trend, Trend::Undefined);
        assert_eq!(p.balance_usd(), 0.0);
    }
}

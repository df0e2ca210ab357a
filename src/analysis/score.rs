//! Composite risk score with matching alerts and recommendations.

use super::TrendInfo;
use crate::config::ServerConfig;
use crate::node::RpcHealth;

pub const CRITICAL_BALANCE_POINTS: i32 = 45;
pub const LOW_BALANCE_POINTS: i32 = 25;
pub const PRIMARY_DOWN_POINTS: i32 = 50;
pub const PRICE_UNAVAILABLE_POINTS: i32 = 15;

/// Balance and score thresholds used by the score and the action cards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub low_balance: f64,
    pub critical_balance: f64,
    pub alert_score: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low_balance: 0.002,
            critical_balance: 0.001,
            alert_score: 70,
        }
    }
}

impl From<&ServerConfig> for Thresholds {
    fn from(cfg: &ServerConfig) -> Self {
        Self {
            low_balance: cfg.low_gas_threshold,
            critical_balance: cfg.critical_gas_threshold,
            alert_score: cfg.alert_score_threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    /// Clamped to 0..=100.
    pub score: u8,
    pub alerts: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Score the wallet's operational risk.
///
/// Rules apply in a fixed order and each one that fires appends one alert and
/// one recommendation. The high-score rule looks at the unclamped sum of the
/// earlier rules and adds no points of its own.
pub fn compute_score(
    balance: f64,
    price: f64,
    health: &RpcHealth,
    _trend: &TrendInfo,
    price_ok: bool,
    thresholds: &Thresholds,
) -> ScoreOutcome {
    let mut score: i32 = 0;
    let mut alerts = Vec::new();
    let mut recommendations = Vec::new();

    if balance < thresholds.critical_balance {
        score += CRITICAL_BALANCE_POINTS;
        alerts.push("Critical gas: balance is very low.".to_string());
        recommendations.push("Top up the wallet balance (gas).".to_string());
    } else if balance < thresholds.low_balance {
        score += LOW_BALANCE_POINTS;
        alerts.push("Low gas: balance is near the limit.".to_string());
        recommendations.push("Add an ETH buffer.".to_string());
    }

    // Primary degradation is flagged even when the secondary serves reads.
    if !health.primary.ok {
        score += PRIMARY_DOWN_POINTS;
        alerts.push("Primary RPC unavailable.".to_string());
        recommendations.push("Check your RPC connection.".to_string());
    }

    if !price_ok || price <= 0.0 {
        score += PRICE_UNAVAILABLE_POINTS;
        alerts.push("ETH price unavailable.".to_string());
        recommendations.push("Check the price cache.".to_string());
    }

    if i64::from(score) >= i64::from(thresholds.alert_score) {
        alerts.push(format!("High score ({}): attention required.", score));
        recommendations.push("Run preventive maintenance.".to_string());
    }

    ScoreOutcome {
        score: score.clamp(0, 100) as u8,
        alerts,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{EndpointRole, NodeHealth};

    fn health(primary_ok: bool, secondary_ok: Option<bool>) -> RpcHealth {
        let node = |url: &str, ok: bool| NodeHealth {
            url: url.to_string(),
            ok,
            latency_ms: Some(12),
            error: (!ok).then(|| "connection refused".to_string()),
            block: ok.then_some(100),
        };
        RpcHealth::select(
            node("http://primary", primary_ok),
            secondary_ok.map(|ok| node("http://secondary", ok)),
        )
    }

    fn score(balance: f64, price: f64, primary_ok: bool) -> ScoreOutcome {
        compute_score(
            balance,
            price,
            &health(primary_ok, None),
            &TrendInfo::UNDEFINED,
            price > 0.0,
            &Thresholds::default(),
        )
    }

    #[test]
    fn test_healthy_wallet_scores_zero() {
        let out = score(1.0, 3000.0, true);
        assert_eq!(out.score, 0);
        assert!(out.alerts.is_empty());
        assert!(out.recommendations.is_empty());
    }

    #[test]
    fn test_balance_bands() {
        for balance in [0.0, 0.0005, 0.000999] {
            let out = score(balance, 3000.0, true);
            assert!(out.score >= 45, "balance {} scored {}", balance, out.score);
        }
        for balance in [0.001, 0.0015, 0.001999] {
            let out = score(balance, 3000.0, true);
            assert_eq!(out.score, 25, "balance {}", balance);
        }
        for balance in [0.002, 0.5, 10.0] {
            assert_eq!(score(balance, 3000.0, true).score, 0, "balance {}", balance);
        }
    }

    #[test]
    fn test_maximal_case_is_clamped() {
        let out = score(0.0, 0.0, false);
        assert_eq!(out.score, 100);
        assert_eq!(
            out.alerts,
            vec![
                "Critical gas: balance is very low.",
                "Primary RPC unavailable.",
                "ETH price unavailable.",
                "High score (110): attention required.",
            ]
        );
        assert_eq!(out.recommendations.len(), out.alerts.len());
        assert_eq!(out.recommendations[3], "Run preventive maintenance.");
    }

    #[test]
    fn test_high_score_threshold_uses_running_total() {
        // 25 (low) + 50 (primary) = 75 >= 70
        let out = score(0.0015, 3000.0, false);
        assert_eq!(out.score, 75);
        assert_eq!(out.alerts.len(), 3);
        assert_eq!(out.alerts[2], "High score (75): attention required.");

        // 50 + 15 = 65 < 70
        let out = score(1.0, 0.0, false);
        assert_eq!(out.score, 65);
        assert_eq!(out.alerts.len(), 2);
    }

    #[test]
    fn test_primary_down_penalised_while_secondary_in_use() {
        let h = health(false, Some(true));
        assert_eq!(h.using, EndpointRole::Secondary);

        let out = compute_score(1.0, 3000.0, &h, &TrendInfo::UNDEFINED, true, &Thresholds::default());
        assert_eq!(out.score, 50);
        assert_eq!(out.alerts, vec!["Primary RPC unavailable."]);
    }

    #[test]
    fn test_price_ok_flag_is_honoured() {
        let out = compute_score(
            1.0,
            3000.0,
            &health(true, None),
            &TrendInfo::UNDEFINED,
            false,
            &Thresholds::default(),
        );
        assert_eq!(out.score, 15);
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = Thresholds {
            low_balance: 1.0,
            critical_balance: 0.5,
            alert_score: 20,
        };
        let out = compute_score(
            0.75,
            3000.0,
            &health(true, None),
            &TrendInfo::UNDEFINED,
            true,
            &thresholds,
        );
        assert_eq!(out.score, 25);
        assert_eq!(out.alerts.len(), 2);
    }

    #[test]
    fn test_huge_alert_threshold_never_fires() {
        let thresholds = Thresholds {
            alert_score: u32::MAX,
            ..Thresholds::default()
        };
        let out = compute_score(
            0.0,
            0.0,
            &health(false, None),
            &TrendInfo::UNDEFINED,
            false,
            &thresholds,
        );
        assert_eq!(out.score, 100);
        assert_eq!(out.alerts.len(), 3);
        assert!(!out.alerts.iter().any(|a| a.starts_with("High score")));
    }
}

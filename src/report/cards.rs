//! Presentational action cards derived from a computed report.

use crate::analysis::Thresholds;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardLevel {
    Success,
    Critical,
}

impl CardLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardLevel::Success => "success",
            CardLevel::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionCard {
    pub level: CardLevel,
    pub title: String,
    pub why: String,
    pub action: String,
    pub cta_label: String,
    pub cta_value: String,
    pub hint: String,
}

/// The informational card comes first, then the critical-balance and
/// high-risk cards when they apply.
pub fn build_action_cards(
    address: &str,
    balance_eth: f64,
    score: u8,
    thresholds: &Thresholds,
) -> Vec<ActionCard> {
    let mut cards = vec![ActionCard {
        level: CardLevel::Success,
        title: "Agent: analysis mode".to_string(),
        why: "Watching wallet balance, node health and market conditions.".to_string(),
        action: "Automatic execution is disabled; this dashboard is read-only.".to_string(),
        cta_label: "Intent log".to_string(),
        cta_value: "ANALYSIS ONLY".to_string(),
        hint: "No keys are used for signing.".to_string(),
    }];

    if balance_eth < thresholds.critical_balance {
        cards.push(ActionCard {
            level: CardLevel::Critical,
            title: "CRITICAL GAS".to_string(),
            why: format!("Balance {:.5} ETH is very low.", balance_eth),
            action: "Top up the wallet.".to_string(),
            cta_label: "Address".to_string(),
            cta_value: address.to_string(),
            hint: "Transactions may fail.".to_string(),
        });
    }

    if score as u32 >= thresholds.alert_score {
        cards.push(ActionCard {
            level: CardLevel::Critical,
            title: "High operational risk".to_string(),
            why: format!("Score {} indicates problems.", score),
            action: "Check the RPC endpoint and the balance.".to_string(),
            cta_label: "Checklist".to_string(),
            cta_value: "RPC | GAS".to_string(),
            hint: "System degraded.".to_string(),
        });
    }

    cards
}

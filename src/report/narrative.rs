//! Plain-text report narrative.

use crate::analysis::TrendInfo;

/// Inputs for the narrative, borrowed from the report being assembled.
pub struct NarrativeInput<'a> {
    pub address: &'a str,
    pub balance_eth: f64,
    /// `0.0` when no price is available.
    pub price_usd: f64,
    pub score: u8,
    pub trend: &'a TrendInfo,
    pub alerts: &'a [String],
    pub recommendations: &'a [String],
}

/// `0x845E…4917` style abbreviation; short inputs are returned unchanged.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() < 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

fn bullets(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        return format!("  • {}", empty);
    }
    items
        .iter()
        .map(|item| format!("  • {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_report(input: &NarrativeInput<'_>) -> String {
    let top_recommendations = &input.recommendations[..input.recommendations.len().min(3)];

    let report = format!(
        "EXECUTIVE REPORT (walletwatch)\n\
         \n\
         Summary:\n\
         • Address: {address}\n\
         • Balance: {balance:.4} ETH\n\
         • Value: ${value:.2} USD\n\
         • Risk score: {score}/100\n\
         \n\
         Market:\n\
         • ETH: ${price:.2}\n\
         • Trend: {trend} ({pct:+.2}%)\n\
         \n\
         Alerts:\n\
         {alerts}\n\
         \n\
         Recommended actions:\n\
         {recommendations}\n\
         \n\
         ---\n\
         Note: running in read-only safe mode.",
        address = short_address(input.address),
        balance = input.balance_eth,
        value = input.balance_eth * input.price_usd,
        score = input.score,
        price = input.price_usd,
        trend = input.trend.trend,
        pct = input.trend.pct,
        alerts = bullets(input.alerts, "System stable"),
        recommendations = bullets(top_recommendations, "Keep monitoring"),
    );

    report.trim().to_string()
}

//! Price trend classification over the recent history window.

use crate::db::HistoryRecord;

use serde::Serialize;
use std::fmt;

/// Moves smaller than this percentage either way count as sideways.
pub const TREND_BAND_PCT: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Sideways,
    Undefined,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Rising => "rising",
            Trend::Falling => "falling",
            Trend::Sideways => "sideways",
            Trend::Undefined => "undefined",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendInfo {
    pub trend: Trend,
    pub pct: f64,
}

impl TrendInfo {
    pub const UNDEFINED: TrendInfo = TrendInfo {
        trend: Trend::Undefined,
        pct: 0.0,
    };
}

/// Classify the price move from the oldest usable point to the newest.
///
/// `history` is newest-first, as returned by the store. Non-positive or
/// missing prices are skipped. `current_price` is appended last when positive.
pub fn compute_trend(history: &[HistoryRecord], current_price: f64) -> TrendInfo {
    let mut prices: Vec<f64> = history
        .iter()
        .rev()
        .filter_map(|r| r.eth_price_usd)
        .filter(|p| *p > 0.0)
        .collect();

    if current_price > 0.0 {
        prices.push(current_price);
    }

    let (first, last) = match (prices.first(), prices.last()) {
        (Some(first), Some(last)) if prices.len() >= 2 => (*first, *last),
        _ => return TrendInfo::UNDEFINED,
    };

    let pct = (last - first) / first * 100.0;
    let trend = if pct > TREND_BAND_PCT {
        Trend::Rising
    } else if pct < -TREND_BAND_PCT {
        Trend::Falling
    } else {
        Trend::Sideways
    };

    TrendInfo { trend, pct }
}

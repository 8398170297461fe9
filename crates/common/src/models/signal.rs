use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSide {
    Long,
    Short,
}

/// Where a signal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    Tradingview,
    Scanner,
    AiForecast,
}

/// A trade opportunity. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub id: String,
    pub user_id: String,
    pub src: SignalSource,
    pub ticker: String,
    pub side: SignalSide,
    pub entry: f64,
    pub stop: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rvol: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalyst: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl TradeSignal {
    /// Distance between entry and stop, in price units.
    pub fn risk_per_share(&self) -> f64 {
        (self.entry - self.stop).abs()
    }

    /// JSON has no NaN or infinity, so a record failing this cannot be
    /// stored and read back.
    pub fn has_finite_prices(&self) -> bool {
        self.entry.is_finite()
            && self.stop.is_finite()
            && self.rvol.is_none_or(|r| r.is_finite())
    }
}

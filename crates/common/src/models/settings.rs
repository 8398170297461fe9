use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Broker {
    Alpaca,
    Binance,
    Ibkr,
}

impl fmt::Display for Broker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Broker::Alpaca => f.write_str("alpaca"),
            Broker::Binance => f.write_str("binance"),
            Broker::Ibkr => f.write_str("ibkr"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    Paper,
    Live,
}

impl fmt::Display for TradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradingMode::Paper => f.write_str("paper"),
            TradingMode::Live => f.write_str("live"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSizeModel {
    FixedRisk,
    FixedQty,
    PercentAccount,
}

/// Credential block for one third-party provider (broker, market data, news).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub broker: Broker,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpaca_paper_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpaca_paper_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpaca_live_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpaca_live_secret: Option<String>,
    /// Keyed by provider id (`alpaca`, `polygon`, `benzinga`, ...).
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderCredentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_key: Option<String>,
}

impl ApiConfig {
    /// Key/secret pair for the given mode, if both halves are present.
    pub fn alpaca_credentials(&self, mode: TradingMode) -> (Option<&str>, Option<&str>) {
        match mode {
            TradingMode::Paper => (
                self.alpaca_paper_key.as_deref(),
                self.alpaca_paper_secret.as_deref(),
            ),
            TradingMode::Live => (
                self.alpaca_live_key.as_deref(),
                self.alpaca_live_secret.as_deref(),
            ),
        }
    }
}

/// Risk, strategy and API configuration for the signed-in user.
///
/// The numeric risk fields are kept as JSON numbers so that whatever a form
/// or an old persisted blob carries can be represented and then rejected by
/// validation, instead of failing to deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub user_id: String,
    pub auto_trade_enabled: bool,
    pub paper_trading: bool,
    pub daily_max_loss: f64,
    pub risk_per_trade: f64,
    pub max_open_trades: f64,
    pub strategy_name: String,
    pub position_size_model: PositionSizeModel,
    pub tp1_percentage: f64,
    pub tp2_percentage: f64,
    pub tp1_offset: f64,
    pub tp2_offset: f64,
    pub sl1_offset: f64,
    pub sl2_offset: f64,
    pub move_sl_to_be_after_tp1: bool,
    pub api_config: ApiConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserSettings {
    pub fn trading_mode(&self) -> TradingMode {
        if self.paper_trading {
            TradingMode::Paper
        } else {
            TradingMode::Live
        }
    }
}

//! Canned records used for demo entry and as storage fallbacks.

use std::collections::BTreeMap;

use chrono::{Duration, Utc};

use crate::models::{
    ApiConfig, Broker, Plan, PositionSizeModel, SignalSide, SignalSource, TradeSignal,
    UserProfile, UserSettings,
};

pub const DEMO_USER_ID: &str = "u-123";

pub fn demo_profile() -> UserProfile {
    UserProfile {
        id: DEMO_USER_ID.to_string(),
        email: "demo@govelites.com".to_string(),
        name: "Alex Trader".to_string(),
        plan: Plan::Pro,
        avatar_url: None,
    }
}

pub fn default_settings() -> UserSettings {
    UserSettings {
        user_id: DEMO_USER_ID.to_string(),
        auto_trade_enabled: false,
        paper_trading: true,
        daily_max_loss: 250.0,
        risk_per_trade: 83.33,
        max_open_trades: 3.0,
        strategy_name: "Trader1 Scale-Out".to_string(),
        position_size_model: PositionSizeModel::FixedRisk,
        tp1_percentage: 60.0,
        tp2_percentage: 40.0,
        tp1_offset: 0.15,
        tp2_offset: 0.30,
        sl1_offset: 0.075,
        sl2_offset: 0.15,
        move_sl_to_be_after_tp1: true,
        api_config: ApiConfig {
            broker: Broker::Alpaca,
            alpaca_paper_key: Some("PK_TEST_123456789".to_string()),
            alpaca_paper_secret: Some("sk_test_****************".to_string()),
            alpaca_live_key: None,
            alpaca_live_secret: None,
            providers: BTreeMap::new(),
            openai_key: None,
            gemini_key: None,
        },
        created_at: None,
    }
}

/// Three seed signals, newest first.
pub fn demo_signals() -> Vec<TradeSignal> {
    let now = Utc::now();
    vec![
        TradeSignal {
            id: "s-1".to_string(),
            user_id: DEMO_USER_ID.to_string(),
            src: SignalSource::Scanner,
            ticker: "NVDA".to_string(),
            side: SignalSide::Long,
            entry: 132.50,
            stop: 130.00,
            reason: Some("Breakout above VWAP".to_string()),
            rvol: Some(2.5),
            catalyst: Some("Earnings anticipation".to_string()),
            received_at: now - Duration::minutes(5),
        },
        TradeSignal {
            id: "s-2".to_string(),
            user_id: DEMO_USER_ID.to_string(),
            src: SignalSource::Tradingview,
            ticker: "TSLA".to_string(),
            side: SignalSide::Short,
            entry: 215.00,
            stop: 218.50,
            reason: Some("Resistance rejection at daily high".to_string()),
            rvol: Some(1.8),
            catalyst: None,
            received_at: now - Duration::minutes(45),
        },
        TradeSignal {
            id: "s-3".to_string(),
            user_id: DEMO_USER_ID.to_string(),
            src: SignalSource::Scanner,
            ticker: "AMD".to_string(),
            side: SignalSide::Long,
            entry: 160.20,
            stop: 158.00,
            reason: Some("Sector sympathy move".to_string()),
            rvol: Some(1.2),
            catalyst: None,
            received_at: now - Duration::minutes(120),
        },
    ]
}

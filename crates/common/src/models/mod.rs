pub mod market;
pub mod settings;
pub mod signal;
pub mod toast;
pub mod user;
pub mod view;

pub use market::{Macd, MarketScanResult, NewsItem, Sentiment, TechnicalIndicator, Trend};
pub use settings::{
    ApiConfig, Broker, PositionSizeModel, ProviderCredentials, TradingMode, UserSettings,
};
pub use signal::{SignalSide, SignalSource, TradeSignal};
pub use toast::{Toast, ToastKind};
pub use user::{Plan, UserProfile};
pub use view::View;

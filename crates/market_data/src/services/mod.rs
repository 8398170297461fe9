use common::models::TradeSignal;

pub mod signal_feed;

pub use signal_feed::SignalFeedSimulator;

/// Records pushed from market-side actors to the session.
#[derive(Debug, Clone)]
pub enum MarketEvent {
    Signal(TradeSignal),
}

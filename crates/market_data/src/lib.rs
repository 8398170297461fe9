pub mod services;

pub use services::{MarketEvent, SignalFeedSimulator};

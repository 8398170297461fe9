use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use common::{
    actors::{Actor, ActorType},
    config::FeedConfig,
    models::{SignalSide, SignalSource, TradeSignal},
};

use crate::services::MarketEvent;

pub const TICKER_UNIVERSE: [&str; 7] = ["AAPL", "MSFT", "GOOGL", "AMZN", "META", "COIN", "NVDA"];

const SIMULATED_REASON: &str = "AI Pattern Recognition: Bull Flag";

/// Synthetic signal generator for the signed-in session.
///
/// Every `interval` it rolls once against `emit_probability` and, on a hit,
/// sends one `MarketEvent::Signal`. The actor stops on its own when the
/// receiving side is dropped.
pub struct SignalFeedSimulator {
    id: Uuid,
    user_id: String,
    config: FeedConfig,
    rng: StdRng,
    market_tx: mpsc::UnboundedSender<MarketEvent>,
    emitted: u64,
}

#[async_trait]
impl Actor for SignalFeedSimulator {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::SignalFeed
    }

    async fn run(&mut self) -> anyhow::Result<()> {
        info!(
            "Starting signal feed (every {:?}, p={})",
            self.config.interval, self.config.emit_probability
        );

        let mut ticker = time::interval_at(Instant::now() + self.config.interval, self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(signal) = self.maybe_emit() else {
                continue;
            };
            debug!("Simulated {} {:?} @ {}", signal.ticker, signal.side, signal.entry);

            if self.market_tx.send(MarketEvent::Signal(signal)).is_err() {
                info!("Signal feed receiver dropped. Stopping feed.");
                return Ok(());
            }
        }
    }
}

impl SignalFeedSimulator {
    pub fn new(
        user_id: impl Into<String>,
        config: FeedConfig,
        market_tx: mpsc::UnboundedSender<MarketEvent>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            config,
            rng: StdRng::from_entropy(),
            market_tx,
            emitted: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// One tick's worth of work: a signal with probability `emit_probability`.
    pub fn maybe_emit(&mut self) -> Option<TradeSignal> {
        let p = self.config.emit_probability.clamp(0.0, 1.0);
        if self.rng.gen_bool(p) {
            Some(self.generate_signal())
        } else {
            None
        }
    }

    pub fn generate_signal(&mut self) -> TradeSignal {
        self.emitted += 1;
        let received_at = Utc::now();

        let ticker = TICKER_UNIVERSE[self.rng.gen_range(0..TICKER_UNIVERSE.len())];
        let side = if self.rng.gen_bool(0.5) {
            SignalSide::Long
        } else {
            SignalSide::Short
        };
        let src = if self.rng.gen_bool(0.5) {
            SignalSource::Scanner
        } else {
            SignalSource::Tradingview
        };
        let rvol = (self.rng.gen_range(0.0..5.0_f64) * 10.0).round() / 10.0;

        TradeSignal {
            id: format!("s-{}-{}", received_at.timestamp_millis(), self.emitted),
            user_id: self.user_id.clone(),
            src,
            ticker: ticker.to_string(),
            side,
            entry: f64::from(self.rng.gen_range(100..300_u32)),
            stop: f64::from(self.rng.gen_range(90..290_u32)),
            reason: Some(SIMULATED_REASON.to_string()),
            rvol: Some(rvol),
            catalyst: None,
            received_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::actors::TaskHandle;
    use std::collections::HashSet;
    use std::time::Duration;

    fn always() -> FeedConfig {
        FeedConfig {
            interval: Duration::from_secs(15),
            emit_probability: 1.0,
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<MarketEvent>) -> Vec<TradeSignal> {
        let mut out = Vec::new();
        while let Ok(MarketEvent::Signal(signal)) = rx.try_recv() {
            out.push(signal);
        }
        out
    }

    #[test]
    fn test_generated_signals_are_schema_valid() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut feed = SignalFeedSimulator::new("u-123", always(), tx).with_seed(7);

        let mut ids = HashSet::new();
        for _ in 0..200 {
            let s = feed.generate_signal();
            assert!(TICKER_UNIVERSE.contains(&s.ticker.as_str()));
            assert!((100.0..300.0).contains(&s.entry));
            assert!((90.0..290.0).contains(&s.stop));
            let rvol = s.rvol.unwrap();
            assert!((0.0..=5.0).contains(&rvol));
            assert_eq!(s.user_id, "u-123");
            assert!(ids.insert(s.id.clone()), "duplicate id {}", s.id);
        }
    }

    #[test]
    fn test_zero_probability_never_emits() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let config = FeedConfig {
            emit_probability: 0.0,
            ..always()
        };
        let mut feed = SignalFeedSimulator::new("u-123", config, tx).with_seed(1);
        assert!((0..1000).all(|_| feed.maybe_emit().is_none()));
    }

    #[test]
    fn test_emission_rate_tracks_probability() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let config = FeedConfig {
            emit_probability: 0.15,
            ..always()
        };
        let mut feed = SignalFeedSimulator::new("u-123", config, tx).with_seed(42);
        let hits = (0..10_000).filter(|_| feed.maybe_emit().is_some()).count();
        assert!((1200..1800).contains(&hits), "hits = {hits}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_emits_once_per_interval() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = TaskHandle::spawn(Box::new(
            SignalFeedSimulator::new("u-123", always(), tx).with_seed(3),
        ));

        time::sleep(Duration::from_secs(14)).await;
        assert!(drain(&mut rx).is_empty());

        time::sleep(Duration::from_secs(32)).await;
        assert_eq!(drain(&mut rx).len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_emission() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut handle = TaskHandle::spawn(Box::new(
            SignalFeedSimulator::new("u-123", always(), tx).with_seed(3),
        ));

        time::sleep(Duration::from_secs(16)).await;
        assert_eq!(drain(&mut rx).len(), 1);

        handle.cancel();
        time::sleep(Duration::from_secs(120)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_receiver_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = TaskHandle::spawn(Box::new(
            SignalFeedSimulator::new("u-123", always(), tx).with_seed(3),
        ));
        drop(rx);

        time::sleep(Duration::from_secs(16)).await;
        assert!(!handle.is_active());
    }
}

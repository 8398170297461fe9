use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use common::actors::{Actor, ActorType};

use crate::controller::ControlEvent;

/// One-shot dismiss timer for a single toast.
pub(crate) struct ToastTimer {
    id: Uuid,
    epoch: u64,
    toast_id: u64,
    duration: Duration,
    events_tx: mpsc::UnboundedSender<ControlEvent>,
}

impl ToastTimer {
    pub(crate) fn new(
        epoch: u64,
        toast_id: u64,
        duration: Duration,
        events_tx: mpsc::UnboundedSender<ControlEvent>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            toast_id,
            duration,
            events_tx,
        }
    }
}

#[async_trait]
impl Actor for ToastTimer {
    fn name(&self) -> ActorType {
        ActorType::ToastTimer
    }

    fn id(&self) -> Uuid {
        self.id
    }

    async fn run(&mut self) -> anyhow::Result<()> {
        tokio::time::sleep(self.duration).await;
        debug!("Toast {} expired", self.toast_id);
        // The controller may already be gone.
        let _ = self.events_tx.send(ControlEvent::ToastExpired {
            epoch: self.epoch,
            toast_id: self.toast_id,
        });
        Ok(())
    }
}

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, error};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorType {
    SignalFeed,
    ToastTimer,
    AnalysisJob,
    Session,
}

/// Background work owned by a scope. Actors never touch session state
/// directly; they only send messages back to whoever spawned them.
#[async_trait]
pub trait Actor: Send {
    fn name(&self) -> ActorType;

    fn id(&self) -> Uuid;

    /// The main loop of the actor. Returning ends the task.
    async fn run(&mut self) -> anyhow::Result<()>;
}

/// Owning handle to a spawned actor.
///
/// Dropping the handle aborts the task, so a scope that stores its handles
/// cannot leak a timer past its own lifetime.
#[derive(Debug)]
pub struct TaskHandle {
    id: Uuid,
    name: ActorType,
    handle: Option<JoinHandle<()>>,
}

impl TaskHandle {
    pub fn spawn(mut actor: Box<dyn Actor>) -> Self {
        let id = actor.id();
        let name = actor.name();
        let handle = tokio::spawn(async move {
            if let Err(e) = actor.run().await {
                error!("Actor {:?} ({}) crashed: {}", name, id, e);
            }
        });
        debug!("Spawned {:?} ({})", name, id);
        Self {
            id,
            name,
            handle: Some(handle),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> ActorType {
        self.name
    }

    /// True while the task has neither finished nor been cancelled.
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Aborts the task. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Cancelled {:?} ({})", self.name, self.id);
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

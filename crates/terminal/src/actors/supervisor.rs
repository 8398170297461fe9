use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use analysis::AnalysisService;
use session::{SessionController, SessionOptions};
use storage::PersistenceAdapter;

use crate::services::session_loop::Exit;

pub const CRASH_MESSAGE: &str = "Something went wrong.";
const RELOAD_HINT: &str = "Type `reload` to start again from saved data, or `quit` to exit.";

/// Error boundary around the interactive session.
///
/// Owns stdin and forwards lines to the session task. When that task panics
/// or fails, the user gets a short message and can rebuild the session from
/// persisted state with `reload`.
pub struct Supervisor {
    persistence: PersistenceAdapter,
    analysis: AnalysisService,
    options: SessionOptions,
    restarts: u32,
}

enum Ended {
    Clean(Exit),
    Crashed,
}

impl Supervisor {
    pub fn new(
        persistence: PersistenceAdapter,
        analysis: AnalysisService,
        options: SessionOptions,
    ) -> Self {
        Self {
            persistence,
            analysis,
            options,
            restarts: 0,
        }
    }

    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Runs sessions built by `session_fn` until the user quits or input ends.
    pub async fn start<R, F, Fut>(&mut self, lines: &mut Lines<R>, session_fn: F) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        F: Fn(SessionController, mpsc::Receiver<String>) -> Fut,
        Fut: Future<Output = anyhow::Result<Exit>> + Send + 'static,
    {
        loop {
            let controller = SessionController::bootstrap(
                self.persistence.clone(),
                self.analysis.clone(),
                self.options.clone(),
            )
            .await;

            let (cmd_tx, cmd_rx) = mpsc::channel::<String>(64);
            let task = tokio::spawn(session_fn(controller, cmd_rx));

            match self.watch(lines, cmd_tx, task).await? {
                Ended::Clean(exit) => {
                    info!("Session ended ({:?})", exit);
                    return Ok(());
                }
                Ended::Crashed => {
                    println!("{CRASH_MESSAGE}");
                    println!("{RELOAD_HINT}");
                }
            }

            if !wait_for_reload(lines).await? {
                return Ok(());
            }
            self.restarts += 1;
            warn!("Reloading session (restart #{})", self.restarts);
        }
    }

    async fn watch<R>(
        &self,
        lines: &mut Lines<R>,
        cmd_tx: mpsc::Sender<String>,
        mut task: JoinHandle<anyhow::Result<Exit>>,
    ) -> anyhow::Result<Ended>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut cmd_tx = Some(cmd_tx);
        let joined = loop {
            tokio::select! {
                biased;
                joined = &mut task => break joined,
                line = lines.next_line(), if cmd_tx.is_some() => {
                    match line? {
                        Some(line) => {
                            let delivered = match &cmd_tx {
                                Some(tx) => tx.send(line).await.is_ok(),
                                None => false,
                            };
                            if !delivered {
                                warn!("Session is not accepting input");
                            }
                        }
                        // Closing the channel lets the session finish on its own.
                        None => cmd_tx = None,
                    }
                }
            }
        };

        Ok(match joined {
            Ok(Ok(exit)) => Ended::Clean(exit),
            Ok(Err(e)) => {
                error!("Session failed: {:#}", e);
                Ended::Crashed
            }
            Err(e) => {
                error!("Session task panicked: {}", e);
                Ended::Crashed
            }
        })
    }
}

/// `true` for `reload`, `false` for `quit` or end of input.
async fn wait_for_reload<R>(lines: &mut Lines<R>) -> anyhow::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "reload" => return Ok(true),
            "quit" | "exit" => return Ok(false),
            _ => println!("{RELOAD_HINT}"),
        }
    }
    Ok(false)
}

use dotenvy::dotenv;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use analysis::AnalysisService;
use common::config::AppConfig;
use common::logger;
use session::SessionOptions;
use storage::{PersistenceAdapter, SqliteKvStore};

use crate::actors::supervisor::Supervisor;
use crate::services::command_service::HELP;
use crate::services::session_loop::run_session;

mod actors;
mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logger::setup_logger();
    debug!("Terminal starting up...");

    let config = AppConfig::from_env()?;
    let db_path = config.database_path();
    let store = SqliteKvStore::open(&db_path).await?;
    info!("Using {}", db_path.display());

    let persistence = PersistenceAdapter::new(Arc::new(store.clone()));
    let analysis = AnalysisService::from_config(&config.ai)?;

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut supervisor = Supervisor::new(persistence, analysis, SessionOptions::from(&config));
    let result = supervisor.start(&mut lines, run_session).await;

    store.close().await;
    result
}

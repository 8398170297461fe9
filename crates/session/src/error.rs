use thiserror::Error;

use crate::state::AppState;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Cannot {action} while in {from}")]
    InvalidTransition {
        from: AppState,
        action: &'static str,
    },
    #[error("Unknown signal: {0}")]
    UnknownSignal(String),
}

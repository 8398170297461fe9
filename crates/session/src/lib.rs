pub mod controller;
pub mod error;
pub mod state;
pub mod toast;

pub use controller::{NavigationOutcome, SessionController, SessionOptions, SessionUpdate};
pub use error::SessionError;
pub use state::{AppState, SessionState};

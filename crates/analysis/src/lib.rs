pub mod prompts;
pub mod remote;
pub mod service;
pub mod traits;

pub use prompts::AlertTrigger;
pub use service::{AnalysisService, EmailTemplate, HeadlineSentiment, ScanRating};
pub use traits::{AnalysisError, TextService};

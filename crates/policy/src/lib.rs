pub mod access;
pub mod credentials;
pub mod validation;

pub use access::{AccessPolicy, NavEntry, NavSection};
pub use validation::{SettingsField, ValidationResult, validate, validate_field};

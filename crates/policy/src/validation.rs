use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use common::models::UserSettings;
use serde::Serialize;
use thiserror::Error;

pub const MUST_BE_POSITIVE: &str = "must be positive";
pub const MUST_BE_POSITIVE_INTEGER: &str = "must be a positive integer";

/// Settings fields that carry validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsField {
    DailyMaxLoss,
    RiskPerTrade,
    MaxOpenTrades,
}

impl SettingsField {
    pub const ALL: [SettingsField; 3] = [
        SettingsField::DailyMaxLoss,
        SettingsField::RiskPerTrade,
        SettingsField::MaxOpenTrades,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingsField::DailyMaxLoss => "daily_max_loss",
            SettingsField::RiskPerTrade => "risk_per_trade",
            SettingsField::MaxOpenTrades => "max_open_trades",
        }
    }

    pub fn value(&self, settings: &UserSettings) -> f64 {
        match self {
            SettingsField::DailyMaxLoss => settings.daily_max_loss,
            SettingsField::RiskPerTrade => settings.risk_per_trade,
            SettingsField::MaxOpenTrades => settings.max_open_trades,
        }
    }

    /// Writes a raw value into a draft. Nothing is checked here.
    pub fn set(&self, settings: &mut UserSettings, value: f64) {
        match self {
            SettingsField::DailyMaxLoss => settings.daily_max_loss = value,
            SettingsField::RiskPerTrade => settings.risk_per_trade = value,
            SettingsField::MaxOpenTrades => settings.max_open_trades = value,
        }
    }

    fn check(&self, value: f64) -> Option<&'static str> {
        match self {
            // NaN fails both comparisons.
            SettingsField::DailyMaxLoss | SettingsField::RiskPerTrade => {
                if value > 0.0 { None } else { Some(MUST_BE_POSITIVE) }
            }
            SettingsField::MaxOpenTrades => {
                if value > 0.0 && value.fract() == 0.0 {
                    None
                } else {
                    Some(MUST_BE_POSITIVE_INTEGER)
                }
            }
        }
    }
}

impl fmt::Display for SettingsField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown settings field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for SettingsField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingsField::ALL
            .into_iter()
            .find(|f| f.as_str() == s.trim())
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// Per-field error messages. Empty means the settings may be committed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationResult {
    errors: BTreeMap<SettingsField, &'static str>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: SettingsField) -> Option<&'static str> {
        self.errors.get(&field).copied()
    }

    pub fn fields(&self) -> impl Iterator<Item = SettingsField> + '_ {
        self.errors.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SettingsField, &'static str)> + '_ {
        self.errors.iter().map(|(f, m)| (*f, *m))
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(field, msg)| format!("{field} {msg}")).collect();
        f.write_str(&parts.join(", "))
    }
}

pub fn validate(settings: &UserSettings) -> ValidationResult {
    let errors = SettingsField::ALL
        .into_iter()
        .filter_map(|field| validate_field(settings, field).map(|msg| (field, msg)))
        .collect();
    ValidationResult { errors }
}

/// Checks a single field with the same rule `validate` uses, for feedback
/// while the user is still editing.
pub fn validate_field(settings: &UserSettings, field: SettingsField) -> Option<&'static str> {
    field.check(field.value(settings))
}

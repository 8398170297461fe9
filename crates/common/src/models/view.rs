use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Named sections of the terminal.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum View {
    #[default]
    Dashboard,
    Signals,
    Scanner,
    Orders,
    Forecast,
    Analysis,
    Automation,
    Billing,
    Settings,
    Help,
}

impl View {
    pub const ALL: [View; 10] = [
        View::Dashboard,
        View::Signals,
        View::Scanner,
        View::Orders,
        View::Forecast,
        View::Analysis,
        View::Automation,
        View::Billing,
        View::Settings,
        View::Help,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Dashboard => "DASHBOARD",
            View::Signals => "SIGNALS",
            View::Scanner => "SCANNER",
            View::Orders => "ORDERS",
            View::Forecast => "FORECAST",
            View::Analysis => "ANALYSIS",
            View::Automation => "AUTOMATION",
            View::Billing => "BILLING",
            View::Settings => "SETTINGS",
            View::Help => "HELP",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown view: {0}")]
pub struct UnknownView(pub String);

impl FromStr for View {
    type Err = UnknownView;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        View::ALL
            .into_iter()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| UnknownView(s.to_string()))
    }
}

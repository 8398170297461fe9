use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Subscription tier. Tags this build does not know deserialize to `Unknown`
/// and are granted the `Free` view set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Starter,
    Pro,
    Elite,
    #[serde(other)]
    Unknown,
}

impl Plan {
    pub const KNOWN: [Plan; 4] = [Plan::Free, Plan::Starter, Plan::Pro, Plan::Elite];

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Starter => "starter",
            Plan::Pro => "pro",
            Plan::Elite => "elite",
            Plan::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "free" => Plan::Free,
            "starter" => Plan::Starter,
            "pro" => Plan::Pro,
            "elite" => Plan::Elite,
            _ => Plan::Unknown,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub plan: Plan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

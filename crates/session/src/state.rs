use std::collections::{BTreeSet, HashMap};
use std::fmt;

use common::models::{Plan, Toast, TradeSignal, UserProfile, UserSettings, View};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    #[default]
    Landing,
    Auth,
    Application,
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AppState::Landing => "LANDING",
            AppState::Auth => "AUTH",
            AppState::Application => "APPLICATION",
        })
    }
}

/// Upgrade hint shown after navigation to a view the plan does not cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockedPrompt {
    pub requested: View,
    pub required_plan: Plan,
}

/// Everything the session owns. Only `SessionController` mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub app_state: AppState,
    pub current_user: Option<UserProfile>,
    pub current_view: View,
    pub settings: UserSettings,
    /// Newest first.
    pub signals: Vec<TradeSignal>,
    pub toast: Option<Toast>,
    /// AI commentary keyed by signal id.
    pub analyses: HashMap<String, String>,
    pub analyzing: BTreeSet<String>,
    pub locked: Option<LockedPrompt>,
}

impl SessionState {
    pub fn new(settings: UserSettings, signals: Vec<TradeSignal>) -> Self {
        Self {
            app_state: AppState::Landing,
            current_user: None,
            current_view: View::Dashboard,
            settings,
            signals,
            toast: None,
            analyses: HashMap::new(),
            analyzing: BTreeSet::new(),
            locked: None,
        }
    }

    pub fn signal(&self, id: &str) -> Option<&TradeSignal> {
        self.signals.iter().find(|s| s.id == id)
    }

    /// Puts `batch` in front of the existing signals, keeping the batch order,
    /// then trims the oldest entries beyond `cap`. Returns how many were dropped.
    pub fn prepend_signals(&mut self, batch: Vec<TradeSignal>, cap: Option<usize>) -> usize {
        let mut signals = batch;
        signals.append(&mut self.signals);
        self.signals = signals;
        self.enforce_retention(cap)
    }

    pub fn enforce_retention(&mut self, cap: Option<usize>) -> usize {
        let Some(cap) = cap else {
            return 0;
        };
        if self.signals.len() <= cap {
            return 0;
        }
        let dropped: Vec<TradeSignal> = self.signals.drain(cap..).collect();
        for signal in &dropped {
            self.analyses.remove(&signal.id);
            self.analyzing.remove(&signal.id);
        }
        dropped.len()
    }
}

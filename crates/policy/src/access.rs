use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use common::models::{Plan, View};
use thiserror::Error;

/// Views every plan must keep, whatever else it unlocks.
pub const REQUIRED_VIEWS: [View; 4] = [View::Dashboard, View::Settings, View::Billing, View::Help];

const PLAN_ACCESS: [(Plan, &[View]); 4] = [
    (
        Plan::Free,
        &[View::Dashboard, View::Settings, View::Billing, View::Help],
    ),
    (
        Plan::Starter,
        &[
            View::Dashboard,
            View::Signals,
            View::Orders,
            View::Settings,
            View::Billing,
            View::Help,
        ],
    ),
    (
        Plan::Pro,
        &[
            View::Dashboard,
            View::Signals,
            View::Scanner,
            View::Orders,
            View::Forecast,
            View::Analysis,
            View::Settings,
            View::Billing,
            View::Help,
        ],
    ),
    (
        Plan::Elite,
        &[
            View::Dashboard,
            View::Signals,
            View::Scanner,
            View::Orders,
            View::Forecast,
            View::Analysis,
            View::Automation,
            View::Settings,
            View::Billing,
            View::Help,
        ],
    ),
];

static STANDARD: LazyLock<AccessPolicy> = LazyLock::new(|| {
    let table = PLAN_ACCESS
        .iter()
        .map(|(plan, views)| (*plan, views.iter().copied().collect()))
        .collect();
    AccessPolicy { table }
});

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Access table has no entry for the free plan")]
    MissingFreePlan,
    #[error("Plan {plan} does not grant required view {view}")]
    MissingRequiredView { plan: Plan, view: View },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavSection {
    Analytics,
    Execution,
    System,
}

/// One sidebar entry. Locked entries are still listed so the user can see
/// what an upgrade would unlock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub view: View,
    pub label: &'static str,
    pub section: NavSection,
    pub locked: bool,
}

const NAV_LAYOUT: [(View, &str, NavSection); 9] = [
    (View::Dashboard, "Overview", NavSection::Analytics),
    (View::Forecast, "Forecast AI", NavSection::Analytics),
    (View::Analysis, "Technical Strategist", NavSection::Analytics),
    (View::Signals, "Signals Feed", NavSection::Execution),
    (View::Scanner, "Market Scanner", NavSection::Execution),
    (View::Automation, "Automation", NavSection::Execution),
    (View::Settings, "Settings", NavSection::System),
    (View::Billing, "Billing", NavSection::System),
    (View::Help, "Help & Support", NavSection::System),
];

/// Maps a plan to the views it may open.
///
/// Lookups are total: a plan without an entry resolves to the `free` set,
/// never to anything wider.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    table: HashMap<Plan, BTreeSet<View>>,
}

impl AccessPolicy {
    pub fn standard() -> &'static AccessPolicy {
        &STANDARD
    }

    /// Builds a policy from a custom table, refusing tables that would hide a
    /// required view from some plan.
    pub fn from_table(table: HashMap<Plan, BTreeSet<View>>) -> Result<Self, PolicyError> {
        if !table.contains_key(&Plan::Free) {
            return Err(PolicyError::MissingFreePlan);
        }
        for (plan, views) in &table {
            if let Some(view) = REQUIRED_VIEWS.iter().find(|v| !views.contains(*v)) {
                return Err(PolicyError::MissingRequiredView {
                    plan: *plan,
                    view: *view,
                });
            }
        }
        Ok(Self { table })
    }

    pub fn allowed_views(&self, plan: Plan) -> &BTreeSet<View> {
        self.table
            .get(&plan)
            .or_else(|| self.table.get(&Plan::Free))
            .unwrap_or(&STANDARD.table[&Plan::Free])
    }

    pub fn is_allowed(&self, plan: Plan, view: View) -> bool {
        self.allowed_views(plan).contains(&view)
    }

    /// Cheapest known plan that opens `view`.
    pub fn minimum_plan(&self, view: View) -> Plan {
        Plan::KNOWN
            .into_iter()
            .find(|plan| self.is_allowed(*plan, view))
            .unwrap_or(Plan::Elite)
    }

    pub fn nav_entries(&self, plan: Plan) -> Vec<NavEntry> {
        NAV_LAYOUT
            .iter()
            .map(|(view, label, section)| NavEntry {
                view: *view,
                label: *label,
                section: *section,
                locked: !self.is_allowed(plan, *view),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_PLANS: [Plan; 5] = [
        Plan::Free,
        Plan::Starter,
        Plan::Pro,
        Plan::Elite,
        Plan::Unknown,
    ];

    #[test]
    fn test_required_views_reachable_on_every_plan() {
        let policy = AccessPolicy::standard();
        for plan in ALL_PLANS {
            for view in REQUIRED_VIEWS {
                assert!(policy.is_allowed(plan, view), "{plan} should open {view}");
            }
        }
    }

    #[test]
    fn test_unknown_plan_matches_free() {
        let policy = AccessPolicy::standard();
        for view in View::ALL {
            assert_eq!(
                policy.is_allowed(Plan::Unknown, view),
                policy.is_allowed(Plan::Free, view),
                "mismatch on {view}"
            );
        }
    }

    #[test]
    fn test_lookup_is_deterministic() {
        let policy = AccessPolicy::standard();
        for plan in ALL_PLANS {
            for view in View::ALL {
                assert_eq!(policy.is_allowed(plan, view), policy.is_allowed(plan, view));
            }
        }
    }

    #[test]
    fn test_tiers_are_nested() {
        let policy = AccessPolicy::standard();
        for pair in Plan::KNOWN.windows(2) {
            let lower = policy.allowed_views(pair[0]);
            let upper = policy.allowed_views(pair[1]);
            assert!(lower.is_subset(upper), "{} ⊄ {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_starter_cannot_open_scanner() {
        let policy = AccessPolicy::standard();
        assert!(policy.is_allowed(Plan::Starter, View::Signals));
        assert!(!policy.is_allowed(Plan::Starter, View::Scanner));
        assert!(!policy.is_allowed(Plan::Pro, View::Automation));
        assert!(policy.is_allowed(Plan::Elite, View::Automation));
    }

    #[test]
    fn test_minimum_plan() {
        let policy = AccessPolicy::standard();
        assert_eq!(policy.minimum_plan(View::Help), Plan::Free);
        assert_eq!(policy.minimum_plan(View::Orders), Plan::Starter);
        assert_eq!(policy.minimum_plan(View::Scanner), Plan::Pro);
        assert_eq!(policy.minimum_plan(View::Automation), Plan::Elite);
    }

    #[test]
    fn test_nav_entries_flag_locked_views() {
        let entries = AccessPolicy::standard().nav_entries(Plan::Free);
        assert_eq!(entries.len(), 9);

        let locked: Vec<View> = entries.iter().filter(|e| e.locked).map(|e| e.view).collect();
        assert_eq!(
            locked,
            vec![
                View::Forecast,
                View::Analysis,
                View::Signals,
                View::Scanner,
                View::Automation
            ]
        );
    }

    #[test]
    fn test_custom_table_must_keep_required_views() {
        let mut table = HashMap::new();
        table.insert(Plan::Free, BTreeSet::from([View::Dashboard, View::Help]));
        assert_eq!(
            AccessPolicy::from_table(table).unwrap_err(),
            PolicyError::MissingRequiredView {
                plan: Plan::Free,
                view: View::Settings
            }
        );

        let mut table = HashMap::new();
        table.insert(Plan::Pro, REQUIRED_VIEWS.into_iter().collect());
        assert_eq!(
            AccessPolicy::from_table(table).unwrap_err(),
            PolicyError::MissingFreePlan
        );
    }

    #[test]
    fn test_custom_table_falls_back_to_free() {
        let mut table = HashMap::new();
        table.insert(Plan::Free, REQUIRED_VIEWS.into_iter().collect());
        let policy = AccessPolicy::from_table(table).unwrap();
        assert!(!policy.is_allowed(Plan::Elite, View::Automation));
        assert!(policy.is_allowed(Plan::Elite, View::Billing));
    }
}

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use analysis::AnalysisService;
use analysis::service::SIGNAL_MISSING_KEY;
use common::actors::{Actor, ActorType, TaskHandle};
use common::config::{AppConfig, FeedConfig};
use common::demo::{default_settings, demo_profile, demo_signals};
use common::models::{Plan, Toast, ToastKind, TradeSignal, UserProfile, UserSettings, View};
use market_data::{MarketEvent, SignalFeedSimulator};
use policy::{AccessPolicy, NavEntry, ValidationResult};
use storage::{PersistenceAdapter, SETTINGS_KEY, SIGNALS_KEY};

use crate::error::SessionError;
use crate::state::{AppState, LockedPrompt, SessionState};
use crate::toast::ToastTimer;

const SETTINGS_SAVED: &str = "Configuration saved successfully";

/// Messages from the controller's own background tasks.
#[derive(Debug)]
pub(crate) enum ControlEvent {
    ToastExpired {
        epoch: u64,
        toast_id: u64,
    },
    AnalysisReady {
        epoch: u64,
        job_id: Uuid,
        signal_id: String,
        text: String,
    },
}

enum Incoming {
    Market(MarketEvent),
    Control(ControlEvent),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub feed: FeedConfig,
    pub toast_duration: Duration,
    pub signal_retention: Option<usize>,
    /// Fixed seed for the signal feed. `None` seeds from entropy.
    pub feed_seed: Option<u64>,
}

impl From<&AppConfig> for SessionOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            feed: config.feed.clone(),
            toast_duration: config.toast_duration,
            signal_retention: config.signal_retention,
            feed_seed: None,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    NotInApplication,
    Locked { requested: View, required_plan: Plan },
    Changed(View),
}

/// What applying one background event did to the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    SignalAdded(String),
    ToastDismissed(u64),
    AnalysisReady(String),
    /// The event was stale and nothing changed.
    Discarded,
}

struct FeedLink {
    handle: TaskHandle,
    rx: mpsc::UnboundedReceiver<MarketEvent>,
}

struct AnalysisJob {
    id: Uuid,
    epoch: u64,
    signal: TradeSignal,
    service: AnalysisService,
    events_tx: mpsc::UnboundedSender<ControlEvent>,
}

#[async_trait]
impl Actor for AnalysisJob {
    fn name(&self) -> ActorType {
        ActorType::AnalysisJob
    }

    fn id(&self) -> Uuid {
        self.id
    }

    async fn run(&mut self) -> anyhow::Result<()> {
        let text = self.service.analyze_signal(&self.signal).await;
        let _ = self.events_tx.send(ControlEvent::AnalysisReady {
            epoch: self.epoch,
            job_id: self.id,
            signal_id: self.signal.id.clone(),
            text,
        });
        Ok(())
    }
}

/// Single owner of `SessionState`.
///
/// Background work (signal feed, toast timer, AI calls) runs in spawned
/// tasks that report back over channels; their results are applied by
/// `next_event` or `drain_events`. Every handle is owned here, so logout or
/// dropping the controller cancels all of it. `epoch` is bumped on logout and
/// anything tagged with an older epoch is discarded.
pub struct SessionController {
    state: SessionState,
    policy: &'static AccessPolicy,
    persistence: PersistenceAdapter,
    analysis: AnalysisService,
    options: SessionOptions,
    epoch: u64,
    next_toast_id: u64,
    feed: Option<FeedLink>,
    toast_timer: Option<TaskHandle>,
    analysis_jobs: HashMap<String, TaskHandle>,
    events_tx: mpsc::UnboundedSender<ControlEvent>,
    events_rx: mpsc::UnboundedReceiver<ControlEvent>,
}

impl SessionController {
    /// Wraps an existing state. A state already in `Application` gets its
    /// feed started, so this must run inside a tokio runtime.
    pub fn new(
        state: SessionState,
        persistence: PersistenceAdapter,
        analysis: AnalysisService,
        options: SessionOptions,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut controller = Self {
            state,
            policy: AccessPolicy::standard(),
            persistence,
            analysis,
            options,
            epoch: 0,
            next_toast_id: 0,
            feed: None,
            toast_timer: None,
            analysis_jobs: HashMap::new(),
            events_tx,
            events_rx,
        };
        if controller.state.app_state == AppState::Application {
            controller.start_feed();
        }
        controller
    }

    /// Builds a fresh landing session from persisted settings and signals,
    /// falling back to the demo data.
    pub async fn bootstrap(
        persistence: PersistenceAdapter,
        analysis: AnalysisService,
        options: SessionOptions,
    ) -> Self {
        let settings: UserSettings = persistence.load(SETTINGS_KEY, default_settings()).await;
        let signals: Vec<TradeSignal> = persistence.load(SIGNALS_KEY, demo_signals()).await;

        let mut state = SessionState::new(settings, signals);
        let dropped = state.enforce_retention(options.signal_retention);
        if dropped > 0 {
            debug!("Dropped {} stored signals over the retention cap", dropped);
        }
        info!(
            "Session ready with {} signals (AI {})",
            state.signals.len(),
            if analysis.is_configured() { "on" } else { "off" }
        );
        Self::new(state, persistence, analysis, options)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn app_state(&self) -> AppState {
        self.state.app_state
    }

    pub fn policy(&self) -> &'static AccessPolicy {
        self.policy
    }

    pub fn is_feed_active(&self) -> bool {
        self.feed.as_ref().is_some_and(|f| f.handle.is_active())
    }

    pub fn is_analyzing(&self, signal_id: &str) -> bool {
        self.state.analyzing.contains(signal_id)
    }

    /// Sidebar entries for the signed-in user. Empty outside the application.
    pub fn nav_entries(&self) -> Vec<NavEntry> {
        match &self.state.current_user {
            Some(user) if self.state.app_state == AppState::Application => {
                self.policy.nav_entries(user.plan)
            }
            _ => Vec::new(),
        }
    }

    fn require(&self, expected: &[AppState], action: &'static str) -> Result<(), SessionError> {
        if expected.contains(&self.state.app_state) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                from: self.state.app_state,
                action,
            })
        }
    }

    pub fn request_sign_in(&mut self) -> Result<(), SessionError> {
        self.require(&[AppState::Landing], "request sign in")?;
        self.state.app_state = AppState::Auth;
        info!("Showing sign in");
        Ok(())
    }

    pub fn cancel_sign_in(&mut self) -> Result<(), SessionError> {
        self.require(&[AppState::Auth], "cancel sign in")?;
        self.state.app_state = AppState::Landing;
        info!("Sign in cancelled");
        Ok(())
    }

    pub fn enter_demo(&mut self) -> Result<(), SessionError> {
        self.require(&[AppState::Landing, AppState::Auth], "enter demo")?;
        self.sign_in(demo_profile());
        Ok(())
    }

    /// Sign-in is mocked: any credentials yield the canned profile, with the
    /// submitted email when one is given.
    pub fn submit_credentials(&mut self, email: &str) -> Result<(), SessionError> {
        self.require(&[AppState::Auth], "submit credentials")?;
        let mut profile = demo_profile();
        let email = email.trim();
        if !email.is_empty() {
            profile.email = email.to_string();
        }
        self.sign_in(profile);
        Ok(())
    }

    fn sign_in(&mut self, profile: UserProfile) {
        info!("Signed in as {} ({} plan)", profile.email, profile.plan);
        self.state.current_user = Some(profile);
        self.state.current_view = View::Dashboard;
        self.state.locked = None;
        self.state.app_state = AppState::Application;
        self.start_feed();
    }

    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.require(&[AppState::Application], "log out")?;

        self.epoch += 1;
        self.stop_feed();
        self.toast_timer = None;
        self.analysis_jobs.clear();

        self.state.app_state = AppState::Landing;
        self.state.current_user = None;
        self.state.current_view = View::Dashboard;
        self.state.toast = None;
        self.state.locked = None;
        self.state.analyzing.clear();
        self.state.analyses.clear();
        info!("Logged out");
        Ok(())
    }

    fn start_feed(&mut self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut feed =
            SignalFeedSimulator::new(self.state.settings.user_id.clone(), self.options.feed.clone(), tx);
        if let Some(seed) = self.options.feed_seed {
            feed = feed.with_seed(seed);
        }
        let handle = TaskHandle::spawn(Box::new(feed));
        // Replacing a previous link drops its receiver and aborts its task.
        self.feed = Some(FeedLink { handle, rx });
    }

    fn stop_feed(&mut self) {
        if let Some(mut feed) = self.feed.take() {
            feed.handle.cancel();
            debug!("Signal feed stopped");
        }
    }

    pub fn navigate(&mut self, view: View) -> NavigationOutcome {
        let Some(user) = &self.state.current_user else {
            return NavigationOutcome::NotInApplication;
        };
        if self.state.app_state != AppState::Application {
            return NavigationOutcome::NotInApplication;
        }

        if !self.policy.is_allowed(user.plan, view) {
            let required_plan = self.policy.minimum_plan(view);
            debug!("{} is locked for plan {}", view, user.plan);
            self.state.locked = Some(LockedPrompt {
                requested: view,
                required_plan,
            });
            return NavigationOutcome::Locked {
                requested: view,
                required_plan,
            };
        }

        self.state.locked = None;
        self.state.current_view = view;
        NavigationOutcome::Changed(view)
    }

    /// Replaces the settings if they validate. On rejection the current
    /// settings stay as they were.
    pub async fn commit_settings(&mut self, settings: UserSettings) -> Result<(), ValidationResult> {
        let result = policy::validate(&settings);
        if !result.is_valid() {
            warn!("Settings rejected: {}", result);
            return Err(result);
        }

        self.state.settings = settings;
        self.persistence.save(SETTINGS_KEY, &self.state.settings).await;
        self.show_toast(SETTINGS_SAVED, ToastKind::Success);
        Ok(())
    }

    /// Adds records from an external feed. The batch is taken as newest
    /// first and lands in front of the existing signals. Records with a
    /// non-finite price are skipped, as they would corrupt the stored list.
    pub async fn ingest_signals(&mut self, batch: Vec<TradeSignal>) {
        let (batch, rejected): (Vec<_>, Vec<_>) =
            batch.into_iter().partition(TradeSignal::has_finite_prices);
        for signal in &rejected {
            warn!("Skipping signal {} ({}): non-finite price", signal.id, signal.ticker);
        }
        if batch.is_empty() {
            return;
        }
        let added = batch.len();
        let dropped = self
            .state
            .prepend_signals(batch, self.options.signal_retention);
        debug!("Ingested {} signals ({} dropped by retention)", added, dropped);
        self.persistence.save(SIGNALS_KEY, &self.state.signals).await;
    }

    /// Starts an AI commentary request for a signal and returns at once.
    /// Without a credential the placeholder is stored immediately.
    pub fn request_signal_analysis(&mut self, signal_id: &str) -> Result<(), SessionError> {
        self.require(&[AppState::Application], "analyze a signal")?;
        let Some(signal) = self.state.signal(signal_id).cloned() else {
            return Err(SessionError::UnknownSignal(signal_id.to_string()));
        };

        if !self.analysis.is_configured() {
            self.state
                .analyses
                .insert(signal.id, SIGNAL_MISSING_KEY.to_string());
            return Ok(());
        }

        let job = AnalysisJob {
            id: Uuid::new_v4(),
            epoch: self.epoch,
            signal,
            service: self.analysis.clone(),
            events_tx: self.events_tx.clone(),
        };
        let handle = TaskHandle::spawn(Box::new(job));
        self.state.analyzing.insert(signal_id.to_string());
        // A repeated request supersedes the one in flight.
        self.analysis_jobs.insert(signal_id.to_string(), handle);
        Ok(())
    }

    /// Shows `message`, replacing any current toast and restarting the
    /// dismiss timer. Returns the toast id.
    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) -> u64 {
        self.next_toast_id += 1;
        let toast_id = self.next_toast_id;
        self.state.toast = Some(Toast {
            id: toast_id,
            message: message.into(),
            kind,
        });

        let timer = ToastTimer::new(
            self.epoch,
            toast_id,
            self.options.toast_duration,
            self.events_tx.clone(),
        );
        self.toast_timer = Some(TaskHandle::spawn(Box::new(timer)));
        toast_id
    }

    pub fn dismiss_toast(&mut self) {
        self.toast_timer = None;
        self.state.toast = None;
    }

    /// Waits for the next background event and applies it. The controller
    /// keeps its own control sender, so with nothing queued this waits
    /// indefinitely; callers race it against their own input.
    pub async fn next_event(&mut self) -> Option<SessionUpdate> {
        let incoming = {
            let feed_rx = self.feed.as_mut().map(|feed| &mut feed.rx);
            tokio::select! {
                Some(event) = recv_market(feed_rx) => Incoming::Market(event),
                Some(event) = self.events_rx.recv() => Incoming::Control(event),
                else => return None,
            }
        };
        Some(self.apply(incoming).await)
    }

    /// Applies every event that is already queued, without waiting.
    pub async fn drain_events(&mut self) -> Vec<SessionUpdate> {
        let mut incoming = Vec::new();
        if let Some(feed) = self.feed.as_mut() {
            while let Ok(event) = feed.rx.try_recv() {
                incoming.push(Incoming::Market(event));
            }
        }
        while let Ok(event) = self.events_rx.try_recv() {
            incoming.push(Incoming::Control(event));
        }

        let mut updates = Vec::with_capacity(incoming.len());
        for event in incoming {
            updates.push(self.apply(event).await);
        }
        updates
    }

    async fn apply(&mut self, incoming: Incoming) -> SessionUpdate {
        match incoming {
            Incoming::Market(MarketEvent::Signal(signal)) => self.apply_signal(signal).await,
            Incoming::Control(ControlEvent::ToastExpired { epoch, toast_id }) => {
                let current = self.state.toast.as_ref().map(|t| t.id);
                if epoch != self.epoch || current != Some(toast_id) {
                    return SessionUpdate::Discarded;
                }
                self.dismiss_toast();
                SessionUpdate::ToastDismissed(toast_id)
            }
            Incoming::Control(ControlEvent::AnalysisReady {
                epoch,
                job_id,
                signal_id,
                text,
            }) => self.apply_analysis(epoch, job_id, signal_id, text),
        }
    }

    async fn apply_signal(&mut self, signal: TradeSignal) -> SessionUpdate {
        if self.state.app_state != AppState::Application {
            return SessionUpdate::Discarded;
        }
        let id = signal.id.clone();
        let message = format!("New Opportunity: {}", signal.ticker);

        self.state
            .prepend_signals(vec![signal], self.options.signal_retention);
        self.persistence.save(SIGNALS_KEY, &self.state.signals).await;
        self.show_toast(message, ToastKind::Success);
        SessionUpdate::SignalAdded(id)
    }

    fn apply_analysis(
        &mut self,
        epoch: u64,
        job_id: Uuid,
        signal_id: String,
        text: String,
    ) -> SessionUpdate {
        let current_job = self
            .analysis_jobs
            .get(&signal_id)
            .is_some_and(|job| job.id() == job_id);
        if epoch != self.epoch || !current_job {
            debug!("Discarding stale analysis for {}", signal_id);
            return SessionUpdate::Discarded;
        }

        self.analysis_jobs.remove(&signal_id);
        self.state.analyzing.remove(&signal_id);
        if self.state.signal(&signal_id).is_none() {
            debug!("Signal {} is gone, dropping its analysis", signal_id);
            return SessionUpdate::Discarded;
        }
        self.state.analyses.insert(signal_id.clone(), text);
        SessionUpdate::AnalysisReady(signal_id)
    }
}

async fn recv_market(rx: Option<&mut mpsc::UnboundedReceiver<MarketEvent>>) -> Option<MarketEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

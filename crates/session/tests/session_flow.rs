use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use analysis::{AnalysisError, AnalysisService, TextService};
use async_trait::async_trait;
use common::config::FeedConfig;
use common::demo::{default_settings, demo_profile, demo_signals};
use common::models::{Plan, ToastKind, TradeSignal, UserProfile, View};
use mockall::mock;
use policy::SettingsField;
use policy::validation::MUST_BE_POSITIVE;
use session::{AppState, NavigationOutcome, SessionController, SessionOptions, SessionState, SessionUpdate};
use storage::{
    KeyValueStore, PersistenceAdapter, SETTINGS_KEY, SIGNALS_KEY, SqliteKvStore, StorageError,
};
use tokio::time::{self, Instant};

mock! {
    pub Backend {}

    #[async_trait]
    impl TextService for Backend {
        async fn generate(&self, prompt: &str, json: bool) -> Result<String, AnalysisError>;
    }
}

/// Answers after a fixed delay and counts calls.
struct SlowBackend {
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl TextService for SlowBackend {
    async fn generate(&self, _prompt: &str, _json: bool) -> Result<String, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        time::sleep(self.delay).await;
        Ok("Solid setup. Risk is defined.".to_string())
    }
}

/// Plain map store. sqlx pools do not mix with a paused clock.
#[derive(Default)]
struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn put_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn options(emit_probability: f64) -> SessionOptions {
    SessionOptions {
        feed: FeedConfig {
            interval: Duration::from_secs(15),
            emit_probability,
        },
        toast_duration: Duration::from_secs(3),
        signal_retention: Some(500),
        feed_seed: Some(11),
    }
}

fn adapter() -> PersistenceAdapter {
    PersistenceAdapter::new(Arc::new(MemoryStore::default()))
}

async fn sqlite_adapter() -> PersistenceAdapter {
    let store = SqliteKvStore::open_in_memory().await.unwrap();
    PersistenceAdapter::new(Arc::new(store))
}

async fn session_with(analysis: AnalysisService, options: SessionOptions) -> SessionController {
    SessionController::bootstrap(adapter(), analysis, options).await
}

fn signed_in_state(plan: Plan) -> SessionState {
    let mut state = SessionState::new(default_settings(), demo_signals());
    state.app_state = AppState::Application;
    state.current_user = Some(UserProfile {
        plan,
        ..demo_profile()
    });
    state
}

fn extra_signal(id: &str) -> TradeSignal {
    TradeSignal {
        id: id.to_string(),
        ..demo_signals().remove(0)
    }
}

#[tokio::test]
async fn starter_plan_is_locked_out_of_scanner() {
    let mut session = SessionController::new(
        signed_in_state(Plan::Starter),
        adapter(),
        AnalysisService::unconfigured(),
        options(0.0),
    );
    assert!(session.is_feed_active());

    assert_eq!(
        session.navigate(View::Scanner),
        NavigationOutcome::Locked {
            requested: View::Scanner,
            required_plan: Plan::Pro,
        }
    );
    assert_eq!(session.state().current_view, View::Dashboard);
    assert_eq!(
        session.state().locked.map(|l| l.required_plan),
        Some(Plan::Pro)
    );

    assert_eq!(
        session.navigate(View::Signals),
        NavigationOutcome::Changed(View::Signals)
    );
    assert_eq!(session.state().current_view, View::Signals);
    assert!(session.state().locked.is_none());
}

#[tokio::test]
async fn unknown_plan_gets_free_views_only() {
    let mut session = SessionController::new(
        signed_in_state(Plan::Unknown),
        adapter(),
        AnalysisService::unconfigured(),
        options(0.0),
    );

    assert!(matches!(
        session.navigate(View::Signals),
        NavigationOutcome::Locked { .. }
    ));
    assert_eq!(session.navigate(View::Help), NavigationOutcome::Changed(View::Help));

    let locked: Vec<View> = session
        .nav_entries()
        .into_iter()
        .filter(|e| e.locked)
        .map(|e| e.view)
        .collect();
    assert!(locked.contains(&View::Scanner));
    assert!(!locked.contains(&View::Settings));
}

#[tokio::test]
async fn invalid_settings_are_rejected_and_not_persisted() {
    let persistence = sqlite_adapter().await;
    let mut session = SessionController::bootstrap(
        persistence.clone(),
        AnalysisService::unconfigured(),
        options(0.0),
    )
    .await;

    let mut draft = default_settings();
    draft.daily_max_loss = 0.0;
    draft.risk_per_trade = 50.0;
    draft.max_open_trades = 3.0;

    let errors = session.commit_settings(draft).await.unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.get(SettingsField::DailyMaxLoss), Some(MUST_BE_POSITIVE));
    assert_eq!(session.state().settings, default_settings());
    assert!(session.state().toast.is_none());

    let mut stored = default_settings();
    stored.strategy_name = "unchanged".into();
    let loaded = persistence.load(SETTINGS_KEY, stored.clone()).await;
    assert_eq!(loaded, stored);
}

#[tokio::test]
async fn valid_settings_are_saved_with_a_toast() {
    let persistence = sqlite_adapter().await;
    let mut session = SessionController::bootstrap(
        persistence.clone(),
        AnalysisService::unconfigured(),
        options(0.0),
    )
    .await;

    let mut draft = default_settings();
    draft.max_open_trades = 5.0;
    draft.strategy_name = "Opening Range".into();
    session.commit_settings(draft.clone()).await.unwrap();

    assert_eq!(session.state().settings, draft);
    let toast = session.state().toast.clone().unwrap();
    assert_eq!(toast.message, "Configuration saved successfully");
    assert_eq!(toast.kind, ToastKind::Success);

    let reloaded = SessionController::bootstrap(
        persistence,
        AnalysisService::unconfigured(),
        options(0.0),
    )
    .await;
    assert_eq!(reloaded.state().settings, draft);
}

#[tokio::test(start_paused = true)]
async fn feed_signals_arrive_newest_first() {
    let mut session = session_with(AnalysisService::unconfigured(), options(1.0)).await;
    session.enter_demo().unwrap();

    let mut emitted = Vec::new();
    while emitted.len() < 3 {
        if let Some(SessionUpdate::SignalAdded(id)) = session.next_event().await {
            emitted.push(id);
        }
    }

    let signals = &session.state().signals;
    assert_eq!(signals.len(), 6);
    let newest: Vec<&str> = signals[..3].iter().map(|s| s.id.as_str()).collect();
    let expected: Vec<&str> = emitted.iter().rev().map(String::as_str).collect();
    assert_eq!(newest, expected);
    assert!(signals.windows(2).all(|w| w[0].received_at >= w[1].received_at));

    let toast = session.state().toast.clone().unwrap();
    assert!(toast.message.starts_with("New Opportunity: "));
}

#[tokio::test(start_paused = true)]
async fn logout_stops_the_feed_before_its_next_tick() {
    let persistence = adapter();
    let mut session = SessionController::bootstrap(
        persistence.clone(),
        AnalysisService::unconfigured(),
        options(1.0),
    )
    .await;
    session.enter_demo().unwrap();

    let first = session.next_event().await;
    assert!(matches!(first, Some(SessionUpdate::SignalAdded(_))));
    assert_eq!(session.state().signals.len(), 4);

    // The next tick is one second away.
    time::sleep(Duration::from_secs(14)).await;
    session.logout().unwrap();
    assert!(!session.is_feed_active());
    assert_eq!(session.state().app_state, AppState::Landing);
    assert_eq!(session.state().current_view, View::Dashboard);
    assert!(session.state().current_user.is_none());
    assert!(session.state().toast.is_none());

    time::sleep(Duration::from_secs(120)).await;
    let updates = session.drain_events().await;
    assert!(updates.iter().all(|u| *u == SessionUpdate::Discarded));
    assert_eq!(session.state().signals.len(), 4);

    let stored: Vec<TradeSignal> = persistence.load(SIGNALS_KEY, Vec::new()).await;
    assert_eq!(stored.len(), 4);
}

#[tokio::test]
async fn analysis_without_key_never_reaches_backend() {
    let mut backend = MockBackend::new();
    backend.expect_generate().times(0);
    let analysis = AnalysisService::with_credential(None, Arc::new(backend));

    let mut session = session_with(analysis, options(0.0)).await;
    session.enter_demo().unwrap();
    session.request_signal_analysis("s-2").unwrap();

    assert_eq!(
        session.state().analyses["s-2"],
        "Gemini API Key is missing. Please configure it to use this feature."
    );
    assert!(session.drain_events().await.is_empty());
}

#[tokio::test]
async fn analysis_result_is_merged_on_arrival() {
    let mut backend = MockBackend::new();
    backend
        .expect_generate()
        .withf(|prompt, _| prompt.contains("Ticker: NVDA"))
        .times(1)
        .returning(|_, _| Ok("Momentum is real. Stop is tight.".to_string()));
    let analysis = AnalysisService::new(Arc::new(backend));

    let mut session = session_with(analysis, options(0.0)).await;
    session.enter_demo().unwrap();
    session.request_signal_analysis("s-1").unwrap();
    assert!(session.is_analyzing("s-1"));

    let update = session.next_event().await;
    assert_eq!(update, Some(SessionUpdate::AnalysisReady("s-1".into())));
    assert_eq!(session.state().analyses["s-1"], "Momentum is real. Stop is tight.");
    assert!(!session.is_analyzing("s-1"));
}

#[tokio::test]
async fn analysis_backend_failure_uses_fallback_text() {
    let mut backend = MockBackend::new();
    backend
        .expect_generate()
        .returning(|_, _| Err(AnalysisError::Status { status: 503, body: "busy".into() }));
    let analysis = AnalysisService::new(Arc::new(backend));

    let mut session = session_with(analysis, options(0.0)).await;
    session.enter_demo().unwrap();
    session.request_signal_analysis("s-3").unwrap();

    session.next_event().await;
    assert_eq!(
        session.state().analyses["s-3"],
        "Failed to analyze signal due to an API error."
    );
}

#[tokio::test(start_paused = true)]
async fn analysis_from_a_previous_login_is_discarded() {
    let calls = Arc::new(AtomicUsize::new(0));
    let analysis = AnalysisService::new(Arc::new(SlowBackend {
        delay: Duration::from_secs(1),
        calls: calls.clone(),
    }));

    let mut session = session_with(analysis, options(0.0)).await;
    session.enter_demo().unwrap();
    session.request_signal_analysis("s-1").unwrap();

    // Let the call finish so its result is already queued.
    time::sleep(Duration::from_secs(2)).await;
    session.logout().unwrap();
    session.enter_demo().unwrap();

    let updates = session.drain_events().await;
    assert_eq!(updates, vec![SessionUpdate::Discarded]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(session.state().analyses.is_empty());
}

#[tokio::test(start_paused = true)]
async fn analysis_for_an_evicted_signal_is_discarded() {
    let calls = Arc::new(AtomicUsize::new(0));
    let analysis = AnalysisService::new(Arc::new(SlowBackend {
        delay: Duration::from_secs(5),
        calls: calls.clone(),
    }));
    let options = SessionOptions {
        signal_retention: Some(3),
        ..options(0.0)
    };

    let mut session = session_with(analysis, options).await;
    session.enter_demo().unwrap();
    session.request_signal_analysis("s-3").unwrap();

    session.ingest_signals(vec![extra_signal("ext-1")]).await;
    assert!(session.state().signal("s-3").is_none());

    let update = session.next_event().await;
    assert_eq!(update, Some(SessionUpdate::Discarded));
    assert!(!session.state().analyses.contains_key("s-3"));
}

#[tokio::test]
async fn ingested_batches_land_in_front_in_order() {
    let persistence = adapter();
    let mut session = SessionController::bootstrap(
        persistence.clone(),
        AnalysisService::unconfigured(),
        options(0.0),
    )
    .await;

    // Works before sign-in as well.
    session
        .ingest_signals(vec![extra_signal("ext-2"), extra_signal("ext-1")])
        .await;

    let ids: Vec<&str> = session.state().signals.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["ext-2", "ext-1", "s-1", "s-2", "s-3"]);

    let stored: Vec<TradeSignal> = persistence.load(SIGNALS_KEY, Vec::new()).await;
    assert_eq!(stored, session.state().signals);
}

#[tokio::test]
async fn non_finite_signal_is_skipped_and_history_survives_reload() {
    let persistence = adapter();
    let mut session = SessionController::bootstrap(
        persistence.clone(),
        AnalysisService::unconfigured(),
        options(0.0),
    )
    .await;

    session.ingest_signals(vec![extra_signal("ext-good")]).await;
    let bad = TradeSignal {
        entry: f64::NAN,
        ..extra_signal("ext-bad")
    };
    let worse = TradeSignal {
        rvol: Some(f64::INFINITY),
        ..extra_signal("ext-worse")
    };
    session.ingest_signals(vec![bad, worse]).await;

    let ids: Vec<&str> = session.state().signals.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["ext-good", "s-1", "s-2", "s-3"]);

    let reloaded = SessionController::bootstrap(
        persistence,
        AnalysisService::unconfigured(),
        options(0.0),
    )
    .await;
    let ids: Vec<&str> = reloaded.state().signals.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["ext-good", "s-1", "s-2", "s-3"]);
}

#[tokio::test(start_paused = true)]
async fn replacing_a_toast_restarts_the_dismiss_timer() {
    let mut session = session_with(AnalysisService::unconfigured(), options(0.0)).await;
    let start = Instant::now();

    session.show_toast("first", ToastKind::Success);
    time::sleep(Duration::from_secs(2)).await;
    let second = session.show_toast("second", ToastKind::Error);

    let update = session.next_event().await;
    assert_eq!(update, Some(SessionUpdate::ToastDismissed(second)));
    assert!(start.elapsed() >= Duration::from_secs(5));
    assert!(session.state().toast.is_none());
}

#[tokio::test(start_paused = true)]
async fn dismissed_toast_timer_never_fires() {
    let mut session = session_with(AnalysisService::unconfigured(), options(0.0)).await;
    session.show_toast("gone", ToastKind::Success);
    session.dismiss_toast();

    time::sleep(Duration::from_secs(10)).await;
    assert!(session.drain_events().await.is_empty());

    let id = session.show_toast("shown", ToastKind::Success);
    time::sleep(Duration::from_secs(1)).await;
    assert_eq!(session.state().toast.as_ref().map(|t| t.id), Some(id));
}

#[tokio::test]
async fn corrupt_storage_falls_back_to_demo_data() {
    let store = Arc::new(MemoryStore::default());
    store.put_raw(SETTINGS_KEY, "{not json").await.unwrap();
    store.put_raw(SIGNALS_KEY, r#"{"id": "not a list"}"#).await.unwrap();

    let session = SessionController::bootstrap(
        PersistenceAdapter::new(store),
        AnalysisService::unconfigured(),
        options(0.0),
    )
    .await;

    assert_eq!(session.state().settings, default_settings());
    let ids: Vec<&str> = session.state().signals.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["s-1", "s-2", "s-3"]);
}

#[tokio::test]
async fn stored_signals_over_the_cap_are_trimmed_on_load() {
    let persistence = adapter();
    persistence.save(SIGNALS_KEY, &demo_signals()).await;

    let session = SessionController::bootstrap(
        persistence,
        AnalysisService::unconfigured(),
        SessionOptions {
            signal_retention: Some(2),
            ..options(0.0)
        },
    )
    .await;
    assert_eq!(session.state().signals.len(), 2);
    assert_eq!(session.state().signals[0].id, "s-1");
}

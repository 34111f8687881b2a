use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use game_core::{
    CategoryDescriptor, Command, Controller, GameError, MemoryNameCache, NameCache, WordCatalog,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, warn};

mod actor;
pub mod config;
pub mod name_cache;
pub mod timer;
pub mod view;

use actor::{Input, Publisher};
use config::Config;
use name_cache::JsonFileNameCache;
use timer::TokioRoundTimer;
use view::{ApiError, ErrorCode, ServerMessage, SessionView};

const QUEUE_CAPACITY: usize = 64;
const UPDATE_CAPACITY: usize = 64;

/// Handle to the running game. Cloning shares the same controller.
#[derive(Clone)]
pub struct AppState {
    inbox: mpsc::Sender<Input>,
    updates: broadcast::Sender<ServerMessage>,
    snapshot: watch::Receiver<SessionView>,
    categories: Arc<Vec<CategoryDescriptor>>,
}

impl AppState {
    /// Starts the controller task with the cache the config asks for.
    pub fn start(config: &Config) -> Self {
        match &config.name_cache_path {
            Some(path) => Self::with_name_cache(JsonFileNameCache::new(path), config),
            None => Self::with_name_cache(MemoryNameCache::new(), config),
        }
    }

    pub fn with_name_cache<C>(cache: C, config: &Config) -> Self
    where
        C: NameCache + Send + 'static,
    {
        let (inbox, queue) = mpsc::channel(QUEUE_CAPACITY);
        let rng = config
            .seed
            .map(ChaCha8Rng::seed_from_u64)
            .unwrap_or_else(ChaCha8Rng::from_entropy);
        let timer = TokioRoundTimer::new(inbox.clone(), config.tick_interval);
        let controller = Controller::new(WordCatalog::builtin(), cache, timer, rng);

        let initial = SessionView::project(controller.session(), controller.catalog());
        let categories = Arc::new(controller.catalog().all_categories());
        let (snapshot_tx, snapshot) = watch::channel(initial);
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);

        tokio::spawn(actor::run(
            controller,
            queue,
            Publisher {
                snapshot: snapshot_tx,
                updates: updates.clone(),
            },
        ));

        Self {
            inbox,
            updates,
            snapshot,
            categories,
        }
    }

    pub fn session(&self) -> SessionView {
        self.snapshot.borrow().clone()
    }

    pub fn categories(&self) -> &[CategoryDescriptor] {
        &self.categories
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.updates.subscribe()
    }

    pub async fn dispatch(&self, command: Command) -> Result<SessionView, DispatchError> {
        let (reply, response) = oneshot::channel();
        self.inbox
            .send(Input::Command { command, reply })
            .await
            .map_err(|_| DispatchError::Unavailable)?;
        let outcome = response.await.map_err(|_| DispatchError::Unavailable)?;
        Ok(outcome?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("game controller is not running")]
    Unavailable,
}

impl From<&DispatchError> for ApiError {
    fn from(error: &DispatchError) -> Self {
        let code = match error {
            DispatchError::Game(GameError::IllegalTransition { .. }) => {
                ErrorCode::IllegalTransition
            }
            DispatchError::Game(GameError::Validation(_)) => ErrorCode::Validation,
            DispatchError::Game(GameError::NoWordsAvailable(_)) => ErrorCode::Configuration,
            DispatchError::Unavailable => ErrorCode::Unavailable,
        };
        ApiError::new(code, error.to_string())
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::IllegalTransition => StatusCode::CONFLICT,
        ErrorCode::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/session", get(get_session))
        .route("/categories", get(get_categories))
        .route("/command", post(post_command))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session()))
}

async fn get_categories(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.categories().to_vec()))
}

async fn post_command(State(state): State<AppState>, Json(command): Json<Command>) -> Response {
    match state.dispatch(command).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => {
            let body = ApiError::from(&error);
            (status_for(body.code), Json(body)).into_response()
        }
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn encode(message: &ServerMessage) -> Option<Message> {
    serde_json::to_string(message).ok().map(Message::Text)
}

async fn handle_socket(stream: WebSocket, state: AppState) {
    let (sender, mut receiver) = stream.split();
    let sender = Arc::new(tokio::sync::Mutex::new(sender));
    let mut updates = state.subscribe();

    if let Some(message) = encode(&ServerMessage::State(state.session())) {
        if sender.lock().await.send(message).await.is_err() {
            return;
        }
    }

    let forward_state = state.clone();
    let forward_sender = sender.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            let message = match updates.recv().await {
                Ok(message) => message,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "renderer fell behind, resending state");
                    ServerMessage::State(forward_state.session())
                }
                Err(RecvError::Closed) => break,
            };
            let Some(frame) = encode(&message) else {
                continue;
            };
            if forward_sender.lock().await.send(frame).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(frame)) = receiver.next().await {
            let Message::Text(text) = frame else {
                continue;
            };
            let failure = match serde_json::from_str::<Command>(&text) {
                Ok(command) => state
                    .dispatch(command)
                    .await
                    .err()
                    .map(|error| ApiError::from(&error)),
                Err(err) => Some(ApiError::new(ErrorCode::BadRequest, err.to_string())),
            };
            if let Some(error) = failure {
                debug!(message = %error.message, "renderer command refused");
                if let Some(frame) = encode(&ServerMessage::Error(error)) {
                    let _ = sender.lock().await.send(frame).await;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    debug!("renderer socket closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use game_core::{CategorySelection, GameEvent, PhaseKind};
    use http_body_util::BodyExt;
    use rand::seq::SliceRandom;
    use rand::Rng;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_config() -> Config {
        Config {
            name_cache_path: None,
            seed: Some(42),
            tick_interval: Duration::from_millis(5),
            ..Config::default()
        }
    }

    fn test_app() -> (Router, AppState) {
        let state = AppState::start(&test_config());
        (app(state.clone()), state)
    }

    async fn json_body(res: axum::response::Response) -> Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        (status, json_body(res).await)
    }

    async fn command(app: &Router, body: Value) -> (StatusCode, Value) {
        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/command")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        (status, json_body(res).await)
    }

    async fn ok(app: &Router, body: Value) -> Value {
        let (status, view) = command(app, body).await;
        assert_eq!(status, StatusCode::OK, "{view}");
        view
    }

    async fn enter_names(app: &Router, names: &[&str]) -> Value {
        ok(app, json!({ "type": "start_game" })).await;
        ok(app, json!({ "type": "submit_names", "names": names })).await
    }

    async fn wait_for_phase(state: &AppState, phase: PhaseKind) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while state.session().phase != phase {
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {phase}"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn fresh_session_is_in_setup() {
        let (app, _) = test_app();
        let (status, body) = get_json(&app, "/session").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "setup");
        assert_eq!(body["settings"]["player_count"], 3);
        assert_eq!(body["settings"]["round_duration_secs"], 180);
        assert_eq!(body["settings"]["category"], "mixed");
        assert_eq!(body["saved_roster_ready"], false);
        assert_eq!(body["detail"]["kind"], "setup");
    }

    #[tokio::test]
    async fn categories_list_real_ones_then_mixed() {
        let (app, _) = test_app();
        let (status, body) = get_json(&app, "/categories").await;

        assert_eq!(status, StatusCode::OK);
        let keys: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["key"].as_str().unwrap())
            .collect();
        assert_eq!(
            keys,
            vec!["places", "food", "activities", "nature", "entertainment", "animals", "mixed"]
        );
        assert_eq!(body[1]["name"], "Food & Drinks");
    }

    #[tokio::test]
    async fn rejected_commands_map_to_error_codes() {
        let (app, state) = test_app();

        let (status, body) = command(&app, json!({ "type": "cast_vote", "voted_for": "A" })).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "illegal_transition");

        let (status, body) = command(&app, json!({ "type": "set_player_count", "count": 11 })).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "validation");

        let (status, body) = command(
            &app,
            json!({ "type": "select_category", "category": "sports" }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "validation");

        assert_eq!(state.session().phase, PhaseKind::Setup);
        assert_eq!(state.session().settings.player_count, 3);
    }

    #[tokio::test]
    async fn malformed_command_is_client_error() {
        let (app, _) = test_app();
        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/command")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"type":"launch_rocket"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(res.status().is_client_error());
    }

    #[tokio::test]
    async fn blank_name_keeps_naming_open() {
        let (app, state) = test_app();
        let view = ok(&app, json!({ "type": "start_game" })).await;
        assert_eq!(view["phase"], "naming_players");
        assert_eq!(view["detail"]["slots"], 3);

        let (status, body) = command(
            &app,
            json!({ "type": "submit_names", "names": ["Ann", " ", "Cy"] }),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "name for player 2 is empty");
        assert_eq!(state.session().phase, PhaseKind::NamingPlayers);
    }

    #[tokio::test]
    async fn seeded_round_reveals_expected_word() {
        let (app, _) = test_app();
        ok(&app, json!({ "type": "select_category", "category": "food" })).await;
        let view = enter_names(&app, &["Ann", "Bo", "Cy"]).await;
        assert_eq!(view["phase"], "reveal");
        assert_eq!(view["detail"]["card"]["player_name"], "Ann");
        assert!(view["detail"]["card"]["role"].is_null());

        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let catalog = WordCatalog::builtin();
        let pool = catalog.candidate_pool(&CategorySelection::named("food"));
        let word = pool.choose(&mut rng).unwrap().to_string();
        let impostor: usize = rng.gen_range(0..3);

        for index in 0..3 {
            let view = ok(&app, json!({ "type": "reveal_word" })).await;
            let role = &view["detail"]["card"]["role"];
            if index == impostor {
                assert_eq!(role["role"], "impostor");
            } else {
                assert_eq!(role["role"], "word");
                assert_eq!(role["word"], word.as_str());
            }
            ok(&app, json!({ "type": "advance_player" })).await;
        }
    }

    #[tokio::test]
    async fn full_round_over_http() {
        let (app, state) = test_app();
        enter_names(&app, &["A", "B", "C"]).await;
        for _ in 0..3 {
            ok(&app, json!({ "type": "advance_player" })).await;
        }
        let view = state.session();
        assert_eq!(view.phase, PhaseKind::Playing);
        assert!(view.timer_active);

        let view = ok(&app, json!({ "type": "force_vote" })).await;
        assert_eq!(view["phase"], "voting");
        assert_eq!(view["detail"]["ballot"]["voter"], "A");
        assert_eq!(view["detail"]["ballot"]["candidates"], json!(["B", "C"]));

        let (status, body) = command(&app, json!({ "type": "cast_vote", "voted_for": "A" })).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "A cannot vote for themselves");

        ok(&app, json!({ "type": "cast_vote", "voted_for": "B" })).await;
        ok(&app, json!({ "type": "cast_vote", "voted_for": "C" })).await;
        let view = ok(&app, json!({ "type": "cast_vote", "voted_for": "B" })).await;

        assert_eq!(view["phase"], "results");
        let results = &view["detail"]["results"];
        assert_eq!(
            results["tally"],
            json!([
                { "name": "B", "votes": 2 },
                { "name": "C", "votes": 1 },
                { "name": "A", "votes": 0 }
            ])
        );
        assert_eq!(results["category_name"], "Mixed");
        assert!(results["secret_word"].as_str().is_some());

        let view = ok(&app, json!({ "type": "new_game" })).await;
        assert_eq!(view["phase"], "setup");
        assert_eq!(view["player_names"], json!(["A", "B", "C"]));
        assert_eq!(view["saved_roster_ready"], true);

        let view = ok(&app, json!({ "type": "start_game" })).await;
        assert_eq!(view["phase"], "reveal");
    }

    #[tokio::test]
    async fn countdown_expires_into_voting_and_stops() {
        let (app, state) = test_app();
        ok(&app, json!({ "type": "set_round_duration", "seconds": 60 })).await;
        enter_names(&app, &["A", "B", "C"]).await;
        for _ in 0..3 {
            ok(&app, json!({ "type": "advance_player" })).await;
        }

        wait_for_phase(&state, PhaseKind::Voting).await;
        let mut updates = state.subscribe();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!state.session().timer_active);
        assert_eq!(state.session().phase, PhaseKind::Voting);
        while let Ok(message) = updates.try_recv() {
            assert!(
                !matches!(message, ServerMessage::Event(GameEvent::TimerTicked { .. })),
                "tick applied after expiry"
            );
        }
    }

    #[tokio::test]
    async fn ending_early_stops_the_countdown() {
        let (app, state) = test_app();
        enter_names(&app, &["A", "B", "C"]).await;
        for _ in 0..3 {
            ok(&app, json!({ "type": "advance_player" })).await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        let mut updates = state.subscribe();
        let view = ok(&app, json!({ "type": "end_game_early" })).await;
        assert_eq!(view["phase"], "setup");
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut after_reset = false;
        while let Ok(message) = updates.try_recv() {
            match message {
                ServerMessage::Event(GameEvent::SessionReset) => after_reset = true,
                ServerMessage::Event(GameEvent::TimerTicked { .. }) => {
                    assert!(!after_reset, "tick applied after end_game_early")
                }
                _ => {}
            }
        }
        assert!(after_reset);
        assert_eq!(state.session().phase, PhaseKind::Setup);
    }

    #[tokio::test]
    async fn updates_broadcast_state_then_events() {
        let (_app, state) = test_app();
        let mut updates = state.subscribe();

        state
            .dispatch(Command::SetPlayerCount { count: 4 })
            .await
            .unwrap();

        match updates.recv().await.unwrap() {
            ServerMessage::State(view) => assert_eq!(view.settings.player_count, 4),
            other => panic!("expected state first, got {other:?}"),
        }
        assert_eq!(
            updates.recv().await.unwrap(),
            ServerMessage::Event(GameEvent::PlayerCountChanged {
                count: 4,
                names_cleared: false
            })
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn roster_survives_restart_through_file_cache() {
        let path = std::env::temp_dir().join(format!("impostor_state_{}.json", Uuid::new_v4()));
        let config = Config {
            name_cache_path: Some(path.clone()),
            ..test_config()
        };

        let state = AppState::start(&config);
        state
            .dispatch(Command::SetPlayerCount { count: 4 })
            .await
            .unwrap();
        state.dispatch(Command::StartGame).await.unwrap();
        state
            .dispatch(Command::SubmitNames {
                names: vec!["Ann".into(), "Bo".into(), "Cy".into(), "Di".into()],
            })
            .await
            .unwrap();
        assert!(tokio::fs::metadata(&path).await.is_ok());

        let reloaded = AppState::start(&config);
        let view = reloaded.session();
        assert_eq!(view.settings.player_count, 4);
        assert_eq!(view.player_names, vec!["Ann", "Bo", "Cy", "Di"]);
        assert!(view.saved_roster_ready);

        let view = reloaded.dispatch(Command::StartGame).await.unwrap();
        assert_eq!(view.phase, PhaseKind::Reveal);
        let _ = tokio::fs::remove_file(&path).await;
    }
}

use super::*;
use std::{
    collections::HashMap,
    sync::Arc,
};

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use shared::{
    catalog::Catalog,
    domain::{Category, UserId},
    error::{ApiError, ErrorCode},
    progress::WorkbookProgress,
    protocol::{
        ProgressResponse, SessionResponse, SignInRequest, SignUpRequest, UserProfile,
        WorksheetRecord,
    },
    worksheet::{InterestsContent, WorksheetContent},
};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex, Notify},
};

async fn signed_in(adapter: &InMemoryAdapter) -> Session {
    session::sign_up(adapter, "Ada Lovelace", "ada@example.com", "hunter22", "hunter22")
        .await
        .expect("signup")
}

fn ranked_values() -> WorksheetContent {
    let mut editor = PriorityEditor::new(Catalog::values());
    for name in ["Courage", "Wisdom", "Gratitude"] {
        editor.toggle(name);
    }
    editor.commit().expect("commit");
    editor.reorder(0, 2);
    WorksheetContent::Values(editor.to_content().expect("content"))
}

#[tokio::test]
async fn saved_values_load_back_deep_equal() {
    let adapter = InMemoryAdapter::new();
    let session = signed_in(&adapter).await;
    let content = ranked_values();

    adapter.save(&session, &content).await.expect("save");
    let loaded = adapter
        .load(&session, Category::Values)
        .await
        .expect("load")
        .expect("present");
    assert_eq!(loaded, content);
}

#[tokio::test]
async fn resumed_editor_matches_saved_ranking() {
    let adapter = InMemoryAdapter::new();
    let session = signed_in(&adapter).await;
    adapter
        .save(&session, &ranked_values())
        .await
        .expect("save");

    let saved = adapter
        .load(&session, Category::Values)
        .await
        .expect("load")
        .expect("present")
        .into_values()
        .expect("values");
    let mut editor = PriorityEditor::new(Catalog::values());
    editor.resume(saved);
    let order: Vec<&str> = editor.ranked().iter().map(|i| i.name.as_str()).collect();
    assert_eq!(order, vec!["Wisdom", "Gratitude", "Courage"]);
}

#[tokio::test]
async fn gate_opens_once_values_are_saved() {
    let adapter = Arc::new(InMemoryAdapter::new());
    let session = signed_in(&adapter).await;
    let gate = PrerequisiteGate::new(adapter.clone());

    assert!(!gate
        .is_satisfied(&session, Category::Values)
        .await
        .expect("check"));
    assert_eq!(
        gate.check(&session, Category::Interests).await.expect("gate"),
        Gate::Redirect(Category::Values)
    );
    assert_eq!(
        gate.check(&session, Category::Values).await.expect("gate"),
        Gate::Open
    );

    adapter
        .save(&session, &ranked_values())
        .await
        .expect("save");
    assert!(gate
        .is_satisfied(&session, Category::Values)
        .await
        .expect("check"));
    assert_eq!(
        gate.check(&session, Category::Interests).await.expect("gate"),
        Gate::Open
    );
    assert_eq!(
        gate.check(&session, Category::LifeCategories)
            .await
            .expect("gate"),
        Gate::Redirect(Category::Interests)
    );
}

#[tokio::test]
async fn signup_form_is_checked_before_any_call() {
    let adapter = InMemoryAdapter::new();
    let err = session::sign_up(&adapter, "Ada", "ada@example.com", "hunter22", "hunter23")
        .await
        .expect_err("mismatch");
    assert_eq!(err, ClientError::Validation("Passwords do not match".into()));

    let err = session::sign_in(&adapter, "ada@example.com", "hunter22")
        .await
        .expect_err("no account was created");
    assert_eq!(err, ClientError::Auth("Invalid login credentials".into()));
}

#[tokio::test]
async fn duplicate_signup_surfaces_backend_message() {
    let adapter = InMemoryAdapter::new();
    signed_in(&adapter).await;
    let err = session::sign_up(&adapter, "Ada", "ADA@example.com", "hunter22", "hunter22")
        .await
        .expect_err("duplicate");
    assert_eq!(err.to_string(), "User already registered");
}

#[tokio::test]
async fn sign_out_destroys_the_session() {
    let adapter = InMemoryAdapter::new();
    let session = signed_in(&adapter).await;
    let kept = session.clone();
    session::sign_out(&adapter, session).await.expect("sign out");

    let err = adapter.current_user(&kept).await.expect_err("signed out");
    assert!(matches!(err, ClientError::Auth(_)));
}

#[tokio::test]
async fn end_after_signs_out_on_success_and_failure() {
    let adapter = InMemoryAdapter::new();
    let session = signed_in(&adapter).await;
    let kept = session.clone();
    let value = session::end_after(&adapter, session, Ok::<_, ClientError>(7))
        .await
        .expect("ok");
    assert_eq!(value, 7);
    assert!(matches!(
        adapter.current_user(&kept).await,
        Err(ClientError::Auth(_))
    ));

    let session = session::sign_in(&adapter, "ada@example.com", "hunter22")
        .await
        .expect("sign in");
    let kept = session.clone();
    let err = session::end_after(
        &adapter,
        session,
        Err::<(), _>(ClientError::Validation("bad input".into())),
    )
    .await
    .expect_err("command error surfaces");
    assert_eq!(err, ClientError::Validation("bad input".into()));
    assert!(matches!(
        adapter.current_user(&kept).await,
        Err(ClientError::Auth(_))
    ));
}

#[tokio::test]
async fn users_never_see_each_others_records() {
    let adapter = InMemoryAdapter::new();
    let ada = signed_in(&adapter).await;
    let bob = session::sign_up(&adapter, "Bob", "bob@example.com", "hunter22", "hunter22")
        .await
        .expect("bob");

    adapter.save(&ada, &ranked_values()).await.expect("save");
    assert!(adapter
        .load(&bob, Category::Values)
        .await
        .expect("load")
        .is_none());
    assert_eq!(
        adapter.completed_categories(&ada).await.expect("done"),
        vec![Category::Values]
    );
    assert!(adapter
        .completed_categories(&bob)
        .await
        .expect("done")
        .is_empty());
}

#[tokio::test]
async fn failed_save_resets_the_guard_for_retry() {
    let adapter = InMemoryAdapter::new();
    let session = signed_in(&adapter).await;
    let guard = SaveGuard::new();
    adapter.fail_next_save("network unreachable").await;

    let err = guard
        .save(&adapter, &session, &ranked_values())
        .await
        .expect_err("injected failure");
    assert_eq!(err, ClientError::Persist("network unreachable".into()));
    assert!(!guard.is_saving());

    guard
        .save(&adapter, &session, &ranked_values())
        .await
        .expect("retry");
    assert_eq!(adapter.record_count().await, 1);
}

#[tokio::test]
async fn invalid_content_never_reaches_the_adapter() {
    let adapter = InMemoryAdapter::new();
    let session = signed_in(&adapter).await;
    let guard = SaveGuard::new();
    let content = WorksheetContent::Interests(InterestsContent {
        existing: vec!["Hiking".into(), "Hiking".into()],
        exploring: vec![],
    });

    let err = guard
        .save(&adapter, &session, &content)
        .await
        .expect_err("duplicate");
    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(adapter.record_count().await, 0);
}

struct BlockingAdapter {
    inner: InMemoryAdapter,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl PersistenceAdapter for BlockingAdapter {
    async fn sign_up(&self, request: SignUpRequest) -> Result<Session, ClientError> {
        self.inner.sign_up(request).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        self.inner.sign_in(email, password).await
    }

    async fn sign_out(&self, session: &Session) -> Result<(), ClientError> {
        self.inner.sign_out(session).await
    }

    async fn current_user(&self, session: &Session) -> Result<UserProfile, ClientError> {
        self.inner.current_user(session).await
    }

    async fn save(
        &self,
        session: &Session,
        content: &WorksheetContent,
    ) -> Result<WorksheetRecord, ClientError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.save(session, content).await
    }

    async fn load(
        &self,
        session: &Session,
        category: Category,
    ) -> Result<Option<WorksheetContent>, ClientError> {
        self.inner.load(session, category).await
    }

    async fn completed_categories(&self, session: &Session) -> Result<Vec<Category>, ClientError> {
        self.inner.completed_categories(session).await
    }
}

#[tokio::test]
async fn second_save_while_one_is_in_flight_is_rejected() {
    let adapter = Arc::new(BlockingAdapter {
        inner: InMemoryAdapter::new(),
        entered: Notify::new(),
        release: Notify::new(),
    });
    let session = signed_in(&adapter.inner).await;
    let guard = Arc::new(SaveGuard::new());

    let first = {
        let adapter = adapter.clone();
        let guard = guard.clone();
        let session = session.clone();
        tokio::spawn(async move {
            guard
                .save(adapter.as_ref(), &session, &ranked_values())
                .await
        })
    };
    adapter.entered.notified().await;
    assert!(guard.is_saving());

    let err = guard
        .save(adapter.as_ref(), &session, &ranked_values())
        .await
        .expect_err("in flight");
    assert_eq!(err, ClientError::SaveInFlight);

    adapter.release.notify_one();
    first.await.expect("join").expect("first save");
    assert!(!guard.is_saving());
}

#[derive(Clone, Default)]
struct FakeServer {
    records: Arc<Mutex<HashMap<Category, WorksheetRecord>>>,
    last_token: Arc<Mutex<Option<String>>>,
    signed_out: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

const FAKE_TOKEN: &str = "fake-token";

fn profile() -> UserProfile {
    UserProfile {
        user_id: UserId(42),
        email: "ada@example.com".into(),
        full_name: "Ada Lovelace".into(),
    }
}

fn require_token(
    state_token: &mut Option<String>,
    headers: &HeaderMap,
) -> Result<(), (StatusCode, Json<ApiError>)> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);
    *state_token = token.clone();
    if token.as_deref() == Some(FAKE_TOKEN) {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiError::unauthorized("Invalid or expired session")),
        ))
    }
}

async fn fake_sign_in(
    Json(req): Json<SignInRequest>,
) -> Result<Json<SessionResponse>, (StatusCode, Json<ApiError>)> {
    if req.password != "hunter22" {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiError::unauthorized("Invalid login credentials")),
        ));
    }
    Ok(Json(SessionResponse {
        token: FAKE_TOKEN.into(),
        expires_at: Utc::now() + chrono::Duration::hours(1),
        user: profile(),
    }))
}

async fn fake_sign_out(State(state): State<FakeServer>) -> StatusCode {
    if let Some(tx) = state.signed_out.lock().await.take() {
        let _ = tx.send(());
    }
    StatusCode::NO_CONTENT
}

async fn fake_save(
    State(state): State<FakeServer>,
    headers: HeaderMap,
    Json(content): Json<WorksheetContent>,
) -> Result<Json<WorksheetRecord>, (StatusCode, Json<ApiError>)> {
    require_token(&mut *state.last_token.lock().await, &headers)?;
    if let Err(e) = content.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(ErrorCode::Validation, e.to_string())),
        ));
    }
    let record = WorksheetRecord {
        user_id: UserId(42),
        content: content.clone(),
        updated_at: Utc::now(),
    };
    state
        .records
        .lock()
        .await
        .insert(content.category(), record.clone());
    Ok(Json(record))
}

async fn fake_load(
    State(state): State<FakeServer>,
    headers: HeaderMap,
    Path(category): Path<String>,
) -> Result<Json<WorksheetRecord>, (StatusCode, Json<ApiError>)> {
    require_token(&mut *state.last_token.lock().await, &headers)?;
    let category: Category = category.parse().map_err(|e: shared::domain::UnknownCategory| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::validation(e.to_string())),
        )
    })?;
    state
        .records
        .lock()
        .await
        .get(&category)
        .cloned()
        .map(Json)
        .ok_or((
            StatusCode::NOT_FOUND,
            Json(ApiError::not_found("nothing saved")),
        ))
}

async fn fake_progress(
    State(state): State<FakeServer>,
    headers: HeaderMap,
) -> Result<Json<ProgressResponse>, (StatusCode, Json<ApiError>)> {
    require_token(&mut *state.last_token.lock().await, &headers)?;
    let records = state.records.lock().await;
    let completed: Vec<Category> = records.keys().copied().collect();
    Ok(Json(WorkbookProgress::from_completed(&completed).into()))
}

async fn spawn_fake_server() -> (String, FakeServer, oneshot::Receiver<()>) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (tx, rx) = oneshot::channel();
    let state = FakeServer {
        signed_out: Arc::new(Mutex::new(Some(tx))),
        ..FakeServer::default()
    };
    let app = Router::new()
        .route("/auth/signin", post(fake_sign_in))
        .route("/auth/signout", post(fake_sign_out))
        .route("/worksheets", put(fake_save))
        .route("/worksheets/:category", get(fake_load))
        .route("/progress", get(fake_progress))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state, rx)
}

#[tokio::test]
async fn http_adapter_round_trips_a_worksheet() {
    let (server_url, server, _signed_out) = spawn_fake_server().await;
    let adapter = HttpAdapter::new(&server_url).expect("adapter");

    let session = session::sign_in(&adapter, "ada@example.com", "hunter22")
        .await
        .expect("sign in");
    assert_eq!(session.greeting_name(), "Ada");

    assert!(adapter
        .load(&session, Category::Values)
        .await
        .expect("load")
        .is_none());

    let content = ranked_values();
    adapter.save(&session, &content).await.expect("save");
    assert_eq!(
        server.last_token.lock().await.as_deref(),
        Some(FAKE_TOKEN)
    );
    let loaded = adapter
        .load(&session, Category::Values)
        .await
        .expect("load")
        .expect("present");
    assert_eq!(loaded, content);

    assert_eq!(
        adapter
            .completed_categories(&session)
            .await
            .expect("progress"),
        vec![Category::Values]
    );
}

#[tokio::test]
async fn http_adapter_maps_server_errors() {
    let (server_url, _server, _signed_out) = spawn_fake_server().await;
    let adapter = HttpAdapter::new(&server_url).expect("adapter");

    let err = adapter
        .sign_in("ada@example.com", "wrong")
        .await
        .expect_err("bad password");
    assert_eq!(err, ClientError::Auth("Invalid login credentials".into()));

    let stale = Session {
        token: "stale".into(),
        expires_at: Utc::now(),
        user: profile(),
    };
    let err = adapter
        .save(&stale, &ranked_values())
        .await
        .expect_err("stale token");
    assert!(matches!(err, ClientError::Auth(_)));
}

#[tokio::test]
async fn http_gate_redirects_through_the_server() {
    let (server_url, _server, signed_out) = spawn_fake_server().await;
    let adapter = Arc::new(HttpAdapter::new(&server_url).expect("adapter"));
    let session = session::sign_in(adapter.as_ref(), "ada@example.com", "hunter22")
        .await
        .expect("sign in");
    let gate = PrerequisiteGate::new(adapter.clone());

    assert_eq!(
        gate.check(&session, Category::Interests).await.expect("gate"),
        Gate::Redirect(Category::Values)
    );
    adapter.save(&session, &ranked_values()).await.expect("save");
    assert_eq!(
        gate.check(&session, Category::Interests).await.expect("gate"),
        Gate::Open
    );

    session::sign_out(adapter.as_ref(), session)
        .await
        .expect("sign out");
    signed_out.await.expect("server saw sign out");
}

#[test]
fn http_adapter_rejects_bad_urls() {
    assert!(matches!(
        HttpAdapter::new("not a url"),
        Err(ClientError::Validation(_))
    ));
    let adapter = HttpAdapter::new("http://example.com/api").expect("adapter");
    assert_eq!(adapter.base_url().as_str(), "http://example.com/api/");
}

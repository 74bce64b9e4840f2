use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use server_api::{
    auth::AuthConfig, authenticate, check_prerequisite, current_user_with_profile,
    load_progress, load_worksheet, save_worksheet, sign_in, sign_out, sign_up, ApiContext,
};
use shared::{
    domain::{Category, UserId},
    error::{ApiError, ErrorCode},
    protocol::{
        PrerequisiteResponse, ProgressResponse, SessionResponse, SignInRequest, SignUpRequest,
        UserProfile, WorksheetRecord,
    },
    worksheet::WorksheetContent,
};
use storage::Storage;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};

mod app_state;
mod config;

use app_state::AppState;
use crate::config::{load_settings, prepare_database_url};

type HttpError = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    if settings.jwt_secret == crate::config::Settings::default().jwt_secret {
        warn!("using the built-in development JWT secret; set JWT_SECRET for real deployments");
    }

    let api = ApiContext {
        storage,
        auth: AuthConfig {
            jwt_secret: settings.jwt_secret,
            session_ttl_seconds: settings.session_ttl_seconds,
        },
    };
    let app = build_router(Arc::new(AppState { api }), settings.body_limit_bytes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/auth/signup", post(http_sign_up))
        .route("/auth/signin", post(http_sign_in))
        .route("/auth/signout", post(http_sign_out))
        .route("/me", get(http_me))
        .route("/worksheets", put(http_save_worksheet))
        .route("/worksheets/:category", get(http_load_worksheet))
        .route(
            "/worksheets/:category/prerequisite",
            get(http_check_prerequisite),
        )
        .route("/progress", get(http_progress))
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, HttpError> {
    state.api.storage.health_check().await.map_err(|e| {
        error!(error = %e, "health check failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::new(ErrorCode::Internal, e.to_string())),
        )
    })?;
    Ok("ok")
}

async fn http_sign_up(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), HttpError> {
    let Json(req) = body.map_err(bad_body)?;
    let session = sign_up(&state.api, req).await.map_err(http_error)?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn http_sign_in(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, HttpError> {
    let Json(req) = body.map_err(bad_body)?;
    let session = sign_in(&state.api, req).await.map_err(http_error)?;
    Ok(Json(session))
}

async fn http_sign_out(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, HttpError> {
    let token = bearer_token(&headers)?;
    sign_out(&state.api, token).await.map_err(http_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn http_me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<UserProfile>, HttpError> {
    let user_id = authorize(&state, &headers).await?;
    let profile = current_user_with_profile(&state.api, user_id)
        .await
        .map_err(http_error)?;
    Ok(Json(profile))
}

async fn http_save_worksheet(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<WorksheetContent>, JsonRejection>,
) -> Result<Json<WorksheetRecord>, HttpError> {
    let user_id = authorize(&state, &headers).await?;
    let Json(content) = body.map_err(bad_body)?;
    let record = save_worksheet(&state.api, user_id, content)
        .await
        .map_err(http_error)?;
    Ok(Json(record))
}

async fn http_load_worksheet(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(category): Path<String>,
) -> Result<Json<WorksheetRecord>, HttpError> {
    let user_id = authorize(&state, &headers).await?;
    let category = parse_category(&category)?;
    let record = load_worksheet(&state.api, user_id, category)
        .await
        .map_err(http_error)?;
    Ok(Json(record))
}

async fn http_check_prerequisite(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(category): Path<String>,
) -> Result<Json<PrerequisiteResponse>, HttpError> {
    let user_id = authorize(&state, &headers).await?;
    let category = parse_category(&category)?;
    let gate = check_prerequisite(&state.api, user_id, category)
        .await
        .map_err(http_error)?;
    Ok(Json(gate))
}

async fn http_progress(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ProgressResponse>, HttpError> {
    let user_id = authorize(&state, &headers).await?;
    let progress = load_progress(&state.api, user_id)
        .await
        .map_err(http_error)?;
    Ok(Json(progress))
}

async fn authorize(state: &AppState, headers: &HeaderMap) -> Result<UserId, HttpError> {
    let token = bearer_token(headers)?;
    authenticate(&state.api, token).await.map_err(http_error)
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, HttpError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| http_error(ApiError::unauthorized("missing bearer token")))
}

fn parse_category(raw: &str) -> Result<Category, HttpError> {
    raw.parse::<Category>()
        .map_err(|e| http_error(ApiError::validation(e.to_string())))
}

fn bad_body(rejection: JsonRejection) -> HttpError {
    (
        rejection.status(),
        Json(ApiError::validation(rejection.body_text())),
    )
}

fn http_error(err: ApiError) -> HttpError {
    let status = status_for(err.code);
    if status.is_server_error() {
        error!(message = %err.message, "request failed");
    }
    (status, Json(err))
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

use shared::{
    domain::{Category, UserId},
    error::{ApiError, ErrorCode},
    progress::WorkbookProgress,
    protocol::{
        PrerequisiteResponse, ProgressResponse, SessionResponse, SignInRequest, SignUpRequest,
        UserProfile, WorksheetRecord,
    },
    validation::{normalize_email, validate_credentials},
    worksheet::WorksheetContent,
};
use storage::{Storage, StoredEntry, StoredProfile};
use tracing::{info, warn};

pub mod auth;

use auth::{decode_session_token, hash_password, mint_session_token, verify_password, AuthConfig};

const INVALID_CREDENTIALS: &str = "Invalid login credentials";
const INVALID_SESSION: &str = "Invalid or expired session";

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub auth: AuthConfig,
}

pub async fn sign_up(ctx: &ApiContext, req: SignUpRequest) -> Result<SessionResponse, ApiError> {
    validate_credentials(&req.full_name, &req.email, &req.password)
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let email = normalize_email(&req.email);
    let password_hash = hash_password(&req.password)
        .map_err(|e| ApiError::new(ErrorCode::Internal, format!("password hashing failed: {e}")))?;
    let user = ctx
        .storage
        .create_user(&email, &password_hash, req.full_name.trim())
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::Conflict, "User already registered"))?;

    info!(user_id = %user.user_id, "account created");
    issue_session(
        ctx,
        UserProfile {
            user_id: user.user_id,
            email: user.email,
            full_name: user.full_name,
        },
    )
    .await
}

pub async fn sign_in(ctx: &ApiContext, req: SignInRequest) -> Result<SessionResponse, ApiError> {
    let email = normalize_email(&req.email);
    let Some(credentials) = ctx
        .storage
        .find_credentials(&email)
        .await
        .map_err(internal)?
    else {
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    let matches = verify_password(&req.password, &credentials.password_hash).map_err(|e| {
        ApiError::new(ErrorCode::Internal, format!("stored password hash unreadable: {e}"))
    })?;
    if !matches {
        warn!(user_id = %credentials.user_id, "sign-in rejected");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    if ctx
        .storage
        .profile_for_user(credentials.user_id)
        .await
        .map_err(internal)?
        .is_none()
    {
        warn!(user_id = %credentials.user_id, "profile missing at sign-in; recreating");
    }
    let profile = ctx
        .storage
        .ensure_profile(credentials.user_id)
        .await
        .map_err(|e| {
            ApiError::new(
                ErrorCode::Internal,
                format!("Account setup incomplete. Please contact support. ({e})"),
            )
        })?;

    issue_session(ctx, profile_dto(profile)).await
}

/// Revokes the session behind `token`. Signing out twice is not an error.
pub async fn sign_out(ctx: &ApiContext, token: &str) -> Result<(), ApiError> {
    let claims = decode_session_token(&ctx.auth, token)
        .map_err(|_| ApiError::unauthorized(INVALID_SESSION))?;
    let revoked = ctx
        .storage
        .revoke_session(&claims.jti)
        .await
        .map_err(internal)?;
    info!(sub = %claims.sub, revoked, "signed out");
    Ok(())
}

/// Resolves a bearer token to its user: valid signature, not expired, not revoked.
pub async fn authenticate(ctx: &ApiContext, token: &str) -> Result<UserId, ApiError> {
    let claims = decode_session_token(&ctx.auth, token)
        .map_err(|_| ApiError::unauthorized(INVALID_SESSION))?;
    let user_id = claims
        .user_id()
        .ok_or_else(|| ApiError::unauthorized(INVALID_SESSION))?;

    let session = ctx
        .storage
        .load_session(&claims.jti)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::unauthorized(INVALID_SESSION))?;
    if session.user_id != user_id || !session.is_active_at(chrono::Utc::now()) {
        return Err(ApiError::unauthorized(INVALID_SESSION));
    }
    Ok(user_id)
}

pub async fn current_user_with_profile(
    ctx: &ApiContext,
    user_id: UserId,
) -> Result<UserProfile, ApiError> {
    ctx.storage
        .profile_for_user(user_id)
        .await
        .map_err(internal)?
        .map(profile_dto)
        .ok_or_else(|| ApiError::not_found("profile not found"))
}

pub async fn save_worksheet(
    ctx: &ApiContext,
    user_id: UserId,
    content: WorksheetContent,
) -> Result<WorksheetRecord, ApiError> {
    content
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let stored = ctx
        .storage
        .upsert_entry(user_id, &content)
        .await
        .map_err(internal)?;
    info!(%user_id, category = %stored.category, "worksheet saved");
    Ok(WorksheetRecord {
        user_id,
        content,
        updated_at: stored.updated_at,
    })
}

pub async fn load_worksheet(
    ctx: &ApiContext,
    user_id: UserId,
    category: Category,
) -> Result<WorksheetRecord, ApiError> {
    let entry = ctx
        .storage
        .load_entry(user_id, category)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found(format!("no {category} worksheet saved")))?;
    record_from_entry(entry)
}

/// Existence check for the worksheet that must precede `category`. Re-run on every page entry.
pub async fn check_prerequisite(
    ctx: &ApiContext,
    user_id: UserId,
    category: Category,
) -> Result<PrerequisiteResponse, ApiError> {
    let Some(required) = category.prerequisite() else {
        return Ok(PrerequisiteResponse {
            category,
            satisfied: true,
            redirect_to: None,
        });
    };

    let satisfied = ctx
        .storage
        .entry_exists(user_id, required)
        .await
        .map_err(internal)?;
    if !satisfied {
        info!(%user_id, %category, %required, "prerequisite incomplete");
    }
    Ok(PrerequisiteResponse {
        category,
        satisfied,
        redirect_to: (!satisfied).then_some(required),
    })
}

pub async fn load_progress(
    ctx: &ApiContext,
    user_id: UserId,
) -> Result<ProgressResponse, ApiError> {
    let completed = ctx
        .storage
        .completed_categories(user_id)
        .await
        .map_err(internal)?;
    Ok(WorkbookProgress::from_completed(&completed).into())
}

async fn issue_session(
    ctx: &ApiContext,
    user: UserProfile,
) -> Result<SessionResponse, ApiError> {
    let minted = mint_session_token(&ctx.auth, user.user_id)
        .map_err(|e| ApiError::new(ErrorCode::Internal, format!("token mint failed: {e}")))?;
    ctx.storage
        .create_session(user.user_id, &minted.token_id, minted.expires_at)
        .await
        .map_err(internal)?;
    Ok(SessionResponse {
        token: minted.token,
        expires_at: minted.expires_at,
        user,
    })
}

fn record_from_entry(entry: StoredEntry) -> Result<WorksheetRecord, ApiError> {
    let content = WorksheetContent::from_parts(entry.category, entry.content)
        .map_err(|e| ApiError::new(ErrorCode::Internal, e.to_string()))?;
    Ok(WorksheetRecord {
        user_id: entry.user_id,
        content,
        updated_at: entry.updated_at,
    })
}

fn profile_dto(profile: StoredProfile) -> UserProfile {
    UserProfile {
        user_id: profile.user_id,
        email: profile.email,
        full_name: profile.full_name,
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use shared::{
    domain::{Category, UserId},
    protocol::{SignUpRequest, UserProfile, WorksheetRecord},
    validation::{normalize_email, validate_credentials},
    worksheet::WorksheetContent,
};
use tokio::sync::Mutex;

use crate::{error::ClientError, session::Session};

/// Everything a screen needs from the backend.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    async fn sign_up(&self, request: SignUpRequest) -> Result<Session, ClientError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ClientError>;
    async fn sign_out(&self, session: &Session) -> Result<(), ClientError>;
    async fn current_user(&self, session: &Session) -> Result<UserProfile, ClientError>;
    /// Upsert keyed on `(user, category)`; replaces any earlier content wholesale.
    async fn save(
        &self,
        session: &Session,
        content: &WorksheetContent,
    ) -> Result<WorksheetRecord, ClientError>;
    async fn load(
        &self,
        session: &Session,
        category: Category,
    ) -> Result<Option<WorksheetContent>, ClientError>;
    async fn completed_categories(&self, session: &Session) -> Result<Vec<Category>, ClientError>;
}

const INVALID_CREDENTIALS: &str = "Invalid login credentials";
const INVALID_SESSION: &str = "Invalid or expired session";

/// Process-local backend with the same rules as the server. Used by tests and demos.
#[derive(Default)]
pub struct InMemoryAdapter {
    inner: Mutex<InMemoryState>,
}

#[derive(Default)]
struct InMemoryState {
    next_user_id: i64,
    next_token: u64,
    accounts: HashMap<String, Account>,
    sessions: HashMap<String, UserId>,
    records: HashMap<(UserId, Category), WorksheetRecord>,
    fail_next_save: Option<String>,
}

struct Account {
    password: String,
    profile: UserProfile,
}

impl InMemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `save` fail with `message`, as a dropped connection would.
    pub async fn fail_next_save(&self, message: impl Into<String>) {
        self.inner.lock().await.fail_next_save = Some(message.into());
    }

    pub async fn record_count(&self) -> usize {
        self.inner.lock().await.records.len()
    }
}

impl InMemoryState {
    fn issue(&mut self, profile: UserProfile) -> Session {
        self.next_token += 1;
        let token = format!("mem-{}-{}", profile.user_id, self.next_token);
        self.sessions.insert(token.clone(), profile.user_id);
        Session {
            token,
            expires_at: Utc::now() + Duration::hours(1),
            user: profile,
        }
    }

    fn user_for(&self, session: &Session) -> Result<UserId, ClientError> {
        self.sessions
            .get(&session.token)
            .copied()
            .ok_or_else(|| ClientError::Auth(INVALID_SESSION.into()))
    }
}

#[async_trait]
impl PersistenceAdapter for InMemoryAdapter {
    async fn sign_up(&self, request: SignUpRequest) -> Result<Session, ClientError> {
        validate_credentials(&request.full_name, &request.email, &request.password)?;
        let email = normalize_email(&request.email);
        let mut state = self.inner.lock().await;
        if state.accounts.contains_key(&email) {
            return Err(ClientError::Auth("User already registered".into()));
        }
        state.next_user_id += 1;
        let profile = UserProfile {
            user_id: UserId(state.next_user_id),
            email: email.clone(),
            full_name: request.full_name.trim().to_string(),
        };
        state.accounts.insert(
            email,
            Account {
                password: request.password,
                profile: profile.clone(),
            },
        );
        Ok(state.issue(profile))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let mut state = self.inner.lock().await;
        let profile = match state.accounts.get(&normalize_email(email)) {
            Some(account) if account.password == password => account.profile.clone(),
            _ => return Err(ClientError::Auth(INVALID_CREDENTIALS.into())),
        };
        Ok(state.issue(profile))
    }

    async fn sign_out(&self, session: &Session) -> Result<(), ClientError> {
        self.inner.lock().await.sessions.remove(&session.token);
        Ok(())
    }

    async fn current_user(&self, session: &Session) -> Result<UserProfile, ClientError> {
        let state = self.inner.lock().await;
        let user_id = state.user_for(session)?;
        state
            .accounts
            .values()
            .find(|account| account.profile.user_id == user_id)
            .map(|account| account.profile.clone())
            .ok_or_else(|| ClientError::Persist("profile not found".into()))
    }

    async fn save(
        &self,
        session: &Session,
        content: &WorksheetContent,
    ) -> Result<WorksheetRecord, ClientError> {
        let mut state = self.inner.lock().await;
        let user_id = state.user_for(session)?;
        if let Some(message) = state.fail_next_save.take() {
            return Err(ClientError::Persist(message));
        }
        content.validate()?;
        let record = WorksheetRecord {
            user_id,
            content: content.clone(),
            updated_at: Utc::now(),
        };
        state
            .records
            .insert((user_id, content.category()), record.clone());
        Ok(record)
    }

    async fn load(
        &self,
        session: &Session,
        category: Category,
    ) -> Result<Option<WorksheetContent>, ClientError> {
        let state = self.inner.lock().await;
        let user_id = state.user_for(session)?;
        Ok(state
            .records
            .get(&(user_id, category))
            .map(|record| record.content.clone()))
    }

    async fn completed_categories(&self, session: &Session) -> Result<Vec<Category>, ClientError> {
        let state = self.inner.lock().await;
        let user_id = state.user_for(session)?;
        let mut completed: Vec<Category> = state
            .records
            .keys()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, category)| *category)
            .collect();
        completed.sort();
        Ok(completed)
    }
}

use chrono::{DateTime, Utc};
use shared::{
    protocol::{SessionResponse, SignUpRequest, UserProfile},
    validation::validate_signup,
};
use tracing::{info, warn};

use crate::{adapter::PersistenceAdapter, error::ClientError};

/// Signed-in user. Created by sign-in or sign-up and handed to every screen operation;
/// consumed by [`sign_out`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

impl Session {
    pub fn greeting_name(&self) -> &str {
        self.user.first_name()
    }
}

impl From<SessionResponse> for Session {
    fn from(response: SessionResponse) -> Self {
        Self {
            token: response.token,
            expires_at: response.expires_at,
            user: response.user,
        }
    }
}

/// Signup form submit. The form is checked locally before anything is sent.
pub async fn sign_up(
    adapter: &dyn PersistenceAdapter,
    full_name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<Session, ClientError> {
    validate_signup(full_name, email, password, confirm_password)?;
    let session = adapter
        .sign_up(SignUpRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
            full_name: full_name.trim().to_string(),
        })
        .await?;
    info!(user_id = %session.user.user_id, "signed up");
    Ok(session)
}

pub async fn sign_in(
    adapter: &dyn PersistenceAdapter,
    email: &str,
    password: &str,
) -> Result<Session, ClientError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ClientError::Validation(
            "Please enter your email and password".into(),
        ));
    }
    let session = adapter.sign_in(email.trim(), password).await?;
    info!(user_id = %session.user.user_id, "signed in");
    Ok(session)
}

pub async fn sign_out(adapter: &dyn PersistenceAdapter, session: Session) -> Result<(), ClientError> {
    let user_id = session.user.user_id;
    adapter.sign_out(&session).await?;
    info!(%user_id, "signed out");
    Ok(())
}

/// Signs out once a command built on `session` has run, whether or not it succeeded.
/// The command's own error is returned in preference to a sign-out failure.
pub async fn end_after<T, E>(
    adapter: &dyn PersistenceAdapter,
    session: Session,
    outcome: Result<T, E>,
) -> Result<T, E>
where
    E: From<ClientError>,
{
    match (outcome, sign_out(adapter, session).await) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) => Err(err.into()),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(sign_out_err)) => {
            warn!(error = %sign_out_err, "sign-out after a failed command also failed");
            Err(err)
        }
    }
}

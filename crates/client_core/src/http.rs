use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::Category,
    error::ApiError,
    protocol::{
        ProgressResponse, SessionResponse, SignInRequest, SignUpRequest, UserProfile,
        WorksheetRecord,
    },
    worksheet::WorksheetContent,
};
use tracing::warn;
use url::Url;

use crate::{adapter::PersistenceAdapter, error::ClientError, session::Session};

/// Talks to the workbook server over its JSON routes.
#[derive(Clone)]
pub struct HttpAdapter {
    http: Client,
    base: Url,
}

impl HttpAdapter {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        let mut base = Url::parse(server_url.trim())
            .map_err(|e| ClientError::Validation(format!("invalid server url '{server_url}': {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|e| ClientError::Validation(format!("invalid request path '{path}': {e}")))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "request failed before reaching the server");
            ClientError::Persist(e.to_string())
        })?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(error_from_response(response).await)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Persist(format!("unreadable server response: {e}")))
    }
}

async fn error_from_response(response: Response) -> ClientError {
    let status = response.status();
    match response.json::<ApiError>().await {
        Ok(api_error) => api_error.into(),
        Err(_) if status == StatusCode::UNAUTHORIZED => {
            ClientError::Auth(format!("request rejected ({status})"))
        }
        Err(_) => ClientError::Persist(format!("request failed ({status})")),
    }
}

#[async_trait]
impl PersistenceAdapter for HttpAdapter {
    async fn sign_up(&self, request: SignUpRequest) -> Result<Session, ClientError> {
        let url = self.url("auth/signup")?;
        let response: SessionResponse = self.send_json(self.http.post(url).json(&request)).await?;
        Ok(response.into())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let url = self.url("auth/signin")?;
        let body = SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: SessionResponse = self.send_json(self.http.post(url).json(&body)).await?;
        Ok(response.into())
    }

    async fn sign_out(&self, session: &Session) -> Result<(), ClientError> {
        let url = self.url("auth/signout")?;
        self.send(self.http.post(url).bearer_auth(&session.token))
            .await?;
        Ok(())
    }

    async fn current_user(&self, session: &Session) -> Result<UserProfile, ClientError> {
        let url = self.url("me")?;
        self.send_json(self.http.get(url).bearer_auth(&session.token))
            .await
    }

    async fn save(
        &self,
        session: &Session,
        content: &WorksheetContent,
    ) -> Result<WorksheetRecord, ClientError> {
        let url = self.url("worksheets")?;
        self.send_json(
            self.http
                .put(url)
                .bearer_auth(&session.token)
                .json(content),
        )
        .await
    }

    async fn load(
        &self,
        session: &Session,
        category: Category,
    ) -> Result<Option<WorksheetContent>, ClientError> {
        let url = self.url(&format!("worksheets/{category}"))?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&session.token)
            .send()
            .await
            .map_err(|e| ClientError::Persist(e.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let record: WorksheetRecord = response
            .json()
            .await
            .map_err(|e| ClientError::Persist(format!("unreadable server response: {e}")))?;
        Ok(Some(record.content))
    }

    async fn completed_categories(&self, session: &Session) -> Result<Vec<Category>, ClientError> {
        let url = self.url("progress")?;
        let progress: ProgressResponse = self
            .send_json(self.http.get(url).bearer_auth(&session.token))
            .await?;
        Ok(Category::ALL
            .into_iter()
            .filter(|category| progress.progress.is_complete(*category))
            .collect())
    }
}

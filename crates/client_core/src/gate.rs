use std::sync::Arc;

use shared::domain::Category;
use tracing::info;

use crate::{adapter::PersistenceAdapter, error::ClientError, session::Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Open,
    /// Show this worksheet instead; its record does not exist yet.
    Redirect(Category),
}

/// Decides whether a worksheet page may be shown. Never cached: every page entry asks again.
#[derive(Clone)]
pub struct PrerequisiteGate {
    adapter: Arc<dyn PersistenceAdapter>,
}

impl PrerequisiteGate {
    pub fn new(adapter: Arc<dyn PersistenceAdapter>) -> Self {
        Self { adapter }
    }

    pub async fn check(&self, session: &Session, category: Category) -> Result<Gate, ClientError> {
        let Some(required) = category.prerequisite() else {
            return Ok(Gate::Open);
        };
        if self.is_satisfied(session, required).await? {
            Ok(Gate::Open)
        } else {
            info!(%category, %required, "redirecting to prerequisite");
            Ok(Gate::Redirect(required))
        }
    }

    /// Whether a record for `required` exists for the signed-in user.
    pub async fn is_satisfied(
        &self,
        session: &Session,
        required: Category,
    ) -> Result<bool, ClientError> {
        Ok(self.adapter.load(session, required).await?.is_some())
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{Category, UserId},
    progress::WorkbookProgress,
    worksheet::WorksheetContent,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub email: String,
    pub full_name: String,
}

impl UserProfile {
    /// Name used in greetings; falls back to "there" like the dashboard does.
    pub fn first_name(&self) -> &str {
        self.full_name.split_whitespace().next().unwrap_or("there")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

/// One stored worksheet, flattened to `{user_id, category, content, updated_at}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorksheetRecord {
    pub user_id: UserId,
    #[serde(flatten)]
    pub content: WorksheetContent,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteResponse {
    pub category: Category,
    pub satisfied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<Category>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub progress: WorkbookProgress,
    pub completed_count: usize,
    pub total_steps: usize,
    pub percentage: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<Category>,
}

impl From<WorkbookProgress> for ProgressResponse {
    fn from(progress: WorkbookProgress) -> Self {
        Self {
            progress,
            completed_count: progress.completed_count(),
            total_steps: WorkbookProgress::TOTAL_STEPS,
            percentage: progress.percentage(),
            next_step: progress.next_step(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worksheet::InterestsContent;

    #[test]
    fn worksheet_record_flattens_category_and_content() {
        let record = WorksheetRecord {
            user_id: UserId(7),
            content: WorksheetContent::Interests(InterestsContent::default()),
            updated_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).expect("timestamp"),
        };
        let raw = serde_json::to_value(&record).expect("json");
        assert_eq!(raw["user_id"], 7);
        assert_eq!(raw["category"], "interests");
        assert!(raw["content"]["existing"].is_array());

        let back: WorksheetRecord = serde_json::from_value(raw).expect("decode");
        assert_eq!(back, record);
    }

    #[test]
    fn first_name_falls_back_for_blank_names() {
        let profile = UserProfile {
            user_id: UserId(1),
            email: "a@b.c".into(),
            full_name: "  ".into(),
        };
        assert_eq!(profile.first_name(), "there");
    }
}

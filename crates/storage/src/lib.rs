use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::{
    domain::{Category, UserId},
    worksheet::WorksheetContent,
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user_id: UserId,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub user_id: UserId,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
}

#[derive(Debug, Clone)]
pub struct StoredProfile {
    pub user_id: UserId,
    pub email: String,
    pub full_name: String,
}

#[derive(Debug, Clone)]
pub struct StoredSession {
    pub token_id: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl StoredSession {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub user_id: UserId,
    pub category: Category,
    pub content: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        // every connection to `sqlite::memory:` is a separate database
        let pool_options = if database_url.starts_with("sqlite::memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(connect_options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Creates the account and its profile together. Returns `None` when the email is taken.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        full_name: &str,
    ) -> Result<Option<StoredUser>> {
        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query(
            "INSERT INTO users (email, password_hash, full_name, created_at) VALUES (?, ?, ?, ?)
             RETURNING id, email, full_name, created_at",
        )
        .bind(email)
        .bind(password_hash)
        .bind(full_name)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await;

        let row = match inserted {
            Ok(row) => row,
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let user = StoredUser {
            user_id: UserId(row.get::<i64, _>(0)),
            email: row.get::<String, _>(1),
            full_name: row.get::<String, _>(2),
            created_at: row.get::<DateTime<Utc>, _>(3),
        };

        sqlx::query("INSERT INTO profiles (user_id, full_name) VALUES (?, ?)")
            .bind(user.user_id.0)
            .bind(full_name)
            .execute(&mut *tx)
            .await
            .context("failed to create profile for new user")?;
        tx.commit().await?;
        Ok(Some(user))
    }

    pub async fn find_credentials(&self, email: &str) -> Result<Option<StoredCredentials>> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, full_name FROM users WHERE email = ? COLLATE NOCASE",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| StoredCredentials {
            user_id: UserId(r.get::<i64, _>(0)),
            email: r.get::<String, _>(1),
            password_hash: r.get::<String, _>(2),
            full_name: r.get::<String, _>(3),
        }))
    }

    pub async fn profile_for_user(&self, user_id: UserId) -> Result<Option<StoredProfile>> {
        let row = sqlx::query(
            "SELECT u.id, u.email, p.full_name
             FROM profiles p
             INNER JOIN users u ON u.id = p.user_id
             WHERE p.user_id = ?",
        )
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| StoredProfile {
            user_id: UserId(r.get::<i64, _>(0)),
            email: r.get::<String, _>(1),
            full_name: r.get::<String, _>(2),
        }))
    }

    /// Recreates a missing profile from the name captured at signup. Returns the profile either way.
    pub async fn ensure_profile(&self, user_id: UserId) -> Result<StoredProfile> {
        let inserted = sqlx::query(
            "INSERT INTO profiles (user_id, full_name)
             SELECT id, full_name FROM users WHERE id = ?
             ON CONFLICT(user_id) DO NOTHING",
        )
        .bind(user_id.0)
        .execute(&self.pool)
        .await?
        .rows_affected();
        if inserted > 0 {
            debug!(%user_id, "recreated missing profile");
        }

        self.profile_for_user(user_id)
            .await?
            .ok_or_else(|| anyhow!("user {user_id} does not exist"))
    }

    pub async fn create_session(
        &self,
        user_id: UserId,
        token_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("INSERT INTO sessions (token_id, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(token_id)
            .bind(user_id.0)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn load_session(&self, token_id: &str) -> Result<Option<StoredSession>> {
        let row = sqlx::query(
            "SELECT token_id, user_id, expires_at, revoked_at FROM sessions WHERE token_id = ?",
        )
        .bind(token_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| StoredSession {
            token_id: r.get::<String, _>(0),
            user_id: UserId(r.get::<i64, _>(1)),
            expires_at: r.get::<DateTime<Utc>, _>(2),
            revoked_at: r.get::<Option<DateTime<Utc>>, _>(3),
        }))
    }

    /// Marks the session revoked. Revoking twice keeps the first timestamp.
    pub async fn revoke_session(&self, token_id: &str) -> Result<bool> {
        let updated = sqlx::query(
            "UPDATE sessions SET revoked_at = ? WHERE token_id = ? AND revoked_at IS NULL",
        )
        .bind(Utc::now())
        .bind(token_id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(updated > 0)
    }

    /// Deletes sessions that expired at or before `before`, and every revoked session.
    pub async fn purge_sessions(&self, before: DateTime<Utc>) -> Result<u64> {
        let deleted = sqlx::query(
            "DELETE FROM sessions WHERE expires_at <= ? OR revoked_at IS NOT NULL",
        )
        .bind(before)
        .execute(&self.pool)
        .await?
        .rows_affected();
        debug!(deleted, "purged sessions");
        Ok(deleted)
    }

    /// Insert-or-overwrite keyed on `(user_id, category)`. The previous content is replaced wholesale.
    pub async fn upsert_entry(
        &self,
        user_id: UserId,
        content: &WorksheetContent,
    ) -> Result<StoredEntry> {
        let category = content.category();
        let raw = serde_json::to_string(&content.content_json())
            .context("failed to serialize worksheet content")?;
        let now = Utc::now();
        let row = sqlx::query(
            "INSERT INTO workbook_entries (user_id, category, content, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(user_id, category) DO UPDATE SET content = excluded.content, updated_at = excluded.updated_at
             RETURNING created_at, updated_at",
        )
        .bind(user_id.0)
        .bind(category.as_str())
        .bind(&raw)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to upsert {category} entry for user {user_id}"))?;

        Ok(StoredEntry {
            user_id,
            category,
            content: content.content_json(),
            created_at: row.get::<DateTime<Utc>, _>(0),
            updated_at: row.get::<DateTime<Utc>, _>(1),
        })
    }

    pub async fn load_entry(
        &self,
        user_id: UserId,
        category: Category,
    ) -> Result<Option<StoredEntry>> {
        let row = sqlx::query(
            "SELECT content, created_at, updated_at
             FROM workbook_entries
             WHERE user_id = ? AND category = ?",
        )
        .bind(user_id.0)
        .bind(category.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw = row.get::<String, _>(0);
        let content = serde_json::from_str(&raw).with_context(|| {
            format!("stored {category} entry for user {user_id} is not valid JSON")
        })?;
        Ok(Some(StoredEntry {
            user_id,
            category,
            content,
            created_at: row.get::<DateTime<Utc>, _>(1),
            updated_at: row.get::<DateTime<Utc>, _>(2),
        }))
    }

    pub async fn entry_exists(&self, user_id: UserId, category: Category) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM workbook_entries WHERE user_id = ? AND category = ?",
        )
        .bind(user_id.0)
        .bind(category.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    /// Categories with a stored record, in workbook order.
    pub async fn completed_categories(&self, user_id: UserId) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT category FROM workbook_entries WHERE user_id = ?")
            .bind(user_id.0)
            .fetch_all(&self.pool)
            .await?;
        let mut categories = rows
            .into_iter()
            .map(|r| {
                let raw = r.get::<String, _>(0);
                Category::from_str(&raw).map_err(anyhow::Error::from)
            })
            .collect::<Result<Vec<_>>>()?;
        categories.sort();
        Ok(categories)
    }

    /// Out-of-band removal; the application surface never deletes entries.
    pub async fn delete_entry(&self, user_id: UserId, category: Category) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM workbook_entries WHERE user_id = ? AND category = ?")
            .bind(user_id.0)
            .bind(category.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    pub async fn list_users(&self) -> Result<Vec<StoredUser>> {
        let rows = sqlx::query(
            "SELECT id, email, full_name, created_at FROM users ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| StoredUser {
                user_id: UserId(r.get::<i64, _>(0)),
                email: r.get::<String, _>(1),
                full_name: r.get::<String, _>(2),
                created_at: r.get::<DateTime<Utc>, _>(3),
            })
            .collect())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

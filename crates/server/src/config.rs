use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use ::config::{Config, Environment, File, Map};
use serde::Deserialize;

pub const DEFAULT_BODY_LIMIT_BYTES: usize = 256 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub session_ttl_seconds: i64,
    pub body_limit_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8443".into(),
            database_url: "sqlite://./data/lifealigner.db".into(),
            jwt_secret: "dev-only-change-me".into(),
            session_ttl_seconds: 7 * 24 * 3600,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

const LEGACY_KEYS: [&str; 3] = ["SERVER_BIND", "DATABASE_URL", "JWT_SECRET"];

/// Defaults, then `server.toml`, then the bare legacy names, then `APP__*` variables.
pub fn load_settings() -> anyhow::Result<Settings> {
    let env: Map<String, String> = std::env::vars().collect();
    layer_settings(Some("server"), &env)
}

fn layer_settings(file: Option<&str>, env: &Map<String, String>) -> anyhow::Result<Settings> {
    let defaults = Settings::default();
    let mut builder = Config::builder()
        .set_default("server_bind", defaults.server_bind)?
        .set_default("database_url", defaults.database_url)?
        .set_default("jwt_secret", defaults.jwt_secret)?
        .set_default("session_ttl_seconds", defaults.session_ttl_seconds)?
        .set_default("body_limit_bytes", defaults.body_limit_bytes as u64)?;
    if let Some(name) = file {
        builder = builder.add_source(File::with_name(name).required(false));
    }

    let legacy: Map<String, String> = env
        .iter()
        .filter(|(key, _)| LEGACY_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let layered = builder
        .add_source(Environment::default().source(Some(legacy)))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("__")
                .try_parsing(true)
                .source(Some(env.clone())),
        )
        .build()
        .context("failed to layer server settings")?;

    layered
        .try_deserialize()
        .context("invalid server settings")
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite://") {
        let path = path.replace('\\', "/");
        if has_drive_prefix(&path) {
            return format!("sqlite:{path}");
        }
        return format!("sqlite://{path}");
    }

    if raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    let path = raw_database_url
        .strip_prefix("sqlite:")
        .unwrap_or(raw_database_url)
        .replace('\\', "/");
    if has_drive_prefix(&path) {
        return format!("sqlite:{path}");
    }
    format!("sqlite://{path}")
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
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
#[path = "tests/config_tests.rs"]
mod tests;

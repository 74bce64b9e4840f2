use super::{layer_settings, normalize_database_url, prepare_database_url, Settings};

use ::config::Map;

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
}

#[test]
fn blank_database_url_falls_back_to_default() {
    assert_eq!(
        normalize_database_url("   "),
        Settings::default().database_url
    );
}

#[test]
fn memory_url_is_left_alone() {
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
}

#[test]
fn keeps_windows_absolute_path_with_single_sqlite_colon() {
    assert_eq!(
        normalize_database_url("sqlite:C:\\Users\\alice\\test.db"),
        "sqlite:C:/Users/alice/test.db"
    );
}

#[test]
fn normalizes_windows_plain_path_with_single_sqlite_colon() {
    assert_eq!(
        normalize_database_url("C:\\Users\\alice\\test.db"),
        "sqlite:C:/Users/alice/test.db"
    );
}

#[test]
fn converts_sqlite_double_slash_windows_path() {
    assert_eq!(
        normalize_database_url("sqlite://C:/Users/alice/test.db"),
        "sqlite:C:/Users/alice/test.db"
    );
}

#[test]
fn creates_parent_dir_for_nested_sqlite_path() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("data").join("test.db");

    prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare db url");
    assert!(temp_root.path().join("data").exists());
}

fn env(pairs: &[(&str, &str)]) -> Map<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[test]
fn legacy_env_names_override_defaults() {
    let settings = layer_settings(
        None,
        &env(&[
            ("SERVER_BIND", "0.0.0.0:9000"),
            ("JWT_SECRET", "from-env"),
            ("UNRELATED", "ignored"),
        ]),
    )
    .expect("settings");

    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(settings.jwt_secret, "from-env");
    assert_eq!(settings.database_url, Settings::default().database_url);
}

#[test]
fn prefixed_env_wins_over_legacy_names() {
    let settings = layer_settings(
        None,
        &env(&[
            ("DATABASE_URL", "sqlite://./legacy.db"),
            ("APP__DATABASE_URL", "sqlite://./app.db"),
            ("APP__SESSION_TTL_SECONDS", "60"),
        ]),
    )
    .expect("settings");

    assert_eq!(settings.database_url, "sqlite://./app.db");
    assert_eq!(settings.session_ttl_seconds, 60);
}

#[tokio::test]
async fn prepared_database_url_creates_openable_sqlite_file() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("server.db");

    let prepared = prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare");
    let storage = storage::Storage::new(&prepared).await.expect("open sqlite");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should be created: {}",
        db_path.display()
    );
}

//! Shared integration-test server bootstrap helpers.

use axum_test::TestServer;
use lexicard_core::models::WordEntry;
use lexicard_server::{create_app, AppState, Config};
use std::path::Path;
use tempfile::TempDir;

pub(crate) fn test_config_for_dir(data_dir: &Path) -> Config {
    Config {
        data_dir: data_dir.to_str().expect("data dir").to_string(),
        static_dir: None,
        port: 0,
        max_body_size: 64 * 1024,
    }
}

pub(crate) fn test_server_for_config(config: Config) -> (TestServer, AppState) {
    let state = AppState::open(config).expect("open store");
    let app = create_app(state.clone(), false);
    let server = TestServer::new(app).expect("server");
    (server, state)
}

pub(crate) fn setup_test_server() -> (TestServer, TempDir, AppState) {
    let temp_dir = TempDir::new().expect("temp dir");
    let config = test_config_for_dir(temp_dir.path());
    let (server, state) = test_server_for_config(config);
    (server, temp_dir, state)
}

pub(crate) fn sample_lesson() -> Vec<WordEntry> {
    vec![
        WordEntry::new("cat", "кошка", true),
        WordEntry::new("dog", "собака", false),
    ]
}

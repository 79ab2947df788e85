//! Full stack: lesson server on a loopback port, client driver on top.

use lexicard::models::WordEntry;
use lexicard::session::{DisplayFilter, LoadOutcome, PersistPolicy, SessionAction};
use lexicard::{AppState, ClientConfig, Config, EmbeddedServer, FileStore, SessionDriver};
use std::time::Duration;
use tempfile::TempDir;

fn start_server(data: &TempDir) -> EmbeddedServer {
    let config = Config {
        data_dir: data.path().to_string_lossy().to_string(),
        static_dir: None,
        port: 0,
        max_body_size: 1024 * 1024,
    };
    EmbeddedServer::start(AppState::open(config).expect("state"), false).expect("server")
}

fn client_config(server: &EmbeddedServer, downloads: &TempDir) -> ClientConfig {
    ClientConfig {
        server: server.base_url(),
        timeout: Duration::from_secs(5),
        download_dir: downloads.path().to_path_buf(),
        persist_policy: PersistPolicy::SingleFileOnly,
        data_dir: None,
    }
}

#[tokio::test]
async fn review_and_edit_round_trip() {
    let data = TempDir::new().expect("data dir");
    let downloads = TempDir::new().expect("downloads dir");
    let store = FileStore::open(data.path()).expect("store");
    store
        .write_file(
            "lesson1",
            &[
                WordEntry::new("dog", "sobaka", true),
                WordEntry::new("fox", "lisa", false),
            ],
        )
        .expect("seed");
    let server = start_server(&data);
    let mut driver =
        SessionDriver::from_config(&client_config(&server, &downloads)).expect("driver");

    assert_eq!(driver.list_files().await, vec!["lesson1"]);
    assert!(matches!(
        driver.select("lesson1", false).await,
        LoadOutcome::Applied(_)
    ));
    assert_eq!(driver.session().visible_len(), 1);

    driver
        .run(SessionAction::SetDisplayFilter(DisplayFilter::All))
        .await
        .expect("filter");
    assert_eq!(driver.session().visible_len(), 2);

    for _ in 0..2 {
        driver.run(SessionAction::ToggleCurrent).await.expect("toggle");
    }
    driver
        .run(SessionAction::Add {
            headword: "owl".to_string(),
            translation: "sova".to_string(),
            active: true,
            target_file: "lesson1".to_string(),
        })
        .await
        .expect("add");

    let reloaded = store.read_file("lesson1").expect("reload");
    assert_eq!(
        reloaded,
        vec![
            WordEntry::new("dog", "sobaka", true),
            WordEntry::new("fox", "lisa", false),
            WordEntry::new("owl", "sova", true),
        ]
    );
    assert_eq!(std::fs::read_dir(downloads.path()).expect("downloads").count(), 0);

    drop(driver);
    drop(server);
}

#[tokio::test]
async fn saves_fall_back_to_downloads_once_the_server_stops() {
    let data = TempDir::new().expect("data dir");
    let downloads = TempDir::new().expect("downloads dir");
    FileStore::open(data.path())
        .expect("store")
        .write_file("lesson2", &[WordEntry::new("cat", "kot", true)])
        .expect("seed");
    let server = start_server(&data);
    let config = ClientConfig {
        timeout: Duration::from_secs(2),
        ..client_config(&server, &downloads)
    };
    let mut driver = SessionDriver::from_config(&config).expect("driver");
    driver.load_single("lesson2").await;
    drop(server);

    let reports = driver
        .run(SessionAction::ToggleCurrent)
        .await
        .expect("toggle");
    assert_eq!(reports.len(), 1);
    assert!(reports[0].result.is_ok());

    let copy = FileStore::open(downloads.path())
        .expect("downloads")
        .read_file("lesson2")
        .expect("downloaded lesson");
    assert_eq!(copy, vec![WordEntry::new("cat", "kot", false)]);
    let original = FileStore::open(data.path())
        .expect("store")
        .read_file("lesson2")
        .expect("original");
    assert!(original[0].active);
}

//! Integration tests for the Lexicard lesson HTTP API.

mod support;

use axum::http::StatusCode;
use lexicard_core::models::WordEntry;
use serde_json::json;
use std::fs;
use support::{sample_lesson, setup_test_server, test_config_for_dir, test_server_for_config};
use tempfile::TempDir;

#[tokio::test]
async fn test_lesson_lifecycle() {
    let (server, temp, _state) = setup_test_server();

    let empty = server.get("/api/files").await;
    assert_eq!(empty.status_code(), StatusCode::OK);
    assert_eq!(empty.json::<Vec<String>>(), Vec::<String>::new());

    let save = server.post("/api/save/lesson1").json(&sample_lesson()).await;
    assert_eq!(save.status_code(), StatusCode::OK);
    let body: serde_json::Value = save.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "lesson1.json updated successfully");
    assert!(temp.path().join("lesson1.json").is_file());

    let read = server.get("/api/data/lesson1").await;
    assert_eq!(read.status_code(), StatusCode::OK);
    assert_eq!(read.json::<Vec<WordEntry>>(), sample_lesson());

    let listed = server.get("/api/files").await;
    assert_eq!(listed.json::<Vec<String>>(), vec!["lesson1".to_string()]);
}

#[tokio::test]
async fn test_wire_format_uses_flag_integers() {
    let (server, temp, _state) = setup_test_server();

    server
        .post("/api/save/lesson2")
        .json(&json!([{ "eng": "tree", "rus": "дерево", "display": 1 }]))
        .await
        .assert_status_ok();

    let raw = fs::read_to_string(temp.path().join("lesson2.json")).expect("read file");
    assert!(raw.contains("\"display\": 1"), "{}", raw);
    assert!(raw.starts_with("[\n  {"), "{}", raw);

    let read: serde_json::Value = server.get("/api/data/lesson2").await.json();
    assert_eq!(read, json!([{ "eng": "tree", "rus": "дерево", "display": 1 }]));
}

#[tokio::test]
async fn test_list_is_sorted_and_skips_non_lessons() {
    let (server, temp, _state) = setup_test_server();
    for name in ["lesson3", "lesson1", "lesson2"] {
        server
            .post(&format!("/api/save/{}", name))
            .json(&sample_lesson())
            .await
            .assert_status_ok();
    }
    fs::write(temp.path().join("notes.txt"), "ignored").expect("write notes");
    fs::write(temp.path().join("bad name.json"), "[]").expect("write bad name");

    let names: Vec<String> = server.get("/api/files").await.json();
    assert_eq!(names, vec!["lesson1", "lesson2", "lesson3"]);
}

#[tokio::test]
async fn test_missing_lesson_returns_not_found() {
    let (server, _temp, _state) = setup_test_server();
    let response = server.get("/api/data/lesson9").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "File not found");
}

#[tokio::test]
async fn test_corrupt_lesson_returns_unprocessable() {
    let (server, temp, _state) = setup_test_server();
    fs::write(temp.path().join("broken.json"), "{ not json").expect("write corrupt");

    let response = server.get("/api/data/broken").await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Failed to read file");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn test_traversal_names_are_rejected() {
    let (server, temp, _state) = setup_test_server();

    let read = server.get("/api/data/..%2Fsecret").await;
    assert_eq!(read.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(read.json::<serde_json::Value>()["error"], "Invalid file name");

    let save = server
        .post("/api/save/..%2Fescape")
        .json(&sample_lesson())
        .await;
    assert_eq!(save.status_code(), StatusCode::BAD_REQUEST);
    assert!(!temp.path().parent().expect("parent").join("escape.json").exists());

    let dotted = server.get("/api/data/lesson1.json").await;
    assert_eq!(dotted.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_name_wins_over_malformed_body() {
    let (server, _temp, _state) = setup_test_server();
    let response = server
        .post("/api/save/bad.name")
        .json(&json!({ "not": "an array" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<serde_json::Value>()["error"], "Invalid file name");
}

#[tokio::test]
async fn test_malformed_body_is_rejected_without_writing() {
    let (server, temp, _state) = setup_test_server();
    server
        .post("/api/save/lesson1")
        .json(&sample_lesson())
        .await
        .assert_status_ok();

    let cases = [
        json!({ "not": "an array" }),
        json!([{ "eng": "cat", "rus": "кошка", "display": true }]),
        json!([{ "eng": "cat", "display": 1 }]),
    ];
    for body in cases {
        let response = server.post("/api/save/lesson1").json(&body).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "{}", body);
    }

    let on_disk: Vec<WordEntry> = serde_json::from_str(
        &fs::read_to_string(temp.path().join("lesson1.json")).expect("read"),
    )
    .expect("parse");
    assert_eq!(on_disk, sample_lesson());
}

#[tokio::test]
async fn test_save_replaces_whole_lesson() {
    let (server, _temp, _state) = setup_test_server();
    server
        .post("/api/save/lesson1")
        .json(&sample_lesson())
        .await
        .assert_status_ok();
    server
        .post("/api/save/lesson1")
        .json(&Vec::<WordEntry>::new())
        .await
        .assert_status_ok();

    let read: Vec<WordEntry> = server.get("/api/data/lesson1").await.json();
    assert!(read.is_empty());
}

#[tokio::test]
async fn test_static_data_mirror_serves_lesson_files() {
    let (server, _temp, _state) = setup_test_server();
    server
        .post("/api/save/lesson1")
        .json(&sample_lesson())
        .await
        .assert_status_ok();

    let mirrored = server.get("/data/lesson1.json").await;
    assert_eq!(mirrored.status_code(), StatusCode::OK);
    assert_eq!(mirrored.json::<Vec<WordEntry>>(), sample_lesson());

    let missing = server.get("/data/lesson9.json").await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_static_dir_serves_page_assets() {
    let data = TempDir::new().expect("data dir");
    let assets = TempDir::new().expect("assets dir");
    fs::write(assets.path().join("index.html"), "<h1>cards</h1>").expect("write index");

    let mut config = test_config_for_dir(data.path());
    config.static_dir = Some(assets.path().to_string_lossy().to_string());
    let (server, _state) = test_server_for_config(config);

    let page = server.get("/index.html").await;
    assert_eq!(page.status_code(), StatusCode::OK);
    assert!(page.text().contains("cards"));
}

#[tokio::test]
async fn test_health_reports_port_and_security_headers() {
    let (server, _temp, _state) = setup_test_server();
    let response = server.get("/api/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "Server is running");
    assert_eq!(body["port"], 0);
    response.assert_header("x-content-type-options", "nosniff");
    response.assert_header("x-frame-options", "DENY");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let (server, _temp, _state) = setup_test_server();
    let big: Vec<WordEntry> = (0..4000)
        .map(|i| WordEntry::new(format!("word{}", i), "x".repeat(16), true))
        .collect();
    let response = server.post("/api/save/lesson1").json(&big).await;
    assert!(response.status_code().is_client_error());
    assert!(server.get("/api/data/lesson1").await.status_code() == StatusCode::NOT_FOUND);
}

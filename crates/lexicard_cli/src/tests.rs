//! Unit tests for the `lexicard` CLI entrypoint module.

use super::{
    apply_overrides, format_files_output, format_notice, format_persist_output,
    format_rows_output, numbered_rows, parse_study_command, record_at, render_card,
    save_unsaved, StudyCommand,
};
use super::{Cli, Commands};
use clap::Parser;
use lexicard_client::{ClientConfig, PersistReport, Saved, SessionDriver};
use lexicard_core::env::{env_lock, EnvGuard};
use lexicard_core::models::WordEntry;
use lexicard_core::session::{
    Direction, DisplayFilter, FileBatch, LoadedScope, Notice, PersistPolicy, PrimaryLanguage,
    Session, SessionAction, Severity,
};
use lexicard_core::{AppError, FileStore, DEFAULT_PORT};
use std::path::PathBuf;
use std::time::Duration;

fn loaded_session(names: &[&str]) -> Session {
    let mut session = Session::new(PersistPolicy::default());
    let scope = match names {
        [single] => LoadedScope::SingleFile(single.to_string()),
        _ => LoadedScope::MultiFile(names.iter().map(|name| name.to_string()).collect()),
    };
    let ticket = session.begin_load(scope);
    let batches = names
        .iter()
        .map(|name| {
            FileBatch::loaded(
                *name,
                vec![
                    WordEntry::new(format!("{}-dog", name), "sobaka", true),
                    WordEntry::new(format!("{}-fox", name), "lisa", false),
                ],
            )
        })
        .collect();
    session.finish_load(ticket, batches);
    session
}

#[test]
fn cli_parses_show_with_multiple_lessons_and_search() {
    let cli = Cli::try_parse_from([
        "lexicard", "show", "lesson1", "lesson2", "--all", "--search", "do",
    ])
    .expect("cli should parse show");
    match cli.command {
        Commands::Show {
            names,
            all_files,
            all,
            search,
        } => {
            assert_eq!(names, vec!["lesson1", "lesson2"]);
            assert!(!all_files);
            assert!(all);
            assert_eq!(search.as_deref(), Some("do"));
        }
        _ => panic!("expected show command"),
    }
}

#[test]
fn cli_rejects_names_with_all_files() {
    assert!(Cli::try_parse_from(["lexicard", "show", "lesson1", "--all-files"]).is_err());
}

#[test]
fn cli_parses_edit_options_and_global_flags() {
    let cli = Cli::try_parse_from([
        "lexicard",
        "edit",
        "lesson1",
        "2",
        "--translation",
        "lisitsa",
        "--active",
        "true",
        "--persist",
        "per-record",
        "--json",
    ])
    .expect("cli should parse edit");
    assert!(cli.json);
    assert_eq!(cli.persist, Some(PersistPolicy::PerRecordSource));
    match cli.command {
        Commands::Edit {
            lesson,
            index,
            headword,
            translation,
            active,
        } => {
            assert_eq!(lesson, "lesson1");
            assert_eq!(index, 2);
            assert_eq!(headword, None);
            assert_eq!(translation.as_deref(), Some("lisitsa"));
            assert_eq!(active, Some(true));
        }
        _ => panic!("expected edit command"),
    }
}

#[test]
fn cli_rejects_unknown_persist_policy() {
    assert!(Cli::try_parse_from(["lexicard", "files", "--persist", "sometimes"]).is_err());
}

#[test]
fn lexicard_server_env_value_is_used() {
    let _lock = env_lock().lock().expect("env lock");
    let _server = EnvGuard::set("LEXICARD_SERVER", "http://127.0.0.1:47777");
    let _data = EnvGuard::remove("LEXICARD_DATA_DIR");
    let cli = Cli::parse_from(["lexicard", "files"]);
    assert_eq!(cli.server.as_deref(), Some("http://127.0.0.1:47777"));
    assert!(cli.data_dir.is_none());
}

#[test]
fn apply_overrides_prefers_flags_and_ignores_blank_values() {
    let base = ClientConfig::default();
    let config = apply_overrides(
        base.clone(),
        Some(format!("http://localhost:{}/", DEFAULT_PORT + 1)),
        Some(PathBuf::from("/tmp/lessons")),
        Some(9),
        Some(PersistPolicy::PerRecordSource),
    );
    assert_eq!(config.server, format!("http://127.0.0.1:{}", DEFAULT_PORT + 1));
    assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/lessons")));
    assert_eq!(config.timeout, Duration::from_secs(9));
    assert_eq!(config.persist_policy, PersistPolicy::PerRecordSource);

    let unchanged = apply_overrides(base.clone(), Some("   ".to_string()), None, Some(0), None);
    assert_eq!(unchanged, base);
}

#[test]
fn files_output_matrix() {
    let names = vec!["lesson1".to_string(), "lesson2".to_string()];
    assert_eq!(
        format_files_output(&names, false).expect("plain"),
        "lesson1\nlesson2"
    );
    let rendered = format_files_output(&names, true).expect("json");
    let parsed: Vec<String> = serde_json::from_str(&rendered).expect("valid json");
    assert_eq!(parsed, names);
}

#[test]
fn rows_output_marks_inactive_words_and_lessons() {
    let mut session = loaded_session(&["lesson1", "lesson2"]);
    session.set_display_filter(DisplayFilter::All);
    let rows = numbered_rows(&session);

    let plain = format_rows_output(&rows, true, false).expect("plain");
    let lines: Vec<&str> = plain.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("   1   lesson1-dog"));
    assert!(lines[1].starts_with("   2 - lesson1-fox"));
    assert!(lines[2].starts_with("   1   lesson2-dog"));
    assert!(lines[3].ends_with("[lesson2]"));

    let rendered = format_rows_output(&rows, false, true).expect("json");
    let parsed: serde_json::Value = serde_json::from_str(&rendered).expect("valid json");
    assert_eq!(parsed[1]["eng"], "lesson1-fox");
    assert_eq!(parsed[1]["position"], 2);
    assert_eq!(parsed[1]["display"], 0);
    assert_eq!(parsed[2]["file"], "lesson2");
}

#[test]
fn persist_output_describes_each_outcome() {
    let reports = vec![
        PersistReport {
            file: "lesson1".to_string(),
            result: Ok(Saved::Stored { provider: "api" }),
        },
        PersistReport {
            file: "lesson2".to_string(),
            result: Ok(Saved::Downloaded(PathBuf::from("downloads/lesson2.json"))),
        },
        PersistReport {
            file: "lesson3".to_string(),
            result: Err(AppError::InvalidName("lesson3".to_string())),
        },
    ];

    let plain = format_persist_output(&reports, false).expect("plain");
    let lines: Vec<&str> = plain.lines().collect();
    assert_eq!(lines[0], "Saved lesson1.json");
    assert!(lines[1].contains("downloads/lesson2.json"));
    assert!(lines[2].starts_with("Could not save lesson3"));

    let rendered = format_persist_output(&reports, true).expect("json");
    let parsed: serde_json::Value = serde_json::from_str(&rendered).expect("valid json");
    assert_eq!(parsed[0]["saved"], "api");
    assert_eq!(parsed[1]["saved"], "download");
    assert!(parsed[2]["error"].is_string());
}

#[test]
fn notice_formatting_includes_level_and_detail() {
    let notice = Notice::new(Severity::Warn, "Lesson unavailable", "lesson2: not found");
    assert_eq!(
        format_notice(&notice),
        "[warn] Lesson unavailable: lesson2: not found"
    );
    let bare = Notice::new(Severity::Success, "Saved", "");
    assert_eq!(format_notice(&bare), "[ok] Saved");
}

#[test]
fn render_card_shows_back_only_when_revealed() {
    let mut session = loaded_session(&["lesson1"]);
    let title = session.display_title();
    let face = session.current_card().expect("card");
    let hidden = render_card(&face, title.as_deref());
    assert_eq!(hidden, "Lesson1 (Active Words)\n[1/1] lesson1-dog");

    session.reveal_card();
    let face = session.current_card().expect("card");
    assert_eq!(render_card(&face, None), "[1/1] lesson1-dog\n      sobaka");

    session.set_primary_language(PrimaryLanguage::Target);
    session.reveal_card();
    let face = session.current_card().expect("card");
    assert_eq!(render_card(&face, None), "[1/1] sobaka\n      lesson1-dog");
}

#[test]
fn study_commands_map_to_session_actions() {
    let session = loaded_session(&["lesson1"]);
    let cases = [
        ("", Some(StudyCommand::Act(SessionAction::Advance(Direction::Forward)))),
        ("p\n", Some(StudyCommand::Act(SessionAction::Advance(Direction::Backward)))),
        ("f", Some(StudyCommand::Act(SessionAction::Reveal))),
        ("t", Some(StudyCommand::Act(SessionAction::ToggleCurrent))),
        (
            "l",
            Some(StudyCommand::Act(SessionAction::SetPrimaryLanguage(
                PrimaryLanguage::Target,
            ))),
        ),
        (
            "a",
            Some(StudyCommand::Act(SessionAction::SetDisplayFilter(
                DisplayFilter::All,
            ))),
        ),
        ("s", Some(StudyCommand::Save)),
        ("save", Some(StudyCommand::Save)),
        ("?", Some(StudyCommand::Help)),
        ("q", Some(StudyCommand::Quit)),
        ("xyz", None),
    ];
    for (input, expected) in cases {
        assert_eq!(parse_study_command(input, &session), expected, "{:?}", input);
    }
}

#[test]
fn record_at_uses_one_based_file_positions() {
    let session = loaded_session(&["lesson1"]);
    assert_eq!(
        record_at(&session, 2).expect("second word").headword,
        "lesson1-fox"
    );
    assert!(record_at(&session, 0).is_err());
    let err = record_at(&session, 3).expect_err("out of range");
    assert!(err.contains("lesson has 2 words"));
}

#[test]
fn shown_positions_address_the_same_word_as_edit_commands() {
    let mut session = Session::new(PersistPolicy::default());
    let ticket = session.begin_load(LoadedScope::SingleFile("lesson1".to_string()));
    session.finish_load(
        ticket,
        vec![FileBatch::loaded(
            "lesson1",
            vec![
                WordEntry::new("dog", "sobaka", true),
                WordEntry::new("fox", "lisa", false),
                WordEntry::new("cat", "kot", true),
            ],
        )],
    );

    let rows = numbered_rows(&session);
    let plain = format_rows_output(&rows, false, false).expect("plain");
    let lines: Vec<&str> = plain.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("   3   cat"));

    for (position, record) in rows {
        assert_eq!(record_at(&session, position).expect("word").id, record.id);
    }
}

#[tokio::test]
async fn save_writes_lessons_changed_under_a_multi_lesson_view() {
    let data = tempfile::TempDir::new().expect("data dir");
    let store = FileStore::open(data.path()).expect("store");
    store
        .write_file("lesson1", &[WordEntry::new("dog", "sobaka", true)])
        .expect("seed lesson1");
    store
        .write_file("lesson2", &[WordEntry::new("cat", "kot", true)])
        .expect("seed lesson2");
    let config = ClientConfig {
        data_dir: Some(data.path().to_path_buf()),
        ..ClientConfig::default()
    };
    let mut driver = SessionDriver::from_config(&config).expect("driver");
    driver
        .load_multiple(&["lesson1".to_string(), "lesson2".to_string()])
        .await;

    let reports = driver
        .run(SessionAction::ToggleCurrent)
        .await
        .expect("toggle");
    assert!(reports.is_empty());
    assert!(store.read_file("lesson1").expect("read")[0].active);

    let saved = save_unsaved(&mut driver).await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].file, "lesson1");
    assert!(!store.read_file("lesson1").expect("read")[0].active);
    assert_eq!(driver.session().unsaved_files().count(), 0);
    assert!(save_unsaved(&mut driver).await.is_empty());
}

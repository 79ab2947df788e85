//! Command-line front end for Lexicard lessons.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use lexicard_client::{
    config::normalize_server, ApiClient, ClientConfig, PersistReport, Saved, SessionDriver,
};
use lexicard_core::models::WordRecord;
use lexicard_core::session::{
    CardFace, Direction, DisplayFilter, LoadOutcome, LoadReport, Notice, PersistPolicy,
    PrimaryLanguage, Session, SessionAction, Severity,
};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(test)]
mod tests;

#[derive(Parser)]
#[command(name = "lexicard", about = "Lexicard vocabulary CLI", version)]
struct Cli {
    /// Server URL (can also be set via LEXICARD_SERVER env var)
    #[arg(short, long, env = "LEXICARD_SERVER", global = true)]
    server: Option<String>,

    /// Read and write lessons in this directory instead of using a server
    #[arg(short = 'd', long, env = "LEXICARD_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    /// Request timeout in seconds
    #[arg(short = 't', long, global = true)]
    timeout: Option<u64>,

    /// Where edits go while several lessons are loaded (single-file, per-record)
    #[arg(long, global = true)]
    persist: Option<PersistPolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// List lesson names
    Files,
    /// Print the words of one or more lessons
    Show {
        names: Vec<String>,
        /// Load every lesson
        #[arg(long, conflicts_with = "names")]
        all_files: bool,
        /// Include inactive words
        #[arg(short, long)]
        all: bool,
        /// Only rows whose word or translation contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Add a word to a lesson
    Add {
        lesson: String,
        headword: String,
        translation: String,
        /// Store the word as inactive
        #[arg(long)]
        inactive: bool,
    },
    /// Change a word, addressed by its 1-based position in the lesson
    Edit {
        lesson: String,
        index: usize,
        #[arg(long)]
        headword: Option<String>,
        #[arg(long)]
        translation: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Remove a word, addressed by its 1-based position in the lesson
    Delete { lesson: String, index: usize },
    /// Flip a word between active and inactive, addressed like `delete`
    Toggle { lesson: String, index: usize },
    /// Review flashcards interactively
    Study {
        names: Vec<String>,
        /// Load every lesson
        #[arg(long, conflicts_with = "names")]
        all_files: bool,
        /// Include inactive words
        #[arg(short, long)]
        all: bool,
        /// Show the translation on the front of each card
        #[arg(long)]
        reverse: bool,
    },
    /// Check that the server is up
    Health,
}

/// One line of input during `study`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StudyCommand {
    Act(SessionAction),
    /// Write every lesson with unsaved changes.
    Save,
    Help,
    Quit,
}

fn fail(action: &str, message: impl std::fmt::Display) -> ! {
    eprintln!("{} failed: {}", action, message);
    std::process::exit(1);
}

fn apply_overrides(
    mut config: ClientConfig,
    server: Option<String>,
    data_dir: Option<PathBuf>,
    timeout: Option<u64>,
    persist: Option<PersistPolicy>,
) -> ClientConfig {
    if let Some(server) = server.filter(|value| !value.trim().is_empty()) {
        config.server = normalize_server(server.trim().to_string());
    }
    if let Some(dir) = data_dir {
        config.data_dir = Some(dir);
    }
    if let Some(secs) = timeout.filter(|secs| *secs > 0) {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(policy) = persist {
        config.persist_policy = policy;
    }
    config
}

fn encode(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|err| format!("response encoding error: {}", err))
}

fn format_files_output(names: &[String], json: bool) -> Result<String, String> {
    if json {
        return encode(&names);
    }
    Ok(names.join("\n"))
}

/// Table rows paired with each word's 1-based position in its own lesson,
/// the number `edit`, `delete` and `toggle` take.
fn numbered_rows(session: &Session) -> Vec<(usize, &WordRecord)> {
    session
        .table_rows()
        .into_iter()
        .map(|row| {
            let position = session
                .records()
                .iter()
                .filter(|record| record.source_file == row.source_file)
                .take_while(|record| record.id != row.id)
                .count();
            (position + 1, row)
        })
        .collect()
}

fn format_rows_output(
    rows: &[(usize, &WordRecord)],
    show_lesson: bool,
    json: bool,
) -> Result<String, String> {
    if json {
        let values: Vec<Value> = rows
            .iter()
            .map(|(position, record)| {
                json!({
                    "position": position,
                    "eng": record.headword,
                    "rus": record.translation,
                    "display": u8::from(record.active),
                    "file": record.source_file,
                })
            })
            .collect();
        return encode(&values);
    }

    let lines: Vec<String> = rows
        .iter()
        .map(|(position, record)| {
            let flag = if record.active { ' ' } else { '-' };
            let mut line = format!(
                "{:>4} {} {:<24} {}",
                position, flag, record.headword, record.translation
            );
            if show_lesson {
                line.push_str(&format!("  [{}]", record.source_file));
            }
            line
        })
        .collect();
    Ok(lines.join("\n"))
}

fn format_notice(notice: &Notice) -> String {
    let level = match notice.severity {
        Severity::Success => "ok",
        Severity::Info => "info",
        Severity::Warn => "warn",
        Severity::Error => "error",
    };
    if notice.detail.is_empty() {
        format!("[{}] {}", level, notice.summary)
    } else {
        format!("[{}] {}: {}", level, notice.summary, notice.detail)
    }
}

fn format_persist_output(reports: &[PersistReport], json: bool) -> Result<String, String> {
    if json {
        let values: Vec<Value> = reports
            .iter()
            .map(|report| match &report.result {
                Ok(Saved::Stored { provider }) => {
                    json!({ "file": report.file, "saved": provider })
                }
                Ok(Saved::Downloaded(path)) => json!({
                    "file": report.file,
                    "saved": "download",
                    "path": path.display().to_string(),
                }),
                Err(err) => json!({ "file": report.file, "error": err.to_string() }),
            })
            .collect();
        return encode(&values);
    }

    let lines: Vec<String> = reports
        .iter()
        .map(|report| match &report.result {
            Ok(Saved::Stored { .. }) => format!("Saved {}.json", report.file),
            Ok(Saved::Downloaded(path)) => format!(
                "Server unreachable; saved a copy of {} to {}",
                report.file,
                path.display()
            ),
            Err(err) => format!("Could not save {}: {}", report.file, err),
        })
        .collect();
    Ok(lines.join("\n"))
}

fn render_card(face: &CardFace<'_>, title: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(title) = title {
        out.push_str(title);
        out.push('\n');
    }
    let status = if face.record.active { "" } else { " (inactive)" };
    out.push_str(&format!(
        "[{}/{}] {}{}",
        face.position + 1,
        face.total,
        face.front,
        status
    ));
    if face.revealed {
        out.push_str(&format!("\n      {}", face.back));
    }
    out
}

fn parse_study_command(line: &str, session: &Session) -> Option<StudyCommand> {
    let command = match line.trim() {
        "" | "n" | "next" => StudyCommand::Act(SessionAction::Advance(Direction::Forward)),
        "p" | "prev" => StudyCommand::Act(SessionAction::Advance(Direction::Backward)),
        "f" | "flip" => StudyCommand::Act(SessionAction::Reveal),
        "t" | "toggle" => StudyCommand::Act(SessionAction::ToggleCurrent),
        "l" | "lang" => StudyCommand::Act(SessionAction::SetPrimaryLanguage(
            match session.primary_language() {
                PrimaryLanguage::Source => PrimaryLanguage::Target,
                PrimaryLanguage::Target => PrimaryLanguage::Source,
            },
        )),
        "a" | "all" => StudyCommand::Act(SessionAction::SetDisplayFilter(
            match session.display_filter() {
                DisplayFilter::Active => DisplayFilter::All,
                DisplayFilter::All => DisplayFilter::Active,
            },
        )),
        "s" | "save" => StudyCommand::Save,
        "?" | "h" | "help" => StudyCommand::Help,
        "q" | "quit" => StudyCommand::Quit,
        _ => return None,
    };
    Some(command)
}

fn study_help() -> &'static str {
    "enter/n next, p previous, f flip, t toggle active, l swap languages, a active/all, \
     s save, q quit"
}

fn record_at(session: &Session, index: usize) -> Result<&WordRecord, String> {
    let records = session.records();
    index
        .checked_sub(1)
        .and_then(|idx| records.get(idx))
        .ok_or_else(|| {
            format!(
                "no word at position {} (lesson has {} words)",
                index,
                records.len()
            )
        })
}

fn print_notices(driver: &mut SessionDriver, min: Severity) {
    for notice in driver.session_mut().drain_notices() {
        let shown = match min {
            Severity::Error => notice.severity == Severity::Error,
            Severity::Warn => matches!(notice.severity, Severity::Warn | Severity::Error),
            _ => true,
        };
        if shown {
            eprintln!("{}", format_notice(&notice));
        }
    }
}

fn applied_or_exit(outcome: LoadOutcome, action: &str) -> LoadReport {
    match outcome {
        LoadOutcome::Applied(report) => report,
        LoadOutcome::Failed(report) => {
            let reasons: Vec<&str> = report
                .failed
                .iter()
                .map(|(_, reason)| reason.as_str())
                .collect();
            fail(action, reasons.join("; "))
        }
        LoadOutcome::Stale => fail(action, "load was superseded"),
    }
}

async fn load_view(
    driver: &mut SessionDriver,
    names: &[String],
    all_files: bool,
    action: &str,
) -> LoadReport {
    let outcome = if all_files {
        driver.load_all().await
    } else {
        match names {
            [] => fail(action, "name at least one lesson or pass --all-files"),
            [name] => driver.load_single(name).await,
            _ => driver.load_multiple(names).await,
        }
    };
    print_notices(driver, Severity::Warn);
    applied_or_exit(outcome, action)
}

async fn load_lesson_or_exit(driver: &mut SessionDriver, lesson: &str, action: &str) {
    let report = applied_or_exit(driver.load_single(lesson).await, action);
    if let Some((_, reason)) = report.failed.first() {
        fail(action, reason);
    }
    driver.session_mut().drain_notices();
}

async fn run_mutation(driver: &mut SessionDriver, action: SessionAction, label: &str, json: bool) {
    let reports = match driver.run(action).await {
        Ok(reports) => reports,
        Err(err) => fail(label, err),
    };
    print_notices(driver, Severity::Warn);
    match format_persist_output(&reports, json) {
        Ok(output) if !output.is_empty() => println!("{}", output),
        Ok(_) => {}
        Err(message) => fail(label, message),
    }
    if reports.iter().any(|report| report.result.is_err()) {
        std::process::exit(1);
    }
}

/// Write every lesson the session holds unsaved changes for.
async fn save_unsaved(driver: &mut SessionDriver) -> Vec<PersistReport> {
    let files: Vec<String> = driver
        .session()
        .unsaved_files()
        .map(str::to_string)
        .collect();
    let mut reports = Vec::with_capacity(files.len());
    for file in files {
        match driver.save_file(&file).await {
            Ok(report) => reports.push(report),
            Err(err) => tracing::warn!("Could not save {}: {}", file, err),
        }
    }
    reports
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [Y/n] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer)? == 0 {
        return Ok(false);
    }
    Ok(matches!(answer.trim(), "" | "y" | "Y" | "yes"))
}

async fn run_study(driver: &mut SessionDriver) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    println!("{}", study_help());
    loop {
        let title = driver.session().display_title();
        match driver.session().current_card() {
            Some(face) => println!("{}", render_card(&face, title.as_deref())),
            None => println!("No words to show"),
        }
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }
        match parse_study_command(&line, driver.session()) {
            Some(StudyCommand::Quit) => return Ok(()),
            Some(StudyCommand::Help) => println!("{}", study_help()),
            Some(StudyCommand::Save) => {
                let reports = save_unsaved(driver).await;
                if reports.is_empty() {
                    println!("Nothing to save");
                }
                print_notices(driver, Severity::Info);
            }
            Some(StudyCommand::Act(action)) => {
                if let Err(err) = driver.run(action).await {
                    tracing::debug!("study action rejected: {}", err);
                }
                print_notices(driver, Severity::Warn);
            }
            None => println!("Unknown command. {}", study_help()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let Cli {
        server,
        data_dir,
        json,
        timeout,
        persist,
        command,
    } = Cli::parse();

    if let Commands::Completions { shell } = &command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let config = apply_overrides(ClientConfig::from_env(), server, data_dir, timeout, persist);

    if let Commands::Health = &command {
        let client = ApiClient::new(&config.server, config.timeout)?;
        let health = match client.health().await {
            Ok(health) => health,
            Err(err) => fail("Health", err),
        };
        if json {
            println!("{}", serde_json::to_string_pretty(&health)?);
        } else {
            println!("{} (port {}) at {}", health.status, health.port, config.server);
        }
        return Ok(());
    }

    let mut driver = SessionDriver::from_config(&config)?;

    match command {
        Commands::Completions { .. } | Commands::Health => {
            unreachable!("handled before driver setup")
        }
        Commands::Files => {
            let names = driver.list_files().await;
            print_notices(&mut driver, Severity::Warn);
            match format_files_output(&names, json) {
                Ok(output) if !output.is_empty() => println!("{}", output),
                Ok(_) => {}
                Err(message) => fail("Files", message),
            }
        }
        Commands::Show {
            names,
            all_files,
            all,
            search,
        } => {
            let report = load_view(&mut driver, &names, all_files, "Show").await;
            let session = driver.session_mut();
            if all {
                session.set_display_filter(DisplayFilter::All);
            }
            if let Some(query) = search {
                session.set_search(&query);
            }
            if !json {
                if let Some(title) = session.display_title() {
                    println!("{}", title);
                }
            }
            let rows = numbered_rows(session);
            let show_lesson = report.loaded.len() > 1 || all_files;
            match format_rows_output(&rows, show_lesson, json) {
                Ok(output) if !output.is_empty() => println!("{}", output),
                Ok(_) => {}
                Err(message) => fail("Show", message),
            }
        }
        Commands::Add {
            lesson,
            headword,
            translation,
            inactive,
        } => {
            load_lesson_or_exit(&mut driver, &lesson, "Add").await;
            let action = SessionAction::Add {
                headword,
                translation,
                active: !inactive,
                target_file: lesson,
            };
            run_mutation(&mut driver, action, "Add", json).await;
        }
        Commands::Edit {
            lesson,
            index,
            headword,
            translation,
            active,
        } => {
            load_lesson_or_exit(&mut driver, &lesson, "Edit").await;
            let action = match record_at(driver.session(), index) {
                Ok(record) => SessionAction::Edit {
                    id: record.id,
                    headword: headword.unwrap_or_else(|| record.headword.clone()),
                    translation: translation.unwrap_or_else(|| record.translation.clone()),
                    active: active.unwrap_or(record.active),
                },
                Err(message) => fail("Edit", message),
            };
            run_mutation(&mut driver, action, "Edit", json).await;
        }
        Commands::Delete { lesson, index } => {
            load_lesson_or_exit(&mut driver, &lesson, "Delete").await;
            let id = match record_at(driver.session(), index) {
                Ok(record) => record.id,
                Err(message) => fail("Delete", message),
            };
            run_mutation(&mut driver, SessionAction::Delete(id), "Delete", json).await;
        }
        Commands::Toggle { lesson, index } => {
            load_lesson_or_exit(&mut driver, &lesson, "Toggle").await;
            let id = match record_at(driver.session(), index) {
                Ok(record) => record.id,
                Err(message) => fail("Toggle", message),
            };
            run_mutation(&mut driver, SessionAction::ToggleActive(id), "Toggle", json).await;
        }
        Commands::Study {
            names,
            all_files,
            all,
            reverse,
        } => {
            load_view(&mut driver, &names, all_files, "Study").await;
            let session = driver.session_mut();
            if all {
                session.set_display_filter(DisplayFilter::All);
            }
            if reverse {
                session.set_primary_language(PrimaryLanguage::Target);
            }
            run_study(&mut driver).await?;
            let unsaved: Vec<String> = driver
                .session()
                .unsaved_files()
                .map(str::to_string)
                .collect();
            if !unsaved.is_empty() {
                if confirm(&format!("Save changes to {}?", unsaved.join(", ")))? {
                    let reports = save_unsaved(&mut driver).await;
                    print_notices(&mut driver, Severity::Warn);
                    if let Ok(output) = format_persist_output(&reports, json) {
                        println!("{}", output);
                    }
                } else {
                    eprintln!("Unsaved changes in: {}", unsaved.join(", "));
                }
            }
        }
    }

    Ok(())
}

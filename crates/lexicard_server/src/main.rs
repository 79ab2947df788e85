//! Headless lesson server entrypoint.

use lexicard_core::store::LessonCheck;
use lexicard_core::DEFAULT_PORT;
use lexicard_server::{config::Config, serve_router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CliFlags {
    help: bool,
    check: bool,
}

fn parse_cli_flags(args: &[String]) -> anyhow::Result<CliFlags> {
    let mut flags = CliFlags::default();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" => flags.help = true,
            "--check" => flags.check = true,
            value if value.starts_with('-') => {
                anyhow::bail!(
                    "Unknown option: '{}'. Use --help to see supported options.",
                    value
                );
            }
            value => {
                anyhow::bail!(
                    "Unexpected positional argument: '{}'. Use --help to see supported options.",
                    value
                );
            }
        }
    }
    Ok(flags)
}

fn summarize_checks(checks: &[LessonCheck]) -> (Vec<String>, usize) {
    let mut lines = Vec::with_capacity(checks.len());
    let mut failures = 0;
    for check in checks {
        match &check.result {
            Ok(count) => lines.push(format!("ok      {} ({} words)", check.name, count)),
            Err(err) => {
                failures += 1;
                lines.push(format!("FAILED  {}: {}", check.name, err));
            }
        }
    }
    (lines, failures)
}

fn run_check(state: &AppState) -> anyhow::Result<()> {
    let checks = state.store.check_all()?;
    if checks.is_empty() {
        println!("No lessons found in {}", state.store.root().display());
        return Ok(());
    }
    let (lines, failures) = summarize_checks(&checks);
    for line in lines {
        println!("{}", line);
    }
    if failures > 0 {
        anyhow::bail!("{} of {} lesson file(s) failed to parse", failures, checks.len());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lexicard=info,lexicard_server=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cli_flags = parse_cli_flags(&args)?;

    if cli_flags.help {
        print_help();
        return Ok(());
    }

    let config = Config::from_env();
    let state = AppState::open(config.clone())?;
    tracing::info!("Serving lessons from {}", state.store.root().display());

    if cli_flags.check {
        return run_check(&state);
    }

    let allow_public = lexicard_server::config::env_flag_enabled("ALLOW_PUBLIC_ACCESS");
    if allow_public {
        tracing::warn!("Public access enabled - server will accept requests from any origin");
    }

    let bind_addr = lexicard_server::resolve_bind_address(&config, allow_public);
    if !bind_addr.ip().is_loopback() {
        tracing::warn!(
            "Binding to non-localhost address: {} - ensure proper security measures are in place",
            bind_addr
        );
    }

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let actual_addr = listener.local_addr().unwrap_or(bind_addr);
    tracing::info!("Lexicard running at http://{}", actual_addr);

    serve_router(listener, state, allow_public, shutdown_signal()).await?;
    tracing::info!("Server stopped");

    Ok(())
}

fn print_help() {
    println!("Lexicard Server\n");
    println!("Usage: lexicard-server [OPTIONS]\n");
    println!("Options:");
    println!("  --check           Parse every lesson file and report failures");
    println!("  --help            Show this help message");
    println!("\nEnvironment variables:");
    println!("  DATA_DIR          Lesson directory (default: ~/.local/share/lexicard/data)");
    println!("  STATIC_DIR        Optional directory of page assets served at /");
    println!("  PORT              Server port (default: {})", DEFAULT_PORT);
    println!("  MAX_BODY_SIZE     Maximum save payload in bytes (default: 1MB)");
    println!("  ALLOW_PUBLIC_ACCESS  Allow CORS from any origin");
    println!(
        "  BIND              Override bind address (e.g. 0.0.0.0:{})",
        DEFAULT_PORT
    );
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to install signal handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

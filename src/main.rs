//! Folklore GPT: server entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse CLI args
//!   3. Load config
//!   4. Resolve effective log level (CLI `-v` flags > env > config)
//!   5. Init logger once
//!   6. Probe the store and the model (never fatal)
//!   7. Spawn Ctrl-C → shutdown signal watcher
//!   8. Serve HTTP until shutdown

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use folklore_gpt::config::{self, Config};
use folklore_gpt::error::AppError;
use folklore_gpt::logger;
use folklore_gpt::probe::{self, Resources};
use folklore_gpt::subsystems::comms::{self, CommsState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present: ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let config = config::load(args.config_path.as_deref())?;

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    let force_cli_level = args.log_level.is_some();

    logger::init(effective_log_level, force_cli_level)?;

    info!(
        bind = %config.server.bind,
        store_url = %config.store.url,
        db_name = %config.store.db_name,
        llm_provider = %config.llm.provider,
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        "config loaded"
    );

    let resources = probe::probe(&config).await;
    print_startup_summary(&config, &resources);

    // Shared shutdown token: Ctrl-C cancels it, the server watches it.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received: initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    let comms_state = Arc::new(CommsState::new(resources));
    comms::run_axum(&config.server.bind, comms_state, shutdown).await?;

    let _ = { use std::io::Write as _; std::io::stderr().flush() };
    Ok(())
}

fn print_startup_summary(config: &Config, resources: &Resources) {
    let fit = |text: String| -> String {
        const WIDTH: usize = 58;
        let char_count = text.chars().count();
        if char_count >= WIDTH {
            let mut out = text.chars().take(WIDTH - 1).collect::<String>();
            out.push('…');
            out
        } else {
            format!("{text:<WIDTH$}")
        }
    };
    let mark = |up: bool| if up { "✅" } else { "⚠️ " };

    let avail = resources.availability;
    let store_line = format!(
        "{} {} ({})",
        mark(avail.store()),
        resources.status_log.store_type(),
        if config.store.url.is_empty() { "disabled" } else { config.store.url.as_str() },
    );
    let model_line = if avail.ai_model() {
        format!(
            "{} provider={} model={} timeout={}s",
            mark(true),
            config.llm.provider,
            config.llm.openai.model,
            config.llm.openai.timeout_seconds
        )
    } else {
        format!("{} curated stories only (provider={})", mark(false), config.llm.provider)
    };

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ 📜 Folklore GPT Status                                       ║");
    println!("╟──────────────────────────────────────────────────────────────╢");
    println!("║ 🧠 PID: {:<52}║", std::process::id());
    println!("║ 🌐 Bind: {:<51}║", config.server.bind);
    println!("╟──────────────────────────────────────────────────────────────╢");
    println!("║ 🗄️  Store                                                     ║");
    println!("║   {}║", fit(store_line));
    println!("╟──────────────────────────────────────────────────────────────╢");
    println!("║ 🤖 AI model                                                  ║");
    println!("║   {}║", fit(model_line));
    println!("╚══════════════════════════════════════════════════════════════╝");
}

struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut config_path = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: folklore-gpt [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "-f" | "--config" => {
                if let Some(path) = iter.next() {
                    config_path = Some(path);
                } else {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    // -v → warn, -vv → info, -vvv → debug, -vvvv+ → trace
    let log_level = match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    };

    CliArgs { log_level, config_path }
}

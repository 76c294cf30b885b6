//! SmartLog Control - CLI for the logistics assistant
//!
//! Interactive conversation by default; one-shot questions, cache refresh and
//! config inspection as subcommands.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use smartlog_common::formatter::DATA_UNAVAILABLE;
use smartlog_common::{Dataset, QueryEngine, SmartlogConfig};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::info;

use smartlogctl::errors::{
    EXIT_CONFIG_ERROR, EXIT_DATA_UNAVAILABLE, EXIT_GENERAL_ERROR, EXIT_SUCCESS,
};
use smartlogctl::logging::Transcript;
use smartlogctl::repl::{self, FAREWELL};
use smartlogctl::startup::{config_source, init_tracing, load_config};
use smartlogctl::voice::{stdin_recognizer, stdout_speaker};

#[derive(Parser)]
#[command(name = "smartlogctl")]
#[command(about = "SmartLog - kanban stock and delivery status assistant", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (default: $SMARTLOG_CONFIG or ~/.config/smartlog/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the conversation loop (default)
    Repl,

    /// Ask a single question and print the reply
    Ask {
        /// Question text, e.g. "stok kanban 105D"
        #[arg(required = true, trailing_var_arg = true)]
        query: Vec<String>,
    },

    /// Refetch both datasets and report where they came from
    Refresh,

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };
    init_tracing(&config);

    let code = match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            EXIT_GENERAL_ERROR
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli, config: SmartlogConfig) -> Result<i32> {
    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Repl => repl_command(config).await,
        Commands::Ask { query } => ask_command(config, query.join(" ")).await,
        Commands::Refresh => refresh_command(config).await,
        Commands::Config => {
            match config_source(cli.config.as_deref()) {
                Some(path) if path.exists() => println!("# {}", path.display()),
                _ => println!("# defaults"),
            }
            print!("{}", config.to_toml());
            Ok(EXIT_SUCCESS)
        }
    }
}

/// The engine uses a blocking HTTP client, so it lives on the blocking pool
async fn on_blocking_pool<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("Worker thread panicked")?
}

async fn repl_command(config: SmartlogConfig) -> Result<i32> {
    let transcript = Transcript::from_config(config.log.transcript);
    if let Some(path) = transcript.path() {
        info!("Transcript: {}", path.display());
    }

    let session = on_blocking_pool(move || {
        let engine = QueryEngine::with_http(config)?;
        let mut recognizer = stdin_recognizer();
        let mut speaker = stdout_speaker();
        repl::run_repl(&engine, &mut recognizer, &mut speaker, &transcript)
    });

    tokio::select! {
        stats = session => {
            let stats = stats?;
            info!("Session ended: {} queries, {} degraded", stats.queries, stats.degraded);
            Ok(EXIT_SUCCESS)
        }
        _ = tokio::signal::ctrl_c() => {
            println!();
            println!("{}", FAREWELL);
            Ok(EXIT_SUCCESS)
        }
    }
}

async fn ask_command(config: SmartlogConfig, query: String) -> Result<i32> {
    let transcript = Transcript::from_config(config.log.transcript);
    let reply = on_blocking_pool(move || {
        let engine = QueryEngine::with_http(config)?;
        Ok(repl::answer(&engine, &query, &transcript))
    })
    .await?;

    println!("{}", reply);
    if reply == DATA_UNAVAILABLE {
        Ok(EXIT_DATA_UNAVAILABLE)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

async fn refresh_command(config: SmartlogConfig) -> Result<i32> {
    let (parts, delivery) = on_blocking_pool(move || {
        let engine = QueryEngine::with_http(config)?;
        Ok(engine.refresh())
    })
    .await?;

    print_dataset("parts", &parts);
    print_dataset("delivery", &delivery);

    if parts.is_unavailable() && delivery.is_unavailable() {
        Ok(EXIT_DATA_UNAVAILABLE)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

fn print_dataset(name: &str, dataset: &Dataset) {
    let origin = dataset.origin.as_str();
    let origin = if !std::io::stdout().is_terminal() {
        origin.to_string()
    } else if dataset.is_unavailable() {
        origin.red().to_string()
    } else {
        origin.green().to_string()
    };
    println!(
        "{:<9} {:<12} {} rows (fetched {})",
        name,
        origin,
        dataset.len(),
        dataset.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
}

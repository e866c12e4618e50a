//! splitpaste - split pasted multi-file text into files on disk.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use splitpaste_cli::{commands, config::Config, logging};
use splitpaste_core::{Scheduler, SessionManager, SessionStore, SystemClipboard};
use splitpaste_types::{DelimiterSpec, Placement};
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;

use logging::{LogConfig, LogFormat};

/// Split text containing several marked files into real files.
#[derive(Parser, Debug)]
#[command(name = "splitpaste")]
#[command(about = "Split pasted multi-file text into files on disk")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Marker text that introduces a file (overrides config)
    #[arg(short, long, global = true)]
    marker: Option<String>,

    /// Where the marker sits: prefix or surround (overrides config)
    #[arg(short, long, global = true)]
    placement: Option<Placement>,

    /// Enable verbose logging (INFO level for every target)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable trace logging (includes every clipboard poll)
    #[arg(long, global = true)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "clipboard=debug").
    /// Can be specified multiple times. Targets are prefixed with "splitpaste::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL", global = true)]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the files found in FILE (or stdin)
    Split {
        file: Option<PathBuf>,
        /// Print the parsed block as JSON
        #[arg(long)]
        json: bool,
    },
    /// Split FILE (or stdin) and write the files under DIR
    Write {
        file: Option<PathBuf>,
        #[arg(long, value_name = "DIR")]
        dest: PathBuf,
        /// Only write this file (repeatable)
        #[arg(long = "only", value_name = "NAME")]
        only: Vec<String>,
    },
    /// Watch the clipboard and load each new copy into a session
    Watch {
        #[arg(long, value_name = "DIR")]
        dest: Option<PathBuf>,
        /// Write files as soon as they are copied
        #[arg(long)]
        auto_parse: bool,
    },
    /// Suggest marker candidates for FILE (or stdin)
    Detect { file: Option<PathBuf> },
    /// List remembered destination folders
    Folders,
    /// Show the most recently written files
    History {
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(marker) = cli.marker {
        config.marker = marker;
    }
    if let Some(placement) = cli.placement {
        config.placement = placement;
    }

    tracing::info!(
        target: "splitpaste::startup",
        "Loaded configuration (marker: {:?}, placement: {}, db: {})",
        config.marker,
        config.placement,
        config.db_path.display()
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Split { file, json } => {
            let text = commands::read_input(file.as_deref())?;
            commands::split_cmd(&text, &config.delimiter()?, json, &mut out)?;
        }
        Command::Write { file, dest, only } => {
            let text = commands::read_input(file.as_deref())?;
            let mut manager = SessionManager::new(config.session_config()?)?;
            commands::write_cmd(&mut manager, text, &dest, &only, &mut out)?;
        }
        Command::Detect { file } => {
            let text = commands::read_input(file.as_deref())?;
            commands::detect_cmd(&text, &mut out)?;
        }
        Command::Folders => {
            let store = SessionStore::open(&config.db_path)?;
            commands::folders_cmd(&store, &mut out)?;
        }
        Command::History { limit } => {
            let store = SessionStore::open(&config.db_path)?;
            commands::history_cmd(&store, limit, &mut out)?;
        }
        Command::Watch { dest, auto_parse } => {
            drop(out);
            if let Some(dest) = dest {
                config.destination = Some(dest);
            }
            watch(&config, auto_parse).await?;
        }
    }
    Ok(())
}

async fn watch(config: &Config, auto_parse: bool) -> Result<()> {
    let manager = SessionManager::new(config.session_config()?)?;
    let clipboard = SystemClipboard::new()?;
    let mut scheduler = Scheduler::new(manager, clipboard);

    let mut events = scheduler.manager().subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => println!("{}", commands::describe_event(&event)),
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(target: "splitpaste::session", "Dropped {} events", n)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let now = Instant::now();
    let manager = scheduler.manager_mut();
    let id = manager.create_session(now)?;
    manager.enable_auto_clipboard(id, now)?;

    if auto_parse {
        let saved = manager
            .store()
            .list_folders()?
            .into_iter()
            .map(|f| f.path)
            .collect();
        let mut prompt = commands::LinePrompt::new(io::stdin().lock(), io::stderr(), saved);
        if !manager.enable_auto_parse(id, &mut prompt, Instant::now())? {
            bail!("Auto parse needs a destination folder");
        }
    }

    let delimiter: Option<&DelimiterSpec> = manager.session(id)?.delimiter();
    if let Some(spec) = delimiter {
        eprintln!("Watching the clipboard. Marker lines look like: {}", spec.example_line());
    }
    eprintln!("Press Ctrl-C to stop.");
    io::stderr().flush()?;

    scheduler
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(
                    target: "splitpaste::startup",
                    "Failed to listen for Ctrl-C: {}",
                    e
                );
            }
        })
        .await;
    Ok(())
}

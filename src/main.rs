use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use infotron::{
    ai::{AiDelegate, SqlChain},
    config::AppConfig,
    llm::AnthropicClient,
    logging::{LogConfig, init_logging, log_performance_metric, parse_level},
    shell::{Mode, Response, Shell, render},
    store::Store,
    view::TableView,
};

#[derive(Parser)]
#[command(name = "infotron")]
#[command(about = "Terminal SQLite browser with a natural-language query mode")]
#[command(long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run one SQL statement, print the resulting view and exit
    #[arg(short, long, conflicts_with = "ask")]
    execute: Option<String>,

    /// Ask one natural-language question, print the answer and exit
    #[arg(short, long)]
    ask: Option<String>,

    /// Start the shell in natural-language mode
    #[arg(long)]
    ai: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Enable verbose logging (debug level, with thread ids and source locations)
    #[arg(short, long)]
    verbose: bool,

    /// Enable file logging
    #[arg(long)]
    log_file: bool,

    /// Log file path
    #[arg(long)]
    log_file_path: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // a missing .env file is fine
    let _ = dotenvy::dotenv();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        parse_level(&cli.log_level)
    };
    let mut log_config = LogConfig::new()
        .with_level(level)
        .with_console(true)
        .with_thread_ids(cli.verbose)
        .with_file_line(cli.verbose);
    if cli.log_file {
        log_config = log_config.with_file(true);
        if let Some(ref file_path) = cli.log_file_path {
            log_config = log_config.with_file_path(file_path.clone());
        }
    }
    init_logging(&log_config)?;

    let config = load_config(&cli)?;
    let store = Store::new(&config.database.path);
    store.ensure_exists()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    if let Some(sql) = &cli.execute {
        let started = Instant::now();
        let mut view = TableView::new(store);
        view.execute_query(sql);
        render::display_result(view.display(), started.elapsed());
        return Ok(());
    }

    let delegate = AnthropicClient::from_config(&config).map(|client| {
        AiDelegate::new(SqlChain::new(client, store.clone(), config.chain.clone()))
    });

    if let Some(question) = &cli.ask {
        let delegate = delegate?;
        let started = Instant::now();
        let text = runtime.block_on(delegate.ask(question));
        log_performance_metric("ask", started.elapsed());
        render::display_answer(&text, started.elapsed());
        return Ok(());
    }

    let shell = Shell::new(TableView::new(store), runtime)
        .with_history_file(config.shell.history_file.clone());
    let mut shell = match delegate {
        Ok(delegate) => shell.with_ai(delegate),
        Err(e) => {
            tracing::info!("Natural-language mode disabled: {e}");
            shell.with_ai_unavailable(e.to_string())
        }
    };

    if cli.ai || config.shell.start_in_ai_mode {
        if let Response::Warning(message) = shell.set_mode(Mode::Ai) {
            eprintln!("{}: {}", "Warning".yellow(), message);
        }
    }

    shell.run()?;
    Ok(())
}

/// Config file (if any), then environment, then command line
fn load_config(cli: &Cli) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    config.apply_environment_overrides();

    if let Some(database) = &cli.database {
        config.database.path = database.clone();
    }

    config.validate()?;
    tracing::debug!("Configuration: database={}", config.database.path.display());
    Ok(config)
}

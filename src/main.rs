//! PageScope main entry point
//!
//! This is the command-line interface for the PageScope webpage analyzer.

use clap::{Parser, Subcommand};
use pagescope::config::{load_config_with_hash, Config};
use pagescope::output::{
    generate_markdown_report, load_statistics, print_statistics, render_record,
};
use pagescope::storage::{open_storage, SqliteStorage};
use pagescope::{AnalysisService, Analyzer};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// PageScope: a single-page web analyzer
///
/// PageScope fetches a webpage and reports its title, heading census,
/// HTML version, internal and external links, login forms and every link
/// that fails a liveness probe. Results are kept in a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "pagescope")]
#[command(version = "1.0.0")]
#[command(about = "A single-page web analyzer", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one or more URLs and wait for the results
    Analyze {
        #[arg(value_name = "URL", required = true)]
        urls: Vec<String>,
    },

    /// List stored analyses
    List,

    /// Show one stored analysis
    Show {
        id: i64,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Analyze stored records again, overwriting their results
    Requeue {
        #[arg(value_name = "ID", required = true)]
        ids: Vec<i64>,
    },

    /// Delete stored analyses
    Delete {
        #[arg(value_name = "ID", required = true)]
        ids: Vec<i64>,
    },

    /// Show statistics from the database and exit
    Stats,

    /// Generate a markdown report from existing data and exit
    ExportSummary,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let storage = open_storage(Path::new(&config.storage.database_path))?;

    match cli.command {
        Command::Analyze { urls } => handle_analyze(&config, storage, &urls).await?,
        Command::List => handle_list(&storage)?,
        Command::Show { id, json } => handle_show(&storage, id, json)?,
        Command::Requeue { ids } => handle_requeue(&config, storage, &ids).await?,
        Command::Delete { ids } => handle_delete(storage, &ids)?,
        Command::Stats => handle_stats(&config, &storage)?,
        Command::ExportSummary => handle_export_summary(&config, &storage)?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pagescope=info,warn"),
            1 => EnvFilter::new("pagescope=debug,info"),
            2 => EnvFilter::new("pagescope=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn start_service(
    config: &Config,
    storage: SqliteStorage,
) -> Result<AnalysisService<SqliteStorage>, Box<dyn std::error::Error>> {
    let analyzer = Analyzer::new(config)?;
    Ok(AnalysisService::start(
        analyzer,
        storage,
        config.service.workers as usize,
    ))
}

/// Waits for the queue to drain; Ctrl-C cancels in-flight analyses
async fn drain(service: &mut AnalysisService<SqliteStorage>) {
    tokio::select! {
        _ = service.shutdown() => return,
        _ = tokio::signal::ctrl_c() => {}
    }

    service.abort();
    service.shutdown().await;
}

/// Handles the analyze command: submits every URL and prints the results
async fn handle_analyze(
    config: &Config,
    storage: SqliteStorage,
    urls: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut service = start_service(config, storage)?;

    let mut ids = Vec::with_capacity(urls.len());
    for url in urls {
        match service.submit(url) {
            Ok(id) => ids.push(id),
            Err(e) => tracing::error!("Rejected {}: {}", url, e),
        }
    }

    drain(&mut service).await;

    for id in ids {
        println!("{}", render_record(&service.get(id)?));
    }

    Ok(())
}

/// Handles the requeue command: analyzes stored records again
async fn handle_requeue(
    config: &Config,
    storage: SqliteStorage,
    ids: &[i64],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut service = start_service(config, storage)?;

    let mut requeued = Vec::with_capacity(ids.len());
    for &id in ids {
        match service.requeue(id) {
            Ok(_) => requeued.push(id),
            Err(e) => tracing::error!("Cannot requeue {}: {}", id, e),
        }
    }

    drain(&mut service).await;

    for id in requeued {
        println!("{}", render_record(&service.get(id)?));
    }

    Ok(())
}

fn handle_list(storage: &SqliteStorage) -> Result<(), Box<dyn std::error::Error>> {
    use pagescope::AnalysisStore;

    let records = storage.list()?;
    if records.is_empty() {
        println!("No analyses stored");
        return Ok(());
    }

    for record in records {
        let a = &record.analysis;
        println!(
            "{:>5}  {:<8} {:>4} broken  {}",
            record.id,
            a.status.to_string(),
            a.broken_link_count(),
            a.url
        );
    }

    Ok(())
}

fn handle_show(storage: &SqliteStorage, id: i64, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    use pagescope::AnalysisStore;

    let record = storage.get(id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!("{}", render_record(&record));
    }

    Ok(())
}

fn handle_delete(mut storage: SqliteStorage, ids: &[i64]) -> Result<(), Box<dyn std::error::Error>> {
    use pagescope::AnalysisStore;

    if let [id] = ids {
        storage.delete(*id)?;
        println!("Deleted analysis {}", id);
    } else {
        let deleted = storage.delete_many(ids)?;
        println!("Deleted {} of {} analyses", deleted, ids.len());
    }

    Ok(())
}

/// Handles the stats command: shows statistics from the database
fn handle_stats(config: &Config, storage: &SqliteStorage) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.storage.database_path);

    let stats = load_statistics(storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the export-summary command: generates the markdown report
fn handle_export_summary(
    config: &Config,
    storage: &SqliteStorage,
) -> Result<(), Box<dyn std::error::Error>> {
    use pagescope::AnalysisStore;

    println!("=== Exporting Analysis Report ===\n");
    println!("Database: {}", config.storage.database_path);
    println!("Output: {}", config.storage.summary_path);
    println!();

    tracing::info!("Loading analyses from database...");
    let records = storage.list()?;

    tracing::info!("Generating markdown report...");
    generate_markdown_report(&records, Path::new(&config.storage.summary_path))?;

    println!("✓ Report exported to: {}", config.storage.summary_path);

    Ok(())
}

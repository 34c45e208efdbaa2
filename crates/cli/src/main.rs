//! vectext CLI: store text fragments under their embeddings and query them.
//!
//! `vectext [--db PATH] [--raw] [-v...] COMMAND`
//!
//! Every invocation opens the database, runs one command and closes it.
//! Embeddings come from the built-in hashing embedder, sized by the
//! `dimension` setting in the database's `vectext.toml`.

mod commands;
mod format;
mod parse;

use std::io;
use std::path::Path;
use std::process;
use std::sync::Arc;

use tracing::Level;
use vectext_core::{HashingEmbedder, Result, StoreError, TextRecord};
use vectext_engine::demo::{DEMO_CORPUS, DEMO_QUERY};
use vectext_engine::{Database, VectextConfig, CONFIG_FILE_NAME};

use commands::{build_cli, DEFAULT_DB_PATH};
use format::{
    format_error, format_ingested, format_nearest, format_outcome, format_records, format_stats,
    OutputMode,
};
use parse::{matches_to_action, CliAction};

/// Ranking lines printed by `demo`
const DEMO_REPORT_RANKS: usize = 4;

fn main() {
    let matches = build_cli().get_matches();

    init_logging(matches.get_count("verbose"));

    let mode = if matches.get_flag("raw") {
        OutputMode::Raw
    } else {
        OutputMode::Human
    };

    let action = match matches_to_action(&matches, io::stdin().lock()) {
        Ok(action) => action,
        Err(msg) => {
            eprintln!("(error) {}", msg);
            process::exit(1);
        }
    };

    let path = matches
        .get_one::<String>("db")
        .map(|s| s.as_str())
        .unwrap_or(DEFAULT_DB_PATH);

    let db = match open_database(Path::new(path)) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open database: {}", e);
            process::exit(1);
        }
    };

    let result = execute(&db, action, mode);
    let closed = db.close();

    if let Err(e) = result.and(closed) {
        eprintln!("{}", format_error(&e, mode));
        process::exit(1);
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

/// Open the database with a hashing embedder sized from its config file.
fn open_database(path: &Path) -> Result<Database> {
    std::fs::create_dir_all(path).map_err(StoreError::from)?;
    let config_path = path.join(CONFIG_FILE_NAME);
    VectextConfig::write_default_if_missing(&config_path)?;
    let config = VectextConfig::from_file(&config_path)?;

    Database::open(path, Arc::new(HashingEmbedder::new(config.dimension)))
}

/// Run one action, printing its output on success.
fn execute(db: &Database, action: CliAction, mode: OutputMode) -> Result<()> {
    let output = match action {
        CliAction::Ingest { texts } => format_ingested(db.insert_texts(&texts)?, mode),
        CliAction::Query { text, top } => format_nearest(&db.find_nearest(&text)?, top, mode),
        CliAction::List { limit } => {
            let records = db
                .records()?
                .take(limit.unwrap_or(usize::MAX))
                .collect::<Result<Vec<TextRecord>>>()?;
            format_records(&records, mode)
        }
        CliAction::Gc => format_outcome(&db.reclaim_now()?, mode),
        CliAction::Stats => format_stats(&db.stats(), mode),
        CliAction::Demo => {
            db.insert_texts(DEMO_CORPUS)?;
            format_nearest(&db.find_nearest(DEMO_QUERY)?, DEMO_REPORT_RANKS, mode)
        }
    };
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

//! Clap command tree definition.

use clap::{Arg, ArgAction, Command};

/// Default database directory
pub const DEFAULT_DB_PATH: &str = ".vectext";

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("vectext")
        .about("Store text fragments under their embeddings and find the nearest one")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("db")
                .long("db")
                .value_name("PATH")
                .default_value(DEFAULT_DB_PATH)
                .help("Database directory")
                .global(true),
        )
        .arg(
            Arg::new("raw")
                .long("raw")
                .help("Raw output mode (bare values, no labels)")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log to stderr (-v info, -vv debug, -vvv trace)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(build_ingest())
        .subcommand(build_query())
        .subcommand(build_list())
        .subcommand(build_gc())
        .subcommand(build_stats())
        .subcommand(build_demo())
}

fn build_ingest() -> Command {
    Command::new("ingest")
        .about("Embed and store text fragments in one batch")
        .arg(
            Arg::new("texts")
                .num_args(1..)
                .value_name("TEXT")
                .help("Fragments to store (one per line from stdin if omitted)"),
        )
}

fn build_query() -> Command {
    Command::new("query")
        .about("Find the stored fragment nearest to a text")
        .arg(Arg::new("text").required(true).help("Query text"))
        .arg(
            Arg::new("top")
                .long("top")
                .short('n')
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .default_value("0")
                .help("Also print the N best-ranked scores"),
        )
}

fn build_list() -> Command {
    Command::new("list")
        .about("List stored fragments")
        .arg(
            Arg::new("limit")
                .long("limit")
                .short('n')
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .help("Maximum fragments to print"),
        )
}

fn build_gc() -> Command {
    Command::new("gc").about("Run one space reclamation cycle now")
}

fn build_stats() -> Command {
    Command::new("stats").about("Show store statistics")
}

fn build_demo() -> Command {
    Command::new("demo").about("Load the sample corpus and run the sample query")
}

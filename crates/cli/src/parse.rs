//! ArgMatches → CliAction conversion.

use std::io::BufRead;

use clap::ArgMatches;

/// What the user asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum CliAction {
    /// Store fragments in one batch
    Ingest { texts: Vec<String> },
    /// Nearest fragment, plus the top `top` ranks
    Query { text: String, top: usize },
    /// Stored fragments, at most `limit`
    List { limit: Option<usize> },
    /// One reclamation cycle
    Gc,
    /// Store statistics
    Stats,
    /// Sample corpus and query
    Demo,
}

/// Convert parsed arguments into an action.
///
/// `ingest` without arguments reads one fragment per non-empty line from
/// `stdin`.
pub fn matches_to_action(matches: &ArgMatches, stdin: impl BufRead) -> Result<CliAction, String> {
    match matches.subcommand() {
        Some(("ingest", sub)) => {
            let texts: Vec<String> = match sub.get_many::<String>("texts") {
                Some(values) => values.cloned().collect(),
                None => read_lines(stdin)?,
            };
            if texts.is_empty() {
                return Err("nothing to ingest".to_string());
            }
            Ok(CliAction::Ingest { texts })
        }
        Some(("query", sub)) => Ok(CliAction::Query {
            text: sub
                .get_one::<String>("text")
                .cloned()
                .ok_or("query text is required")?,
            top: sub.get_one::<usize>("top").copied().unwrap_or(0),
        }),
        Some(("list", sub)) => Ok(CliAction::List {
            limit: sub.get_one::<usize>("limit").copied(),
        }),
        Some(("gc", _)) => Ok(CliAction::Gc),
        Some(("stats", _)) => Ok(CliAction::Stats),
        Some(("demo", _)) => Ok(CliAction::Demo),
        Some((other, _)) => Err(format!("unknown command '{}'", other)),
        None => Err("no command given".to_string()),
    }
}

fn read_lines(input: impl BufRead) -> Result<Vec<String>, String> {
    let mut texts = Vec::new();
    for line in input.lines() {
        let line = line.map_err(|e| format!("failed to read stdin: {}", e))?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            texts.push(trimmed.to_string());
        }
    }
    Ok(texts)
}

//! Result → human/raw string formatting.
//!
//! Two modes:
//! - **Human** (default): labelled output, e.g. `(nearest) "text"`
//! - **Raw** (`--raw`): bare values, one per line

use vectext_core::{Error, TextRecord};
use vectext_engine::{Nearest, ReclaimOutcome};
use vectext_storage::StoreStats;

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Raw,
}

/// Format an error.
pub fn format_error(err: &Error, mode: OutputMode) -> String {
    match mode {
        OutputMode::Raw => format!("{}", err),
        OutputMode::Human => format!("(error) {}", err),
    }
}

/// Format the number of fragments written.
pub fn format_ingested(count: usize, mode: OutputMode) -> String {
    match mode {
        OutputMode::Raw => count.to_string(),
        OutputMode::Human => format!("(integer) {} stored", count),
    }
}

/// Format a query result, with up to `top` ranking lines before it.
pub fn format_nearest(nearest: &Nearest, top: usize, mode: OutputMode) -> String {
    match mode {
        OutputMode::Raw => nearest.text.clone(),
        OutputMode::Human => {
            let mut out = nearest.report(top);
            out.push_str(&format!("(nearest) {:?}", nearest.text));
            out
        }
    }
}

/// Leading vector components shown per listed record
const LIST_PREVIEW_COMPONENTS: usize = 3;

/// Format stored records, one per line.
pub fn format_records(records: &[TextRecord], mode: OutputMode) -> String {
    if records.is_empty() && mode == OutputMode::Human {
        return "(empty list)".to_string();
    }
    records
        .iter()
        .enumerate()
        .map(|(i, r)| match mode {
            OutputMode::Raw => r.text.clone(),
            OutputMode::Human => format!(
                "{}) {:?} {:?}",
                i + 1,
                &r.vector[..r.dimension().min(LIST_PREVIEW_COMPONENTS)],
                r.text
            ),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a reclamation cycle outcome.
pub fn format_outcome(outcome: &ReclaimOutcome, mode: OutputMode) -> String {
    match mode {
        OutputMode::Raw => outcome.segments_reclaimed.to_string(),
        OutputMode::Human => {
            let mut out = format!(
                "reclaimed {} segment(s) in {} round(s)",
                outcome.segments_reclaimed, outcome.rounds
            );
            if outcome.exhausted {
                out.push_str(" (round limit reached, more may remain)");
            }
            out
        }
    }
}

/// Format store statistics.
pub fn format_stats(stats: &StoreStats, mode: OutputMode) -> String {
    let rows = [
        ("version", stats.version.to_string()),
        ("records", stats.keys.to_string()),
        ("segments", stats.segments.to_string()),
        ("total_bytes", stats.total_bytes.to_string()),
        ("discard_bytes", stats.discard_bytes.to_string()),
    ];
    rows.iter()
        .map(|(name, value)| match mode {
            OutputMode::Raw => value.clone(),
            OutputMode::Human => format!("{:<14}{}", name, value),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

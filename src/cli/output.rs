//! Output formatting for CLI commands.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, XiphosArgs};
use crate::config::DEFAULT_RUN_ID;
use crate::error::Result;

/// One ranked document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub rank: usize,
    pub doc_id: String,
    pub score: f64,
}

/// Result structure for a single query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub model: String,
    pub hits: Vec<Hit>,
    pub total_hits: usize,
    pub duration_ms: u64,
}

/// Result structure for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub queries: usize,
    pub documents_ranked: usize,
    pub output_path: String,
    pub model: String,
    pub threads: usize,
    pub duration_ms: u64,
}

/// Write the results of a single query in the selected format.
pub fn output_search_results<W: Write>(
    out: &mut W,
    results: &SearchResults,
    args: &XiphosArgs,
) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            writeln!(out, "Results for {} ({}):", results.query, results.model)?;
            if results.hits.is_empty() {
                writeln!(out, "  no matching documents")?;
            }
            for hit in &results.hits {
                writeln!(out, "{:>4}. {} (Score: {:.4})", hit.rank, hit.doc_id, hit.score)?;
            }
            if args.verbosity() > 0 {
                writeln!(out)?;
                writeln!(out, "Total hits: {}", results.total_hits)?;
                writeln!(out, "Search time: {}ms", results.duration_ms)?;
            }
        }
        OutputFormat::Json => output_json(out, results, args)?,
        OutputFormat::Trec => {
            if results.hits.is_empty() {
                writeln!(out, "0 Q0 dummy 1 0 {DEFAULT_RUN_ID}")?;
            }
            for hit in &results.hits {
                writeln!(
                    out,
                    "0 Q0 {} {} {} {DEFAULT_RUN_ID}",
                    hit.doc_id, hit.rank, hit.score
                )?;
            }
        }
    }
    Ok(())
}

/// Write the summary of a batch run in the selected format.
///
/// The run file itself is written by the command; TREC format only affects
/// single-query output, so here it falls back to the human summary.
pub fn output_run_summary<W: Write>(
    out: &mut W,
    summary: &RunSummary,
    args: &XiphosArgs,
) -> Result<()> {
    match args.output_format {
        OutputFormat::Json => output_json(out, summary, args),
        OutputFormat::Human | OutputFormat::Trec => {
            if args.verbosity() == 0 {
                return Ok(());
            }
            writeln!(out, "Run written to {}", summary.output_path)?;
            writeln!(out, "Queries: {}", summary.queries)?;
            writeln!(out, "Documents ranked: {}", summary.documents_ranked)?;
            writeln!(out, "Model: {}", summary.model)?;
            writeln!(out, "Threads: {}", summary.threads)?;
            writeln!(out, "Total time: {}ms", summary.duration_ms)?;
            Ok(())
        }
    }
}

/// Output in JSON format.
fn output_json<W: Write, T: Serialize>(out: &mut W, result: &T, args: &XiphosArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    writeln!(out, "{json}")?;
    Ok(())
}

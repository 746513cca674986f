//! Command line argument parsing for Xiphos CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;
use crate::model::RetrievalModel;

/// Xiphos - structured query evaluation over an inverted index
#[derive(Parser, Debug, Clone)]
#[command(name = "xiphos")]
#[command(about = "Evaluate structured queries with Boolean, BM25 and Indri retrieval models")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Xiphos Contributors")]
#[command(long_about = None)]
pub struct XiphosArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl XiphosArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Evaluate every query of a parameter file and write a TREC run file
    Run(RunArgs),

    /// Evaluate a single query and print the ranking
    Query(QueryArgs),
}

/// Arguments for a batch run
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Parameter file (`key=value` lines, or JSON when it ends in `.json`)
    #[arg(value_name = "PARAM_FILE")]
    pub param_file: PathBuf,

    /// Override the number of worker threads
    #[arg(short, long)]
    pub threads: Option<usize>,
}

/// Arguments for a single query
#[derive(Parser, Debug, Clone)]
pub struct QueryArgs {
    /// Index snapshot to search
    #[arg(value_name = "INDEX")]
    pub index_path: PathBuf,

    /// Query string
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Retrieval model
    #[arg(short, long, default_value = "unranked-boolean")]
    pub model: ModelArg,

    /// BM25 term frequency saturation
    #[arg(long, default_value = "1.2")]
    pub k1: f64,

    /// BM25 document length normalization
    #[arg(long, default_value = "0.75")]
    pub b: f64,

    /// BM25 query term frequency saturation
    #[arg(long, default_value = "0.0")]
    pub k3: f64,

    /// Indri Dirichlet prior
    #[arg(long, default_value = "2500.0")]
    pub mu: f64,

    /// Indri collection model weight
    #[arg(long, default_value = "0.4")]
    pub lambda: f64,

    /// Maximum number of results to print
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
}

impl QueryArgs {
    /// Build the retrieval model selected by these arguments.
    pub fn retrieval_model(&self) -> Result<RetrievalModel> {
        match self.model {
            ModelArg::UnrankedBoolean => Ok(RetrievalModel::UnrankedBoolean),
            ModelArg::RankedBoolean => Ok(RetrievalModel::RankedBoolean),
            ModelArg::Bm25 => RetrievalModel::bm25(self.k1, self.b, self.k3),
            ModelArg::Indri => RetrievalModel::indri(self.mu, self.lambda),
        }
    }
}

/// Retrieval models selectable on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelArg {
    /// Every match scores 1.0
    UnrankedBoolean,
    /// Scores derived from term frequencies
    RankedBoolean,
    /// Okapi BM25
    Bm25,
    /// Indri language model
    Indri,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
    /// TREC run lines
    Trec,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_command() {
        let args = XiphosArgs::try_parse_from(["xiphos", "run", "params.txt"]).unwrap();

        if let Command::Run(run_args) = args.command {
            assert_eq!(run_args.param_file, PathBuf::from("params.txt"));
            assert_eq!(run_args.threads, None);
        } else {
            panic!("Expected Run command");
        }

        let args =
            XiphosArgs::try_parse_from(["xiphos", "run", "params.txt", "--threads", "4"]).unwrap();
        if let Command::Run(run_args) = args.command {
            assert_eq!(run_args.threads, Some(4));
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_query_command() {
        let args = XiphosArgs::try_parse_from([
            "xiphos",
            "query",
            "index.json",
            "#AND(apple pie)",
            "--model",
            "bm25",
            "--k1",
            "2.0",
            "--limit",
            "5",
        ])
        .unwrap();

        if let Command::Query(query_args) = args.command {
            assert_eq!(query_args.index_path, PathBuf::from("index.json"));
            assert_eq!(query_args.query, "#AND(apple pie)");
            assert_eq!(query_args.model, ModelArg::Bm25);
            assert_eq!(query_args.limit, 5);
            assert_eq!(
                query_args.retrieval_model().unwrap(),
                RetrievalModel::Bm25 {
                    k1: 2.0,
                    b: 0.75,
                    k3: 0.0
                }
            );
        } else {
            panic!("Expected Query command");
        }
    }

    #[test]
    fn test_query_defaults() {
        let args = XiphosArgs::try_parse_from(["xiphos", "query", "index.json", "apple"]).unwrap();

        if let Command::Query(query_args) = args.command {
            assert_eq!(query_args.model, ModelArg::UnrankedBoolean);
            assert_eq!(query_args.limit, 10);
            assert_eq!(
                query_args.retrieval_model().unwrap(),
                RetrievalModel::UnrankedBoolean
            );
        } else {
            panic!("Expected Query command");
        }
    }

    #[test]
    fn test_invalid_model_parameters() {
        let args = XiphosArgs::try_parse_from([
            "xiphos", "query", "index.json", "apple", "-m", "indri", "--lambda", "1.5",
        ])
        .unwrap();

        if let Command::Query(query_args) = args.command {
            assert!(query_args.retrieval_model().is_err());
        } else {
            panic!("Expected Query command");
        }

        assert!(
            XiphosArgs::try_parse_from(["xiphos", "query", "index.json", "a", "-m", "tfidf"])
                .is_err()
        );
    }

    #[test]
    fn test_verbosity_levels() {
        let args = XiphosArgs::try_parse_from(["xiphos", "run", "p"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        let args = XiphosArgs::try_parse_from(["xiphos", "-vv", "run", "p"]).unwrap();
        assert_eq!(args.verbosity(), 2);

        let args = XiphosArgs::try_parse_from(["xiphos", "-q", "-vvv", "run", "p"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_output_format() {
        let args =
            XiphosArgs::try_parse_from(["xiphos", "--format", "json", "--pretty", "run", "p"])
                .unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);
        assert!(args.pretty);
    }
}

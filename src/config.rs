//! Run configuration.
//!
//! A run is described by a parameter file of `key=value` lines:
//!
//! ```text
//! indexPath=index.json
//! queryFilePath=queries.txt
//! trecEvalOutputPath=run.teIn
//! retrievalAlgorithm=BM25
//! BM25:k_1=1.2
//! BM25:b=0.75
//! BM25:k_3=0
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. The same settings
//! can also be given as a JSON document (see [`Parameters::load`]).

use std::fs;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, XiphosError};
use crate::model::RetrievalModel;

/// Default number of results written per query.
pub const DEFAULT_OUTPUT_LENGTH: usize = 100;

/// Default run label in the last column of the run file.
pub const DEFAULT_RUN_ID: &str = "xiphos";

fn default_output_length() -> usize {
    DEFAULT_OUTPUT_LENGTH
}

fn default_run_id() -> String {
    DEFAULT_RUN_ID.to_string()
}

/// Settings of one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Index snapshot to evaluate against.
    pub index_path: PathBuf,
    /// File of `query_id:query` lines.
    pub query_file_path: PathBuf,
    /// Where the TREC run file is written.
    pub trec_eval_output_path: PathBuf,
    /// Retrieval model and its parameters.
    pub model: RetrievalModel,
    /// Maximum number of results written per query.
    #[serde(default = "default_output_length")]
    pub trec_eval_output_length: usize,
    /// Run label.
    #[serde(default = "default_run_id")]
    pub run_id: String,
    /// Number of queries evaluated concurrently.
    #[serde(default = "num_cpus::get")]
    pub threads: usize,
}

impl Parameters {
    /// Load parameters from a file.
    ///
    /// Files ending in `.json` are read as JSON, anything else as
    /// `key=value` lines.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            XiphosError::config(format!("can't read {}: {e}", path.display()))
        })?;

        if path.extension().is_some_and(|ext| ext == "json") {
            let parameters: Parameters = serde_json::from_str(&text)?;
            parameters.validate()?;
            Ok(parameters)
        } else {
            Self::parse(&text)
        }
    }

    /// Parse `key=value` lines.
    pub fn parse(text: &str) -> Result<Self> {
        let mut values = AHashMap::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| {
                XiphosError::config(format!(
                    "line {}: expected key=value, got '{line}'",
                    number + 1
                ))
            })?;
            values.insert(key.trim().to_string(), value.trim().to_string());
        }
        Self::from_map(&values)
    }

    /// Build parameters from already split key/value pairs.
    pub fn from_map(values: &AHashMap<String, String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            values
                .get(key)
                .cloned()
                .ok_or_else(|| XiphosError::config(format!("missing required parameter {key}")))
        };

        let parameters = Parameters {
            index_path: PathBuf::from(required("indexPath")?),
            query_file_path: PathBuf::from(required("queryFilePath")?),
            trec_eval_output_path: PathBuf::from(required("trecEvalOutputPath")?),
            model: model_from_map(&required("retrievalAlgorithm")?, values)?,
            trec_eval_output_length: match values.get("trecEvalOutputLength") {
                Some(value) => parse_number(value, "trecEvalOutputLength")?,
                None => DEFAULT_OUTPUT_LENGTH,
            },
            run_id: values
                .get("runId")
                .cloned()
                .unwrap_or_else(default_run_id),
            threads: match values.get("threads") {
                Some(value) => parse_number(value, "threads")?,
                None => num_cpus::get(),
            },
        };
        parameters.validate()?;
        Ok(parameters)
    }

    /// Check values that deserialization alone does not constrain.
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(XiphosError::config("threads must be at least 1"));
        }
        if self.run_id.chars().any(char::is_whitespace) || self.run_id.is_empty() {
            return Err(XiphosError::config(format!(
                "runId must be a single non-empty word, got '{}'",
                self.run_id
            )));
        }
        match self.model {
            RetrievalModel::Bm25 { k1, b, k3 } => RetrievalModel::bm25(k1, b, k3).map(|_| ()),
            RetrievalModel::Indri { mu, lambda } => RetrievalModel::indri(mu, lambda).map(|_| ()),
            _ => Ok(()),
        }
    }
}

/// Build the retrieval model named by `retrievalAlgorithm`.
fn model_from_map(name: &str, values: &AHashMap<String, String>) -> Result<RetrievalModel> {
    let number = |key: &str| -> Result<f64> {
        let value = values.get(key).ok_or_else(|| {
            XiphosError::config(format!("missing parameter {key} required by {name}"))
        })?;
        parse_number(value, key)
    };

    match name.to_ascii_lowercase().as_str() {
        "unrankedboolean" => Ok(RetrievalModel::UnrankedBoolean),
        "rankedboolean" => Ok(RetrievalModel::RankedBoolean),
        "bm25" => RetrievalModel::bm25(
            number("BM25:k_1")?,
            number("BM25:b")?,
            number("BM25:k_3")?,
        ),
        "indri" => RetrievalModel::indri(number("Indri:mu")?, number("Indri:lambda")?),
        _ => Err(XiphosError::config(format!("unknown retrieval model {name}"))),
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, key: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| XiphosError::config(format!("{key} must be a number, got '{value}'")))
}

/// Read a query file of `query_id:query` lines.
///
/// The query text is everything after the first `:`. Blank lines are
/// skipped; any other line without a `:` is an error.
pub fn read_queries<P: AsRef<Path>>(path: P) -> Result<Vec<(String, String)>> {
    let text = fs::read_to_string(path)?;
    let mut queries = Vec::new();
    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (query_id, query) = line.split_once(':').ok_or_else(|| {
            XiphosError::query(format!("line {}: missing ':' in query line", number + 1))
        })?;
        queries.push((query_id.trim().to_string(), query.trim().to_string()));
    }
    Ok(queries)
}

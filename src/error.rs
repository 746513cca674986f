//! Error types for the Xiphos library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`XiphosError`] enum. Query evaluation distinguishes between conditions
//! that abort the current query (an operator used under a retrieval model it
//! has no formula for, a malformed weight configuration, a failing index read)
//! and conditions that are absorbed as "no match" (a term missing from the
//! index never produces an error).
//!
//! # Examples
//!
//! ```
//! use xiphos::error::{Result, XiphosError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(XiphosError::query("unbalanced parentheses"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Xiphos operations.
#[derive(Error, Debug)]
pub enum XiphosError {
    /// I/O errors (index snapshot, query file, run file).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The posting store could not supply postings or statistics.
    #[error("Index error: {0}")]
    Index(String),

    /// Malformed query strings or query trees.
    #[error("Query error: {0}")]
    Query(String),

    /// An operator was matched or scored under a retrieval model that
    /// defines no behavior for it.
    #[error("{model} doesn't support the {operator} operator")]
    UnsupportedOperator {
        /// Operator name, e.g. `#SUM`.
        operator: &'static str,
        /// Retrieval model name, e.g. `Indri`.
        model: &'static str,
    },

    /// Weights of a weighted combinator cannot be normalized.
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),

    /// Parameter file or model configuration errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with XiphosError.
pub type Result<T> = std::result::Result<T, XiphosError>;

impl XiphosError {
    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        XiphosError::Index(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        XiphosError::Query(msg.into())
    }

    /// Create a new parse error.
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        XiphosError::Query(msg.into()) // Parse errors are treated as query errors
    }

    /// Create a new unsupported-operator error.
    pub fn unsupported(operator: &'static str, model: &'static str) -> Self {
        XiphosError::UnsupportedOperator { operator, model }
    }

    /// Create a new invalid weight error.
    pub fn invalid_weight<S: Into<String>>(msg: S) -> Self {
        XiphosError::InvalidWeight(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        XiphosError::Config(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        XiphosError::Other(msg.into())
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        XiphosError::Other(format!("Internal error: {}", msg.into()))
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        XiphosError::Other(format!("Not found: {}", msg.into()))
    }

    /// Process exit status for the command-line driver.
    ///
    /// 2 for a bad query or parameter file, 3 for an unreadable index or
    /// input file, 1 for anything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            XiphosError::Query(_)
            | XiphosError::UnsupportedOperator { .. }
            | XiphosError::InvalidWeight(_)
            | XiphosError::Config(_) => 2,
            XiphosError::Io(_) | XiphosError::Index(_) | XiphosError::Json(_) => 3,
            XiphosError::Other(_) | XiphosError::Anyhow(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = XiphosError::index("Test index error");
        assert_eq!(error.to_string(), "Index error: Test index error");

        let error = XiphosError::query("Test query error");
        assert_eq!(error.to_string(), "Query error: Test query error");

        let error = XiphosError::config("missing indexPath");
        assert_eq!(error.to_string(), "Configuration error: missing indexPath");
    }

    #[test]
    fn test_unsupported_operator_message() {
        let error = XiphosError::unsupported("#SUM", "Indri");
        assert_eq!(error.to_string(), "Indri doesn't support the #SUM operator");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let xiphos_error = XiphosError::from(io_error);

        match xiphos_error {
            XiphosError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(XiphosError::parse("missing ')'").exit_code(), 2);
        assert_eq!(XiphosError::unsupported("#AND", "BM25").exit_code(), 2);
        assert_eq!(XiphosError::config("missing indexPath").exit_code(), 2);
        assert_eq!(XiphosError::index("unordered postings").exit_code(), 3);

        let io_error = io::Error::new(io::ErrorKind::NotFound, "index.json");
        assert_eq!(XiphosError::from(io_error).exit_code(), 3);
        assert_eq!(XiphosError::internal("pool").exit_code(), 1);
    }
}

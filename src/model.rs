//! Retrieval models.
//!
//! A retrieval model decides which matching rule each query operator uses and
//! which formula turns matches into scores. It also names the operator that
//! wraps a bare query string before parsing.

use serde::{Deserialize, Serialize};

use crate::error::{Result, XiphosError};

/// The retrieval model used for one evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "lowercase")]
pub enum RetrievalModel {
    /// Set-based matching, every match scores 1.0.
    UnrankedBoolean,
    /// Set-based matching, scores derived from term frequencies.
    RankedBoolean,
    /// Okapi BM25.
    Bm25 {
        /// Term frequency saturation.
        k1: f64,
        /// Document length normalization.
        b: f64,
        /// Query term frequency saturation.
        k3: f64,
    },
    /// Indri language model with Dirichlet and Jelinek-Mercer smoothing.
    Indri {
        /// Dirichlet prior.
        mu: f64,
        /// Mixing weight of the collection model.
        lambda: f64,
    },
}

impl RetrievalModel {
    /// Create a BM25 model with validated parameters.
    pub fn bm25(k1: f64, b: f64, k3: f64) -> Result<Self> {
        if k1.is_nan() || k1 < 0.0 {
            return Err(XiphosError::config(format!("BM25:k_1 must be >= 0, got {k1}")));
        }
        if !(0.0..=1.0).contains(&b) {
            return Err(XiphosError::config(format!(
                "BM25:b must be between 0 and 1, got {b}"
            )));
        }
        if k3.is_nan() || k3 < 0.0 {
            return Err(XiphosError::config(format!("BM25:k_3 must be >= 0, got {k3}")));
        }
        Ok(RetrievalModel::Bm25 { k1, b, k3 })
    }

    /// Create an Indri model with validated parameters.
    pub fn indri(mu: f64, lambda: f64) -> Result<Self> {
        if mu.is_nan() || mu < 0.0 {
            return Err(XiphosError::config(format!("Indri:mu must be >= 0, got {mu}")));
        }
        if !(0.0..=1.0).contains(&lambda) {
            return Err(XiphosError::config(format!(
                "Indri:lambda must be between 0 and 1, got {lambda}"
            )));
        }
        Ok(RetrievalModel::Indri { mu, lambda })
    }

    /// Get the name of this model.
    pub fn name(&self) -> &'static str {
        match self {
            RetrievalModel::UnrankedBoolean => "UnrankedBoolean",
            RetrievalModel::RankedBoolean => "RankedBoolean",
            RetrievalModel::Bm25 { .. } => "BM25",
            RetrievalModel::Indri { .. } => "Indri",
        }
    }

    /// Operator wrapped around a bare query string.
    pub fn default_operator(&self) -> &'static str {
        match self {
            RetrievalModel::UnrankedBoolean | RetrievalModel::RankedBoolean => "#OR",
            RetrievalModel::Bm25 { .. } => "#SUM",
            RetrievalModel::Indri { .. } => "#AND",
        }
    }

    /// Wrap a query string in the default operator.
    pub fn wrap_query(&self, query: &str) -> String {
        format!("{}({})", self.default_operator(), query)
    }

    /// Check if this is one of the exact-match Boolean models.
    pub fn is_boolean(&self) -> bool {
        matches!(
            self,
            RetrievalModel::UnrankedBoolean | RetrievalModel::RankedBoolean
        )
    }
}

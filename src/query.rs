//! Structured queries and their evaluation.
//!
//! A [`QueryTree`] holds the operator tree of one query. Its methods are
//! spread over the submodules by concern:
//!
//! - [`node`]: building the tree and preparing it for evaluation
//! - [`iterator`]: document and position iteration
//! - [`term`] and [`proximity`]: nodes that produce inverted lists
//! - [`scorer`], [`boolean`] and [`belief`]: nodes that produce scores
//!
//! [`QueryParser`] builds trees from query strings and [`ScoreList`] holds
//! the ranked result of evaluating one.

pub mod belief;
pub mod boolean;
pub mod collector;
pub mod iterator;
pub mod node;
pub mod parser;
pub mod proximity;
pub mod scorer;
pub mod term;

pub use self::collector::{ScoreList, ScoredDocument};
pub use self::node::{NodeId, Operator, QueryNode, QueryTree};
pub use self::parser::{DEFAULT_FIELD, KNOWN_FIELDS, QueryParser};
pub use self::scorer::{Bm25Scorer, IndriScorer, Scorer};

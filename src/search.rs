//! Query evaluation and result output.

pub mod evaluator;
pub mod output;

pub use self::evaluator::{QueryEvaluator, evaluate};
pub use self::output::TrecWriter;

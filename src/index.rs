//! Index access for query evaluation.
//!
//! The evaluator depends only on the [`PostingStore`] trait. The in-memory
//! store is the implementation used by tests, benches and the command line.

pub mod memory;
pub mod posting;
pub mod store;

pub use self::memory::InMemoryPostingStore;
pub use self::posting::{DocId, InvertedList, Position, Posting};
pub use self::store::PostingStore;

//! TREC run file output.

use std::io::Write;

use crate::error::Result;
use crate::index::store::PostingStore;
use crate::query::ScoreList;

/// Writes ranked results in the six-column TREC run format:
/// `query_id Q0 document_id rank score run_id`.
#[derive(Debug)]
pub struct TrecWriter<W: Write> {
    writer: W,
    /// Label written in the last column.
    run_id: String,
    /// Maximum number of lines written per query.
    max_results: usize,
}

impl<W: Write> TrecWriter<W> {
    /// Create a new writer.
    pub fn new<S: Into<String>>(writer: W, run_id: S, max_results: usize) -> Self {
        TrecWriter {
            writer,
            run_id: run_id.into(),
            max_results,
        }
    }

    /// Write the results of one query.
    ///
    /// Ranks start at 1. A query without results gets a single `dummy` line
    /// so that it still appears in the run.
    pub fn write_results(
        &mut self,
        query_id: &str,
        results: &ScoreList,
        store: &dyn PostingStore,
    ) -> Result<()> {
        if results.is_empty() {
            writeln!(self.writer, "{query_id} Q0 dummy 1 0 {}", self.run_id)?;
            return Ok(());
        }

        for (index, entry) in results.iter().take(self.max_results).enumerate() {
            let external_id = store.external_id(entry.doc_id)?;
            writeln!(
                self.writer,
                "{query_id} Q0 {external_id} {} {} {}",
                index + 1,
                entry.score,
                self.run_id
            )?;
        }
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Unwrap the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

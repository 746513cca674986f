//! Command implementations for Xiphos CLI.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::{Parameters, read_queries};
use crate::error::Result;
use crate::index::memory::InMemoryPostingStore;
use crate::index::store::PostingStore;
use crate::model::RetrievalModel;
use crate::search::evaluator::QueryEvaluator;
use crate::search::output::TrecWriter;

/// Execute a CLI command.
pub fn execute_command(args: XiphosArgs) -> Result<()> {
    match &args.command {
        Command::Run(run_args) => run_queries(run_args.clone(), &args),
        Command::Query(query_args) => query_index(query_args.clone(), &args),
    }
}

/// Evaluate every query named by a parameter file and write the run file.
fn run_queries(args: RunArgs, cli_args: &XiphosArgs) -> Result<()> {
    let start_time = Instant::now();
    let mut parameters = Parameters::load(&args.param_file)?;
    if let Some(threads) = args.threads {
        parameters.threads = threads;
        parameters.validate()?;
    }

    let summary = execute_run(&parameters)?;
    let summary = RunSummary {
        duration_ms: start_time.elapsed().as_millis() as u64,
        ..summary
    };
    output_run_summary(&mut io::stdout().lock(), &summary, cli_args)
}

/// Run the evaluation described by `parameters`.
///
/// Queries are evaluated concurrently and written in query-file order. The
/// first failing query aborts the run before the run file is created.
pub fn execute_run(parameters: &Parameters) -> Result<RunSummary> {
    let start_time = Instant::now();

    info!("Loading index from {}", parameters.index_path.display());
    let store = Arc::new(InMemoryPostingStore::load(&parameters.index_path)?);
    let queries = read_queries(&parameters.query_file_path)?;
    info!(
        "Evaluating {} queries with {}",
        queries.len(),
        parameters.model.name()
    );

    let evaluator = QueryEvaluator::new(store.clone(), parameters.model)
        .with_threads(parameters.threads)?;
    let texts: Vec<&str> = queries.iter().map(|(_, query)| query.as_str()).collect();
    let results = evaluator.evaluate_batch(&texts);

    let mut rankings = Vec::with_capacity(results.len());
    for ((query_id, _), result) in queries.iter().zip(results) {
        match result {
            Ok(ranking) => rankings.push((query_id, ranking)),
            Err(e) => {
                warn!("Query {query_id} failed: {e}");
                return Err(e);
            }
        }
    }

    if let Some(parent) = parameters.trec_eval_output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(&parameters.trec_eval_output_path)?;
    let mut writer = TrecWriter::new(
        BufWriter::new(file),
        parameters.run_id.clone(),
        parameters.trec_eval_output_length,
    );

    let mut documents_ranked = 0;
    for (query_id, ranking) in &rankings {
        writer.write_results(query_id, ranking, store.as_ref())?;
        documents_ranked += ranking.len().min(parameters.trec_eval_output_length);
    }
    writer.flush()?;

    Ok(RunSummary {
        queries: rankings.len(),
        documents_ranked,
        output_path: parameters.trec_eval_output_path.display().to_string(),
        model: parameters.model.name().to_string(),
        threads: parameters.threads,
        duration_ms: start_time.elapsed().as_millis() as u64,
    })
}

/// Evaluate one query and print the ranking.
fn query_index(args: QueryArgs, cli_args: &XiphosArgs) -> Result<()> {
    let model = args.retrieval_model()?;
    let store = Arc::new(InMemoryPostingStore::load(&args.index_path)?);
    let results = search(store, &args, model)?;
    output_search_results(&mut io::stdout().lock(), &results, cli_args)
}

fn search(
    store: Arc<InMemoryPostingStore>,
    args: &QueryArgs,
    model: RetrievalModel,
) -> Result<SearchResults> {
    let start_time = Instant::now();
    let evaluator = QueryEvaluator::new(store.clone(), model);
    let mut ranking = evaluator.process_query(&args.query)?;
    let total_hits = ranking.len();
    ranking.truncate(args.limit);

    let hits = ranking
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            Ok(Hit {
                rank: index + 1,
                doc_id: store.external_id(entry.doc_id)?,
                score: entry.score,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SearchResults {
        query: args.query.clone(),
        model: model.name().to_string(),
        hits,
        total_hits,
        duration_ms: start_time.elapsed().as_millis() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn write_index(dir: &TempDir) -> std::path::PathBuf {
        let mut store = InMemoryPostingStore::new();
        store
            .add_document("doc-a", &[("body", "apple pie recipe")])
            .unwrap();
        store
            .add_document("doc-b", &[("body", "apple apple tart")])
            .unwrap();
        store.add_document("doc-c", &[("body", "cherry pie")]).unwrap();
        let path = dir.path().join("index.json");
        store.save(&path).unwrap();
        path
    }

    #[test]
    fn test_execute_run() {
        let temp_dir = TempDir::new().unwrap();
        let index_path = write_index(&temp_dir);
        let query_path = temp_dir.path().join("queries.txt");
        fs::write(&query_path, "1:apple\n2:#AND(apple pie)\n3:banana\n").unwrap();

        let parameters = Parameters {
            index_path,
            query_file_path: query_path,
            trec_eval_output_path: temp_dir.path().join("out").join("run.teIn"),
            model: RetrievalModel::RankedBoolean,
            trec_eval_output_length: 100,
            run_id: "test".to_string(),
            threads: 2,
        };

        let summary = execute_run(&parameters).unwrap();
        assert_eq!(summary.queries, 3);
        assert_eq!(summary.documents_ranked, 3);

        let run = fs::read_to_string(&parameters.trec_eval_output_path).unwrap();
        assert_eq!(
            run,
            "1 Q0 doc-b 1 2 test\n\
             1 Q0 doc-a 2 1 test\n\
             2 Q0 doc-a 1 1 test\n\
             3 Q0 dummy 1 0 test\n"
        );
    }

    #[test]
    fn test_failing_query_aborts_run() {
        let temp_dir = TempDir::new().unwrap();
        let index_path = write_index(&temp_dir);
        let query_path = temp_dir.path().join("queries.txt");
        fs::write(&query_path, "1:apple\n2:#AND(apple\n").unwrap();

        let parameters = Parameters {
            index_path,
            query_file_path: query_path,
            trec_eval_output_path: temp_dir.path().join("run.teIn"),
            model: RetrievalModel::UnrankedBoolean,
            trec_eval_output_length: 100,
            run_id: "test".to_string(),
            threads: 1,
        };

        assert!(execute_run(&parameters).is_err());
        assert!(!parameters.trec_eval_output_path.exists());
    }

    #[test]
    fn test_search_limits_hits() {
        let temp_dir = TempDir::new().unwrap();
        let index_path = write_index(&temp_dir);
        let store = Arc::new(InMemoryPostingStore::load(&index_path).unwrap());

        let args = XiphosArgs::try_parse_from([
            "xiphos",
            "query",
            index_path.to_str().unwrap(),
            "apple pie",
            "--model",
            "ranked-boolean",
            "--limit",
            "2",
        ])
        .unwrap();
        let Command::Query(query_args) = args.command else {
            panic!("Expected Query command");
        };

        let model = query_args.retrieval_model().unwrap();
        let results = search(store, &query_args, model).unwrap();
        assert_eq!(results.total_hits, 3);
        assert_eq!(results.hits.len(), 2);
        assert_eq!(results.hits[0].doc_id, "doc-b");
        assert_eq!(results.hits[0].score, 2.0);
        assert_eq!(results.hits[1].doc_id, "doc-a");
    }
}

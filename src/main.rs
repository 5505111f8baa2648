use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use coderag_core::{AnswerService, Config};
use coderag_index::context::format_for_display;
use coderag_index::pipeline::Startup;
use coderag_index::{BuildOutcome, IndexError, Pipeline};
use coderag_llm::any::AnyProvider;
use coderag_llm::ollama::OllamaProvider;

#[derive(Parser, Debug)]
#[command(
    name = "coderag",
    version,
    about = "Index a source tree and answer questions grounded in its code"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(
        long,
        global = true,
        env = "CODERAG_CONFIG",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rebuild the corpus from the code directory
    Index {
        /// Directory to index instead of `index.code_dir`
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Print the chunk records nearest to a query
    Search {
        query: String,
        /// Number of records to return instead of `retrieval.top_k`
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Answer a question from retrieved code
    Ask {
        question: String,
        /// Number of records to retrieve instead of `retrieval.top_k`
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Delete the persisted corpus
    Reset,
    /// Report whether a corpus is available
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    config.validate()?;

    let provider = Arc::new(AnyProvider::Ollama(OllamaProvider::new(
        &config.llm.base_url,
        config.llm.model.clone(),
        config.llm.embedding_model.clone(),
    )));
    let pipeline = Arc::new(Pipeline::new(
        config.corpus_store(),
        Arc::clone(&provider),
        config.pipeline_config(),
    ));

    match cli.command {
        Command::Index { path } => {
            health_check(&provider).await;
            let base = path.unwrap_or_else(|| config.index.code_dir.clone());
            let outcome = pipeline
                .process_and_store(&base)
                .await
                .context("indexing failed")?;
            print_outcome(&outcome);
        }
        Command::Search { query, k } => {
            ensure_corpus(&pipeline, &provider, &config).await?;
            let k = k.unwrap_or(config.retrieval.top_k);
            let chunks = pipeline.retrieve(&query, k).await?;
            print!("{}", format_for_display(&chunks));
        }
        Command::Ask { question, k } => {
            ensure_corpus(&pipeline, &provider, &config).await?;
            let k = k.unwrap_or(config.retrieval.top_k);
            let service = AnswerService::new(Arc::clone(&pipeline), Arc::clone(&provider));
            let answer = service.ask(&question, k).await?;
            println!("{}", answer.answer);
            println!();
            print!("{}", format_for_display(&answer.chunks));
        }
        Command::Reset => {
            pipeline.reset().await?;
            println!("corpus deleted");
        }
        Command::Status => match pipeline.load().await {
            Ok(corpus) => println!("corpus ready: {} chunks", corpus.len()),
            Err(IndexError::NotBuilt) => println!("not built"),
            Err(e) => return Err(e).context("stored corpus is unusable"),
        },
    }

    Ok(())
}

/// Load the persisted corpus, building it from `index.code_dir` when absent.
async fn ensure_corpus(
    pipeline: &Pipeline<AnyProvider>,
    provider: &AnyProvider,
    config: &Config,
) -> anyhow::Result<()> {
    health_check(provider).await;
    match pipeline.load_or_build(&config.index.code_dir).await {
        Ok(Startup::Loaded { chunks }) => {
            tracing::info!(chunks, "using persisted corpus");
            Ok(())
        }
        Ok(Startup::Built(outcome)) => {
            print_outcome(&outcome);
            if outcome.is_built() {
                Ok(())
            } else {
                anyhow::bail!(
                    "no corpus available, nothing indexable under {}",
                    config.index.code_dir.display()
                )
            }
        }
        Err(e) if e.is_consistency() => Err(e).context(
            "persisted corpus is inconsistent, run `coderag reset` then `coderag index`",
        ),
        Err(e) => Err(e.into()),
    }
}

fn print_outcome(outcome: &BuildOutcome) {
    match outcome {
        BuildOutcome::Built(report) => {
            println!(
                "indexed {} chunks from {} files in {} ms",
                report.chunks_created, report.files_indexed, report.duration_ms
            );
            for error in &report.errors {
                println!("skipped {error}");
            }
        }
        BuildOutcome::NoFiles => println!("no supported code files found"),
        BuildOutcome::EmptyCorpus { files_scanned } => {
            println!("no chunks generated from {files_scanned} files");
        }
    }
}

async fn health_check(provider: &AnyProvider) {
    #[allow(irrefutable_let_patterns)]
    if let AnyProvider::Ollama(ollama) = provider {
        match ollama.health_check().await {
            Ok(()) => tracing::info!("ollama health check passed"),
            Err(e) => tracing::warn!("ollama health check failed: {e:#}"),
        }
    }
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["coderag", "search", "parse args", "-k", "3"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("config/default.toml"));
        match cli.command {
            Command::Search { query, k } => {
                assert_eq!(query, "parse args");
                assert_eq!(k, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli =
            Cli::try_parse_from(["coderag", "index", "--path", "src", "--config", "my.toml"])
                .unwrap();
        assert_eq!(cli.config, PathBuf::from("my.toml"));
        assert!(matches!(cli.command, Command::Index { path: Some(p) } if p == PathBuf::from("src")));
    }

    #[test]
    fn missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["coderag"]).is_err());
    }

    #[tokio::test]
    async fn ensure_corpus_checks_backend_then_reports_empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.llm.base_url = "http://127.0.0.1:1".into();
        config.index.code_dir = dir.path().join("code");
        config.index.store_dir = dir.path().join("store");
        std::fs::create_dir_all(&config.index.code_dir).unwrap();

        let provider = Arc::new(AnyProvider::Ollama(OllamaProvider::new(
            &config.llm.base_url,
            config.llm.model.clone(),
            config.llm.embedding_model.clone(),
        )));
        let pipeline = Pipeline::new(
            config.corpus_store(),
            Arc::clone(&provider),
            config.pipeline_config(),
        );

        let err = ensure_corpus(&pipeline, &provider, &config)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no corpus available"));
    }

    #[tokio::test]
    async fn health_check_unreachable_only_warns() {
        let provider = AnyProvider::Ollama(OllamaProvider::new(
            "http://127.0.0.1:1",
            "test".into(),
            "embed".into(),
        ));
        health_check(&provider).await;
    }
}

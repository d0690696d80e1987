//! Recall CLI - one-shot query harness for the recall engine.
//!
//! Loads configuration and corpus files, registers the reference sources,
//! runs a single query through the engine, and prints the result envelope
//! as JSON.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde::Deserialize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use recall_core::{Embedder, RecallConfig, RecallRequest};
use recall_engine::RecallEngine;
use recall_sources::{FaqSource, KeywordSource, MemoryIndex, MockEmbedder, VectorSource};

/// Recall - multi-source retrieval with weighted merge and degradation
#[derive(Parser)]
#[command(name = "recall")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Query text
    query: String,

    /// Config file path (default: ~/.config/recall/config.toml, then ./recall.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// FAQ corpus JSON file (array of entries)
    #[arg(long)]
    faq: Option<PathBuf>,

    /// Keyword rule set JSON file
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Document corpus JSON file for the mock vector source
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Maximum number of results
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// Experiment identifier to run under
    #[arg(long)]
    experiment: Option<String>,

    /// Session identifier
    #[arg(long, default_value = "cli")]
    session: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// A document for the mock vector index.
#[derive(Debug, Deserialize)]
struct CorpusEntry {
    id: String,
    content: String,
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

async fn build_engine(cli: &Cli, config: RecallConfig) -> Result<RecallEngine, Box<dyn std::error::Error>> {
    let mut engine = RecallEngine::new(config);

    if let Some(path) = &cli.faq {
        engine = engine.register(Arc::new(FaqSource::load(path)?));
    }

    if let Some(path) = &cli.rules {
        engine = engine.register(Arc::new(KeywordSource::load(path)?));
    }

    if let Some(path) = &cli.corpus {
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<CorpusEntry> = serde_json::from_str(&content)?;

        let embedder = Arc::new(MockEmbedder::new());
        let mut index = MemoryIndex::new();
        for entry in entries {
            let embedding = embedder.embed_query(&entry.content).await?;
            index.add(entry.id, embedding, entry.content, entry.metadata);
        }

        engine = engine.register(Arc::new(VectorSource::new(embedder, Arc::new(index))));
    }

    Ok(engine)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => RecallConfig::load(path)?,
        None => RecallConfig::load_default()?,
    };

    let engine = build_engine(&cli, config).await?;

    let mut request = RecallRequest::new(cli.query.clone(), cli.session.clone());
    if let Some(top_k) = cli.top_k {
        request = request.with_top_k(top_k);
    }
    if let Some(experiment) = &cli.experiment {
        request = request.with_experiment(experiment.clone());
    }

    let result = engine.invoke(request).await;

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

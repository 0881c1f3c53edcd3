use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::corpus::DocumentSource;
use crate::embeddings::ollama::OllamaClient;
use crate::gate::gate_from_config;
use crate::index::CurriculumIndex;
use crate::indexer::CorpusIndexer;
use crate::pipeline::{QueryOutcome, QueryPipeline};
use crate::retriever::Retriever;

const DOCUMENT_EXTENSIONS: &[&str] = &["md", "markdown", "txt", "text"];

/// Build the index from curriculum documents
#[inline]
pub async fn ingest(paths: Vec<PathBuf>, subject: Option<String>) -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;

    let sources = collect_sources(paths, subject)?;
    if sources.is_empty() {
        println!("No curriculum documents found.");
        println!("Supported document types: .md, .txt (pages separated by form feeds)");
        return Ok(());
    }

    println!("Ingesting {} documents...", sources.len());

    let embedder = Arc::new(
        OllamaClient::new(&config.embedding).context("Failed to create embedding client")?,
    );
    embedder
        .health_check()
        .context("Embedding service is not available")?;

    let index = Arc::new(
        CurriculumIndex::attach(config.index_path())
            .await
            .context("Failed to open index")?,
    );
    let indexer = CorpusIndexer::new(Arc::clone(&index), embedder, config.chunking.clone());

    let bar = if console::user_attended_stderr() {
        ProgressBar::new_spinner().with_style(
            ProgressStyle::with_template("{spinner} Embedding and indexing {len} documents")
                .expect("style template is valid"),
        )
    } else {
        ProgressBar::hidden()
    };
    bar.set_length(sources.len() as u64);
    bar.enable_steady_tick(std::time::Duration::from_millis(120));

    let stats = indexer.build(&sources).await;
    bar.finish_and_clear();
    let stats = stats.context("Indexing failed")?;

    println!("Ingest completed successfully!");
    println!("  Documents indexed: {}", stats.documents_indexed);
    println!("  Pages loaded: {}", stats.pages_loaded);
    println!("  Chunks created: {}", stats.chunks_created);
    println!("  Embeddings generated: {}", stats.embeddings_generated);

    Ok(())
}

/// Answer a question with curriculum context, printing the retrieved chunks
#[inline]
pub async fn ask(question: String, subject: String, limit: usize) -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;

    let gate = gate_from_config(&config).context("Failed to build admission gate")?;

    let embedder = Arc::new(
        OllamaClient::new(&config.embedding).context("Failed to create embedding client")?,
    );
    let index = Arc::new(
        CurriculumIndex::attach(config.index_path())
            .await
            .context("Failed to open index")?,
    );
    let retriever = Retriever::new(index, embedder);
    let pipeline = QueryPipeline::new(gate, retriever);

    match pipeline.scoped_context(&question, &subject, limit).await? {
        QueryOutcome::OutOfScope(reason) => {
            println!("Question is outside the curriculum scope.");
            println!("  Reason: {}", reason.describe());
        }
        QueryOutcome::InScope(chunks) => {
            if chunks.is_empty() {
                println!("No matching curriculum content found for '{}'.", subject);
                return Ok(());
            }

            println!(
                "Top {} context chunks for {} ({}):",
                chunks.len(),
                subject.to_lowercase(),
                question
            );
            println!();
            for (i, chunk) in chunks.iter().enumerate() {
                println!("--- Chunk {} ---", i + 1);
                println!("{}", chunk.trim());
                println!();
            }
        }
    }

    Ok(())
}

/// Delete the persisted index
#[inline]
pub async fn clear_index() -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;

    let index = CurriculumIndex::attach(config.index_path())
        .await
        .context("Failed to open index")?;

    info!("Clearing index at {:?}", config.index_path());
    index.clear().await.context("Failed to clear index")?;

    println!("✓ Index cleared");
    Ok(())
}

/// Show connectivity and index health
#[inline]
pub async fn show_status() -> Result<()> {
    let config = Config::load_default().unwrap_or_default();

    println!("📊 Curriculum RAG Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("🤖 Embedding Service:");
    match OllamaClient::new(&config.embedding) {
        Ok(client) => match client.health_check() {
            Ok(()) => {
                println!(
                    "   ✅ Connected ({}:{})",
                    config.embedding.host, config.embedding.port
                );
                println!("   📋 Model: {}", config.embedding.model);
                println!("   🔢 Batch Size: {}", config.embedding.batch_size);
            }
            Err(e) => {
                println!("   ⚠️  Reachable but unhealthy - {}", e);
            }
        },
        Err(e) => {
            println!("   ❌ Failed to connect - {}", e);
        }
    }

    println!();
    println!("🛡️  Admission Gate:");
    println!("   📋 Strategy: {:?}", config.gate.strategy);
    println!("   📚 Subjects: {}", config.gate.subjects.join(", "));
    println!("   🌐 Classifier: {}", config.classifier.base_url);

    println!();
    println!("🔍 Vector Index:");
    match CurriculumIndex::attach(config.index_path()).await {
        Ok(index) => {
            if index.is_ready().await {
                match index.count().await {
                    Ok(count) => {
                        println!("   ✅ Ready ({} chunks indexed)", count);
                    }
                    Err(e) => {
                        println!("   ⚠️  Ready but unreadable - {}", e);
                    }
                }
            } else {
                println!("   💤 Not built yet");
            }
        }
        Err(e) => {
            println!("   ❌ Failed to open - {}", e);
        }
    }

    println!();
    println!("💡 Next Steps:");
    println!("   • Use 'curriculum-rag ingest <paths>' to build the index");
    println!("   • Use 'curriculum-rag ask <question> --subject <subject>' to query it");

    Ok(())
}

/// Expand the given paths into document sources.
///
/// Directories are scanned one level deep for supported document types; an
/// explicit subject, when given, applies to every collected document.
fn collect_sources(paths: Vec<PathBuf>, subject: Option<String>) -> Result<Vec<DocumentSource>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(&path)
                .with_context(|| format!("Failed to read directory: {}", path.display()))?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|p| {
                    p.is_file()
                        && p.extension()
                            .and_then(|ext| ext.to_str())
                            .is_some_and(|ext| {
                                DOCUMENT_EXTENSIONS.contains(&ext.to_lowercase().as_str())
                            })
                })
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(path);
        }
    }

    Ok(files
        .into_iter()
        .map(|path| match &subject {
            Some(subject) => DocumentSource::with_subject(path, subject.clone()),
            None => DocumentSource::new(path),
        })
        .collect())
}

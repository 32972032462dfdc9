use anyhow::Context;
use tracing::info;

use vectorscope::{Document, SearchRequest, VectorStore, VectorscopeConfig};

/// Loads the YAML file named by the first argument (defaults otherwise),
/// stores a few documents and runs one observed search.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => VectorscopeConfig::from_file(&path)
            .with_context(|| format!("loading configuration from {path}"))?,
        None => {
            let mut config = VectorscopeConfig::default();
            config.apply_env_overrides(|key| std::env::var(key).ok());
            config.validate()?;
            config
        }
    };
    vectorscope::init_tracing(&config.logging)?;

    let store = config.build_store().context("building vector store")?;

    let documents = vec![
        Document::builder("Great Depression caused mass unemployment")
            .id("a")
            .metadata("meta2", "meta2")
            .build()?,
        Document::builder("The Roaring Twenties were a period of economic prosperity")
            .id("b")
            .metadata("era", "1920s")
            .build()?,
        Document::builder("The New Deal introduced public works programs")
            .id("c")
            .metadata("era", "1930s")
            .build()?,
    ];
    store.add(documents).await?;

    let request = SearchRequest::builder("What is Great Depression")
        .top_k(1)
        .similarity_threshold_all()
        .build()?;
    let hits = store.similarity_search(&request).await?;

    for hit in &hits {
        info!(
            id = hit.id(),
            score = hit.score().unwrap_or_default(),
            "search_hit"
        );
        println!(
            "{:.4}  {}  {}",
            hit.score().unwrap_or_default(),
            hit.id(),
            hit.content()
        );
    }

    store.delete(&["b".to_string(), "c".to_string()]).await?;
    Ok(())
}

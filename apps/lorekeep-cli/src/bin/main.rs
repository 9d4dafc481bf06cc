use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lorekeep_core::chunker::SemanticChunker;
use lorekeep_core::config::{resolve_with_base, Config};
use lorekeep_core::corpus::CorpusLoader;
use lorekeep_core::settings::Settings;
use lorekeep_core::traits::TextGenerator;
use lorekeep_embed::get_default_embedder;
use lorekeep_hybrid::{ChatClient, Expansion, IndexBuilder, RetrievalEngine};

const USAGE: &str = "Usage: lorekeep <stats [data_dir] | chunk <file.txt> | query \"<question>\" [data_dir]>";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() { eprintln!("{}", USAGE); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

fn data_dir(arg: Option<&String>, settings: &Settings) -> anyhow::Result<PathBuf> {
    let raw = arg.cloned().unwrap_or_else(|| settings.corpus.data_dir.clone());
    Ok(resolve_with_base(&env::current_dir()?, raw))
}

fn generator(settings: &Settings) -> Option<Arc<dyn TextGenerator>> {
    if !settings.expansion.enabled { return None; }
    match ChatClient::new(&settings.generation) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => { warn!("Query expansion disabled: {}", e); None }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    info!("Config loaded ({} environment)", config.env_name());
    let settings = config.settings()?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "stats" => {
            let dir = data_dir(args.first(), &settings)?;
            let documents = CorpusLoader::new(&settings.corpus)?.load(&dir)?;
            let embedder = get_default_embedder(&settings.embedding)?;
            let builder = IndexBuilder::new(settings.clone(), embedder).with_progress(true);
            let retriever = builder.build(documents.clone()).await?;
            println!("📚 {} chapters from {}", documents.len(), dir.display());
            println!("🧩 {} chunks (BM25), {} vectors of dim {}", retriever.lexical().len(), retriever.dense().len(), retriever.dense().dim());
        }
        "chunk" => {
            let file = args.first().map(PathBuf::from).unwrap_or_else(|| { eprintln!("{}", USAGE); std::process::exit(1) });
            print_chunks(&file, &settings)?;
        }
        "query" => {
            let question = args.first().cloned().unwrap_or_else(|| { eprintln!("{}", USAGE); std::process::exit(1) });
            let dir = data_dir(args.get(1), &settings)?;
            let documents = CorpusLoader::new(&settings.corpus)?.load(&dir)?;
            let embedder = get_default_embedder(&settings.embedding)?;
            let mut builder = IndexBuilder::new(settings.clone(), embedder).with_progress(true);
            if let Some(g) = generator(&settings) { builder = builder.with_generator(g); }

            let engine = RetrievalEngine::new();
            engine.initialize(&builder, documents).await?;
            let retrieval = engine.retrieve(&question).await?;

            match &retrieval.expansion {
                Expansion::Expanded { keywords, .. } => println!("🔎 Expanded with: {}", keywords.join(", ")),
                Expansion::Fallback { reason, .. } => println!("🔎 Expansion skipped: {}", reason),
                Expansion::Disabled { .. } => {}
            }
            if let Some(err) = &retrieval.search_error { println!("⚠️  Search failed: {}", err); }
            for (i, p) in retrieval.passages.iter().enumerate() {
                let preview: String = p.text.chars().take(100).collect();
                println!("{:>2}. {} / {} | {}", i + 1, p.book, p.chapter, preview);
            }
            println!("\n{}", retrieval.context);
        }
        _ => { eprintln!("Unknown command: {}\n{}", cmd, USAGE); std::process::exit(1); }
    }
    Ok(())
}

fn print_chunks(file: &Path, settings: &Settings) -> anyhow::Result<()> {
    let loader = CorpusLoader::new(&settings.corpus)?;
    let chapters = loader.load_file(file)?;
    let embedder = get_default_embedder(&settings.embedding)?;
    let chunker = SemanticChunker::new(embedder, settings.chunking.clone());
    for (i, chapter) in chapters.iter().enumerate() {
        let chunks = chunker.chunk_document(i, chapter)?;
        println!("== {} / chapter {} ({} chunks)", chapter.book().unwrap_or("?"), chapter.chapter().unwrap_or("?"), chunks.len());
        for c in chunks { println!("[{}] ({} chars) {}", c.id, c.text.chars().count(), c.text); }
    }
    Ok(())
}

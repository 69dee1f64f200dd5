use clap::{Parser, Subcommand};
use serde::Serialize;
use solaudit_embed::{EmbeddingProvider, provider_from_config};
use solaudit_retriever::{
    config::{DEFAULT_CONFIG_FILE, RetrieverConfig},
    retrieval::{ChunkingConfig, ChunkingStrategy, Retriever, collect_documents, ingest_paths},
    storage::{DirectoryStore, IndexStore},
};
use std::path::PathBuf;
use std::process;

/// A CLI tool to build and query the solaudit vector index.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults apply when it does not exist)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Index directory, overriding `[index] location`
    #[arg(short, long)]
    index: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest files or directories and rebuild the index from scratch
    Build {
        /// Files or directories to ingest
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Chunk size in characters
        #[arg(long)]
        size: Option<usize>,
        /// Overlap between consecutive chunks in characters
        #[arg(long)]
        overlap: Option<usize>,
    },
    /// Retrieve the chunks most similar to a query
    Search {
        /// Query text
        query: String,
        /// Number of chunks to return
        #[arg(short)]
        k: Option<usize>,
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// List indexed chunks
    List {
        /// Limit number of results
        #[arg(short, long, default_value_t = 100)]
        limit: usize,
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// Show what the persisted index contains
    Status {
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// Remove the persisted index
    Clear,
}

#[derive(Debug, Clone, PartialEq)]
enum OutputFormat {
    Summary,
    Full,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputFormat::Summary),
            "full" => Ok(OutputFormat::Full),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format: {s}")),
        }
    }
}

#[derive(Serialize)]
struct ChunkOutput<'a> {
    row: usize,
    source: Option<&'a str>,
    sequence: usize,
    start: usize,
    chars: usize,
    content: &'a str,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn build_embedder(config: &RetrieverConfig) -> anyhow::Result<Box<dyn EmbeddingProvider>> {
    let embed_config = config
        .embedding
        .to_embed_config(|var| std::env::var(var).ok())?;
    Ok(provider_from_config(&embed_config)?)
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > max_chars {
        format!("{}...", flat.chars().take(max_chars).collect::<String>())
    } else {
        flat
    }
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let mut config = RetrieverConfig::load(&args.config)?;
    if let Some(index) = args.index {
        config.index.location = index;
    }
    let store = DirectoryStore::new(&config.index.location);

    match args.command {
        Commands::Build {
            paths,
            size,
            overlap,
        } => {
            if let Some(size) = size {
                config.chunking.size = size;
            }
            if let Some(overlap) = overlap {
                config.chunking.overlap = overlap;
            }
            let segmenter = config.chunking.segmenter()?;
            let strategy = ChunkingStrategy::new(ChunkingConfig::new(segmenter.window()));
            let embedder = build_embedder(&config)?;

            let files = collect_documents(&paths, &strategy)?;
            let report = ingest_paths(&files, &strategy);
            for (document, error) in report.failures() {
                println!("  skipped {document}: {error}");
            }

            let index = store.build(&report.chunks, embedder.as_ref())?;
            println!(
                "Indexed {} chunks from {}/{} documents into {}",
                index.len(),
                report.indexed_count(),
                files.len(),
                store.location().display()
            );
            Ok(())
        }
        Commands::Search { query, k, format } => {
            let k = k.unwrap_or(config.retrieval.top_k);
            let embedder = build_embedder(&config)?;
            let retriever = Retriever::open(&store, embedder)?;
            let hits = retriever.retrieve(&query, k)?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&hits)?);
                }
                OutputFormat::Summary => {
                    println!("Found {} similar chunks:", hits.len());
                    for hit in &hits {
                        println!(
                            "  Similarity: {:.3} | Row: {} | Source: {} | {}",
                            hit.score,
                            hit.row,
                            hit.chunk.source.as_deref().unwrap_or("-"),
                            preview(&hit.chunk.chunk_text, 60)
                        );
                    }
                }
                OutputFormat::Full => {
                    for hit in &hits {
                        println!("Similarity: {:.3}", hit.score);
                        println!("Row: {}", hit.row);
                        println!("Source: {}", hit.chunk.source.as_deref().unwrap_or("-"));
                        println!("Content:\n{}", hit.chunk.chunk_text);
                        println!("---");
                    }
                }
            }
            Ok(())
        }
        Commands::List { limit, format } => {
            let index = store.load()?;
            let chunks: Vec<ChunkOutput> = index
                .chunks()
                .iter()
                .take(limit)
                .enumerate()
                .map(|(row, chunk)| ChunkOutput {
                    row,
                    source: chunk.source.as_deref(),
                    sequence: chunk.sequence,
                    start: chunk.start,
                    chars: chunk.char_len(),
                    content: &chunk.chunk_text,
                })
                .collect();

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&chunks)?);
                }
                OutputFormat::Summary => {
                    println!("Showing {} of {} chunks:", chunks.len(), index.len());
                    for chunk in &chunks {
                        println!(
                            "  Row: {} | Source: {} | Seq: {} | Start: {} | Chars: {}",
                            chunk.row,
                            chunk.source.unwrap_or("-"),
                            chunk.sequence,
                            chunk.start,
                            chunk.chars
                        );
                    }
                }
                OutputFormat::Full => {
                    for chunk in &chunks {
                        println!("Row: {}", chunk.row);
                        println!("Source: {}", chunk.source.unwrap_or("-"));
                        println!("Sequence: {} (start {})", chunk.sequence, chunk.start);
                        println!("Content:\n{}", chunk.content);
                        println!("---");
                    }
                }
            }
            Ok(())
        }
        Commands::Status { format } => {
            let summary = store.summary()?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                }
                OutputFormat::Summary | OutputFormat::Full => match summary {
                    None => {
                        println!(
                            "No index at {}. Run `solaudit-retriever build <paths>` first.",
                            store.location().display()
                        );
                    }
                    Some(summary) => {
                        println!("Index Status");
                        println!("============");
                        println!("  Location: {}", summary.location.display());
                        println!("  Provider: {}", summary.provider);
                        println!("  Model: {}", summary.model);
                        println!("  Dimension: {}", summary.dimension);
                        println!("  Chunks: {}", summary.chunk_count);
                        println!("  Vector bytes: {}", summary.vectors_bytes);
                        println!("  Built at: {}", summary.built_at.to_rfc3339());
                        println!("  Sources: {}", summary.sources.len());
                        let shown = if format == OutputFormat::Full {
                            summary.sources.len()
                        } else {
                            10
                        };
                        for source in summary.sources.iter().take(shown) {
                            println!("    {source}");
                        }
                        if summary.sources.len() > shown {
                            println!("    ... and {} more", summary.sources.len() - shown);
                        }
                    }
                },
            }
            Ok(())
        }
        Commands::Clear => {
            store.clear()?;
            println!("Removed index at {}", store.location().display());
            Ok(())
        }
    }
}

use anyhow::Context;
use clap::{Parser, Subcommand};
use solaudit_bench::{
    AnsweringModel, BenchConfig, BenchmarkHarness, ChatCompletionsModel, DirectPredictor,
    LabeledItem, Predictor, RetrievalAugmentedPredictor, Strategy, load_json, load_labeled_dirs,
};
use solaudit_embed::{EmbeddingProvider, provider_from_config};
use solaudit_retriever::RetrieverError;
use solaudit_retriever::config::DEFAULT_CONFIG_FILE;
use solaudit_retriever::retrieval::Retriever;
use solaudit_retriever::storage::DirectoryStore;
use std::path::PathBuf;
use std::process;

/// Benchmark and query the smart-contract audit assistant.
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
    /// Score predictions against labeled contracts
    Run {
        /// Directory of vulnerable samples
        #[arg(long, requires = "negative", conflicts_with = "items")]
        positive: Option<PathBuf>,
        /// Directory of safe samples
        #[arg(long, requires = "positive", conflicts_with = "items")]
        negative: Option<PathBuf>,
        /// JSON array of {"id"?, "code", "label"} objects
        #[arg(long)]
        items: Option<PathBuf>,
        /// Prediction strategy: rag or direct
        #[arg(short, long)]
        strategy: Option<Strategy>,
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// Ask a question, grounded in the index
    Ask {
        /// Question text
        question: String,
        /// Contract source to ask about
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Skip retrieval and ask with no context
        #[arg(long)]
        direct: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum OutputFormat {
    Summary,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputFormat::Summary),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format: {s}")),
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn answering_model(config: &BenchConfig) -> anyhow::Result<ChatCompletionsModel> {
    let chat = config
        .answering
        .to_chat_config(|var| std::env::var(var).ok())?;
    Ok(ChatCompletionsModel::new(&chat)?)
}

fn open_retriever(config: &BenchConfig) -> anyhow::Result<Retriever<Box<dyn EmbeddingProvider>>> {
    let embed_config = config
        .retriever
        .embedding
        .to_embed_config(|var| std::env::var(var).ok())?;
    let embedder = provider_from_config(&embed_config)?;
    let store = DirectoryStore::new(&config.retriever.index.location);
    match Retriever::open(&store, embedder) {
        Ok(retriever) => Ok(retriever),
        Err(e @ RetrieverError::IndexNotFound { .. }) => Err(anyhow::Error::new(e)
            .context("retrieval needs an index; run `solaudit-retriever build <paths>` first")),
        Err(e) => Err(e.into()),
    }
}

fn load_items(
    positive: Option<PathBuf>,
    negative: Option<PathBuf>,
    items: Option<PathBuf>,
) -> anyhow::Result<Vec<LabeledItem>> {
    match (positive, negative, items) {
        (_, _, Some(path)) => Ok(load_json(&path)?),
        (Some(positive), Some(negative), None) => Ok(load_labeled_dirs(&positive, &negative)?),
        _ => anyhow::bail!("pass either --positive and --negative, or --items"),
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

    let mut config = BenchConfig::load(&args.config)?;
    if let Some(index) = args.index {
        config.retriever.index.location = index;
    }

    match args.command {
        Commands::Run {
            positive,
            negative,
            items,
            strategy,
            format,
        } => {
            let items = load_items(positive, negative, items)?;
            let strategy = strategy.unwrap_or(config.benchmark.strategy);
            let question = config.benchmark.question.clone();
            let harness = BenchmarkHarness::new(config.benchmark.classifier()?);
            let model = answering_model(&config)?;

            let predictor: Box<dyn Predictor> = match strategy {
                Strategy::Rag => {
                    config.retriever.retrieval.validate()?;
                    Box::new(RetrievalAugmentedPredictor::new(
                        open_retriever(&config)?,
                        model,
                        question,
                        config.retriever.retrieval.top_k,
                    ))
                }
                Strategy::Direct => Box::new(DirectPredictor::new(model, question)),
            };

            let result = harness.run(&items, predictor.as_ref())?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
                OutputFormat::Summary => {
                    println!("Predictions:");
                    for prediction in &result.predictions {
                        println!(
                            "  {} | actual: {} | predicted: {} | {}",
                            prediction.item_id,
                            prediction.actual,
                            prediction.predicted,
                            if prediction.is_correct() { "ok" } else { "MISS" }
                        );
                    }
                    println!(
                        "Accuracy: {:.2}% ({}/{})",
                        result.accuracy_percent, result.correct, result.total
                    );
                }
            }
            Ok(())
        }
        Commands::Ask {
            question,
            file,
            direct,
        } => {
            let code = file
                .map(|path| {
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("failed to read {}", path.display()))
                })
                .transpose()?;
            let full_question = match &code {
                Some(code) => format!("{question}\n\n{code}"),
                None => question.clone(),
            };
            let model = answering_model(&config)?;

            let answer = if direct {
                model.answer(&full_question, None)?
            } else {
                config.retriever.retrieval.validate()?;
                let retriever = open_retriever(&config)?;
                let query = code.as_deref().unwrap_or(&question);
                let context = retriever.context_for(query, config.retriever.retrieval.top_k)?;
                model.answer(&full_question, Some(&context))?
            };
            println!("{answer}");
            Ok(())
        }
    }
}

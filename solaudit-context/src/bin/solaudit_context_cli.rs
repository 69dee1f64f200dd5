use clap::Parser;
use solaudit_context::text::{
    DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, TextSegmenter, WindowConfig,
};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::process;

/// A CLI tool to segment text files into overlapping JSON chunks using solaudit-context.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input text file. If not provided, reads from stdin.
    #[arg(short, long)]
    input: Option<String>,

    /// Source identifier attached to every chunk.
    #[arg(short, long)]
    source: Option<String>,

    /// Window size in characters.
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    size: usize,

    /// Characters shared by consecutive windows.
    #[arg(long, default_value_t = DEFAULT_CHUNK_OVERLAP)]
    overlap: usize,
}

#[derive(Serialize)]
struct SerializableChunk<'a> {
    source: Option<&'a str>,
    sequence: usize,
    start: usize,
    length: usize,
    chunk_text: &'a str,
}

fn main() {
    let args = Args::parse();

    let window = match WindowConfig::new(args.size, args.overlap) {
        Ok(window) => window,
        Err(e) => {
            eprintln!("Error: [segment] {e}");
            process::exit(2);
        }
    };

    if let Err(e) = run(args, window) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(args: Args, window: WindowConfig) -> io::Result<()> {
    let file_content = if let Some(input_path) = &args.input {
        fs::read_to_string(input_path)?
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    };

    let mut segmenter = TextSegmenter::new(window);
    if let Some(source) = args.source.or(args.input) {
        segmenter = segmenter.with_source(source);
    }

    let chunks = segmenter.get_chunks(&file_content);

    let serializable_chunks: Vec<SerializableChunk> = chunks
        .iter()
        .map(|c| SerializableChunk {
            source: c.source.as_deref(),
            sequence: c.sequence,
            start: c.start,
            length: c.char_len(),
            chunk_text: &c.chunk_text,
        })
        .collect();

    let json_output = serde_json::to_string_pretty(&serializable_chunks)?;
    println!("{json_output}");

    Ok(())
}

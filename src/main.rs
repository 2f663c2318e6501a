use clap::Parser;
use tracing_subscriber::EnvFilter;

use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use richtext_sanitizer::batch::{self, Mode};
use richtext_sanitizer::post::PostDraft;
use richtext_sanitizer::sanitizer::ParserKind;
use richtext_sanitizer::{to_plain_text, Sanitizer};

#[derive(Parser, Debug)]
struct Args {
    /// What to do with the input
    #[arg(short, long, value_enum, default_value_t = Mode::Sanitize)]
    mode: Mode,
    /// File to read from, stdin if omitted
    #[arg(short, long)]
    input_file: Option<String>,
    /// File to write to, stdout if omitted
    #[arg(short, long)]
    output_file: Option<String>,
    /// Treat the input as JSON lines, one record per line
    #[arg(long)]
    batch: bool,
    /// Number of threads for batch processing, 0 lets rayon decide
    #[arg(long, default_value_t = 0usize)]
    threads: usize,
    /// Parser used in sanitize mode; `disabled` runs the normalization-only fallback
    #[arg(long, value_enum, default_value_t = ParserKind::Html)]
    parser: ParserKind,
    /// Fail instead of falling back to normalization when no parser is available
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if args.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()?;
    }

    let reader: Box<dyn BufRead> = match &args.input_file {
        Some(filename) => Box::new(BufReader::new(File::open(filename)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let writer: Box<dyn Write> = match &args.output_file {
        Some(filename) => {
            ensure_parent_folder_exists(filename)?;
            Box::new(BufWriter::new(File::create(filename)?))
        }
        None => Box::new(BufWriter::new(io::stdout())),
    };

    if args.batch {
        let summary = batch::process_lines(reader, writer, args.mode)?;
        tracing::info!(
            "processed {} records, {} failed",
            summary.processed,
            summary.failed
        );
        return Ok(());
    }

    process_document(reader, writer, &args)
}

fn process_document(
    mut reader: Box<dyn BufRead>,
    mut writer: Box<dyn Write>,
    args: &Args,
) -> Result<(), Box<dyn Error>> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;

    let output = match args.mode {
        Mode::Sanitize => {
            let sanitizer = Sanitizer::for_parser(args.parser);
            if args.strict {
                sanitizer.try_sanitize(&input)?
            } else {
                sanitizer.sanitize_lenient(&input)
            }
        }
        Mode::PlainText => to_plain_text(&input),
        Mode::Post => {
            let draft: PostDraft = serde_json::from_str(&input)?;
            serde_json::to_string_pretty(&draft.prepare()?)?
        }
    };

    writeln!(writer, "{}", output)?;
    writer.flush()?;
    Ok(())
}

fn ensure_parent_folder_exists(filename: &str) -> io::Result<()> {
    match Path::new(filename).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

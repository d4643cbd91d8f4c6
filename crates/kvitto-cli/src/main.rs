use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use kvitto_convert::{Config, ConvertError, ConvertErrorKind, UnknownKeys};
use kvitto_document::Value;
use kvitto_receipt::receipt_from_xml;
use kvitto_store::{DocId, MemoryStore, SaveOutcome, Store};

#[derive(Parser)]
#[command(name = "kvitto", about = "Receipt XML conversion utilities")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a receipt XML file and print the normalized document
    Convert(Convert),
    /// Convert a receipt XML file and upsert it into a store file
    Save(Save),
    /// Print one stored document
    Get(Get),
    /// List stored document ids
    List(List),
}

#[derive(Args)]
struct Convert {
    /// Path to the receipt XML file
    file: PathBuf,
    #[command(flatten)]
    options: ConvertOptions,
}

#[derive(Args)]
struct Save {
    /// Path to the receipt XML file
    file: PathBuf,
    /// Path to the JSON store file
    #[arg(short, long)]
    store: PathBuf,
    /// Update this document id instead of inserting under a fresh one
    #[arg(long)]
    id: Option<String>,
    #[command(flatten)]
    options: ConvertOptions,
}

#[derive(Args)]
struct Get {
    /// Document id
    id: String,
    /// Path to the JSON store file
    #[arg(short, long)]
    store: PathBuf,
}

#[derive(Args)]
struct List {
    /// Path to the JSON store file
    #[arg(short, long)]
    store: PathBuf,
}

#[derive(Args)]
struct ConvertOptions {
    /// JSON file with defaults to backfill into the check subtree
    #[arg(short, long)]
    template: Option<PathBuf>,
    /// Skip attributes whose values fail conversion instead of aborting
    #[arg(long)]
    lenient: bool,
    /// Treat unknown attributes as errors
    #[arg(long)]
    deny_unknown: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Commands::Convert(args) => run_convert(args),
        Commands::Save(args) => run_save(args),
        Commands::Get(args) => run_get(args),
        Commands::List(args) => run_list(args),
    }
}

fn run_convert(args: Convert) -> anyhow::Result<()> {
    let document = convert_file(&args.file, &args.options)?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

fn run_save(args: Save) -> anyhow::Result<()> {
    let document = convert_file(&args.file, &args.options)?;
    let id = args.id.as_deref().map(DocId::parse).transpose()?;
    let mut store = MemoryStore::load(&args.store)?;
    let outcome = store.save(id, document)?;
    store.persist(&args.store)?;
    match outcome {
        SaveOutcome::Inserted(id) => println!("Inserted {id}"),
        SaveOutcome::Updated(id) => println!("Updated {id}"),
    }
    Ok(())
}

fn run_get(args: Get) -> anyhow::Result<()> {
    let store = MemoryStore::load(&args.store)?;
    let id = DocId::parse(&args.id)?;
    match store.find(&id) {
        Some(document) => {
            println!("{}", serde_json::to_string_pretty(document)?);
            Ok(())
        }
        None => anyhow::bail!("no document with id {id}"),
    }
}

fn run_list(args: List) -> anyhow::Result<()> {
    let store = MemoryStore::load(&args.store)?;
    for (id, _) in store.all() {
        println!("{id}");
    }
    Ok(())
}

fn lenient(err: &ConvertError) -> bool {
    matches!(err.kind, ConvertErrorKind::Convert(_))
}

fn convert_file(file: &Path, options: &ConvertOptions) -> anyhow::Result<Value> {
    let xml = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let template = options.template.as_deref().map(load_template).transpose()?;
    let name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());
    let config = Config {
        on_error: options.lenient.then_some(&lenient as &dyn Fn(&ConvertError) -> bool),
        unknown_keys: if options.deny_unknown {
            UnknownKeys::Deny
        } else {
            UnknownKeys::Ignore
        },
    };
    let document = receipt_from_xml(&xml, &name, template.as_ref(), config)?;
    Ok(document)
}

fn load_template(path: &Path) -> anyhow::Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading template {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing template {}", path.display()))
}

mod logging;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docstore_core::{Level, Options, Store, TracingLogger};
use output::{
    InitOutput, LsOutput, OutputWriter, ReadOutput, RecordInfo, RmOutput, WriteOutput,
};
use serde_json::Value;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Docstore - A JSON document store
#[derive(Parser)]
#[command(name = "docstore")]
#[command(about = "JSON document store with one file per record", long_about = None)]
#[command(version)]
struct Cli {
    /// Store root directory (defaults to DOCSTORE_ROOT env var or ./DB)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store root directory if it does not exist
    Init,

    /// Write a JSON document
    Write {
        /// Collection name
        collection: String,

        /// Resource name
        resource: String,

        /// Document as JSON (read from stdin if omitted)
        #[arg(long)]
        value: Option<String>,
    },

    /// Print a document
    Read {
        /// Collection name
        collection: String,

        /// Resource name
        resource: String,
    },

    /// List every document in a collection
    Ls {
        /// Collection name
        collection: String,

        /// Include document contents
        #[arg(short, long)]
        long: bool,
    },

    /// Delete a document
    Rm {
        /// Collection name
        collection: String,

        /// Resource name
        resource: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_level);

    // Determine store root: CLI arg > DOCSTORE_ROOT env var > ./DB default
    let root = cli
        .root
        .or_else(|| std::env::var("DOCSTORE_ROOT").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./DB"));

    let out = OutputWriter::new(cli.json);

    match run(cli.command, &root, cli.log_level, &out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = result_code(&err);
            out.write_error(&err, code);
            ExitCode::from(code)
        }
    }
}

fn run(command: Commands, root: &Path, log_level: Level, out: &OutputWriter) -> Result<()> {
    let store = open_store(root, log_level)?;

    match command {
        Commands::Init => cmd_init(&store, out),
        Commands::Write {
            collection,
            resource,
            value,
        } => cmd_write(&store, &collection, &resource, value, out),
        Commands::Read {
            collection,
            resource,
        } => cmd_read(&store, &collection, &resource, out),
        Commands::Ls { collection, long } => cmd_ls(&store, &collection, long, out),
        Commands::Rm {
            collection,
            resource,
        } => cmd_rm(&store, &collection, &resource, out),
    }
}

/// Exit code for a failed command: 2 invalid argument, 3 not found, 1 otherwise.
fn result_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<docstore_core::Error>() {
        Some(e) if e.is_invalid_argument() => 2,
        Some(e) if e.is_not_found() => 3,
        _ => 1,
    }
}

fn open_store(root: &Path, log_level: Level) -> Result<Store> {
    Store::open(root, Options::new().logger(TracingLogger::new(log_level)))
        .with_context(|| format!("Failed to open store at {}", root.display()))
}

fn cmd_init(store: &Store, out: &OutputWriter) -> Result<()> {
    let data = InitOutput {
        success: true,
        result_code: 0,
        root: store.root().display().to_string(),
        version: docstore_core::VERSION.to_string(),
    };

    out.write(&data, || {
        format!("Initialized docstore at {}\n", store.root().display())
    })
}

/// Parse the document from `--value`, or from stdin when it is piped.
fn read_document(value: Option<String>) -> Result<Value> {
    let raw = match value {
        Some(raw) => raw,
        None => {
            if atty::is(atty::Stream::Stdin) {
                return Err(docstore_core::Error::invalid_argument(
                    "no document given: pass --value or pipe JSON on stdin",
                )
                .into());
            }
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read document from stdin")?;
            raw
        }
    };

    parse_document(&raw)
}

fn parse_document(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).map_err(|err| {
        docstore_core::Error::invalid_argument(format!("document is not valid JSON: {}", err))
            .into()
    })
}

fn cmd_write(
    store: &Store,
    collection: &str,
    resource: &str,
    value: Option<String>,
    out: &OutputWriter,
) -> Result<()> {
    let document = read_document(value)?;

    store
        .write(collection, resource, &document)
        .with_context(|| format!("Failed to write {}/{}", collection, resource))?;

    let path = store.resource_path(collection, resource);
    let data = WriteOutput {
        success: true,
        result_code: 0,
        collection: collection.to_string(),
        resource: resource.to_string(),
        path: path.display().to_string(),
    };

    out.write(&data, || format!("Wrote {}\n", path.display()))
}

fn cmd_read(store: &Store, collection: &str, resource: &str, out: &OutputWriter) -> Result<()> {
    let document: Value = store
        .read(collection, resource)
        .with_context(|| format!("Failed to read {}/{}", collection, resource))?;

    let text = if out.is_json() {
        String::new()
    } else {
        serde_json::to_string_pretty(&document)?
    };
    let data = ReadOutput {
        success: true,
        result_code: 0,
        collection: collection.to_string(),
        resource: resource.to_string(),
        document,
    };

    out.write(&data, || format!("{}\n", text))
}

fn cmd_ls(store: &Store, collection: &str, long: bool, out: &OutputWriter) -> Result<()> {
    let raw = store
        .read_all(collection)
        .with_context(|| format!("Failed to list collection {}", collection))?;

    let mut records = Vec::with_capacity(raw.len());
    let mut text = String::new();

    for (file, content) in raw {
        let document = if long {
            text.push_str(&format!("{}\n{}", file, content));
            Some(
                serde_json::from_str(&content)
                    .with_context(|| format!("Malformed document: {}", file))?,
            )
        } else {
            text.push_str(&format!("{}\n", file));
            None
        };
        records.push(RecordInfo { file, document });
    }

    if records.is_empty() {
        text = format!("No documents in {}\n", collection);
    }

    let data = LsOutput {
        success: true,
        result_code: 0,
        collection: collection.to_string(),
        records,
    };

    out.write(&data, || text)
}

fn cmd_rm(store: &Store, collection: &str, resource: &str, out: &OutputWriter) -> Result<()> {
    store
        .delete(collection, resource)
        .with_context(|| format!("Failed to delete {}/{}", collection, resource))?;

    let data = RmOutput {
        success: true,
        result_code: 0,
        collection: collection.to_string(),
        resource: resource.to_string(),
    };

    out.write(&data, || format!("Removed {}/{}\n", collection, resource))
}

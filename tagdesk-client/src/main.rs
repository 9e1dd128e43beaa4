//! tagdesk - command-line front end for the document tagging engine
//!
//! Each invocation loads taxonomy and documents from the backend, performs one
//! operation through the controller and prints the resulting state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tagdesk_client::{AppController, DocumentId, FileBlob, HttpBackend, Snapshot};
use tagdesk_common::config::{load_toml_config, ClientConfig, BASE_URL_ENV};
use tracing::info;

/// Command-line arguments for tagdesk
#[derive(Parser, Debug)]
#[command(name = "tagdesk")]
#[command(about = "Browse, filter and upload auto-tagged documents")]
#[command(version)]
struct Args {
    /// Backend base URL
    #[arg(long, env = BASE_URL_ENV, global = true)]
    base_url: Option<String>,

    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List documents, optionally filtered by tags (all must match)
    List {
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Show one document with its summary
    Show { id: String },
    /// Show the tag taxonomy and custom tags with their colors
    Tags,
    /// Upload files one after another and select the last one
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Delete all uploaded documents on the backend
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = load_toml_config(args.config.as_deref()).context("Failed to load config")?;
    tagdesk_common::logging::init_tracing(&toml_config.logging)
        .context("Failed to initialize logging")?;

    info!("Starting tagdesk v{}", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::resolve(args.base_url.as_deref(), &toml_config)
        .context("Invalid configuration")?;
    let backend = HttpBackend::new(&config).context("Failed to create HTTP client")?;
    let controller = AppController::new(Arc::new(backend), &config);

    controller
        .load()
        .await
        .context("Failed to load documents and taxonomy")?;

    match args.command {
        Command::List { tags } => {
            for tag in &tags {
                controller.toggle_tag(tag).await;
            }
            print_documents(&controller.snapshot().await);
        }
        Command::Show { id } => {
            controller
                .select(DocumentId::new(&id))
                .await
                .with_context(|| format!("Failed to load document {}", id))?;
            print_detail(&controller.snapshot().await);
        }
        Command::Tags => print_tags(&controller.snapshot().await),
        Command::Upload { paths } => {
            let mut files = Vec::with_capacity(paths.len());
            for path in &paths {
                files.push(read_blob(path).await?);
            }

            let report = controller.upload(files).await.context("Upload failed")?;
            for processed in &report.processed {
                println!("uploaded {}  [{}]", processed.filename, processed.tags.join(", "));
            }

            let snapshot = controller.snapshot().await;
            match &report.selected {
                Some(_) => print_detail(&snapshot),
                None => println!("uploaded document not found in the refreshed list"),
            }
        }
        Command::Reset => {
            controller.reset().await.context("Reset failed")?;
            let snapshot = controller.snapshot().await;
            println!(
                "reset complete: {} documents, {} custom tags, {} taxonomy groups",
                snapshot.documents.len(),
                snapshot.custom_tags.len(),
                snapshot.taxonomy.len()
            );
        }
    }

    Ok(())
}

async fn read_blob(path: &Path) -> Result<FileBlob> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file path: {}", path.display()))?;
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(FileBlob::new(name, content))
}

fn print_documents(snapshot: &Snapshot) {
    if !snapshot.filter.is_empty() {
        println!("filter: {}", snapshot.filter.join(" AND "));
    }
    println!("{} of {} documents", snapshot.visible.len(), snapshot.documents.len());
    for doc in &snapshot.visible {
        let tags: Vec<String> = doc
            .tags
            .iter()
            .map(|t| format!("{} <{}>", t, snapshot.color_of(t)))
            .collect();
        println!("{:>6}  {}  {}", doc.id, doc.filename, tags.join(", "));
    }
}

fn print_detail(snapshot: &Snapshot) {
    let Some(doc) = &snapshot.selected_detail else {
        println!("no document selected");
        return;
    };
    println!("{} ({})", doc.filename, doc.id);
    println!("tags: {}", doc.tags.join(", "));
    println!();
    println!("{}", doc.summary.as_deref().unwrap_or("(no summary)"));
}

fn print_tags(snapshot: &Snapshot) {
    for group in &snapshot.taxonomy {
        println!("{}", group.name);
        for tag in &group.tags {
            println!("  {}  <{}>", tag, snapshot.color_of(tag));
        }
    }
    if !snapshot.custom_tags.is_empty() {
        println!("Custom");
        for tag in &snapshot.custom_tags {
            println!("  {}  <{}>", tag, snapshot.color_of(tag));
        }
    }
}

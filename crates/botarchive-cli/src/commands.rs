use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;

use botarchive_registry::{hash_password, CollectionKind, Registry};
use botarchive_server::handler::ListQuery;
use botarchive_server::{BotArchiveServer, ServerConfig};
use botarchive_store::FileKvStore;
use botarchive_types::{Record, UuidGenerator};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args).await,
        Command::List(args) => cmd_list(&config, args, cli.format).await,
        Command::Flush(args) => cmd_flush(&config, args).await,
        Command::HashPassword(args) => cmd_hash_password(args, cli.format),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ServerConfig> {
    let config = match path {
        Some(p) => ServerConfig::load(p)
            .with_context(|| format!("loading config from {}", p.display()))?,
        None => ServerConfig::default(),
    };
    Ok(config.with_env_overrides())
}

/// Open the file-backed registry. Offline commands need a data directory.
fn open_registry(config: &ServerConfig, data_dir: Option<PathBuf>) -> anyhow::Result<Registry> {
    let dir = data_dir
        .or_else(|| config.data_dir.clone())
        .context("no data directory; pass --data-dir or set data_dir in the config")?;
    let kv = FileKvStore::open(&dir)
        .with_context(|| format!("opening store at {}", dir.display()))?;
    Ok(Registry::with_config(
        Arc::new(kv),
        Arc::new(UuidGenerator),
        config.registry_config(),
    ))
}

async fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = Some(dir);
    }
    let server = BotArchiveServer::new(config)?;
    server.serve().await?;
    Ok(())
}

async fn cmd_list(config: &ServerConfig, args: ListArgs, format: OutputFormat) -> anyhow::Result<()> {
    let kind = if args.pending {
        CollectionKind::Pending
    } else {
        CollectionKind::Approved
    };
    let records = list_records(config, kind, args).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Text if records.is_empty() => println!("No {kind} records."),
        OutputFormat::Text => {
            for record in &records {
                print_record(record);
            }
            println!("\n{} {kind} record(s)", records.len().to_string().bold());
        }
    }
    Ok(())
}

async fn list_records(
    config: &ServerConfig,
    kind: CollectionKind,
    args: ListArgs,
) -> anyhow::Result<Vec<Record>> {
    let registry = open_registry(config, args.data_dir)?;
    let filter = ListQuery {
        kind: None,
        q: args.query,
        category: args.category,
    }
    .filter();
    Ok(registry.list(kind, &filter).await?)
}

fn print_record(record: &Record) {
    let category = record
        .category
        .map(|c| c.to_string())
        .unwrap_or_else(|| "-".into());
    println!(
        "{}  {}  v{}  {}",
        record.name.bold(),
        category.cyan(),
        record.version,
        record.id.to_string().dimmed()
    );
    if !record.url.is_empty() {
        println!("    {}", record.url.blue());
    }
    if !record.desc.is_empty() {
        println!("    {}", record.desc);
    }
    if let Some(at) = record.created_at {
        println!("    {} {}", "added".dimmed(), at.to_rfc3339());
    } else if let Some(at) = record.suggested_at {
        println!("    {} {}", "suggested".dimmed(), at.to_rfc3339());
    }
}

async fn cmd_flush(config: &ServerConfig, args: FlushArgs) -> anyhow::Result<()> {
    if !args.yes {
        bail!("flush deletes every approved bot and pending suggestion; rerun with --yes");
    }
    let registry = open_registry(config, args.data_dir)?;
    registry.flush_all().await?;
    println!("{} Flushed approved and pending collections.", "✓".green().bold());
    Ok(())
}

fn cmd_hash_password(args: HashPasswordArgs, format: OutputFormat) -> anyhow::Result<()> {
    let digest = hash_password(&args.password);
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "sha256": digest })),
        OutputFormat::Text => println!("{digest}"),
    }
    Ok(())
}

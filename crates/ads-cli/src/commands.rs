use std::path::Path;
use std::sync::Arc;

use ads_server::{AnalystDataServer, ServerConfig};
use ads_sync::{CaptureOrigin, CaptureResult, SyncConfig, SyncNode};
use ads_store::{InMemoryBlocklist, InMemoryDirectory, InMemoryRecordStore, RecordStore};
use ads_types::{AnalystData, Identity, Manifest, RecordKind};
use anyhow::Context;
use colored::Colorize;
use serde_json::Value;
use uuid::Uuid;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Index(args) => cmd_index(args, &cli.format),
        Command::Capture(args) => cmd_capture(args, &cli.format),
        Command::CheckConfig(args) => cmd_check_config(args),
    }
}

/// Read a JSON array of tagged records.
fn read_records(path: &Path) -> anyhow::Result<Vec<Value>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    match serde_json::from_str::<Value>(&text).with_context(|| format!("parsing {}", path.display()))? {
        Value::Array(items) => Ok(items),
        single @ Value::Object(_) => Ok(vec![single]),
        _ => anyhow::bail!("{} must contain a record or an array of records", path.display()),
    }
}

fn loader(org: Uuid) -> Identity {
    Identity::site_admin(0, "loader@localhost", org)
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = ServerConfig::load(&args.config)?;
    if let Some(bind) = &args.bind {
        config.bind_addr = bind.parse().with_context(|| format!("invalid bind address {bind}"))?;
    }
    let server = AnalystDataServer::new(config)?;
    if let Some(seed) = &args.seed {
        let admin = loader(server.config().instance.org_uuid);
        let result = server
            .node()
            .capture_all(&admin, read_records(seed)?, CaptureOrigin::local());
        print_capture_summary(&result);
    }
    println!(
        "{} serving analyst data on {} for {}",
        "✓".green().bold(),
        server.config().bind_addr.to_string().bold(),
        server.config().instance.org_uuid.to_string().cyan()
    );
    server.serve().await?;
    Ok(())
}

/// Seed a store with records exactly as held and list what `org` may see.
///
/// Records keep their own `org_uuid`; one without a holder is taken to be
/// held by `org`.
fn visible_index(payloads: Vec<Value>, org: Uuid) -> anyhow::Result<Manifest> {
    let store = InMemoryRecordStore::new();
    let mut skipped = 0usize;
    for payload in payloads {
        let seeded = AnalystData::from_value(payload).map_err(anyhow::Error::from).and_then(|mut record| {
            let env = record.envelope_mut();
            env.id = None;
            if env.org_uuid.is_nil() {
                env.org_uuid = org;
            }
            store.upsert(&record).map_err(anyhow::Error::from)
        });
        if let Err(e) = seeded {
            tracing::warn!(error = %e, "skipping record");
            skipped += 1;
        }
    }
    if skipped > 0 {
        tracing::warn!(skipped, "some records could not be loaded");
    }

    let node = SyncNode::new(
        Arc::new(store),
        Arc::new(InMemoryDirectory::new()),
        Arc::new(InMemoryBlocklist::new()),
        SyncConfig::default(),
    );
    let reader = Identity::user(0, "reader@localhost", org);
    Ok(node.index_minimal(&reader)?)
}

fn cmd_index(args: IndexArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let index = visible_index(read_records(&args.data)?, args.org)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&index)?),
        OutputFormat::Text => {
            for kind in RecordKind::ALL {
                let entries: Vec<_> = index.entries(kind).collect();
                if entries.is_empty() {
                    continue;
                }
                println!("{} ({})", kind.to_string().bold(), entries.len());
                for (uuid, modified) in entries {
                    println!("  {}  {}", uuid.to_string().yellow(), modified.to_rfc3339().dimmed());
                }
            }
            if index.is_empty() {
                println!("No analyst data visible to {}.", args.org);
            }
        }
    }
    Ok(())
}

fn cmd_capture(args: CaptureArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let org = if args.org.is_nil() { Uuid::new_v4() } else { args.org };
    let identity = if args.sync {
        Identity::sync_user(0, "sync@localhost", org)
    } else {
        Identity::user(0, "user@localhost", org)
    };
    let node = SyncNode::in_memory(SyncConfig::default());
    let result = node.capture_all(&identity, read_records(&args.data)?, CaptureOrigin::local());
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_capture_summary(&result),
    }
    Ok(())
}

fn cmd_check_config(args: CheckConfigArgs) -> anyhow::Result<()> {
    let config = ServerConfig::load(&args.config)?;
    println!("{} {} is valid", "✓".green().bold(), args.config.display());
    println!("  Bind: {}", config.bind_addr.to_string().bold());
    println!("  Instance org: {}", config.instance.org_uuid.to_string().cyan());
    println!("  API keys: {}", config.api_keys.len());
    println!("  Chunk size: {}", config.sync.effective_chunk_size());
    for peer in &config.peers {
        let scope = if peer.internal { "internal".yellow() } else { "external".normal() };
        println!("  Peer #{} {} ({})", peer.id, peer.url.blue(), scope);
    }
    Ok(())
}

fn print_capture_summary(result: &CaptureResult) {
    let mark = if result.failed == 0 { "✓".green().bold() } else { "✗".red().bold() };
    println!(
        "{} {} imported, {} ignored, {} failed",
        mark,
        result.imported.to_string().green(),
        result.ignored.to_string().yellow(),
        result.failed.to_string().red()
    );
    for error in &result.errors {
        println!("  {}", error.dimmed());
    }
}

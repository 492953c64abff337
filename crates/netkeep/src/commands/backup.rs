//! Backup command handlers: export to a file, import from a file.

use std::path::{Path, PathBuf};

use chrono::Utc;
use owo_colors::OwoColorize;
use serde_json::Value;
use tabled::Tabled;

use crate::cli::{BackupArgs, BackupCommand, GlobalOpts, OutputFormat};
use crate::client::ApiClient;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: BackupArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let client = ApiClient::new(global);
    match args.command {
        BackupCommand::Export { file } => export(&client, file, global).await,
        BackupCommand::Import { file } => import(&client, &file, global).await,
    }
}

// ── Export ──────────────────────────────────────────────────────────

async fn export(
    client: &ApiClient,
    file: Option<PathBuf>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let snapshot = client.export_snapshot().await?;

    let path = file.unwrap_or_else(|| {
        PathBuf::from(format!(
            "{}-backup-{}.json",
            global.site,
            Utc::now().format("%Y-%m-%d")
        ))
    });
    std::fs::write(&path, serde_json::to_string_pretty(&snapshot)?)?;

    if !global.quiet {
        println!(
            "Exported site '{}' to {} ({} devices, {} subnets)",
            global.site,
            path.display(),
            group_len(&snapshot, "devices"),
            group_len(&snapshot, "subnets"),
        );
    }
    Ok(())
}

fn group_len(snapshot: &Value, group: &str) -> usize {
    snapshot[group].as_array().map_or(0, Vec::len)
}

// ── Import ──────────────────────────────────────────────────────────

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Records")]
    records: String,
}

async fn import(client: &ApiClient, file: &Path, global: &GlobalOpts) -> Result<(), CliError> {
    let raw = std::fs::read_to_string(file)?;
    let document: Value = serde_json::from_str(&raw)?;

    if !global.yes {
        let source = document["site"]["name"].as_str().unwrap_or("unknown");
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Importing \"{source}\" replaces ALL data under site '{}'. Continue?",
                global.site
            ))
            .default(false)
            .interact()
            .map_err(|err| CliError::Io(std::io::Error::other(err)))?;
        if !confirmed {
            println!("Import cancelled.");
            return Ok(());
        }
    }

    let response = client.import_snapshot(&document).await?;
    let counts = &response["counts"];

    match global.output {
        OutputFormat::Table | OutputFormat::Plain => {
            println!("{}", render_count_table(counts));
            print_skips(counts);
        }
        format => println!("{}", output::render_single(format, &response)),
    }

    if !global.quiet {
        let done = "Backup imported";
        if output::should_color(global.color) {
            println!("{} into site '{}'", done.green().bold(), global.site);
        } else {
            println!("{} into site '{}'", done, global.site);
        }
    }
    Ok(())
}

fn render_count_table(counts: &Value) -> String {
    let rows: Vec<CountRow> = counts
        .as_object()
        .map(|map| {
            map.iter()
                .filter(|(key, _)| key.as_str() != "skipped")
                .map(|(key, value)| CountRow {
                    group: key.clone(),
                    records: value.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();
    output::render_table(&rows)
}

/// Point out records the server dropped for unresolvable references.
fn print_skips(counts: &Value) {
    let Some(skipped) = counts["skipped"].as_object() else {
        return;
    };
    for (group, value) in skipped {
        if value.as_u64().unwrap_or(0) > 0 {
            eprintln!("warning: {value} {group} skipped (unresolved references)");
        }
    }
}

//! Device command handlers.

use serde_json::Value;
use tabled::Tabled;

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::client::ApiClient;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub async fn handle(args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List => list(global).await,
    }
}

async fn list(global: &GlobalOpts) -> Result<(), CliError> {
    let client = ApiClient::new(global);
    let body = client.get("/api/devices").await?;
    let devices = body
        .as_array()
        .cloned()
        .ok_or_else(|| CliError::BadResponse("expected a device array".into()))?;

    let rendered = output::render_list(global.output, &devices, to_row, |d| {
        field(d, "name")
    });
    println!("{rendered}");
    Ok(())
}

fn to_row(device: &Value) -> DeviceRow {
    DeviceRow {
        name: field(device, "name"),
        ip: field(device, "ip_address"),
        mac: field(device, "mac"),
        category: field(device, "category"),
        status: field(device, "status"),
    }
}

fn field(value: &Value, key: &str) -> String {
    match &value[key] {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Null | Value::String(_) => "-".into(),
        other => other.to_string(),
    }
}

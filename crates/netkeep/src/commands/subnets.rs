//! Subnet command handlers.

use serde_json::Value;
use tabled::Tabled;

use crate::cli::{GlobalOpts, SubnetsArgs, SubnetsCommand};
use crate::client::ApiClient;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SubnetRow {
    #[tabled(rename = "CIDR")]
    cidr: String,
    #[tabled(rename = "Gateway")]
    gateway: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Used")]
    used: String,
    #[tabled(rename = "Util%")]
    utilization: String,
}

pub async fn handle(args: SubnetsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SubnetsCommand::List => list(global).await,
    }
}

async fn list(global: &GlobalOpts) -> Result<(), CliError> {
    let client = ApiClient::new(global);
    let body = client.get("/api/subnets").await?;
    let subnets = body
        .as_array()
        .cloned()
        .ok_or_else(|| CliError::BadResponse("expected a subnet array".into()))?;

    let rendered = output::render_list(global.output, &subnets, to_row, |s| {
        s["cidr"].as_str().unwrap_or_default().to_owned()
    });
    println!("{rendered}");
    Ok(())
}

fn to_row(subnet: &Value) -> SubnetRow {
    SubnetRow {
        cidr: text(&subnet["cidr"]),
        gateway: text(&subnet["gateway"]),
        role: text(&subnet["role"]),
        status: text(&subnet["status"]),
        used: format!(
            "{}/{}",
            subnet["usedIps"].as_u64().unwrap_or(0),
            subnet["totalIps"].as_u64().unwrap_or(0)
        ),
        utilization: format!("{}%", subnet["utilization"].as_u64().unwrap_or(0)),
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Null | Value::String(_) => "-".into(),
        other => other.to_string(),
    }
}

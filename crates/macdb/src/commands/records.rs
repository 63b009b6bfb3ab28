//! Single-record and listing commands: `show`, `remove`, `list`, `count`.

use macdb_core::{ConnectionType, DeviceCode, MacRecord, MacStore};
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "WE")]
    connection_type: String,
    #[tabled(rename = "Code")]
    device_code: String,
    #[tabled(rename = "Info")]
    info: String,
}

impl From<&MacRecord> for RecordRow {
    fn from(r: &MacRecord) -> Self {
        Self {
            mac: r.mac.clone(),
            connection_type: r.connection_type.clone(),
            device_code: r.device_code.clone(),
            info: r.info.clone(),
        }
    }
}

fn detail(r: &MacRecord) -> String {
    let kind = r.connection_kind().map_or("unknown", ConnectionType::describe);
    let class = r.device_class().map_or("unknown", DeviceCode::describe);
    let mut lines = vec![
        format!("MAC:      {}", r.mac),
        format!("WE:       {} ({kind})", r.connection_type),
        format!("Code:     {} ({class})", r.device_code),
        format!("Info:     {}", r.info),
    ];
    if let Some(rev) = &r.rev {
        lines.push(format!("Revision: {rev}"));
    }
    lines.join("\n")
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn show(store: &MacStore, mac: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let record = store
        .get(mac)
        .await
        .into_found()
        .ok_or_else(|| CliError::NotFound {
            mac: mac.to_uppercase(),
        })?;
    let out = output::render_single(&global.output, &record, detail, |r| r.mac.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn remove(store: &MacStore, mac: &str, global: &GlobalOpts) -> Result<(), CliError> {
    if store.delete(mac).await.into_result()? {
        output::print_output("Removed 1 MAC entry.", global.quiet);
    } else if !global.quiet {
        eprintln!("No MAC entry for '{}'.", mac.to_uppercase());
    }
    Ok(())
}

pub async fn list(store: &MacStore, global: &GlobalOpts) -> Result<(), CliError> {
    let records = store.list_all().await?;
    let out = output::render_list(&global.output, &records, |r| RecordRow::from(r), |r| r.mac.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn count(store: &MacStore, global: &GlobalOpts) -> Result<(), CliError> {
    let size = store.size().await?;
    output::print_output(&size.to_string(), global.quiet);
    Ok(())
}

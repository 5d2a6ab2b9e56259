//! Inspect command implementation.

use crate::OutputFormat;
use serde::Serialize;
use std::path::Path;
use vvtv_snapshot::{SnapshotKind, SnapshotStore, StoreOptions, LOG_FILE_NAME};

/// Snapshot log inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Data directory.
    pub path: String,
    /// Log size in bytes.
    pub log_bytes: u64,
    /// Records in the log, including superseded ones.
    pub log_records: usize,
    /// Whether a status has been ingested.
    pub has_status: bool,
    /// Stored daily report dates.
    pub daily: Vec<String>,
    /// Stored weekly report weeks.
    pub weekly: Vec<String>,
}

/// Opens the store at `path` and collects its statistics.
pub fn inspect(path: &Path) -> Result<InspectResult, Box<dyn std::error::Error>> {
    if !path.join(LOG_FILE_NAME).exists() {
        return Err(format!("No snapshot log found at {:?}", path).into());
    }

    let store = SnapshotStore::open_dir(path, StoreOptions::default())?;
    let stats = store.stats()?;

    Ok(InspectResult {
        path: path.display().to_string(),
        log_bytes: stats.log_bytes,
        log_records: stats.log_records,
        has_status: stats.status > 0,
        daily: store.keys(SnapshotKind::Daily),
        weekly: store.keys(SnapshotKind::Weekly),
    })
}

/// Runs the inspect command.
pub fn run(path: &Path, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => print_text_output(&result),
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("Snapshot store: {}", result.path);
    println!();
    println!("Log:");
    println!("  Size:    {} bytes", result.log_bytes);
    println!("  Records: {}", result.log_records);
    println!();
    println!("Live snapshots:");
    println!(
        "  Status:  {}",
        if result.has_status { "present" } else { "default" }
    );
    println!("  Daily:   {}", result.daily.len());
    for date in &result.daily {
        println!("    {date}");
    }
    println!("  Weekly:  {}", result.weekly.len());
    for week in &result.weekly {
        println!("    {week}");
    }
}

//! Compact command implementation.

use std::path::Path;
use vvtv_snapshot::{CompactStats, SnapshotStore, StoreOptions, LOG_FILE_NAME};

/// Runs the compact command.
pub fn run(path: &Path, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !path.join(LOG_FILE_NAME).exists() {
        return Err("Snapshot log not found".into());
    }

    println!("Compacting snapshot log at {:?}", path);
    if dry_run {
        println!("(dry run - no changes will be made)");
    }
    println!();

    let store = SnapshotStore::open_dir(path, StoreOptions::default())?;
    let plan = store.plan_compaction()?;

    println!("Compaction Analysis:");
    print_stats(&plan);

    if !dry_run {
        if plan.output_records < plan.input_records {
            println!();
            println!("Performing compaction...");
            let done = store.compact()?;
            println!("Compaction complete, {} bytes reclaimed", saved(&done));
        } else {
            println!();
            println!("No compaction needed - log holds only live records");
        }
    }

    Ok(())
}

fn saved(stats: &CompactStats) -> u64 {
    stats.bytes_before.saturating_sub(stats.bytes_after)
}

fn print_stats(stats: &CompactStats) {
    println!("  Input records:  {}", stats.input_records);
    println!("  Output records: {}", stats.output_records);
    println!();
    println!("  Size before: {} bytes", stats.bytes_before);
    println!("  Size after:  {} bytes", stats.bytes_after);
    println!(
        "  Space saved: {} bytes ({:.1}%)",
        saved(stats),
        if stats.bytes_before > 0 {
            (saved(stats) as f64 / stats.bytes_before as f64) * 100.0
        } else {
            0.0
        }
    );
}

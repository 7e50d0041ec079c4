//! Import command implementation

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use fifusion_core::{db::Database, import::parse_csv};

/// Counts from one import run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

pub fn cmd_import(db: &Database, user_id: &str, file: &Path) -> Result<()> {
    println!("📥 Importing transactions from {}...", file.display());

    let summary = import_file(db, user_id, file)?;

    println!("✅ Import complete!");
    println!("   Imported: {}", summary.imported);
    println!("   Skipped (duplicates): {}", summary.skipped);

    Ok(())
}

/// Parse a CSV file and insert its rows, skipping ones already imported
pub fn import_file(db: &Database, user_id: &str, file: &Path) -> Result<ImportSummary> {
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let transactions = parse_csv(csv_file)
        .with_context(|| format!("Failed to parse CSV: {}", file.display()))?;

    tracing::debug!(count = transactions.len(), "Parsed CSV");

    let mut summary = ImportSummary::default();
    for tx in &transactions {
        match db.insert_transaction(user_id, tx)? {
            Some(_) => summary.imported += 1,
            None => summary.skipped += 1,
        }
    }

    Ok(summary)
}

//! Transaction command implementations

use anyhow::{bail, Result};
use chrono::NaiveDate;
use fifusion_core::{db::Database, models::NewTransaction};

use super::{colored_amount, truncate};

pub fn cmd_transactions_list(db: &Database, user_id: &str, limit: i64) -> Result<()> {
    let transactions = db.recent_transactions(user_id, limit)?;

    if transactions.is_empty() {
        println!("No transactions found. Import some with:");
        println!("  fifusion import --file statement.csv");
        return Ok(());
    }

    println!();
    println!("📝 Recent Transactions");
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in transactions {
        println!(
            "   [{}] {} │ {:>10} │ {:<18} │ {}",
            tx.id,
            tx.date,
            colored_amount(tx.amount),
            truncate(tx.category.as_deref().unwrap_or("-"), 18),
            truncate(tx.description.as_deref().unwrap_or(""), 35)
        );
    }

    Ok(())
}

pub fn cmd_transactions_add(
    db: &Database,
    user_id: &str,
    date: NaiveDate,
    amount: f64,
    description: &str,
    category: Option<String>,
    currency: Option<String>,
) -> Result<()> {
    if !amount.is_finite() || amount == 0.0 {
        bail!("Amount must be a non-zero number");
    }

    let tx = NewTransaction {
        date,
        description: description.to_string(),
        amount,
        currency,
        category,
        import_hash: None,
    };

    // Manual entries carry no import hash, so they are always inserted
    if let Some(id) = db.insert_transaction(user_id, &tx)? {
        println!("✅ Added transaction {}", id);
    }
    Ok(())
}

pub fn cmd_transactions_delete(db: &Database, user_id: &str, id: i64) -> Result<()> {
    if !db.delete_transaction(user_id, id)? {
        bail!("Transaction {} not found", id);
    }
    println!("🗑️  Deleted transaction {}", id);
    Ok(())
}

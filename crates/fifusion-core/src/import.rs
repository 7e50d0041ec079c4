//! CSV transaction import
//!
//! Accepts exports with a header row naming at least `date`, `description`
//! and `amount`; `category` and `currency` are optional. Column order does
//! not matter and common bank header spellings are recognised
//! ("Transaction Date", "Posted Date", "Memo", ...).

use std::io::Read;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::NewTransaction;

const DATE_HEADERS: &[&str] = &["date", "transaction date", "posted date", "post date"];
const DESCRIPTION_HEADERS: &[&str] = &["description", "memo", "payee", "merchant"];
const AMOUNT_HEADERS: &[&str] = &["amount"];
const CATEGORY_HEADERS: &[&str] = &["category"];
const CURRENCY_HEADERS: &[&str] = &["currency"];

/// Column positions resolved from the header row
#[derive(Debug)]
struct Columns {
    date: usize,
    description: usize,
    amount: usize,
    category: Option<usize>,
    currency: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };
        let require = |names: &[&str]| {
            find(names).ok_or_else(|| {
                Error::Import(format!("Missing required column '{}'", names[0]))
            })
        };

        Ok(Self {
            date: require(DATE_HEADERS)?,
            description: require(DESCRIPTION_HEADERS)?,
            amount: require(AMOUNT_HEADERS)?,
            category: find(CATEGORY_HEADERS),
            currency: find(CURRENCY_HEADERS),
        })
    }
}

/// Parse a CSV export into transactions ready for insertion
///
/// Amounts are signed major units: negative = expense. Each row carries a
/// SHA-256 import hash so re-importing the same file inserts nothing.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<NewTransaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = Columns::from_headers(rdr.headers()?)?;
    let mut transactions = Vec::new();

    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1
        let line = index + 2;
        let field = |i: usize, name: &str| {
            record
                .get(i)
                .ok_or_else(|| Error::Import(format!("Line {}: missing {}", line, name)))
        };
        let optional = |i: Option<usize>| {
            i.and_then(|i| record.get(i))
                .map(|s| s.to_string())
                .filter(|s| !s.is_empty())
        };

        let date = parse_date(field(columns.date, "date")?)
            .map_err(|e| Error::Import(format!("Line {}: {}", line, e)))?;
        let description = field(columns.description, "description")?.to_string();
        let amount = parse_amount(field(columns.amount, "amount")?)
            .map_err(|e| Error::Import(format!("Line {}: {}", line, e)))?;
        let category = optional(columns.category);
        let currency = optional(columns.currency);

        let import_hash = generate_hash(&date, &description, amount);

        transactions.push(NewTransaction {
            date,
            description,
            amount,
            currency,
            category,
            import_hash: Some(import_hash),
        });
    }

    debug!("Parsed {} CSV transactions", transactions.len());
    Ok(transactions)
}

/// Generate a stable hash for deduplication
fn generate_hash(date: &NaiveDate, description: &str, amount: f64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(date.to_string().as_bytes());
    hasher.update(description.as_bytes());
    hasher.update(amount.to_be_bytes());
    hex::encode(hasher.finalize())
}

/// Parse a date string in various common formats
fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%m/%d/%y", // 01/15/24
        "%m-%d-%Y", // 01-15-2024
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::Import(format!("Unable to parse date: {}", s)))
}

/// Parse an amount string, handling currency symbols and commas
fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite())
        .ok_or_else(|| Error::Import(format!("Unable to parse amount: {}", s)))
}

//! Duplicate bill detection
//!
//! Two layers: a deterministic content hash used as a cheap pre-filter,
//! and a weighted similarity score used to rank candidate duplicates.
//! The score is advisory; false positives are acceptable.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::Date;
use uuid::Uuid;

/// Minimal projection of a bill used for duplicate scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillComparisonRecord {
    pub vendor_id: Uuid,
    pub vendor_invoice_number: String,
    pub total: Decimal,
    pub bill_date: Date,
}

/// Similarity score with human-readable explanations for each
/// contribution, in evaluation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub similarity: f64,
    pub reasons: Vec<String>,
}

// Scoring weights. Preserved verbatim for behavioral parity with the
// historical detector; do not tune.
const SAME_VENDOR_WEIGHT: f64 = 0.3;
const EXACT_INVOICE_NUMBER_WEIGHT: f64 = 0.4;
const PARTIAL_INVOICE_NUMBER_WEIGHT: f64 = 0.2;
const SIMILAR_AMOUNT_WEIGHT: f64 = 0.2;
const CLOSE_DATE_WEIGHT: f64 = 0.1;

const CLOSE_DATE_WINDOW_DAYS: i64 = 30;

fn normalize_invoice_number(invoice_number: &str) -> String {
    invoice_number.trim().to_lowercase()
}

/// Generate a deterministic content fingerprint for a bill.
///
/// The hash is a pure function of `(vendor_id, normalized invoice
/// number, amount at 2 decimals)`; case and surrounding whitespace of
/// the invoice number do not affect it. Returns 64 lowercase hex chars.
pub fn generate_duplicate_check_hash(
    vendor_id: Uuid,
    vendor_invoice_number: &str,
    amount: Decimal,
) -> String {
    let canonical = format!(
        "{}-{}-{:.2}",
        vendor_id,
        normalize_invoice_number(vendor_invoice_number),
        amount
    );
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Score how likely two bills are duplicates of each other.
///
/// Vendor identity is a hard gate: different vendors score exactly 0.
/// Matching vendors contribute an implicit 0.3 with no reason entry,
/// then invoice number, amount proximity (1% of the larger amount), and
/// date proximity (30 days) add their weights. Capped at 1.0.
pub fn calculate_duplicate_similarity(
    a: &BillComparisonRecord,
    b: &BillComparisonRecord,
) -> SimilarityResult {
    if a.vendor_id != b.vendor_id {
        return SimilarityResult {
            similarity: 0.0,
            reasons: vec!["Different vendors".to_string()],
        };
    }

    let mut score = SAME_VENDOR_WEIGHT;
    let mut reasons = Vec::new();

    let invoice_a = normalize_invoice_number(&a.vendor_invoice_number);
    let invoice_b = normalize_invoice_number(&b.vendor_invoice_number);
    if invoice_a == invoice_b {
        score += EXACT_INVOICE_NUMBER_WEIGHT;
        reasons.push("Exact invoice number match".to_string());
    } else if invoice_a.contains(&invoice_b) || invoice_b.contains(&invoice_a) {
        score += PARTIAL_INVOICE_NUMBER_WEIGHT;
        reasons.push("Partial invoice number match".to_string());
    }

    let difference = (a.total - b.total).abs();
    // Tolerance is 1% of the larger amount
    let tolerance = a.total.max(b.total) * Decimal::new(1, 2);
    if difference <= tolerance {
        score += SIMILAR_AMOUNT_WEIGHT;
        reasons.push(format!("Similar amounts ({:.2} vs {:.2})", a.total, b.total));
    }

    let days_apart = (a.bill_date - b.bill_date).whole_days().abs();
    if days_apart <= CLOSE_DATE_WINDOW_DAYS {
        score += CLOSE_DATE_WEIGHT;
        reasons.push(format!("Bills within {} days of each other", days_apart));
    }

    SimilarityResult {
        similarity: score.min(1.0),
        reasons,
    }
}

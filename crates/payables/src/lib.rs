//! Accounts-payable computation engine
//!
//! Pure, synchronous helpers shared by the AP surfaces of the platform:
//! bill amount aggregation, duplicate-bill detection, due-date aging,
//! generic string similarity, and status display metadata. Nothing in
//! this crate performs I/O or reads the system clock; callers supply
//! "today" where time matters.

pub mod aging;
pub mod amounts;
pub mod duplicate;
pub mod similarity;
pub mod status;

pub use aging::{calculate_aging_bucket, calculate_days_overdue, AgingBucket};
pub use amounts::{calculate_bill_amounts, round_money, AmountSummary, LineItem, TaxLine};
pub use duplicate::{
    calculate_duplicate_similarity, generate_duplicate_check_hash, BillComparisonRecord,
    SimilarityResult,
};
pub use similarity::calculate_string_similarity;
pub use status::{
    format_bill_status, format_payment_method, format_po_status, format_vendor_status, StatusBadge,
};

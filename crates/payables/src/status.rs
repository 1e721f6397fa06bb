//! Status display metadata
//!
//! Pure lookup tables mapping domain status identifiers to the label and
//! badge color the UI renders. Unknown statuses fall back to the raw
//! identifier on a gray badge.

use serde::Serialize;

/// Display metadata for a status badge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    pub label: String,
    pub color: &'static str,
}

impl StatusBadge {
    fn new(label: &str, color: &'static str) -> Self {
        Self {
            label: label.to_string(),
            color,
        }
    }

    fn fallback(status: &str) -> Self {
        Self {
            label: status.to_string(),
            color: "gray",
        }
    }
}

/// Display metadata for a bill payment method
pub fn format_payment_method(method: &str) -> StatusBadge {
    match method {
        "bank_transfer" => StatusBadge::new("Bank Transfer", "blue"),
        "card" => StatusBadge::new("Card", "purple"),
        "cash" => StatusBadge::new("Cash", "green"),
        "check" => StatusBadge::new("Check", "teal"),
        "mobile_money" => StatusBadge::new("Mobile Money", "orange"),
        other => StatusBadge::fallback(other),
    }
}

/// Display metadata for a vendor status
pub fn format_vendor_status(status: &str) -> StatusBadge {
    match status {
        "active" => StatusBadge::new("Active", "green"),
        "inactive" => StatusBadge::new("Inactive", "gray"),
        "pending_review" => StatusBadge::new("Pending Review", "yellow"),
        "blacklisted" => StatusBadge::new("Blacklisted", "red"),
        other => StatusBadge::fallback(other),
    }
}

/// Display metadata for a bill status
pub fn format_bill_status(status: &str) -> StatusBadge {
    match status {
        "draft" => StatusBadge::new("Draft", "gray"),
        "pending_approval" => StatusBadge::new("Pending Approval", "yellow"),
        "approved" => StatusBadge::new("Approved", "blue"),
        "partially_paid" => StatusBadge::new("Partially Paid", "orange"),
        "paid" => StatusBadge::new("Paid", "green"),
        "overdue" => StatusBadge::new("Overdue", "red"),
        "void" => StatusBadge::new("Void", "gray"),
        other => StatusBadge::fallback(other),
    }
}

/// Display metadata for a purchase-order status
pub fn format_po_status(status: &str) -> StatusBadge {
    match status {
        "draft" => StatusBadge::new("Draft", "gray"),
        "sent" => StatusBadge::new("Sent", "blue"),
        "partially_received" => StatusBadge::new("Partially Received", "orange"),
        "received" => StatusBadge::new("Received", "green"),
        "closed" => StatusBadge::new("Closed", "gray"),
        "cancelled" => StatusBadge::new("Cancelled", "red"),
        other => StatusBadge::fallback(other),
    }
}

//! Common types used across Opsbooks

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Subscription plan for recurring billing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Standard,
    Pro,
    Premium,
}

impl Default for Plan {
    fn default() -> Self {
        Self::Free
    }
}

impl Plan {
    /// Display name used on invoice line items and in emails
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Free => "Free Plan",
            Self::Standard => "Standard Plan",
            Self::Pro => "Pro Plan",
            Self::Premium => "Premium Plan",
        }
    }

    /// Whether subscriptions on this plan are invoiced by the recurring
    /// billing run. Free subscriptions are never billed.
    pub fn is_billable(&self) -> bool {
        !matches!(self, Self::Free)
    }

    /// Default monthly price per organization member, in the invoice
    /// currency. Subscriptions carry their own `price_per_member` column;
    /// this table seeds new subscriptions.
    pub fn default_price_per_member(&self) -> Decimal {
        match self {
            Self::Free => Decimal::ZERO,
            Self::Standard => Decimal::new(1_000, 0),
            Self::Pro => Decimal::new(2_500, 0),
            Self::Premium => Decimal::new(5_000, 0),
        }
    }

    /// Lowercase identifier as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Standard => "standard",
            Self::Pro => "pro",
            Self::Premium => "premium",
        }
    }
}

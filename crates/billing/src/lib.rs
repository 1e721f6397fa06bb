//! Recurring billing engine
//!
//! Generates monthly subscription invoices on each subscription's billing
//! anniversary: resolves the billing period, prorates per-member charges,
//! persists the invoice and its items, then requests a hosted payment link
//! and emails the subscriber. The batch is idempotent per day and per
//! billing period and processes subscriptions sequentially so one failure
//! never aborts the run.

pub mod email;
pub mod error;
pub mod invoicer;
pub mod paystack;
pub mod proration;
pub mod schedule;

pub use email::{EmailConfig, InvoiceEmailService};
pub use error::{BillingError, BillingResult};
pub use invoicer::{BillingRunSummary, InvoiceGenerator};
pub use paystack::{PaystackClient, PaystackConfig};
pub use proration::{prorate_member, BillableMember, MemberCharge};
pub use schedule::{
    calculate_anniversary_day, calculate_next_period_end, is_billing_anniversary,
    resolve_billing_period, was_invoiced_today, BillingPeriod,
};

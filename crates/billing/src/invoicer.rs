//! Recurring invoice generation
//!
//! One bounded pass per trigger: every active paid subscription is
//! examined sequentially, invoiced if today is its billing anniversary
//! and it has not been invoiced for the resolved period, and skipped or
//! error-counted otherwise. A failure on one subscription never stops
//! the rest of the batch.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use std::fmt;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use opsbooks_payables::round_money;
use opsbooks_shared::Plan;

use crate::email::InvoiceEmailService;
use crate::error::BillingResult;
use crate::paystack::PaystackClient;
use crate::proration::{self, MembershipRow};
use crate::schedule;

/// Days after the period end before an invoice is due
const DUE_DATE_GRACE_DAYS: i64 = 3;

/// Aggregate counts for one billing run
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BillingRunSummary {
    pub processed: u32,
    pub skipped: u32,
    pub errors: u32,
    pub total: u32,
}

/// Why a subscription was skipped this run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    NotAnniversary,
    AlreadyInvoicedToday,
    PeriodInvoiceExists,
    NoOrganizations,
    NoBillableMembers,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::NotAnniversary => "not billing anniversary",
            Self::AlreadyInvoicedToday => "already invoiced today",
            Self::PeriodInvoiceExists => "invoice exists for period",
            Self::NoOrganizations => "no organizations owned",
            Self::NoBillableMembers => "no billable members",
        };
        f.write_str(reason)
    }
}

/// Terminal outcome for one subscription in one run
enum SubscriptionOutcome {
    Processed { invoice_id: Uuid, amount: Decimal },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: Uuid,
    plan: Plan,
    price_per_member: Decimal,
    current_period_start: Option<OffsetDateTime>,
    current_period_end: Option<OffsetDateTime>,
    billing_anniversary_day: Option<i16>,
    last_invoiced_at: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
    owner_email: String,
}

/// Recurring billing engine
pub struct InvoiceGenerator {
    pool: PgPool,
    payments: PaystackClient,
    emails: InvoiceEmailService,
}

impl InvoiceGenerator {
    pub fn new(pool: PgPool, payments: PaystackClient, emails: InvoiceEmailService) -> Self {
        Self {
            pool,
            payments,
            emails,
        }
    }

    /// Create with collaborators configured from environment variables
    pub fn from_env(pool: PgPool) -> Self {
        Self::new(pool, PaystackClient::from_env(), InvoiceEmailService::from_env())
    }

    /// Run the billing batch over all active paid subscriptions.
    ///
    /// Subscriptions are processed one at a time; per-subscription
    /// failures are logged and counted without aborting the pass.
    pub async fn run(&self, now: OffsetDateTime) -> BillingResult<BillingRunSummary> {
        let subscriptions: Vec<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT s.id, s.user_id, s.plan, s.price_per_member,
                   s.current_period_start, s.current_period_end,
                   s.billing_anniversary_day, s.last_invoiced_at, s.created_at,
                   u.email AS owner_email
            FROM subscriptions s
            JOIN users u ON u.id = s.user_id
            WHERE s.status = 'active' AND s.plan != 'free'
            ORDER BY s.created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut summary = BillingRunSummary {
            total: subscriptions.len() as u32,
            ..Default::default()
        };

        for subscription in &subscriptions {
            match self.process_subscription(subscription, now).await {
                Ok(SubscriptionOutcome::Processed { invoice_id, amount }) => {
                    summary.processed += 1;
                    tracing::info!(
                        subscription_id = %subscription.id,
                        invoice_id = %invoice_id,
                        amount = %amount,
                        "Generated recurring invoice"
                    );
                }
                Ok(SubscriptionOutcome::Skipped(reason)) => {
                    summary.skipped += 1;
                    tracing::debug!(
                        subscription_id = %subscription.id,
                        reason = %reason,
                        "Skipped subscription"
                    );
                }
                Err(e) => {
                    summary.errors += 1;
                    tracing::error!(
                        subscription_id = %subscription.id,
                        error = %e,
                        "Failed to process subscription"
                    );
                }
            }
        }

        tracing::info!(
            processed = summary.processed,
            skipped = summary.skipped,
            errors = summary.errors,
            total = summary.total,
            "Recurring billing run complete"
        );

        Ok(summary)
    }

    async fn process_subscription(
        &self,
        subscription: &SubscriptionRow,
        now: OffsetDateTime,
    ) -> BillingResult<SubscriptionOutcome> {
        // Anniversary day is derived once from the original period start
        // and cached on the subscription row.
        let anniversary_day = match subscription.billing_anniversary_day {
            Some(day) => day as u8,
            None => {
                let derived = schedule::calculate_anniversary_day(
                    subscription
                        .current_period_start
                        .unwrap_or(subscription.created_at),
                );
                sqlx::query(
                    "UPDATE subscriptions SET billing_anniversary_day = $1, updated_at = NOW() WHERE id = $2",
                )
                .bind(derived as i16)
                .bind(subscription.id)
                .execute(&self.pool)
                .await?;
                derived
            }
        };

        if !schedule::is_billing_anniversary(anniversary_day, now) {
            return Ok(SubscriptionOutcome::Skipped(SkipReason::NotAnniversary));
        }
        if schedule::was_invoiced_today(subscription.last_invoiced_at, now) {
            return Ok(SubscriptionOutcome::Skipped(SkipReason::AlreadyInvoicedToday));
        }

        let last_invoice_end: Option<OffsetDateTime> = sqlx::query_scalar(
            "SELECT billing_period_end FROM invoices WHERE subscription_id = $1 ORDER BY billing_period_end DESC LIMIT 1",
        )
        .bind(subscription.id)
        .fetch_optional(&self.pool)
        .await?;

        let period = schedule::resolve_billing_period(
            last_invoice_end,
            (
                subscription.current_period_start,
                subscription.current_period_end,
            ),
            subscription.created_at,
            anniversary_day,
        );

        // Idempotency gate: at most one invoice per subscription per period
        let existing: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM invoices
            WHERE subscription_id = $1 AND billing_period_start = $2 AND billing_period_end = $3
            "#,
        )
        .bind(subscription.id)
        .bind(period.start)
        .bind(period.end)
        .fetch_optional(&self.pool)
        .await?;
        if existing.is_some() {
            return Ok(SubscriptionOutcome::Skipped(SkipReason::PeriodInvoiceExists));
        }

        let organizations: Vec<(Uuid, String)> = sqlx::query_as(
            "SELECT id, name FROM organizations WHERE owner_id = $1 ORDER BY created_at ASC",
        )
        .bind(subscription.user_id)
        .fetch_all(&self.pool)
        .await?;
        if organizations.is_empty() {
            return Ok(SubscriptionOutcome::Skipped(SkipReason::NoOrganizations));
        }
        let organization_ids: Vec<Uuid> = organizations.iter().map(|(id, _)| *id).collect();

        // Members removed before the period started are not billable;
        // members removed inside it are billed up to their removal.
        let membership_rows: Vec<MembershipRow> = sqlx::query_as(
            r#"
            SELECT om.user_id AS member_id, om.organization_id, u.email,
                   om.created_at AS joined_at, om.deleted_at AS removed_at,
                   o.name AS organization_name
            FROM organization_members om
            JOIN users u ON u.id = om.user_id
            JOIN organizations o ON o.id = om.organization_id
            WHERE om.organization_id = ANY($1)
              AND (om.deleted_at IS NULL OR om.deleted_at > $2)
            ORDER BY om.created_at ASC
            "#,
        )
        .bind(&organization_ids)
        .bind(period.start)
        .fetch_all(&self.pool)
        .await?;

        let members = proration::deduplicate_members(membership_rows);
        if members.is_empty() {
            return Ok(SubscriptionOutcome::Skipped(SkipReason::NoBillableMembers));
        }

        let invoice_id = Uuid::new_v4();
        let due_date = period.end + Duration::days(DUE_DATE_GRACE_DAYS);

        // Invoice shell, items, and final amount commit atomically. The
        // unique index on (subscription_id, period) turns a lost race
        // between the check above and this insert into a skip.
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO invoices (
                id, subscription_id, status, amount, currency,
                billing_period_start, billing_period_end, due_date
            )
            VALUES ($1, $2, 'open', 0, $3, $4, $5, $6)
            "#,
        )
        .bind(invoice_id)
        .bind(subscription.id)
        .bind(self.payments.currency())
        .bind(period.start)
        .bind(period.end)
        .bind(due_date)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            if is_unique_violation(&e) {
                tx.rollback().await.ok();
                tracing::info!(
                    subscription_id = %subscription.id,
                    "Concurrent run already created invoice for period"
                );
                return Ok(SubscriptionOutcome::Skipped(SkipReason::PeriodInvoiceExists));
            }
            return Err(e.into());
        }

        // Per-member charges accumulate unrounded; rounding happens once
        // per stored item and once for the invoice total.
        let mut raw_total = Decimal::ZERO;
        let mut item_lines = Vec::with_capacity(members.len());
        for member in &members {
            let charge = proration::prorate_member(
                member,
                &period,
                subscription.plan,
                subscription.price_per_member,
            );

            sqlx::query(
                r#"
                INSERT INTO invoice_items (
                    id, invoice_id, member_id, organization_id, description,
                    amount, prorated, billing_period_start, billing_period_end
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(invoice_id)
            .bind(charge.member_id)
            .bind(charge.organization_id)
            .bind(&charge.description)
            .bind(round_money(charge.amount))
            .bind(charge.prorated)
            .bind(period.start)
            .bind(period.end)
            .execute(&mut *tx)
            .await?;

            raw_total += charge.amount;
            item_lines.push(charge.description);
        }

        let total = round_money(raw_total);
        sqlx::query("UPDATE invoices SET amount = $1 WHERE id = $2")
            .bind(total)
            .bind(invoice_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        // Payment link is best effort: one attempt, degrade to none
        let metadata = serde_json::json!({
            "invoice_id": invoice_id,
            "subscription_id": subscription.id,
        });
        let payment_link = match self
            .payments
            .create_payment_link(
                &subscription.owner_email,
                PaystackClient::to_smallest_unit(total),
                metadata,
            )
            .await
        {
            Ok(link) => link,
            Err(e) => {
                tracing::error!(
                    subscription_id = %subscription.id,
                    invoice_id = %invoice_id,
                    error = %e,
                    "Payment link creation failed, continuing without link"
                );
                None
            }
        };

        // Notification failures are logged inside the service
        self.emails
            .send_invoice_notification(
                &subscription.owner_email,
                invoice_id,
                total,
                self.payments.currency(),
                due_date,
                &item_lines,
                payment_link.as_deref(),
            )
            .await?;

        sqlx::query(
            "UPDATE subscriptions SET last_invoiced_at = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(now)
        .bind(subscription.id)
        .execute(&self.pool)
        .await?;

        Ok(SubscriptionOutcome::Processed {
            invoice_id,
            amount: total,
        })
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    )
}

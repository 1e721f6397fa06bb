//! Integration tests for the recurring billing batch
//!
//! These tests verify the idempotency gates end to end: one invoice per
//! subscription per day, and one invoice per billing period.
//!
//! ## Running Tests
//! ```bash
//! export DATABASE_URL="postgres://localhost/opsbooks_test"
//! cargo test -p opsbooks-billing --test recurring_billing -- --ignored --test-threads=1
//! ```

use rust_decimal::Decimal;
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use opsbooks_billing::{
    EmailConfig, InvoiceEmailService, InvoiceGenerator, PaystackClient, PaystackConfig,
};

// ============================================================================
// Test Utilities
// ============================================================================

/// Connect to the test database and build a generator with the payment
/// and email collaborators disabled (both degrade gracefully).
async fn setup() -> (InvoiceGenerator, PgPool) {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    let payments = PaystackClient::new(PaystackConfig {
        secret_key: String::new(),
        base_url: "https://api.paystack.co".to_string(),
        currency: "NGN".to_string(),
    });
    let emails = InvoiceEmailService::new(EmailConfig {
        resend_api_key: String::new(),
        email_from: "Opsbooks <billing@opsbooks.app>".to_string(),
        app_name: "Opsbooks".to_string(),
        dashboard_url: "https://opsbooks.app".to_string(),
    });

    let generator = InvoiceGenerator::new(pool.clone(), payments, emails);
    (generator, pool)
}

struct Fixture {
    owner_id: Uuid,
    member_id: Uuid,
    org_id: Uuid,
    subscription_id: Uuid,
}

/// Create an owner with one organization, one full-period member, and an
/// active Pro subscription whose anniversary is today.
async fn create_fixture(pool: &PgPool, now: OffsetDateTime) -> Fixture {
    let owner_id = Uuid::new_v4();
    let member_id = Uuid::new_v4();
    let org_id = Uuid::new_v4();
    let subscription_id = Uuid::new_v4();

    for (id, email) in [
        (owner_id, format!("owner-{}@example.com", owner_id)),
        (member_id, format!("member-{}@example.com", member_id)),
    ] {
        sqlx::query("INSERT INTO users (id, email) VALUES ($1, $2)")
            .bind(id)
            .bind(email)
            .execute(pool)
            .await
            .expect("Failed to create test user");
    }

    sqlx::query("INSERT INTO organizations (id, owner_id, name) VALUES ($1, $2, $3)")
        .bind(org_id)
        .bind(owner_id)
        .bind("Test Organization")
        .execute(pool)
        .await
        .expect("Failed to create test organization");

    let period_start = now - Duration::days(30);
    sqlx::query(
        "INSERT INTO organization_members (id, organization_id, user_id, created_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(Uuid::new_v4())
    .bind(org_id)
    .bind(member_id)
    .bind(period_start - Duration::days(10))
    .execute(pool)
    .await
    .expect("Failed to create test membership");

    sqlx::query(
        r#"
        INSERT INTO subscriptions (
            id, user_id, plan, status, price_per_member,
            current_period_start, current_period_end, billing_anniversary_day, created_at
        )
        VALUES ($1, $2, 'pro', 'active', $3, $4, $5, $6, $7)
        "#,
    )
    .bind(subscription_id)
    .bind(owner_id)
    .bind(Decimal::new(2500, 0))
    .bind(period_start)
    .bind(now)
    .bind(now.date().day() as i16)
    .bind(period_start - Duration::days(5))
    .execute(pool)
    .await
    .expect("Failed to create test subscription");

    Fixture {
        owner_id,
        member_id,
        org_id,
        subscription_id,
    }
}

async fn invoice_count(pool: &PgPool, subscription_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE subscription_id = $1")
        .bind(subscription_id)
        .fetch_one(pool)
        .await
        .expect("Failed to count invoices")
}

async fn cleanup(pool: &PgPool, fixture: &Fixture) {
    sqlx::query(
        "DELETE FROM invoice_items WHERE invoice_id IN (SELECT id FROM invoices WHERE subscription_id = $1)",
    )
    .bind(fixture.subscription_id)
    .execute(pool)
    .await
    .ok();
    sqlx::query("DELETE FROM invoices WHERE subscription_id = $1")
        .bind(fixture.subscription_id)
        .execute(pool)
        .await
        .ok();
    sqlx::query("DELETE FROM subscriptions WHERE id = $1")
        .bind(fixture.subscription_id)
        .execute(pool)
        .await
        .ok();
    sqlx::query("DELETE FROM organization_members WHERE organization_id = $1")
        .bind(fixture.org_id)
        .execute(pool)
        .await
        .ok();
    sqlx::query("DELETE FROM organizations WHERE id = $1")
        .bind(fixture.org_id)
        .execute(pool)
        .await
        .ok();
    sqlx::query("DELETE FROM users WHERE id IN ($1, $2)")
        .bind(fixture.owner_id)
        .bind(fixture.member_id)
        .execute(pool)
        .await
        .ok();
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
#[ignore] // Requires database
async fn test_second_run_same_day_creates_no_second_invoice() {
    let (generator, pool) = setup().await;
    let now = OffsetDateTime::now_utc();
    let fixture = create_fixture(&pool, now).await;

    let first = generator.run(now).await.expect("First run failed");
    assert_eq!(first.processed, 1);
    assert_eq!(invoice_count(&pool, fixture.subscription_id).await, 1);

    // Same day again: the already-invoiced-today gate must hold
    let second = generator.run(now).await.expect("Second run failed");
    assert_eq!(second.processed, 0);
    assert!(second.skipped >= 1);
    assert_eq!(invoice_count(&pool, fixture.subscription_id).await, 1);

    cleanup(&pool, &fixture).await;
}

#[tokio::test]
#[ignore] // Requires database
async fn test_next_period_starts_where_last_invoice_ended() {
    let (generator, pool) = setup().await;
    let now = OffsetDateTime::now_utc();
    let fixture = create_fixture(&pool, now).await;

    // An invoice for the subscription's current period already exists,
    // but the daily gate was never stamped (e.g. a crash after insert).
    // The engine must pick up from that invoice's period end instead of
    // re-billing the same period.
    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, subscription_id, status, amount, currency,
            billing_period_start, billing_period_end, due_date
        )
        SELECT $1, id, 'open', 0, 'NGN', current_period_start, current_period_end,
               current_period_end + INTERVAL '3 days'
        FROM subscriptions WHERE id = $2
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(fixture.subscription_id)
    .execute(&pool)
    .await
    .expect("Failed to insert existing invoice");

    let summary = generator.run(now).await.expect("Run failed");
    assert_eq!(summary.processed, 1);
    assert_eq!(invoice_count(&pool, fixture.subscription_id).await, 2);

    // Timestamps compare against the stored period end, not the in-test
    // `now`, which carries sub-microsecond precision Postgres drops.
    let (new_start, previous_end): (OffsetDateTime, OffsetDateTime) = sqlx::query_as(
        r#"
        SELECT i.billing_period_start, s.current_period_end
        FROM invoices i
        JOIN subscriptions s ON s.id = i.subscription_id
        WHERE i.subscription_id = $1
        ORDER BY i.billing_period_end DESC
        LIMIT 1
        "#,
    )
    .bind(fixture.subscription_id)
    .fetch_one(&pool)
    .await
    .expect("Failed to load new invoice");
    assert_eq!(new_start, previous_end);

    cleanup(&pool, &fixture).await;
}

#[tokio::test]
#[ignore] // Requires database
async fn test_full_period_member_is_charged_full_price() {
    let (generator, pool) = setup().await;
    let now = OffsetDateTime::now_utc();
    let fixture = create_fixture(&pool, now).await;

    generator.run(now).await.expect("Run failed");

    let (amount, item_count): (Decimal, i64) = sqlx::query_as(
        r#"
        SELECT i.amount, COUNT(ii.id)
        FROM invoices i
        JOIN invoice_items ii ON ii.invoice_id = i.id
        WHERE i.subscription_id = $1
        GROUP BY i.amount
        "#,
    )
    .bind(fixture.subscription_id)
    .fetch_one(&pool)
    .await
    .expect("Failed to load invoice");

    // Owner's single member was present all period: no proration
    assert_eq!(item_count, 1);
    assert_eq!(amount, Decimal::new(2500, 0));

    cleanup(&pool, &fixture).await;
}

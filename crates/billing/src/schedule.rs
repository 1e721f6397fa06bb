//! Anniversary scheduling and billing period math
//!
//! All calendar math runs in UTC on caller-supplied timestamps; nothing
//! here reads the system clock.

use time::{Date, Month, OffsetDateTime};

/// A resolved billing period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriod {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

/// Day-of-month a subscription is invoiced on, derived from its original
/// period start. Computed once and cached on the subscription row.
pub fn calculate_anniversary_day(period_start: OffsetDateTime) -> u8 {
    period_start.date().day()
}

/// Whether `now` falls on the subscription's monthly anniversary (UTC)
pub fn is_billing_anniversary(anniversary_day: u8, now: OffsetDateTime) -> bool {
    now.date().day() == anniversary_day
}

/// Whether the subscription was already invoiced on the current UTC
/// calendar date. Gates repeated cron ticks within one day.
pub fn was_invoiced_today(last_invoiced_at: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
    last_invoiced_at.is_some_and(|at| at.date() == now.date())
}

/// Advance one calendar month from `period_start`, landing on the
/// anniversary day or the last day of months too short for it.
pub fn calculate_next_period_end(period_start: OffsetDateTime, anniversary_day: u8) -> OffsetDateTime {
    let start_date = period_start.date();
    let (year, month) = match start_date.month() {
        Month::December => (start_date.year() + 1, Month::January),
        other => (start_date.year(), other.next()),
    };
    let day = anniversary_day.min(time::util::days_in_year_month(year, month));
    let end_date = Date::from_calendar_date(year, month, day).unwrap_or(start_date);
    period_start.replace_date(end_date)
}

/// Resolve the billing period for the next invoice.
///
/// Three-tier fallback, in order: the previous invoice's period end
/// becomes the new start; else the subscription's own period columns;
/// else the subscription's creation date with the end computed from the
/// anniversary rule. The fallback chain keeps the engine self-healing
/// across partial or missing historical data.
pub fn resolve_billing_period(
    last_invoice_period_end: Option<OffsetDateTime>,
    subscription_period: (Option<OffsetDateTime>, Option<OffsetDateTime>),
    created_at: OffsetDateTime,
    anniversary_day: u8,
) -> BillingPeriod {
    if let Some(last_end) = last_invoice_period_end {
        return BillingPeriod {
            start: last_end,
            end: calculate_next_period_end(last_end, anniversary_day),
        };
    }

    if let (Some(start), Some(end)) = subscription_period {
        return BillingPeriod { start, end };
    }

    BillingPeriod {
        start: created_at,
        end: calculate_next_period_end(created_at, anniversary_day),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_anniversary_day_from_period_start() {
        assert_eq!(calculate_anniversary_day(datetime!(2024-01-15 08:30 UTC)), 15);
        assert_eq!(calculate_anniversary_day(datetime!(2024-01-31 00:00 UTC)), 31);
    }

    #[test]
    fn test_is_billing_anniversary() {
        assert!(is_billing_anniversary(15, datetime!(2024-03-15 23:59 UTC)));
        assert!(!is_billing_anniversary(15, datetime!(2024-03-16 00:00 UTC)));
    }

    #[test]
    fn test_was_invoiced_today() {
        let now = datetime!(2024-03-15 12:00 UTC);
        assert!(was_invoiced_today(Some(datetime!(2024-03-15 06:00 UTC)), now));
        assert!(!was_invoiced_today(Some(datetime!(2024-03-14 23:59 UTC)), now));
        assert!(!was_invoiced_today(None, now));
    }

    #[test]
    fn test_next_period_end_plain_month() {
        let end = calculate_next_period_end(datetime!(2024-01-15 00:00 UTC), 15);
        assert_eq!(end, datetime!(2024-02-15 00:00 UTC));
    }

    #[test]
    fn test_next_period_end_clamps_to_short_month() {
        // Jan 31 anniversary lands on Feb 29 in a leap year
        let end = calculate_next_period_end(datetime!(2024-01-31 00:00 UTC), 31);
        assert_eq!(end, datetime!(2024-02-29 00:00 UTC));

        // and Feb 28 otherwise
        let end = calculate_next_period_end(datetime!(2023-01-31 00:00 UTC), 31);
        assert_eq!(end, datetime!(2023-02-28 00:00 UTC));
    }

    #[test]
    fn test_next_period_end_december_wraps_year() {
        let end = calculate_next_period_end(datetime!(2024-12-10 00:00 UTC), 10);
        assert_eq!(end, datetime!(2025-01-10 00:00 UTC));
    }

    #[test]
    fn test_period_resolution_prefers_last_invoice() {
        let period = resolve_billing_period(
            Some(datetime!(2024-02-15 00:00 UTC)),
            (
                Some(datetime!(2024-01-01 00:00 UTC)),
                Some(datetime!(2024-02-01 00:00 UTC)),
            ),
            datetime!(2023-06-15 00:00 UTC),
            15,
        );
        assert_eq!(period.start, datetime!(2024-02-15 00:00 UTC));
        assert_eq!(period.end, datetime!(2024-03-15 00:00 UTC));
    }

    #[test]
    fn test_period_resolution_falls_back_to_subscription_columns() {
        let period = resolve_billing_period(
            None,
            (
                Some(datetime!(2024-01-15 00:00 UTC)),
                Some(datetime!(2024-02-15 00:00 UTC)),
            ),
            datetime!(2023-06-15 00:00 UTC),
            15,
        );
        assert_eq!(period.start, datetime!(2024-01-15 00:00 UTC));
        assert_eq!(period.end, datetime!(2024-02-15 00:00 UTC));
    }

    #[test]
    fn test_period_resolution_falls_back_to_creation_date() {
        // Period columns must both be set; a lone start is ignored
        let period = resolve_billing_period(
            None,
            (Some(datetime!(2024-01-15 00:00 UTC)), None),
            datetime!(2024-01-20 09:00 UTC),
            20,
        );
        assert_eq!(period.start, datetime!(2024-01-20 09:00 UTC));
        assert_eq!(period.end, datetime!(2024-02-20 09:00 UTC));
    }
}

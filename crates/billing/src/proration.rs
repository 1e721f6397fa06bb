//! Per-member proration
//!
//! Members joining or leaving mid-period are charged the day-fraction of
//! the per-member price; everyone else pays the full price. Amounts stay
//! unrounded here so per-member rounding error never compounds across a
//! large organization; callers round once at storage.

use rust_decimal::Decimal;
use sqlx::FromRow;
use std::collections::HashMap;
use time::OffsetDateTime;
use uuid::Uuid;

use opsbooks_shared::Plan;

use crate::schedule::BillingPeriod;

/// One organization-membership row as read from the database
#[derive(Debug, Clone, FromRow)]
pub struct MembershipRow {
    pub member_id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub joined_at: OffsetDateTime,
    pub removed_at: Option<OffsetDateTime>,
    pub organization_name: String,
}

/// A billable person, deduplicated across the owner's organizations.
/// The first membership row encountered supplies the primary
/// organization and the join/removal timestamps; every organization the
/// member belongs to is kept for the item description.
#[derive(Debug, Clone)]
pub struct BillableMember {
    pub member_id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub joined_at: OffsetDateTime,
    pub removed_at: Option<OffsetDateTime>,
    pub organization_names: Vec<String>,
}

/// A member's computed charge for one billing period
#[derive(Debug, Clone)]
pub struct MemberCharge {
    pub member_id: Uuid,
    pub organization_id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub prorated: bool,
}

/// Collapse membership rows to one entry per person.
/// Rows must arrive ordered; the first row per member wins.
pub fn deduplicate_members(rows: Vec<MembershipRow>) -> Vec<BillableMember> {
    let mut members: Vec<BillableMember> = Vec::new();
    let mut seen: HashMap<Uuid, usize> = HashMap::new();

    for row in rows {
        match seen.get(&row.member_id) {
            Some(&index) => members[index].organization_names.push(row.organization_name),
            None => {
                seen.insert(row.member_id, members.len());
                members.push(BillableMember {
                    member_id: row.member_id,
                    organization_id: row.organization_id,
                    email: row.email,
                    joined_at: row.joined_at,
                    removed_at: row.removed_at,
                    organization_names: vec![row.organization_name],
                });
            }
        }
    }

    members
}

/// Compute one member's charge for the billing period.
///
/// Billing starts at the later of the join date and the period start.
/// A member removed strictly inside the period is billed up to removal
/// and flagged; everyone else is billed to the period end. Prorated
/// charges are the linear day fraction of `price_per_member`.
pub fn prorate_member(
    member: &BillableMember,
    period: &BillingPeriod,
    plan: Plan,
    price_per_member: Decimal,
) -> MemberCharge {
    let billing_start = member.joined_at.max(period.start);

    let mut was_removed = false;
    let billing_end = match member.removed_at {
        Some(removed_at) if removed_at > period.start && removed_at < period.end => {
            was_removed = true;
            removed_at
        }
        _ => period.end,
    };

    let prorated = billing_start > period.start || was_removed;

    let total_days = (period.end - period.start).whole_days();
    let days = (billing_end - billing_start).whole_days().max(0);

    let amount = if prorated && total_days > 0 {
        price_per_member * Decimal::from(days) / Decimal::from(total_days)
    } else {
        price_per_member
    };

    let mut description = format!(
        "{} - {} ({})",
        plan.display_name(),
        member.email,
        member.organization_names.join(", ")
    );
    if prorated {
        description.push_str(&format!(" [Prorated: {}/{} days", days, total_days));
        if was_removed {
            description.push_str(", removed mid-period");
        }
        description.push(']');
    }

    MemberCharge {
        member_id: member.member_id,
        organization_id: member.organization_id,
        description,
        amount,
        prorated,
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, sqlx::Type,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum LeaveCategory {
    Sick,
    Casual,
    Vacation,
}

/// Workflow status of a leave request. `Approved` and `Rejected` are
/// terminal; cancellation deletes the record instead of storing a state.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, sqlx::Type,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

/// Manager action on a pending request.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LeaveDecision {
    Approve,
    Reject,
}

impl LeaveDecision {
    /// Comment stored when the manager supplies none.
    pub fn default_comment(self) -> &'static str {
        match self {
            LeaveDecision::Approve => "Approved",
            LeaveDecision::Reject => "Rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 1000,
    "category": "sick",
    "start_date": "2026-01-01",
    "end_date": "2026-01-03",
    "total_days": 3,
    "reason": "Flu",
    "status": "pending",
    "manager_comment": "",
    "created_at": "2026-01-01T00:00:00Z"
}))]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    /// Requester; immutable for the lifetime of the request.
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "sick")]
    pub category: LeaveCategory,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Inclusive whole-day span, computed once at creation.
    #[schema(example = 3)]
    pub total_days: u32,
    #[schema(example = "Flu")]
    pub reason: String,
    #[schema(example = "pending")]
    pub status: LeaveStatus,
    /// Empty while pending; set exactly once at resolution.
    #[schema(example = "")]
    pub manager_comment: String,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

/// Inclusive day count of `[start, end]`, or `None` for an inverted range.
/// A same-day leave counts as one day.
pub fn span_days(start: NaiveDate, end: NaiveDate) -> Option<u32> {
    if end < start {
        return None;
    }
    Some((end - start).num_days() as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn span_is_inclusive_of_both_endpoints() {
        assert_eq!(span_days(date("2026-01-01"), date("2026-01-03")), Some(3));
    }

    #[test]
    fn same_day_leave_is_one_day() {
        assert_eq!(span_days(date("2026-01-01"), date("2026-01-01")), Some(1));
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert_eq!(span_days(date("2026-01-02"), date("2026-01-01")), None);
    }

    #[test]
    fn status_round_trips_through_strings() {
        assert_eq!(LeaveStatus::Pending.to_string(), "pending");
        assert_eq!("approved".parse::<LeaveStatus>().unwrap(), LeaveStatus::Approved);
        assert!("cancelled".parse::<LeaveStatus>().is_err());
    }

    #[test]
    fn category_round_trips_through_strings() {
        assert_eq!(LeaveCategory::Vacation.to_string(), "vacation");
        assert_eq!("casual".parse::<LeaveCategory>().unwrap(), LeaveCategory::Casual);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::leave_request::LeaveCategory;
use super::role::Role;

/// An employee record. Doubles as the authentication principal; the
/// password hash never leaves this process.
#[derive(Debug, Clone)]
pub struct Employee {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    /// Mutated only by the Balance Ledger's debit.
    pub balance: LeaveBalance,
    pub created_at: DateTime<Utc>,
}

/// Remaining whole-day entitlement per leave category. Entries are
/// unsigned, so a negative balance is unrepresentable.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "sick": 10, "casual": 10, "vacation": 15 }))]
pub struct LeaveBalance {
    #[schema(example = 10)]
    pub sick: u32,
    #[schema(example = 10)]
    pub casual: u32,
    #[schema(example = 15)]
    pub vacation: u32,
}

impl LeaveBalance {
    pub fn get(&self, category: LeaveCategory) -> u32 {
        match category {
            LeaveCategory::Sick => self.sick,
            LeaveCategory::Casual => self.casual,
            LeaveCategory::Vacation => self.vacation,
        }
    }

    /// Debits `days` from one category. Returns `false` and leaves the
    /// balance untouched when the remaining entitlement does not cover it.
    pub fn debit(&mut self, category: LeaveCategory, days: u32) -> bool {
        let entry = match category {
            LeaveCategory::Sick => &mut self.sick,
            LeaveCategory::Casual => &mut self.casual,
            LeaveCategory::Vacation => &mut self.vacation,
        };
        if *entry < days {
            return false;
        }
        *entry -= days;
        true
    }
}

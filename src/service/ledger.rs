//! Balance Ledger: authoritative owner of remaining entitlement, and the
//! only component that reduces it.

use std::sync::Arc;

use crate::error::{LeaveError, LeaveResult};
use crate::model::employee::LeaveBalance;
use crate::model::leave_request::{LeaveCategory, LeaveRequest};
use crate::store::{ApprovalCommit, Store};

/// Reads always hit the store, never a cache, so a sufficiency check
/// observes the latest committed debit.
pub struct BalanceLedger<S> {
    store: Arc<S>,
}

impl<S> Clone for BalanceLedger<S> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone() }
    }
}

impl<S: Store> BalanceLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn balance_of(&self, employee_id: u64) -> LeaveResult<LeaveBalance> {
        let employee = self
            .store
            .find_employee(employee_id)
            .await?
            .ok_or(LeaveError::NotFound("Employee"))?;
        Ok(employee.balance)
    }

    /// Advisory read: true iff the remaining entitlement covers `days`.
    /// Nothing is reserved; the answer can be stale by the time a debit
    /// commits, which is why `debit` re-checks.
    pub async fn check_sufficient(
        &self,
        employee_id: u64,
        category: LeaveCategory,
        days: u32,
    ) -> LeaveResult<bool> {
        let balance = self.balance_of(employee_id).await?;
        Ok(balance.get(category) >= days)
    }

    /// The approval-triggered debit. Reduces `balance[category]` by the
    /// request's span and stamps the request approved in the same commit;
    /// a request is debited at most once because only the transition
    /// winner commits. No credit operation exists anywhere in this crate.
    pub async fn debit(&self, request: &LeaveRequest, comment: &str) -> LeaveResult<LeaveRequest> {
        match self.store.commit_approval(request.id, comment).await? {
            ApprovalCommit::Approved(updated) => Ok(updated),
            ApprovalCommit::InsufficientBalance => Err(LeaveError::InsufficientBalance),
            ApprovalCommit::NotPending => Err(LeaveError::InvalidState("Request already processed")),
        }
    }
}

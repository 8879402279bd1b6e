//! Repository interfaces injected into the core components. No ambient
//! connection state: whoever constructs the service decides the backend.
//!
//! Atomicity owed to the service layer: the conditional operations
//! (`delete_if_pending`, `reject_if_pending`) commit alone, and
//! `commit_approval` commits the balance debit together with the
//! pending → approved transition, or not at all.

use chrono::NaiveDate;

use crate::error::LeaveResult;
use crate::model::employee::{Employee, LeaveBalance};
use crate::model::leave_request::{LeaveCategory, LeaveRequest, LeaveStatus};
use crate::model::role::Role;

pub mod memory;
pub mod mysql;

/// Registration input; the store assigns id and creation time.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub balance: LeaveBalance,
}

/// Creation input for a leave request; persisted with `status = pending`
/// and an empty manager comment.
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub category: LeaveCategory,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: u32,
    pub reason: String,
}

/// Outcome of the atomic approve-and-debit commit.
#[derive(Debug, Clone)]
pub enum ApprovalCommit {
    /// Debit applied and request stamped approved in the same commit.
    Approved(LeaveRequest),
    /// Balance no longer covered the request at the moment of commit; the
    /// request is still pending.
    InsufficientBalance,
    /// The request was resolved or cancelled first; nothing was written.
    NotPending,
}

#[allow(async_fn_in_trait)]
pub trait EmployeeStore {
    /// Fails with `Conflict` when the email is already registered.
    async fn insert_employee(&self, new: NewEmployee) -> LeaveResult<Employee>;

    async fn find_employee(&self, id: u64) -> LeaveResult<Option<Employee>>;

    async fn find_employee_by_email(&self, email: &str) -> LeaveResult<Option<Employee>>;

    async fn count_employees(&self, role: Option<Role>) -> LeaveResult<i64>;
}

#[allow(async_fn_in_trait)]
pub trait LeaveStore {
    async fn insert_request(&self, new: NewLeaveRequest) -> LeaveResult<LeaveRequest>;

    async fn find_request(&self, id: u64) -> LeaveResult<Option<LeaveRequest>>;

    /// Newest-first by creation time, optionally filtered by requester
    /// and/or status.
    async fn list_requests(
        &self,
        employee_id: Option<u64>,
        status: Option<LeaveStatus>,
    ) -> LeaveResult<Vec<LeaveRequest>>;

    async fn count_requests(
        &self,
        employee_id: Option<u64>,
        status: Option<LeaveStatus>,
    ) -> LeaveResult<i64>;

    /// Deletes the request iff it is still pending. `false` means the
    /// caller lost the race against a concurrent resolution.
    async fn delete_if_pending(&self, id: u64) -> LeaveResult<bool>;

    /// Stamps the request rejected iff it is still pending; `None` when it
    /// is absent or already terminal.
    async fn reject_if_pending(&self, id: u64, comment: &str) -> LeaveResult<Option<LeaveRequest>>;
}

/// Combined persistence surface, plus the one cross-record commit the
/// approval path needs.
#[allow(async_fn_in_trait)]
pub trait Store: EmployeeStore + LeaveStore {
    /// Re-checks the balance against the request's span and, only if it
    /// covers it, debits the requester and stamps the request approved —
    /// as a single commit, serialized per employee.
    async fn commit_approval(&self, id: u64, comment: &str) -> LeaveResult<ApprovalCommit>;
}

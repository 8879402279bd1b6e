//! In-memory store backed by sharded concurrent maps. Map-entry locks give
//! the serialization the approval path needs — per request and per
//! employee, never a global lock. Lock order is requests before employees
//! at every site, so the order is total.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::{LeaveError, LeaveResult};
use crate::model::employee::Employee;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::role::Role;

use super::{ApprovalCommit, EmployeeStore, LeaveStore, NewEmployee, NewLeaveRequest, Store};

#[derive(Default)]
pub struct MemoryStore {
    employees: DashMap<u64, Employee>,
    /// Lowercased email → employee id; claimed before the employee row is
    /// written so duplicate registrations cannot interleave.
    emails: DashMap<String, u64>,
    requests: DashMap<u64, LeaveRequest>,
    employee_seq: AtomicU64,
    request_seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EmployeeStore for MemoryStore {
    async fn insert_employee(&self, new: NewEmployee) -> LeaveResult<Employee> {
        match self.emails.entry(new.email.to_lowercase()) {
            Entry::Occupied(_) => Err(LeaveError::Conflict("Email already registered")),
            Entry::Vacant(slot) => {
                let id = self.employee_seq.fetch_add(1, Ordering::Relaxed) + 1;
                let employee = Employee {
                    id,
                    name: new.name,
                    email: new.email,
                    password_hash: new.password_hash,
                    role: new.role,
                    balance: new.balance,
                    created_at: Utc::now(),
                };
                self.employees.insert(id, employee.clone());
                slot.insert(id);
                Ok(employee)
            }
        }
    }

    async fn find_employee(&self, id: u64) -> LeaveResult<Option<Employee>> {
        Ok(self.employees.get(&id).map(|e| e.clone()))
    }

    async fn find_employee_by_email(&self, email: &str) -> LeaveResult<Option<Employee>> {
        let Some(id) = self.emails.get(&email.to_lowercase()).map(|id| *id) else {
            return Ok(None);
        };
        self.find_employee(id).await
    }

    async fn count_employees(&self, role: Option<Role>) -> LeaveResult<i64> {
        let count = self
            .employees
            .iter()
            .filter(|e| role.is_none_or(|r| e.role == r))
            .count();
        Ok(count as i64)
    }
}

impl LeaveStore for MemoryStore {
    async fn insert_request(&self, new: NewLeaveRequest) -> LeaveResult<LeaveRequest> {
        let id = self.request_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let request = LeaveRequest {
            id,
            employee_id: new.employee_id,
            category: new.category,
            start_date: new.start_date,
            end_date: new.end_date,
            total_days: new.total_days,
            reason: new.reason,
            status: LeaveStatus::Pending,
            manager_comment: String::new(),
            created_at: Utc::now(),
        };
        self.requests.insert(id, request.clone());
        Ok(request)
    }

    async fn find_request(&self, id: u64) -> LeaveResult<Option<LeaveRequest>> {
        Ok(self.requests.get(&id).map(|r| r.clone()))
    }

    async fn list_requests(
        &self,
        employee_id: Option<u64>,
        status: Option<LeaveStatus>,
    ) -> LeaveResult<Vec<LeaveRequest>> {
        let mut requests: Vec<LeaveRequest> = self
            .requests
            .iter()
            .filter(|r| employee_id.is_none_or(|id| r.employee_id == id))
            .filter(|r| status.is_none_or(|s| r.status == s))
            .map(|r| r.clone())
            .collect();
        // Ids break ties between same-instant creations.
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(requests)
    }

    async fn count_requests(
        &self,
        employee_id: Option<u64>,
        status: Option<LeaveStatus>,
    ) -> LeaveResult<i64> {
        let count = self
            .requests
            .iter()
            .filter(|r| employee_id.is_none_or(|id| r.employee_id == id))
            .filter(|r| status.is_none_or(|s| r.status == s))
            .count();
        Ok(count as i64)
    }

    async fn delete_if_pending(&self, id: u64) -> LeaveResult<bool> {
        Ok(self
            .requests
            .remove_if(&id, |_, r| r.status == LeaveStatus::Pending)
            .is_some())
    }

    async fn reject_if_pending(&self, id: u64, comment: &str) -> LeaveResult<Option<LeaveRequest>> {
        let Some(mut request) = self.requests.get_mut(&id) else {
            return Ok(None);
        };
        if request.status != LeaveStatus::Pending {
            return Ok(None);
        }
        request.status = LeaveStatus::Rejected;
        request.manager_comment = comment.to_owned();
        Ok(Some(request.clone()))
    }
}

impl Store for MemoryStore {
    async fn commit_approval(&self, id: u64, comment: &str) -> LeaveResult<ApprovalCommit> {
        // Holding the request's entry lock across the whole sequence makes
        // this the only writer that can win the pending → approved
        // transition; the employee's entry lock serializes the debit
        // against other approvals for the same employee.
        let Some(mut request) = self.requests.get_mut(&id) else {
            return Ok(ApprovalCommit::NotPending);
        };
        if request.status != LeaveStatus::Pending {
            return Ok(ApprovalCommit::NotPending);
        }
        let Some(mut employee) = self.employees.get_mut(&request.employee_id) else {
            return Err(LeaveError::NotFound("Employee"));
        };
        if !employee.balance.debit(request.category, request.total_days) {
            return Ok(ApprovalCommit::InsufficientBalance);
        }
        request.status = LeaveStatus::Approved;
        request.manager_comment = comment.to_owned();
        Ok(ApprovalCommit::Approved(request.clone()))
    }
}

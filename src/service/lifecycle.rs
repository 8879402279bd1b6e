//! Request Lifecycle Manager: the pending → approved/rejected state
//! machine, creation-time validation, and the read-side projections.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{LeaveError, LeaveResult};
use crate::model::employee::LeaveBalance;
use crate::model::leave_request::{
    LeaveCategory, LeaveDecision, LeaveRequest, LeaveStatus, span_days,
};
use crate::model::role::Role;
use crate::store::{NewLeaveRequest, Store};

use super::ledger::BalanceLedger;

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeStats {
    #[schema(example = 4)]
    pub total_requests: i64,
    #[schema(example = 1)]
    pub pending_requests: i64,
    #[schema(example = 2)]
    pub approved_requests: i64,
    #[schema(example = 1)]
    pub rejected_requests: i64,
    pub leave_balance: LeaveBalance,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ManagerStats {
    #[schema(example = 12)]
    pub total_employees: i64,
    #[schema(example = 30)]
    pub total_requests: i64,
    #[schema(example = 3)]
    pub pending_requests: i64,
    #[schema(example = 20)]
    pub approved_requests: i64,
    #[schema(example = 7)]
    pub rejected_requests: i64,
}

pub struct LeaveService<S> {
    store: Arc<S>,
    ledger: BalanceLedger<S>,
}

impl<S> Clone for LeaveService<S> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone(), ledger: self.ledger.clone() }
    }
}

impl<S: Store> LeaveService<S> {
    pub fn new(store: Arc<S>) -> Self {
        let ledger = BalanceLedger::new(store.clone());
        Self { store, ledger }
    }

    pub fn ledger(&self) -> &BalanceLedger<S> {
        &self.ledger
    }

    /// Creates a pending request. The balance check here is advisory —
    /// nothing is reserved, and approval re-checks against the balance
    /// current at that moment.
    pub async fn create(
        &self,
        requester_id: u64,
        category: LeaveCategory,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: &str,
    ) -> LeaveResult<LeaveRequest> {
        let total_days = span_days(start_date, end_date).ok_or(LeaveError::InvalidDateRange)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LeaveError::Validation("Reason is required"));
        }
        if !self.ledger.check_sufficient(requester_id, category, total_days).await? {
            return Err(LeaveError::InsufficientBalance);
        }
        self.store
            .insert_request(NewLeaveRequest {
                employee_id: requester_id,
                category,
                start_date,
                end_date,
                total_days,
                reason: reason.to_owned(),
            })
            .await
    }

    /// Caller's own requests, newest-first.
    pub async fn list_own(&self, employee_id: u64) -> LeaveResult<Vec<LeaveRequest>> {
        self.store.list_requests(Some(employee_id), None).await
    }

    pub async fn list_all(&self) -> LeaveResult<Vec<LeaveRequest>> {
        self.store.list_requests(None, None).await
    }

    pub async fn list_pending(&self) -> LeaveResult<Vec<LeaveRequest>> {
        self.store.list_requests(None, Some(LeaveStatus::Pending)).await
    }

    /// Owner-only removal of a pending request. Never touches the ledger.
    pub async fn cancel(&self, caller_id: u64, request_id: u64) -> LeaveResult<()> {
        let request = self
            .store
            .find_request(request_id)
            .await?
            .ok_or(LeaveError::NotFound("Leave request"))?;
        if request.employee_id != caller_id {
            return Err(LeaveError::Forbidden("Not authorized"));
        }
        if request.status != LeaveStatus::Pending {
            return Err(LeaveError::InvalidState("Can only cancel pending requests"));
        }
        if !self.store.delete_if_pending(request_id).await? {
            // A concurrent resolution won the transition.
            return Err(LeaveError::InvalidState("Can only cancel pending requests"));
        }
        Ok(())
    }

    /// Manager resolution of a pending request. Role enforcement happens
    /// at the API boundary; this method owns the state machine.
    pub async fn resolve(
        &self,
        request_id: u64,
        decision: LeaveDecision,
        comment: Option<&str>,
    ) -> LeaveResult<LeaveRequest> {
        let request = self
            .store
            .find_request(request_id)
            .await?
            .ok_or(LeaveError::NotFound("Leave request"))?;
        if request.status != LeaveStatus::Pending {
            return Err(LeaveError::InvalidState("Request already processed"));
        }

        let comment = match comment.map(str::trim) {
            Some(c) if !c.is_empty() => c,
            _ => decision.default_comment(),
        };

        match decision {
            LeaveDecision::Reject => self
                .store
                .reject_if_pending(request_id, comment)
                .await?
                .ok_or(LeaveError::InvalidState("Request already processed")),
            LeaveDecision::Approve => self.ledger.debit(&request, comment).await,
        }
    }

    pub async fn employee_stats(&self, employee_id: u64) -> LeaveResult<EmployeeStats> {
        let leave_balance = self.ledger.balance_of(employee_id).await?;
        Ok(EmployeeStats {
            total_requests: self.store.count_requests(Some(employee_id), None).await?,
            pending_requests: self
                .store
                .count_requests(Some(employee_id), Some(LeaveStatus::Pending))
                .await?,
            approved_requests: self
                .store
                .count_requests(Some(employee_id), Some(LeaveStatus::Approved))
                .await?,
            rejected_requests: self
                .store
                .count_requests(Some(employee_id), Some(LeaveStatus::Rejected))
                .await?,
            leave_balance,
        })
    }

    pub async fn manager_stats(&self) -> LeaveResult<ManagerStats> {
        Ok(ManagerStats {
            total_employees: self.store.count_employees(Some(Role::Employee)).await?,
            total_requests: self.store.count_requests(None, None).await?,
            pending_requests: self.store.count_requests(None, Some(LeaveStatus::Pending)).await?,
            approved_requests: self
                .store
                .count_requests(None, Some(LeaveStatus::Approved))
                .await?,
            rejected_requests: self
                .store
                .count_requests(None, Some(LeaveStatus::Rejected))
                .await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::LeaveBalance;
    use crate::store::memory::MemoryStore;
    use crate::store::{EmployeeStore, LeaveStore, NewEmployee};

    fn service() -> LeaveService<MemoryStore> {
        LeaveService::new(Arc::new(MemoryStore::new()))
    }

    async fn seed_employee(svc: &LeaveService<MemoryStore>, balance: LeaveBalance) -> u64 {
        seed_named(svc, "worker@corp.test", balance).await
    }

    async fn seed_named(
        svc: &LeaveService<MemoryStore>,
        email: &str,
        balance: LeaveBalance,
    ) -> u64 {
        svc.store
            .insert_employee(NewEmployee {
                name: "Test Worker".into(),
                email: email.into(),
                password_hash: "hash".into(),
                role: Role::Employee,
                balance,
            })
            .await
            .unwrap()
            .id
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn sick_balance(days: u32) -> LeaveBalance {
        LeaveBalance { sick: days, casual: 0, vacation: 0 }
    }

    #[tokio::test]
    async fn create_then_approve_debits_once() {
        let svc = service();
        let emp = seed_employee(&svc, sick_balance(5)).await;

        let request = svc
            .create(emp, LeaveCategory::Sick, date("2026-03-02"), date("2026-03-04"), "Flu")
            .await
            .unwrap();
        assert_eq!(request.total_days, 3);
        assert_eq!(request.status, LeaveStatus::Pending);

        let approved = svc.resolve(request.id, LeaveDecision::Approve, None).await.unwrap();
        assert_eq!(approved.status, LeaveStatus::Approved);
        assert_eq!(approved.manager_comment, "Approved");
        assert_eq!(svc.ledger().balance_of(emp).await.unwrap().sick, 2);
    }

    #[tokio::test]
    async fn create_fails_fast_when_balance_cannot_cover() {
        let svc = service();
        let emp = seed_employee(&svc, sick_balance(2)).await;

        let err = svc
            .create(emp, LeaveCategory::Sick, date("2026-03-02"), date("2026-03-04"), "Flu")
            .await
            .unwrap_err();
        assert!(matches!(err, LeaveError::InsufficientBalance));
        assert!(svc.list_own(emp).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inverted_date_range_is_rejected_before_the_ledger() {
        let svc = service();
        // No employee seeded: a date-range failure must precede any
        // balance lookup.
        let err = svc
            .create(99, LeaveCategory::Sick, date("2026-03-04"), date("2026-03-02"), "Flu")
            .await
            .unwrap_err();
        assert!(matches!(err, LeaveError::InvalidDateRange));
    }

    #[tokio::test]
    async fn blank_reason_is_rejected() {
        let svc = service();
        let emp = seed_employee(&svc, sick_balance(5)).await;
        let err = svc
            .create(emp, LeaveCategory::Sick, date("2026-03-02"), date("2026-03-02"), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, LeaveError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_requester_is_not_found() {
        let svc = service();
        let err = svc
            .create(404, LeaveCategory::Sick, date("2026-03-02"), date("2026-03-02"), "Flu")
            .await
            .unwrap_err();
        assert!(matches!(err, LeaveError::NotFound(_)));
    }

    #[tokio::test]
    async fn cancel_round_trip_leaves_no_trace() {
        let svc = service();
        let emp = seed_employee(&svc, sick_balance(5)).await;
        let request = svc
            .create(emp, LeaveCategory::Sick, date("2026-03-02"), date("2026-03-03"), "Flu")
            .await
            .unwrap();

        svc.cancel(emp, request.id).await.unwrap();

        assert!(svc.list_own(emp).await.unwrap().is_empty());
        assert_eq!(svc.ledger().balance_of(emp).await.unwrap().sick, 5);
        let err = svc.cancel(emp, request.id).await.unwrap_err();
        assert!(matches!(err, LeaveError::NotFound(_)));
    }

    #[tokio::test]
    async fn only_the_owner_may_cancel() {
        let svc = service();
        let owner = seed_named(&svc, "owner@corp.test", sick_balance(5)).await;
        let intruder = seed_named(&svc, "intruder@corp.test", sick_balance(5)).await;
        let request = svc
            .create(owner, LeaveCategory::Sick, date("2026-03-02"), date("2026-03-03"), "Flu")
            .await
            .unwrap();

        let err = svc.cancel(intruder, request.id).await.unwrap_err();
        assert!(matches!(err, LeaveError::Forbidden(_)));
        let stored = svc.store.find_request(request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeaveStatus::Pending);
    }

    #[tokio::test]
    async fn terminal_requests_cannot_be_cancelled() {
        let svc = service();
        let emp = seed_employee(&svc, sick_balance(5)).await;
        let request = svc
            .create(emp, LeaveCategory::Sick, date("2026-03-02"), date("2026-03-03"), "Flu")
            .await
            .unwrap();
        svc.resolve(request.id, LeaveDecision::Reject, None).await.unwrap();

        let err = svc.cancel(emp, request.id).await.unwrap_err();
        assert!(matches!(err, LeaveError::InvalidState(_)));
    }

    #[tokio::test]
    async fn reject_never_touches_the_ledger() {
        let svc = service();
        let emp = seed_employee(&svc, sick_balance(5)).await;
        let request = svc
            .create(emp, LeaveCategory::Sick, date("2026-03-02"), date("2026-03-03"), "Flu")
            .await
            .unwrap();

        let rejected = svc
            .resolve(request.id, LeaveDecision::Reject, Some("No cover available"))
            .await
            .unwrap();
        assert_eq!(rejected.status, LeaveStatus::Rejected);
        assert_eq!(rejected.manager_comment, "No cover available");
        assert_eq!(svc.ledger().balance_of(emp).await.unwrap().sick, 5);
    }

    #[tokio::test]
    async fn resolving_twice_fails_invalid_state_and_debits_once() {
        let svc = service();
        let emp = seed_employee(&svc, sick_balance(5)).await;
        let request = svc
            .create(emp, LeaveCategory::Sick, date("2026-03-02"), date("2026-03-04"), "Flu")
            .await
            .unwrap();

        svc.resolve(request.id, LeaveDecision::Approve, None).await.unwrap();
        for decision in [LeaveDecision::Approve, LeaveDecision::Reject] {
            let err = svc.resolve(request.id, decision, None).await.unwrap_err();
            assert!(matches!(err, LeaveError::InvalidState(_)));
        }

        // Second attempts changed neither status nor balance.
        let stored = svc.store.find_request(request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeaveStatus::Approved);
        assert_eq!(svc.ledger().balance_of(emp).await.unwrap().sick, 2);
    }

    #[tokio::test]
    async fn approval_fails_but_stays_pending_when_balance_ran_out() {
        let svc = service();
        let emp = seed_employee(&svc, sick_balance(5)).await;
        // Both pass the advisory creation check against sick = 5.
        let first = svc
            .create(emp, LeaveCategory::Sick, date("2026-03-02"), date("2026-03-05"), "Flu")
            .await
            .unwrap();
        let second = svc
            .create(emp, LeaveCategory::Sick, date("2026-03-09"), date("2026-03-12"), "Flu again")
            .await
            .unwrap();

        svc.resolve(first.id, LeaveDecision::Approve, None).await.unwrap();
        let err = svc.resolve(second.id, LeaveDecision::Approve, None).await.unwrap_err();
        assert!(matches!(err, LeaveError::InsufficientBalance));

        // The loser is still pending; the manager may reject it instead.
        let stored = svc.store.find_request(second.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeaveStatus::Pending);
        svc.resolve(second.id, LeaveDecision::Reject, None).await.unwrap();
        assert_eq!(svc.ledger().balance_of(emp).await.unwrap().sick, 1);
    }

    #[tokio::test]
    async fn unknown_request_is_not_found() {
        let svc = service();
        let err = svc.resolve(404, LeaveDecision::Approve, None).await.unwrap_err();
        assert!(matches!(err, LeaveError::NotFound(_)));
    }

    #[tokio::test]
    async fn lists_are_scoped_and_newest_first() {
        let svc = service();
        let a = seed_named(&svc, "a@corp.test", sick_balance(10)).await;
        let b = seed_named(&svc, "b@corp.test", sick_balance(10)).await;
        let first = svc
            .create(a, LeaveCategory::Sick, date("2026-03-02"), date("2026-03-02"), "one")
            .await
            .unwrap();
        let second = svc
            .create(b, LeaveCategory::Sick, date("2026-03-03"), date("2026-03-03"), "two")
            .await
            .unwrap();
        let third = svc
            .create(a, LeaveCategory::Sick, date("2026-03-04"), date("2026-03-04"), "three")
            .await
            .unwrap();

        let own: Vec<u64> = svc.list_own(a).await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(own, vec![third.id, first.id]);

        let all: Vec<u64> = svc.list_all().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(all, vec![third.id, second.id, first.id]);

        svc.resolve(second.id, LeaveDecision::Reject, None).await.unwrap();
        let pending: Vec<u64> = svc.list_pending().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(pending, vec![third.id, first.id]);
    }

    #[tokio::test]
    async fn stats_project_counts_and_balance() {
        let svc = service();
        let emp = seed_employee(&svc, LeaveBalance { sick: 10, casual: 10, vacation: 15 }).await;
        let r1 = svc
            .create(emp, LeaveCategory::Sick, date("2026-03-02"), date("2026-03-03"), "Flu")
            .await
            .unwrap();
        let r2 = svc
            .create(emp, LeaveCategory::Casual, date("2026-04-01"), date("2026-04-01"), "Errand")
            .await
            .unwrap();
        svc.create(emp, LeaveCategory::Vacation, date("2026-05-01"), date("2026-05-05"), "Trip")
            .await
            .unwrap();
        svc.resolve(r1.id, LeaveDecision::Approve, None).await.unwrap();
        svc.resolve(r2.id, LeaveDecision::Reject, None).await.unwrap();

        let stats = svc.employee_stats(emp).await.unwrap();
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.pending_requests, 1);
        assert_eq!(stats.approved_requests, 1);
        assert_eq!(stats.rejected_requests, 1);
        assert_eq!(stats.leave_balance, LeaveBalance { sick: 8, casual: 10, vacation: 15 });

        let manager_view = svc.manager_stats().await.unwrap();
        assert_eq!(manager_view.total_employees, 1);
        assert_eq!(manager_view.total_requests, 3);
        assert_eq!(manager_view.pending_requests, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_approvals_cannot_overdraw_one_balance() {
        let svc = Arc::new(service());
        let emp = seed_named(
            &svc,
            "race@corp.test",
            LeaveBalance { sick: 0, casual: 4, vacation: 0 },
        )
        .await;
        let three_days = svc
            .create(emp, LeaveCategory::Casual, date("2026-03-02"), date("2026-03-04"), "First")
            .await
            .unwrap();
        let two_days = svc
            .create(emp, LeaveCategory::Casual, date("2026-03-09"), date("2026-03-10"), "Second")
            .await
            .unwrap();

        let a = tokio::spawn({
            let svc = svc.clone();
            async move { svc.resolve(three_days.id, LeaveDecision::Approve, None).await }
        });
        let b = tokio::spawn({
            let svc = svc.clone();
            async move { svc.resolve(two_days.id, LeaveDecision::Approve, None).await }
        });
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        // casual = 4 covers either request alone, never both.
        assert!(a.is_ok() != b.is_ok(), "exactly one approval must win");
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(loser.unwrap_err(), LeaveError::InsufficientBalance));
        let remaining = svc.ledger().balance_of(emp).await.unwrap().casual;
        assert!(remaining == 1 || remaining == 2, "remaining = {remaining}");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_resolutions_of_one_request_pick_one_winner() {
        let svc = Arc::new(service());
        let emp = seed_named(&svc, "double@corp.test", sick_balance(10)).await;
        let request = svc
            .create(emp, LeaveCategory::Sick, date("2026-03-02"), date("2026-03-04"), "Flu")
            .await
            .unwrap();

        let a = tokio::spawn({
            let svc = svc.clone();
            async move { svc.resolve(request.id, LeaveDecision::Approve, None).await }
        });
        let b = tokio::spawn({
            let svc = svc.clone();
            async move { svc.resolve(request.id, LeaveDecision::Approve, None).await }
        });
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        assert!(a.is_ok() != b.is_ok(), "exactly one resolution must win");
        // Debited exactly once.
        assert_eq!(svc.ledger().balance_of(emp).await.unwrap().sick, 7);
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(loser.unwrap_err(), LeaveError::InvalidState(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cancel_racing_resolve_never_leaves_a_partial_state() {
        let svc = Arc::new(service());
        let emp = seed_named(&svc, "tug@corp.test", sick_balance(10)).await;
        let request = svc
            .create(emp, LeaveCategory::Sick, date("2026-03-02"), date("2026-03-04"), "Flu")
            .await
            .unwrap();

        let cancel = tokio::spawn({
            let svc = svc.clone();
            async move { svc.cancel(emp, request.id).await }
        });
        let approve = tokio::spawn({
            let svc = svc.clone();
            async move { svc.resolve(request.id, LeaveDecision::Approve, None).await }
        });
        let (cancel, approve) = (cancel.await.unwrap(), approve.await.unwrap());

        let balance = svc.ledger().balance_of(emp).await.unwrap().sick;
        let stored = svc.store.find_request(request.id).await.unwrap();
        if cancel.is_ok() {
            // Cancellation won: the record is gone and nothing was debited.
            assert!(stored.is_none());
            assert_eq!(balance, 10);
            if let Err(err) = approve {
                assert!(matches!(
                    err,
                    LeaveError::InvalidState(_) | LeaveError::NotFound(_)
                ));
            } else {
                panic!("cancel and approve cannot both win");
            }
        } else {
            // Approval won: debited exactly once, record terminal.
            assert_eq!(stored.unwrap().status, LeaveStatus::Approved);
            assert_eq!(balance, 7);
            assert!(approve.is_ok());
            assert!(matches!(cancel.unwrap_err(), LeaveError::InvalidState(_)));
        }
    }
}

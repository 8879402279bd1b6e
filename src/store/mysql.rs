//! MySQL-backed store. Queries are bound at runtime; the approval commit
//! runs in a transaction with `SELECT ... FOR UPDATE` so the debit and the
//! status transition land together and concurrent approvals for the same
//! employee serialize on the row lock.

use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use crate::error::{LeaveError, LeaveResult};
use crate::model::employee::{Employee, LeaveBalance};
use crate::model::leave_request::{LeaveCategory, LeaveRequest, LeaveStatus};
use crate::model::role::Role;

use super::{ApprovalCommit, EmployeeStore, LeaveStore, NewEmployee, NewLeaveRequest, Store};

const REQUEST_COLUMNS: &str = "id, employee_id, category, start_date, end_date, total_days, \
                               reason, status, manager_comment, created_at";

const EMPLOYEE_COLUMNS: &str =
    "id, name, email, password_hash, role, sick_days, casual_days, vacation_days, created_at";

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct EmployeeRow {
    id: u64,
    name: String,
    email: String,
    password_hash: String,
    role: Role,
    sick_days: u32,
    casual_days: u32,
    vacation_days: u32,
    created_at: DateTime<Utc>,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role: row.role,
            balance: LeaveBalance {
                sick: row.sick_days,
                casual: row.casual_days,
                vacation: row.vacation_days,
            },
            created_at: row.created_at,
        }
    }
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Status(LeaveStatus),
}

fn request_filter(
    employee_id: Option<u64>,
    status: Option<LeaveStatus>,
) -> (String, Vec<FilterValue>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args = Vec::new();
    if let Some(id) = employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(id));
    }
    if let Some(status) = status {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Status(status));
    }
    (where_sql, args)
}

/// Balance column for a category. The enum is closed, so the interpolated
/// name can never come from caller input.
fn balance_column(category: LeaveCategory) -> &'static str {
    match category {
        LeaveCategory::Sick => "sick_days",
        LeaveCategory::Casual => "casual_days",
        LeaveCategory::Vacation => "vacation_days",
    }
}

impl EmployeeStore for MySqlStore {
    async fn insert_employee(&self, new: NewEmployee) -> LeaveResult<Employee> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees
                (name, email, password_hash, role, sick_days, casual_days, vacation_days)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role)
        .bind(new.balance.sick)
        .bind(new.balance.casual)
        .bind(new.balance.vacation)
        .execute(&self.pool)
        .await;

        let inserted = match result {
            Ok(res) => res,
            Err(e) => {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.code() == Some("23000".into()) {
                        return Err(LeaveError::Conflict("Email already registered"));
                    }
                }
                return Err(e.into());
            }
        };

        let id = inserted.last_insert_id();
        self.find_employee(id)
            .await?
            .ok_or_else(|| LeaveError::Storage(format!("employee {id} vanished after insert")))
    }

    async fn find_employee(&self, id: u64) -> LeaveResult<Option<Employee>> {
        let row = sqlx::query_as::<_, EmployeeRow>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Employee::from))
    }

    async fn find_employee_by_email(&self, email: &str) -> LeaveResult<Option<Employee>> {
        let row = sqlx::query_as::<_, EmployeeRow>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Employee::from))
    }

    async fn count_employees(&self, role: Option<Role>) -> LeaveResult<i64> {
        let total = match role {
            Some(role) => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE role = ?")
                    .bind(role)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(total)
    }
}

impl LeaveStore for MySqlStore {
    async fn insert_request(&self, new: NewLeaveRequest) -> LeaveResult<LeaveRequest> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, category, start_date, end_date, total_days, reason)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.category)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.total_days)
        .bind(&new.reason)
        .execute(&self.pool)
        .await?;

        let id = inserted.last_insert_id();
        self.find_request(id)
            .await?
            .ok_or_else(|| LeaveError::Storage(format!("leave request {id} vanished after insert")))
    }

    async fn find_request(&self, id: u64) -> LeaveResult<Option<LeaveRequest>> {
        let request = sqlx::query_as::<_, LeaveRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(request)
    }

    async fn list_requests(
        &self,
        employee_id: Option<u64>,
        status: Option<LeaveStatus>,
    ) -> LeaveResult<Vec<LeaveRequest>> {
        let (where_sql, args) = request_filter(employee_id, status);
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests{where_sql} \
             ORDER BY created_at DESC, id DESC"
        );

        let mut query = sqlx::query_as::<_, LeaveRequest>(&sql);
        for arg in args {
            query = match arg {
                FilterValue::U64(v) => query.bind(v),
                FilterValue::Status(s) => query.bind(s),
            };
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn count_requests(
        &self,
        employee_id: Option<u64>,
        status: Option<LeaveStatus>,
    ) -> LeaveResult<i64> {
        let (where_sql, args) = request_filter(employee_id, status);
        let sql = format!("SELECT COUNT(*) FROM leave_requests{where_sql}");

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for arg in args {
            query = match arg {
                FilterValue::U64(v) => query.bind(v),
                FilterValue::Status(s) => query.bind(s),
            };
        }

        Ok(query.fetch_one(&self.pool).await?)
    }

    async fn delete_if_pending(&self, id: u64) -> LeaveResult<bool> {
        let result = sqlx::query("DELETE FROM leave_requests WHERE id = ? AND status = 'pending'")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn reject_if_pending(&self, id: u64, comment: &str) -> LeaveResult<Option<LeaveRequest>> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = 'rejected', manager_comment = ?
            WHERE id = ?
            AND status = 'pending'
            "#,
        )
        .bind(comment)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_request(id).await
    }
}

impl Store for MySqlStore {
    async fn commit_approval(&self, id: u64, comment: &str) -> LeaveResult<ApprovalCommit> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the request: concurrent resolutions and the debit
        // below serialize here until commit.
        let request = sqlx::query_as::<_, LeaveRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = ? FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(request) = request else {
            return Ok(ApprovalCommit::NotPending);
        };
        if request.status != LeaveStatus::Pending {
            return Ok(ApprovalCommit::NotPending);
        }

        let column = balance_column(request.category);
        let debited = sqlx::query(&format!(
            "UPDATE employees SET {column} = {column} - ? WHERE id = ? AND {column} >= ?"
        ))
        .bind(request.total_days)
        .bind(request.employee_id)
        .bind(request.total_days)
        .execute(&mut *tx)
        .await?;

        if debited.rows_affected() == 0 {
            // Dropping the transaction rolls it back; the request stays
            // pending and the balance is untouched.
            return Ok(ApprovalCommit::InsufficientBalance);
        }

        sqlx::query("UPDATE leave_requests SET status = 'approved', manager_comment = ? WHERE id = ?")
            .bind(comment)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let mut approved = request;
        approved.status = LeaveStatus::Approved;
        approved.manager_comment = comment.to_owned();
        Ok(ApprovalCommit::Approved(approved))
    }
}

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

use crate::api::leave_request::{CreateLeave, ResolveLeave};
use crate::model::employee::LeaveBalance;
use crate::model::leave_request::{LeaveCategory, LeaveRequest, LeaveStatus};
use crate::model::role::Role;
use crate::models::{LoginReqDto, LoginResponse, RegisterReq};
use crate::service::lifecycle::{EmployeeStats, ManagerStats};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management API",
        version = "1.0.0",
        description = r#"
## Leave Management System

Employees apply for leave against per-category balances; managers approve
or reject pending requests. A balance is debited exactly once, exactly when
a request is approved.

### 🔹 Key Features
- **Leave Requests**
  - Apply, cancel while pending, and view your own history
- **Approval Workflow**
  - Managers approve or reject pending requests with an optional comment
- **Balances**
  - Per-category remaining entitlement (sick, casual, vacation)
- **Dashboards**
  - Employee and manager stat projections

### 🔐 Security
All `/api` endpoints require **JWT Bearer authentication**. Manager-only
endpoints additionally require the `manager` role.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::my_requests,
        crate::api::leave_request::leave_balance,
        crate::api::leave_request::all_requests,
        crate::api::leave_request::pending_requests,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::dashboard::employee_stats,
        crate::api::dashboard::manager_stats
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            LoginResponse,
            Role,
            LeaveBalance,
            LeaveCategory,
            LeaveStatus,
            LeaveRequest,
            CreateLeave,
            ResolveLeave,
            EmployeeStats,
            ManagerStats
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Leave", description = "Leave request lifecycle APIs"),
        (name = "Dashboard", description = "Read-side stat projections"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

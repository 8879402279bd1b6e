use actix_web::{HttpResponse, web};

use crate::auth::auth::AuthUser;
use crate::error::LeaveResult;
use crate::service::lifecycle::{EmployeeStats, LeaveService, ManagerStats};
use crate::store::Store;

/// Read-side projection over the caller's requests and balance; carries no
/// invariants of its own.
#[utoipa::path(
    get,
    path = "/api/dashboard/employee",
    responses(
        (status = 200, description = "Caller's request counts and balance", body = EmployeeStats),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn employee_stats<S: Store + 'static>(
    auth: AuthUser,
    svc: web::Data<LeaveService<S>>,
) -> LeaveResult<HttpResponse> {
    let stats = svc.employee_stats(auth.employee_id).await?;
    Ok(HttpResponse::Ok().json(stats))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/manager",
    responses(
        (status = 200, description = "Org-wide request counts", body = ManagerStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn manager_stats<S: Store + 'static>(
    auth: AuthUser,
    svc: web::Data<LeaveService<S>>,
) -> LeaveResult<HttpResponse> {
    auth.require_manager()?;
    let stats = svc.manager_stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}

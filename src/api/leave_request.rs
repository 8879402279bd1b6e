use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::LeaveResult;
use crate::model::leave_request::{LeaveCategory, LeaveDecision, LeaveRequest};
use crate::service::lifecycle::LeaveService;
use crate::store::Store;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "sick")]
    pub leave_type: LeaveCategory,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Flu")]
    pub reason: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ResolveLeave {
    /// Optional manager comment; defaults to "Approved" / "Rejected".
    #[schema(example = "Get well soon")]
    pub comment: Option<String>,
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Invalid dates, blank reason, or insufficient balance"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave<S: Store + 'static>(
    auth: AuthUser,
    svc: web::Data<LeaveService<S>>,
    payload: web::Json<CreateLeave>,
) -> LeaveResult<HttpResponse> {
    let payload = payload.into_inner();
    let request = svc
        .create(
            auth.employee_id,
            payload.leave_type,
            payload.start_date,
            payload.end_date,
            &payload.reason,
        )
        .await?;

    info!(
        request_id = request.id,
        employee_id = auth.employee_id,
        total_days = request.total_days,
        "leave request submitted"
    );
    Ok(HttpResponse::Created().json(request))
}

/* =========================
Employee views
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/my-requests",
    responses(
        (status = 200, description = "Caller's requests, newest first", body = [LeaveRequest]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_requests<S: Store + 'static>(
    auth: AuthUser,
    svc: web::Data<LeaveService<S>>,
) -> LeaveResult<HttpResponse> {
    let requests = svc.list_own(auth.employee_id).await?;
    Ok(HttpResponse::Ok().json(requests))
}

#[utoipa::path(
    get,
    path = "/api/leave/balance",
    responses(
        (status = 200, description = "Remaining entitlement per category"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_balance<S: Store + 'static>(
    auth: AuthUser,
    svc: web::Data<LeaveService<S>>,
) -> LeaveResult<HttpResponse> {
    let balance = svc.ledger().balance_of(auth.employee_id).await?;
    Ok(HttpResponse::Ok().json(balance))
}

/* =========================
Manager views
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/all",
    responses(
        (status = 200, description = "All requests, newest first", body = [LeaveRequest]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn all_requests<S: Store + 'static>(
    auth: AuthUser,
    svc: web::Data<LeaveService<S>>,
) -> LeaveResult<HttpResponse> {
    auth.require_manager()?;
    let requests = svc.list_all().await?;
    Ok(HttpResponse::Ok().json(requests))
}

#[utoipa::path(
    get,
    path = "/api/leave/pending",
    responses(
        (status = 200, description = "Pending requests, newest first", body = [LeaveRequest]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn pending_requests<S: Store + 'static>(
    auth: AuthUser,
    svc: web::Data<LeaveService<S>>,
) -> LeaveResult<HttpResponse> {
    auth.require_manager()?;
    let requests = svc.list_pending().await?;
    Ok(HttpResponse::Ok().json(requests))
}

/* =========================
Cancel (owner only)
========================= */
#[utoipa::path(
    delete,
    path = "/api/leave/{leave_id}",
    params(("leave_id" = u64, Path, description = "ID of the pending request to cancel")),
    responses(
        (status = 200, description = "Leave request cancelled"),
        (status = 400, description = "Request is no longer pending"),
        (status = 403, description = "Caller is not the requester"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn cancel_leave<S: Store + 'static>(
    auth: AuthUser,
    svc: web::Data<LeaveService<S>>,
    path: web::Path<u64>,
) -> LeaveResult<HttpResponse> {
    let leave_id = path.into_inner();
    svc.cancel(auth.employee_id, leave_id).await?;

    info!(request_id = leave_id, employee_id = auth.employee_id, "leave request cancelled");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave request cancelled"
    })))
}

/* =========================
Approve / reject (manager)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(("leave_id" = u64, Path, description = "ID of the leave request to approve")),
    request_body(content = ResolveLeave, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave approved; balance debited", body = LeaveRequest),
        (status = 400, description = "Already processed, or balance no longer sufficient"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave<S: Store + 'static>(
    auth: AuthUser,
    svc: web::Data<LeaveService<S>>,
    path: web::Path<u64>,
    payload: Option<web::Json<ResolveLeave>>,
) -> LeaveResult<HttpResponse> {
    auth.require_manager()?;

    let leave_id = path.into_inner();
    let comment = payload.and_then(|p| p.into_inner().comment);
    let request = svc
        .resolve(leave_id, LeaveDecision::Approve, comment.as_deref())
        .await?;

    info!(
        request_id = leave_id,
        employee_id = request.employee_id,
        total_days = request.total_days,
        "leave request approved"
    );
    Ok(HttpResponse::Ok().json(request))
}

#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(("leave_id" = u64, Path, description = "ID of the leave request to reject")),
    request_body(content = ResolveLeave, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave rejected; balance untouched", body = LeaveRequest),
        (status = 400, description = "Request already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave<S: Store + 'static>(
    auth: AuthUser,
    svc: web::Data<LeaveService<S>>,
    path: web::Path<u64>,
    payload: Option<web::Json<ResolveLeave>>,
) -> LeaveResult<HttpResponse> {
    auth.require_manager()?;

    let leave_id = path.into_inner();
    let comment = payload.and_then(|p| p.into_inner().comment);
    let request = svc
        .resolve(leave_id, LeaveDecision::Reject, comment.as_deref())
        .await?;

    info!(request_id = leave_id, "leave request rejected");
    Ok(HttpResponse::Ok().json(request))
}

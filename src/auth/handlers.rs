use actix_web::{HttpResponse, web};
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, verify_password};
use crate::config::Config;
use crate::error::{LeaveError, LeaveResult};
use crate::model::role::Role;
use crate::models::{LoginReqDto, LoginResponse, RegisterReq};
use crate::store::{NewEmployee, Store};
use crate::utils::email_cache;

/// Registration. Seeds the configured initial balance; the email cache
/// short-circuits the common duplicate case before a store round trip.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Employee registered successfully"),
        (status = 400, description = "Missing name, email or password"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Auth"
)]
pub async fn register<S: Store + 'static>(
    store: web::Data<S>,
    config: web::Data<Config>,
    payload: web::Json<RegisterReq>,
) -> LeaveResult<HttpResponse> {
    let name = payload.name.trim();
    let email = payload.email.trim().to_lowercase();

    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(LeaveError::Validation("Name, email and password must not be empty"));
    }

    if email_cache::is_taken(&email).await {
        return Err(LeaveError::Conflict("Email already registered"));
    }

    if store.find_employee_by_email(&email).await?.is_some() {
        email_cache::mark_taken(&email).await;
        return Err(LeaveError::Conflict("Email already registered"));
    }

    let role = payload.role.unwrap_or(Role::Employee);
    let employee = store
        .insert_employee(NewEmployee {
            name: name.to_owned(),
            email: email.clone(),
            password_hash: hash_password(&payload.password),
            role,
            balance: config.default_balance(),
        })
        .await?;

    email_cache::mark_taken(&email).await;
    info!(employee_id = employee.id, role = %role, "employee registered");

    Ok(HttpResponse::Created().json(json!({
        "message": "Employee registered successfully"
    })))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(store, config, payload),
    fields(email = %payload.email)
)]
pub async fn login<S: Store + 'static>(
    store: web::Data<S>,
    config: web::Data<Config>,
    payload: web::Json<LoginReqDto>,
) -> LeaveResult<HttpResponse> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        info!("Validation failed: empty email or password");
        return Err(LeaveError::Validation("Email and password must not be empty"));
    }

    debug!("Fetching employee from store");

    let email = payload.email.trim().to_lowercase();
    let Some(employee) = store.find_employee_by_email(&email).await? else {
        info!("Invalid credentials: employee not found");
        return Ok(HttpResponse::Unauthorized().json(json!({
            "message": "Invalid credentials"
        })));
    };

    if verify_password(&payload.password, &employee.password_hash).is_err() {
        info!("Invalid credentials: password mismatch");
        return Ok(HttpResponse::Unauthorized().json(json!({
            "message": "Invalid credentials"
        })));
    }

    debug!(employee_id = employee.id, "Password verified, issuing token");

    let access_token = generate_access_token(
        employee.id,
        employee.email.clone(),
        employee.name.clone(),
        employee.role,
        &config.jwt_secret,
        config.access_token_ttl,
    );

    info!(employee_id = employee.id, "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        employee_id: employee.id,
        name: employee.name,
        role: employee.role,
    }))
}

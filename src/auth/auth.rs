use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};
use jsonwebtoken::{DecodingKey, Validation, decode};

use crate::config::Config;
use crate::error::LeaveError;
use crate::model::role::Role;
use crate::models::Claims;

/// Authenticated caller, decoded from the bearer token.
pub struct AuthUser {
    pub employee_id: u64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(d) => d,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        ready(Ok(AuthUser {
            employee_id: data.claims.employee_id,
            email: data.claims.sub,
            name: data.claims.name,
            role: data.claims.role,
        }))
    }
}

impl AuthUser {
    pub fn require_manager(&self) -> Result<(), LeaveError> {
        if self.role == Role::Manager {
            Ok(())
        } else {
            Err(LeaveError::Forbidden("Manager access required"))
        }
    }

    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }
}

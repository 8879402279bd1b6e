use std::env;

use dotenvy::dotenv;

use crate::model::employee::LeaveBalance;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Entitlement granted at registration
    pub default_sick_days: u32,
    pub default_casual_days: u32,
    pub default_vacation_days: u32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            access_token_ttl: env::var("ACCESS_TOKEN_TTL")
                .unwrap_or_else(|_| "900".to_string()) // default 15 min
                .parse()
                .unwrap(),

            rate_login_per_min: env::var("RATE_LOGIN_PER_MIN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),
            rate_register_per_min: env::var("RATE_REGISTER_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            default_sick_days: env::var("DEFAULT_SICK_DAYS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap(),
            default_casual_days: env::var("DEFAULT_CASUAL_DAYS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap(),
            default_vacation_days: env::var("DEFAULT_VACATION_DAYS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .unwrap(),
        }
    }

    /// Balance granted to a newly registered employee.
    pub fn default_balance(&self) -> LeaveBalance {
        LeaveBalance {
            sick: self.default_sick_days,
            casual: self.default_casual_days,
            vacation: self.default_vacation_days,
        }
    }
}

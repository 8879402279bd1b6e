use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

use crate::{
    api::{dashboard, leave_request},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    store::Store,
};

pub fn configure<S: Store + 'static>(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter config
    fn build_limiter(requests_per_min: u32) -> GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap()
    }

    let login_limiter = build_limiter(config.rate_login_per_min);
    let register_limiter = build_limiter(config.rate_register_per_min);
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/register")
                    .wrap(Governor::new(&register_limiter))
                    .route(web::post().to(handlers::register::<S>)),
            )
            .service(
                web::resource("/login")
                    .wrap(Governor::new(&login_limiter))
                    .route(web::post().to(handlers::login::<S>)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(Governor::new(&protected_limiter)) // rate limiting
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("").route(web::post().to(leave_request::create_leave::<S>)),
                    )
                    // /leave/my-requests
                    .service(
                        web::resource("/my-requests")
                            .route(web::get().to(leave_request::my_requests::<S>)),
                    )
                    // /leave/balance
                    .service(
                        web::resource("/balance")
                            .route(web::get().to(leave_request::leave_balance::<S>)),
                    )
                    // /leave/all
                    .service(
                        web::resource("/all")
                            .route(web::get().to(leave_request::all_requests::<S>)),
                    )
                    // /leave/pending
                    .service(
                        web::resource("/pending")
                            .route(web::get().to(leave_request::pending_requests::<S>)),
                    )
                    // /leave/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::delete().to(leave_request::cancel_leave::<S>)),
                    )
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave::<S>)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave::<S>)),
                    ),
            )
            .service(
                web::scope("/dashboard")
                    .service(
                        web::resource("/employee")
                            .route(web::get().to(dashboard::employee_stats::<S>)),
                    )
                    .service(
                        web::resource("/manager")
                            .route(web::get().to(dashboard::manager_stats::<S>)),
                    ),
            ),
    );
}

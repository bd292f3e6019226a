//! HTTP handlers and route configuration.

mod billing;
mod entitlements;
mod health;
mod payments;
mod plans;

use actix_web::web;

use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::state::AppState;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.service(
        web::scope("/api")
            .wrap(RateLimitMiddleware::new(
                state.limiter.clone(),
                state.policies.api,
                state.clock.clone(),
            ))
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .route("/plans", web::get().to(plans::list_plans))
            .route("/billing/webhook", web::post().to(billing::billing_webhook))
            // Authenticated routes
            .service(
                web::scope("/entitlements")
                    .route("", web::get().to(entitlements::list_entitlements))
                    .route("/{feature}", web::get().to(entitlements::get_entitlement)),
            )
            .route(
                "/features/{feature}/authorize",
                web::post().to(entitlements::authorize_feature),
            )
            .route("/payments/orders", web::post().to(payments::create_order)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};
    use planpilot_core::ports::RateLimitPolicy;

    use crate::state::testing::TestContext;

    #[actix_rt::test]
    async fn test_health_and_plans_are_public() {
        let ctx = TestContext::new();
        let state = ctx.state.clone();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(|cfg| configure_routes(cfg, &state)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["plans"], 2);

        let req = test::TestRequest::get().uri("/api/plans").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"][0]["id"], "free");
        assert_eq!(body["data"][1]["id"], "pro");
    }

    #[actix_rt::test]
    async fn test_api_rate_limit_headers_and_rejection() {
        let ctx = TestContext::new().with_api_policy(RateLimitPolicy::new(2, 1_000).unwrap());
        let state = ctx.state.clone();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(|cfg| configure_routes(cfg, &state)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("X-RateLimit-Limit").unwrap(), "2");
        assert_eq!(resp.headers().get("X-RateLimit-Remaining").unwrap(), "1");

        let req = test::TestRequest::get().uri("/api/health").to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(resp.headers().get("Retry-After").unwrap(), "1");

        ctx.clock.advance(1_000);
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}

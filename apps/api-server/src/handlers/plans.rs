//! Plan catalog endpoint.

use actix_web::{HttpResponse, web};
use planpilot_shared::ApiResponse;

use crate::state::AppState;

/// GET /api/plans
pub async fn list_plans(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(state.resolver.catalog().plans()))
}

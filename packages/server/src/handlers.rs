//! HTTP handler functions for the civic safety API.

use actix_web::{HttpResponse, web};
use civic_safety_analysis::AnalysisError;
use civic_safety_incident_models::IncidentScope;
use civic_safety_routing::{RoutingError, parse_mode};
use civic_safety_server_models::{
    ApiBoroughComparison, ApiError, ApiHealth, ApiRefresh, RefreshRequest, SafeRoutesRequest,
    SafetyRequest,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/safety`
///
/// Rates an area given by postal code, borough, or address and radius.
pub async fn area_safety(
    state: web::Data<AppState>,
    body: web::Json<SafetyRequest>,
) -> HttpResponse {
    match state.areas.rate_area(&body.into_inner().into()).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(AnalysisError::Validation { field, message }) => bad_request(field, message),
        Err(e) => {
            log::error!("Area rating failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Safety analysis failed"))
        }
    }
}

/// `GET /api/safety/borough-comparison`
pub async fn borough_comparison(state: web::Data<AppState>) -> HttpResponse {
    let comparison = state.areas.borough_comparison().await;
    HttpResponse::Ok().json(ApiBoroughComparison::from(comparison))
}

/// `POST /api/safety/refresh`
///
/// Refetches one borough, or everything when no borough is given. A failed
/// refetch is reported with `success: false` and the previous data stays in
/// service as stale.
pub async fn refresh(
    state: web::Data<AppState>,
    body: Option<web::Json<RefreshRequest>>,
) -> HttpResponse {
    let borough = body.and_then(|b| b.into_inner().borough);

    let scope = match borough.as_deref() {
        None => IncidentScope::All,
        Some(raw) => match raw.parse::<IncidentScope>() {
            Ok(scope) => scope,
            Err(e) => return bad_request("borough", e.to_string()),
        },
    };

    let success = state.areas.store().refresh(scope).await;
    let message = if !success {
        "Failed to refresh safety data".to_string()
    } else if scope == IncidentScope::All {
        "Safety data refreshed successfully".to_string()
    } else {
        format!("Safety data refreshed successfully for {scope}")
    };
    log::info!("Refresh {scope}: {message}");

    HttpResponse::Ok().json(ApiRefresh { success, message })
}

/// `POST /api/safe-routes`
///
/// Scores alternative routes between two addresses.
pub async fn safe_routes(
    state: web::Data<AppState>,
    body: web::Json<SafeRoutesRequest>,
) -> HttpResponse {
    let request = body.into_inner();

    let result = match parse_mode(request.mode.as_deref()) {
        Ok(mode) => {
            state
                .routes
                .analyze_routes(&request.origin, &request.destination, mode)
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(analysis) => HttpResponse::Ok().json(analysis),
        Err(RoutingError::Validation { field, message }) => bad_request(field, message),
    }
}

fn bad_request(field: &str, message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiError::validation(field, message))
}

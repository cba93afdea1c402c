use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use super::directory::MemberDirectory;
use super::eligibility::GradeTier;
use super::service::DistributionService;

/// Router builder exposing the advisory eligibility endpoints.
pub fn distribution_router<D>(service: Arc<DistributionService<D>>) -> Router
where
    D: MemberDirectory + 'static,
{
    Router::new()
        .route(
            "/api/v1/distribution/eligibility/:grade",
            get(eligibility_handler::<D>),
        )
        .route(
            "/api/v1/distribution/rules/:grade",
            get(rule_eligibility_handler::<D>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct PeriodQuery {
    year: Option<i32>,
    month: Option<u32>,
}

impl PeriodQuery {
    fn period(&self) -> Option<(i32, u32)> {
        match (self.year, self.month) {
            (Some(year), Some(month)) => Some((year, month)),
            _ => None,
        }
    }
}

pub(crate) async fn eligibility_handler<D>(
    State(service): State<Arc<DistributionService<D>>>,
    Path(grade): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> Response
where
    D: MemberDirectory + 'static,
{
    let tier: GradeTier = match grade.parse() {
        Ok(tier) => tier,
        Err(message) => {
            let payload = json!({ "success": false, "error": message });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    let today = Local::now().date_naive();
    match service.eligibility(tier, query.period(), today) {
        Ok(partition) => {
            let payload = json!({ "success": true, "data": partition });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => {
            let payload = json!({ "success": false, "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn rule_eligibility_handler<D>(
    State(service): State<Arc<DistributionService<D>>>,
    Path(grade): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> Response
where
    D: MemberDirectory + 'static,
{
    let tier: GradeTier = match grade.parse() {
        Ok(tier) => tier,
        Err(message) => {
            let payload = json!({ "success": false, "error": message });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    let today = Local::now().date_naive();
    match service.rule_eligibility(tier, query.period(), today) {
        Ok(partition) => {
            let payload = json!({ "success": true, "data": partition });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => {
            let payload = json!({ "success": false, "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

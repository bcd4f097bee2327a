use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use crate::error::{map_db_error, AppError, AppResult};
use crate::services::report_jobs::ReportPoll;
use crate::state::AppState;

const STILL_PROCESSING: &str = "Report is still processing. Check back shortly.";

#[derive(Debug, Clone, serde::Deserialize, utoipa::IntoParams)]
pub(crate) struct TriggerReportQuery {
    store_id: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub(crate) struct TriggerReportResponse {
    pub repid: String,
}

#[derive(Debug, Clone, serde::Deserialize, utoipa::IntoParams)]
pub(crate) struct GetReportQuery {
    repid: Option<String>,
}

#[utoipa::path(
    get,
    path = "/trigger_report",
    params(TriggerReportQuery),
    responses(
        (status = 200, description = "Report job accepted", body = TriggerReportResponse),
        (status = 400, description = "Missing store_id")
    )
)]
pub(crate) async fn trigger_report(
    State(state): State<AppState>,
    Query(query): Query<TriggerReportQuery>,
) -> AppResult<Json<TriggerReportResponse>> {
    let store_id = query
        .store_id
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::bad_request("missing 'store_id' query parameter"))?;

    let repid = state.reports.submit(store_id.to_string());
    tracing::info!(repid = %repid, store_id = %store_id, "report triggered");
    Ok(Json(TriggerReportResponse {
        repid: repid.to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/get_report",
    params(GetReportQuery),
    responses(
        (status = 200, description = "Completed report CSV, or a plain-text still-processing notice", content_type = "text/csv", body = String),
        (status = 400, description = "Missing repid"),
        (status = 404, description = "Unknown report id"),
        (status = 500, description = "Report generation failed")
    )
)]
pub(crate) async fn get_report(
    State(state): State<AppState>,
    Query(query): Query<GetReportQuery>,
) -> AppResult<Response> {
    let repid = query
        .repid
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::bad_request("missing 'repid' query parameter"))?;

    // Job ids are opaque UUIDs; anything else can never have been issued.
    let Ok(job_id) = Uuid::parse_str(repid) else {
        return Err(AppError::not_found(format!("no report with id '{repid}'")));
    };

    match state.reports.poll(job_id).await.map_err(map_db_error)? {
        ReportPoll::NotFound => Err(AppError::not_found(format!("no report with id '{repid}'"))),
        ReportPoll::InProgress => Ok(STILL_PROCESSING.into_response()),
        ReportPoll::Failed => Err(AppError::internal(
            "report generation failed; submit a new report to retry",
        )),
        ReportPoll::Ready { csv } => Ok(csv_response(csv)),
    }
}

fn csv_response(csv: String) -> Response {
    let mut response = Response::new(Body::from(csv));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
    response.headers_mut().insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=\"report.csv\""),
    );
    response
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trigger_report", get(trigger_report))
        .route("/get_report", get(get_report))
}

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "store-monitor-rs",
        description = "Store uptime/downtime report service"
    ),
    paths(
        crate::routes::health::healthz_handler,
        crate::routes::reports::trigger_report,
        crate::routes::reports::get_report,
    ),
    components(schemas(
        crate::routes::health::HealthResponse,
        crate::routes::reports::TriggerReportResponse,
    ))
)]
struct ApiDoc;

pub fn openapi_json() -> serde_json::Value {
    serde_json::to_value(ApiDoc::openapi()).unwrap_or_else(|_| serde_json::json!({}))
}

pub(crate) async fn openapi_handler() -> Json<serde_json::Value> {
    Json(openapi_json())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_handler))
}

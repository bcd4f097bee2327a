use crate::config::MonitorConfig;
use crate::services::report_jobs::ReportJobService;
use axum::extract::FromRef;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: MonitorConfig,
    pub db: SqlitePool,
    pub reports: Arc<ReportJobService>,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> SqlitePool {
        state.db.clone()
    }
}

//! Asynchronous report jobs: an in-memory registry of submit/poll state plus
//! one bounded background build per submission.

use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::config::MonitorConfig;

use super::report;
use super::report_archive;
use super::status_store::Status;

/// Lifecycle: Pending -> Running -> Complete | Error. The serialized artifact
/// only exists on the Complete variant, so a poll can never observe a torn
/// state/artifact pair, and terminal states never regress.
#[derive(Debug, Clone)]
pub enum ReportJobState {
    Pending,
    Running,
    Complete { csv: String },
    Error { message: String },
}

impl ReportJobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Complete { .. } => "complete",
            Self::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportJob {
    pub store_id: String,
    pub state: ReportJobState,
}

/// Snapshot returned to pollers.
#[derive(Debug, Clone)]
pub enum ReportPoll {
    NotFound,
    InProgress,
    Failed,
    Ready { csv: String },
}

#[derive(Clone)]
pub struct ReportJobService {
    db: SqlitePool,
    default_prior_status: Status,
    default_timezone: String,
    jobs: Arc<Mutex<HashMap<Uuid, ReportJob>>>,
    permits: Arc<Semaphore>,
}

impl ReportJobService {
    pub fn new(db: SqlitePool, config: &MonitorConfig) -> Self {
        Self {
            db,
            default_prior_status: config.default_prior_status,
            default_timezone: config.default_timezone.clone(),
            jobs: Arc::new(Mutex::new(HashMap::new())),
            permits: Arc::new(Semaphore::new(config.max_concurrent_reports.max(1))),
        }
    }

    fn jobs_lock(&self) -> MutexGuard<'_, HashMap<Uuid, ReportJob>> {
        match self.jobs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("recovering report job registry from poisoned lock");
                poisoned.into_inner()
            }
        }
    }

    /// Registers a Pending job and schedules its build; returns immediately.
    pub fn submit(&self, store_id: String) -> Uuid {
        let job_id = Uuid::new_v4();
        {
            let mut jobs = self.jobs_lock();
            jobs.insert(
                job_id,
                ReportJob {
                    store_id: store_id.clone(),
                    state: ReportJobState::Pending,
                },
            );
        }

        let service = self.clone();
        tokio::spawn(async move {
            service.execute(job_id, store_id).await;
        });

        job_id
    }

    async fn execute(&self, job_id: Uuid, store_id: String) {
        let _permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                // Closed semaphore means the scheduler is gone; fail the job
                // instead of stranding it in Pending.
                self.transition(
                    job_id,
                    ReportJobState::Error {
                        message: "report scheduler unavailable".to_string(),
                    },
                );
                return;
            }
        };

        self.transition(job_id, ReportJobState::Running);
        tracing::info!(job_id = %job_id, store_id = %store_id, "report build started");

        let built = report::build_report(
            &self.db,
            &store_id,
            self.default_prior_status,
            &self.default_timezone,
        )
        .await
        .and_then(|artifact| artifact.to_csv());

        match built {
            Ok(csv) => {
                self.transition(job_id, ReportJobState::Complete { csv: csv.clone() });
                tracing::info!(job_id = %job_id, store_id = %store_id, "report build completed");
                if let Err(err) =
                    report_archive::put(&self.db, job_id, &store_id, &csv, Utc::now()).await
                {
                    // The in-memory completion stands; only restart recovery
                    // is degraded for this job.
                    tracing::error!(
                        job_id = %job_id,
                        error = %err,
                        "failed to archive completed report"
                    );
                }
            }
            Err(err) => {
                tracing::error!(
                    job_id = %job_id,
                    store_id = %store_id,
                    "report build failed: {err:#}"
                );
                self.transition(
                    job_id,
                    ReportJobState::Error {
                        message: err.to_string(),
                    },
                );
            }
        }
    }

    /// Single mutation point for job state. Terminal states never regress.
    fn transition(&self, job_id: Uuid, next: ReportJobState) {
        let mut jobs = self.jobs_lock();
        let Some(job) = jobs.get_mut(&job_id) else {
            return;
        };
        if job.state.is_terminal() {
            tracing::warn!(
                job_id = %job_id,
                store_id = %job.store_id,
                state = job.state.as_str(),
                "ignoring state transition on terminal job"
            );
            return;
        }
        job.state = next;
    }

    /// Non-blocking snapshot of a job. Falls back to the archive for jobs
    /// that completed before a restart; unknown everywhere means NotFound.
    pub async fn poll(&self, job_id: Uuid) -> Result<ReportPoll, sqlx::Error> {
        let resident = {
            let jobs = self.jobs_lock();
            jobs.get(&job_id).map(|job| match &job.state {
                ReportJobState::Pending | ReportJobState::Running => ReportPoll::InProgress,
                ReportJobState::Complete { csv } => ReportPoll::Ready { csv: csv.clone() },
                ReportJobState::Error { .. } => ReportPoll::Failed,
            })
        };
        if let Some(outcome) = resident {
            return Ok(outcome);
        }

        Ok(match report_archive::get(&self.db, job_id).await? {
            Some(csv) => ReportPoll::Ready { csv },
            None => ReportPoll::NotFound,
        })
    }
}

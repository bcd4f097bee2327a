use anyhow::Result;

use crate::services::status_store::Status;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub database_url: String,
    pub default_timezone: String,
    pub default_prior_status: Status,
    pub max_concurrent_reports: usize,
}

impl MonitorConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = env_string("MONITOR_DATABASE_URL", "sqlite://store_monitoring.db");

        let default_timezone = env_string("MONITOR_DEFAULT_TIMEZONE", "America/Chicago");
        if default_timezone.parse::<chrono_tz::Tz>().is_err() {
            anyhow::bail!(
                "MONITOR_DEFAULT_TIMEZONE is not a recognized IANA zone identifier: {default_timezone}"
            );
        }

        let default_prior_status =
            parse_prior_status(&env_string("MONITOR_DEFAULT_PRIOR_STATUS", "inactive"))?;

        let max_concurrent_reports =
            env_u64("MONITOR_MAX_CONCURRENT_REPORTS", 4).clamp(1, 64) as usize;

        Ok(Self {
            database_url,
            default_timezone,
            default_prior_status,
            max_concurrent_reports,
        })
    }
}

// The state assumed for a store's window when no event precedes it. Whether
// an unobserved store counts as up or down is a policy choice, so the
// default stays explicit and configurable.
fn parse_prior_status(value: &str) -> Result<Status> {
    match value.trim().to_lowercase().as_str() {
        "active" => Ok(Status::Active),
        "inactive" => Ok(Status::Inactive),
        other => anyhow::bail!(
            "MONITOR_DEFAULT_PRIOR_STATUS must be 'active' or 'inactive', got '{other}'"
        ),
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prior_status_values() {
        assert_eq!(parse_prior_status("active").unwrap(), Status::Active);
        assert_eq!(parse_prior_status(" Inactive ").unwrap(), Status::Inactive);
        assert!(parse_prior_status("unknown").is_err());
    }
}

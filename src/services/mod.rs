pub mod report;
pub mod report_archive;
pub mod report_jobs;
pub mod status_store;
pub mod timezone;
pub mod uptime;

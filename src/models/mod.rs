pub mod backup_job;
pub mod candidate_file;
pub mod config;
pub mod config_validator;
pub mod copy_report;
pub mod error;
pub mod run_totals;

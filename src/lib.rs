pub mod cli;
pub mod config;
pub mod error;
pub mod manifest;
pub mod orchestrator;
pub mod poll;
pub mod runner;
pub mod sync;
pub mod vm;
pub mod volume;

pub use config::BackupConfig;
pub use error::{BackupError, Result};
pub use orchestrator::{BackupJob, BackupSummary, Stage};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};

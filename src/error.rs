use std::path::PathBuf;
use thiserror::Error;

use crate::cli::args::RequiredFlag;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("No arguments given")]
    NoArguments,

    #[error("Missing required argument: {flag}")]
    MissingArgument { flag: RequiredFlag },

    #[error("Invalid share name '{share}': must be a single directory name under the source root")]
    InvalidShare { share: String },

    #[error("VM '{vm}' did not reach 'shut off' after {checks} status checks (last status: '{last_status}')")]
    ShutdownTimeout {
        vm: String,
        checks: u32,
        last_status: String,
    },

    #[error("Failed to request shutdown of VM '{vm}': {reason}")]
    ShutdownFailure { vm: String, reason: String },

    #[error("Failed to start VM '{vm}': {reason}")]
    StartFailure { vm: String, reason: String },

    #[error("Backup device with UUID {uuid} not found after {attempts} attempts: {reason}")]
    DeviceNotFound {
        uuid: String,
        attempts: u32,
        reason: String,
    },

    #[error("Failed to create mount directory {}: {source}", path.display())]
    MountDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to mount {} at {}: {reason}", device.display(), mount_dir.display())]
    MountFailure {
        device: PathBuf,
        mount_dir: PathBuf,
        reason: String,
    },

    #[error("Failed to unmount {}: {reason}", mount_dir.display())]
    UnmountFailure { mount_dir: PathBuf, reason: String },

    #[error("Failed to sync share '{share}': {reason}")]
    SyncFailure { share: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BackupError {
    /// Process exit code reported for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            BackupError::NoArguments => 100,
            BackupError::MissingArgument { flag } => flag.exit_code(),
            BackupError::InvalidShare { .. } => RequiredFlag::SharesToBackup.exit_code(),
            BackupError::ShutdownTimeout { .. } | BackupError::ShutdownFailure { .. } => 10,
            BackupError::DeviceNotFound { .. }
            | BackupError::MountDirectory { .. }
            | BackupError::MountFailure { .. } => 11,
            BackupError::SyncFailure { .. } => 12,
            BackupError::UnmountFailure { .. } => 13,
            BackupError::StartFailure { .. } => 14,
            BackupError::Io(_) | BackupError::Serialization(_) => 1,
        }
    }

    /// Whether the failure came from argument parsing, in which case usage is printed.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            BackupError::NoArguments
                | BackupError::MissingArgument { .. }
                | BackupError::InvalidShare { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;

use crate::{config::BackupConfig, poll::PollPolicy, runner::CommandRunner, BackupError, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Why a device UUID could not be resolved on a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The lookup ran but no block device carries the UUID (yet)
    NotFound,
    /// The lookup tool itself could not be run or failed unexpectedly
    Command(String),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NotFound => write!(f, "no block device with this UUID"),
            ResolveError::Command(reason) => write!(f, "device lookup failed: {}", reason),
        }
    }
}

pub struct VolumeManager<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a BackupConfig,
}

impl<'a> VolumeManager<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &'a BackupConfig) -> Self {
        Self { runner, config }
    }

    /// Mount point used for a backup device
    pub fn mount_dir(&self, device_uuid: &str) -> PathBuf {
        self.config.mount_dir_for(device_uuid)
    }

    fn poll(&self) -> PollPolicy {
        self.config.poll
    }

    /// Look up the block device carrying the filesystem UUID.
    pub fn resolve_device_path(&self, device_uuid: &str) -> std::result::Result<PathBuf, ResolveError> {
        let output = self
            .runner
            .run(&self.config.blkid_bin, &["-U".to_string(), device_uuid.to_string()])
            .map_err(|e| {
                ResolveError::Command(format!("failed to run {}: {}", self.config.blkid_bin, e))
            })?;

        // blkid exits 2 when nothing matches
        match output.code {
            Some(0) => {
                let path = output.stdout.trim();
                if path.is_empty() {
                    Err(ResolveError::NotFound)
                } else {
                    Ok(PathBuf::from(path))
                }
            }
            Some(2) => Err(ResolveError::NotFound),
            _ => Err(ResolveError::Command(output.failure_reason())),
        }
    }

    /// Wait for the device to appear, then mount it at `mount_dir`.
    ///
    /// Returns the resolved device path.
    pub fn mount(&self, device_uuid: &str, mount_dir: &Path) -> Result<PathBuf> {
        let policy = self.poll();
        let mut last_error = ResolveError::NotFound;

        let device = policy.poll_until(|attempt| {
            match self.resolve_device_path(device_uuid) {
                Ok(path) => Some(path),
                Err(e) => {
                    match &e {
                        ResolveError::NotFound => tracing::debug!(
                            uuid = %device_uuid,
                            attempt,
                            "Backup device not present yet"
                        ),
                        ResolveError::Command(reason) => tracing::warn!(
                            uuid = %device_uuid,
                            attempt,
                            reason = %reason,
                            "Device lookup failed"
                        ),
                    }
                    last_error = e;
                    None
                }
            }
        });

        let device = device.ok_or_else(|| BackupError::DeviceNotFound {
            uuid: device_uuid.to_string(),
            attempts: policy.attempts,
            reason: last_error.to_string(),
        })?;

        tracing::info!(
            uuid = %device_uuid,
            device = %device.display(),
            mount_dir = %mount_dir.display(),
            fs_type = %self.config.filesystem_type,
            "Mounting backup device"
        );

        fs::create_dir_all(mount_dir).map_err(|source| BackupError::MountDirectory {
            path: mount_dir.to_path_buf(),
            source,
        })?;

        let args = vec![
            "-t".to_string(),
            self.config.filesystem_type.clone(),
            device.to_string_lossy().into_owned(),
            mount_dir.to_string_lossy().into_owned(),
        ];

        let mount_failure = |reason: String| BackupError::MountFailure {
            device: device.clone(),
            mount_dir: mount_dir.to_path_buf(),
            reason,
        };

        let output = self
            .runner
            .run(&self.config.mount_bin, &args)
            .map_err(|e| mount_failure(format!("failed to run {}: {}", self.config.mount_bin, e)))?;

        if !output.success() {
            return Err(mount_failure(output.failure_reason()));
        }

        tracing::info!(
            device = %device.display(),
            mount_dir = %mount_dir.display(),
            "Backup device mounted"
        );

        Ok(device)
    }

    /// Single unmount attempt, no forced or lazy fallback.
    pub fn unmount(&self, mount_dir: &Path) -> Result<()> {
        tracing::info!(mount_dir = %mount_dir.display(), "Unmounting backup device");

        let unmount_failure = |reason: String| BackupError::UnmountFailure {
            mount_dir: mount_dir.to_path_buf(),
            reason,
        };

        let output = self
            .runner
            .run(
                &self.config.umount_bin,
                &[mount_dir.to_string_lossy().into_owned()],
            )
            .map_err(|e| unmount_failure(format!("failed to run {}: {}", self.config.umount_bin, e)))?;

        if !output.success() {
            return Err(unmount_failure(output.failure_reason()));
        }

        tracing::info!(mount_dir = %mount_dir.display(), "Backup device unmounted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod manager_tests;

use crate::{sync::ShareReport, vm::VmState, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the manifest at the root of the backup volume.
///
/// Shares are mirrored into sub-directories, so `--delete-after` never touches it.
pub const MANIFEST_FILE: &str = ".vm-share-backup.json";

/// Record of a completed mirror, left on the backup volume.
#[derive(Debug, Clone, Serialize)]
pub struct BackupManifest {
    pub vm_name: String,
    pub vm_state_before: VmState,
    pub device_uuid: String,
    pub device_path: PathBuf,
    pub source_root: PathBuf,
    pub shares: Vec<ShareReport>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub tool_version: String,
}

impl BackupManifest {
    pub fn path_in(mount_dir: &Path) -> PathBuf {
        mount_dir.join(MANIFEST_FILE)
    }

    /// Write the manifest as pretty JSON into `mount_dir`.
    pub fn write_to(&self, mount_dir: &Path) -> Result<PathBuf> {
        let path = Self::path_in(mount_dir);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        tracing::debug!(path = %path.display(), "Backup manifest written");
        Ok(path)
    }
}

use crate::poll::PollPolicy;
use std::path::PathBuf;

pub const SOURCE_ROOT_ENV: &str = "VM_BACKUP_SOURCE_ROOT";
pub const MOUNT_BASE_ENV: &str = "VM_BACKUP_MOUNT_BASE";
pub const FS_TYPE_ENV: &str = "VM_BACKUP_FS_TYPE";

#[derive(Debug, Clone)]
pub struct BackupConfig {
    // Layout
    pub source_root: PathBuf,
    pub mount_base: PathBuf,
    pub filesystem_type: String,

    // External tools
    pub virsh_bin: String,
    pub blkid_bin: String,
    pub mount_bin: String,
    pub umount_bin: String,
    pub rsync_bin: String,

    // Shutdown confirmation and device discovery share this policy
    pub poll: PollPolicy,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("/mnt/user"),
            mount_base: PathBuf::from("/mnt"),
            filesystem_type: "xfs".to_string(),
            virsh_bin: "virsh".to_string(),
            blkid_bin: "blkid".to_string(),
            mount_bin: "mount".to_string(),
            umount_bin: "umount".to_string(),
            rsync_bin: "rsync".to_string(),
            poll: PollPolicy::default(),
        }
    }
}

impl BackupConfig {
    /// Defaults with the optional `VM_BACKUP_*` environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(root) = non_empty(SOURCE_ROOT_ENV) {
            self.source_root = PathBuf::from(root);
        }
        if let Some(base) = non_empty(MOUNT_BASE_ENV) {
            self.mount_base = PathBuf::from(base);
        }
        if let Some(fs_type) = non_empty(FS_TYPE_ENV) {
            self.filesystem_type = fs_type.trim().to_string();
        }

        self
    }

    /// Mount point for a backup device: `<mount_base>/backup-<uuid>`
    pub fn mount_dir_for(&self, device_uuid: &str) -> PathBuf {
        self.mount_base.join(format!("backup-{}", device_uuid))
    }

    pub fn share_source(&self, share: &str) -> PathBuf {
        self.source_root.join(share)
    }
}

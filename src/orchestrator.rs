use crate::{
    cli::args::BackupRequest,
    config::BackupConfig,
    manifest::BackupManifest,
    runner::CommandRunner,
    sync::{ShareReport, SyncEngine},
    vm::{ShutdownOutcome, VmController},
    volume::VolumeManager,
    Result,
};
use chrono::Utc;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Stages of a backup run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ShutdownVm,
    MountBackup,
    PerformBackup,
    UnmountBackup,
    StartVm,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::ShutdownVm => write!(f, "shutdown-vm"),
            Stage::MountBackup => write!(f, "mount-backup"),
            Stage::PerformBackup => write!(f, "perform-backup"),
            Stage::UnmountBackup => write!(f, "unmount-backup"),
            Stage::StartVm => write!(f, "start-vm"),
        }
    }
}

/// What a successful run did.
#[derive(Debug, Clone)]
pub struct BackupSummary {
    pub shutdown: ShutdownOutcome,
    pub device_path: PathBuf,
    pub mount_dir: PathBuf,
    pub shares: Vec<ShareReport>,
    pub manifest: Option<PathBuf>,
    pub elapsed: Duration,
}

impl BackupSummary {
    /// Whether the VM had to be shut down by this run.
    pub fn vm_was_running(&self) -> bool {
        matches!(self.shutdown, ShutdownOutcome::Stopped { .. })
    }
}

/// Sequences VM shutdown, volume mount, share mirroring, unmount and VM start.
///
/// Every stage is terminal on failure and nothing is rolled back: a failed
/// sync leaves the volume mounted and the VM stopped for the operator.
pub struct BackupJob<'a> {
    config: &'a BackupConfig,
    vm: VmController<'a>,
    volumes: VolumeManager<'a>,
    sync: SyncEngine<'a>,
}

impl<'a> BackupJob<'a> {
    pub fn new(config: &'a BackupConfig, runner: &'a dyn CommandRunner) -> Self {
        Self {
            config,
            vm: VmController::new(runner, config),
            volumes: VolumeManager::new(runner, config),
            sync: SyncEngine::new(runner, config),
        }
    }

    pub fn run(&self, request: &BackupRequest) -> Result<BackupSummary> {
        let started = Instant::now();
        let started_at = Utc::now();
        let vm_name = request.vm_name();

        tracing::info!(
            vm = %vm_name,
            uuid = %request.device_uuid(),
            shares = ?request.shares(),
            "Starting backup"
        );

        enter(Stage::ShutdownVm);
        let shutdown = self.vm.shutdown(vm_name)?;

        enter(Stage::MountBackup);
        let mount_dir = self.volumes.mount_dir(request.device_uuid());
        let device_path = self.volumes.mount(request.device_uuid(), &mount_dir)?;

        enter(Stage::PerformBackup);
        let shares = self.sync.backup_shares(&mount_dir, request.shares())?;

        let manifest = BackupManifest {
            vm_name: vm_name.to_string(),
            vm_state_before: shutdown.previous_state(),
            device_uuid: request.device_uuid().to_string(),
            device_path: device_path.clone(),
            source_root: self.config.source_root.clone(),
            shares: shares.clone(),
            started_at,
            completed_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        };
        let manifest = match manifest.write_to(&mount_dir) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to write backup manifest, continuing");
                None
            }
        };

        enter(Stage::UnmountBackup);
        self.volumes.unmount(&mount_dir)?;

        enter(Stage::StartVm);
        self.vm.start(vm_name)?;

        let elapsed = started.elapsed();
        tracing::info!(vm = %vm_name, elapsed_secs = elapsed.as_secs(), "Backup completed");

        Ok(BackupSummary {
            shutdown,
            device_path,
            mount_dir,
            shares,
            manifest,
            elapsed,
        })
    }
}

fn enter(stage: Stage) {
    tracing::info!(stage = %stage, "Entering stage");
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod orchestrator_tests;

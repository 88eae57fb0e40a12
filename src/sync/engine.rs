use crate::{config::BackupConfig, runner::CommandRunner, BackupError, Result};
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};

/// Archive mode (-rlptgoD), deletions applied once the transfer is complete.
const MIRROR_OPTIONS: [&str; 2] = ["-a", "--delete-after"];

/// Result of one successfully mirrored share.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ShareReport {
    pub share: String,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

pub struct SyncEngine<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a BackupConfig,
}

impl<'a> SyncEngine<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &'a BackupConfig) -> Self {
        Self { runner, config }
    }

    /// rsync arguments mirroring `<source_root>/<share>` into `mount_dir`.
    ///
    /// No trailing slash on the source, so the share lands in `mount_dir/<share>`.
    pub fn mirror_args(&self, share: &str, mount_dir: &Path) -> Vec<String> {
        let mut args: Vec<String> = MIRROR_OPTIONS.iter().map(|opt| opt.to_string()).collect();
        args.push(self.config.share_source(share).to_string_lossy().into_owned());
        args.push(mount_dir.to_string_lossy().into_owned());
        args
    }

    /// Mirror every share in order, stopping at the first failure.
    ///
    /// Shares synced before a failure are left as they are.
    pub fn backup_shares(&self, mount_dir: &Path, shares: &[String]) -> Result<Vec<ShareReport>> {
        let mut reports = Vec::with_capacity(shares.len());

        for (index, share) in shares.iter().enumerate() {
            tracing::info!(
                share = %share,
                progress = %format!("{}/{}", index + 1, shares.len()),
                destination = %mount_dir.display(),
                "Syncing share"
            );

            let started = Instant::now();
            self.sync_share(share, mount_dir)?;
            let elapsed = started.elapsed();

            tracing::info!(share = %share, elapsed_secs = elapsed.as_secs(), "Share synced");
            reports.push(ShareReport {
                share: share.clone(),
                elapsed,
            });
        }

        Ok(reports)
    }

    fn sync_share(&self, share: &str, mount_dir: &Path) -> Result<()> {
        let args = self.mirror_args(share, mount_dir);

        let output = self
            .runner
            .run(&self.config.rsync_bin, &args)
            .map_err(|e| BackupError::SyncFailure {
                share: share.to_string(),
                reason: format!("failed to run {}: {}", self.config.rsync_bin, e),
            })?;

        if !output.success() {
            tracing::error!(share = %share, reason = %output.failure_reason(), "Share sync failed");
            return Err(BackupError::SyncFailure {
                share: share.to_string(),
                reason: output.failure_reason(),
            });
        }

        Ok(())
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::fake::{fail, ok, FakeRunner};
    use std::path::PathBuf;

    fn create_test_config() -> BackupConfig {
        BackupConfig {
            source_root: PathBuf::from("/mnt/user"),
            ..BackupConfig::default()
        }
    }

    #[test]
    fn test_mirror_args() {
        let runner = FakeRunner::new(|_, _| ok(""));
        let config = create_test_config();
        let engine = SyncEngine::new(&runner, &config);

        let args = engine.mirror_args("Share1", Path::new("/mnt/backup-AB12CD23"));
        assert_eq!(
            args,
            vec!["-a", "--delete-after", "/mnt/user/Share1", "/mnt/backup-AB12CD23"]
        );
    }

    #[test]
    fn test_backup_shares_in_order() {
        let runner = FakeRunner::new(|_, _| ok(""));
        let config = create_test_config();
        let engine = SyncEngine::new(&runner, &config);
        let shares = vec!["Share1".to_string(), "Share2".to_string()];

        let reports = engine
            .backup_shares(Path::new("/mnt/backup-X"), &shares)
            .unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].share, "Share1");
        assert_eq!(reports[1].share, "Share2");
        assert_eq!(
            runner.calls(),
            vec![
                "rsync -a --delete-after /mnt/user/Share1 /mnt/backup-X",
                "rsync -a --delete-after /mnt/user/Share2 /mnt/backup-X",
            ]
        );
    }

    #[test]
    fn test_backup_stops_at_first_failure() {
        let runner = FakeRunner::new(|_, args| {
            if args.iter().any(|arg| arg.ends_with("/B")) {
                fail(23, "rsync error: some files could not be transferred")
            } else {
                ok("")
            }
        });
        let config = create_test_config();
        let engine = SyncEngine::new(&runner, &config);
        let shares = vec!["A".to_string(), "B".to_string(), "C".to_string()];

        let err = engine
            .backup_shares(Path::new("/mnt/backup-X"), &shares)
            .unwrap_err();

        match &err {
            BackupError::SyncFailure { share, reason } => {
                assert_eq!(share, "B");
                assert!(reason.starts_with("exit code 23"));
            }
            other => panic!("expected SyncFailure, got {:?}", other),
        }
        assert_eq!(err.exit_code(), 12);

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].contains("/mnt/user/A"));
        assert!(calls[1].contains("/mnt/user/B"));
        assert!(!calls.iter().any(|call| call.contains("/mnt/user/C")));
    }

    #[test]
    fn test_report_serializes_seconds() {
        let report = ShareReport {
            share: "A".to_string(),
            elapsed: Duration::from_millis(1500),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["elapsed"], 1.5);
    }
}

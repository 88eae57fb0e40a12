use crate::{
    cli::args::BackupRequest,
    config::BackupConfig,
    orchestrator::{BackupJob, BackupSummary},
    runner::CommandRunner,
    BackupError,
};
use anyhow::Result;

/// Parse `argv` and run the backup. Nothing is executed unless parsing succeeds.
pub fn run_from_args(
    argv: &[String],
    config: &BackupConfig,
    runner: &dyn CommandRunner,
) -> Result<BackupSummary> {
    let request = BackupRequest::from_args(argv)?;
    execute(&request, config, runner)
}

/// Process exit code for an error returned by `run_from_args`.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<BackupError>()
        .map(BackupError::exit_code)
        .unwrap_or(1)
}

pub fn execute(
    request: &BackupRequest,
    config: &BackupConfig,
    runner: &dyn CommandRunner,
) -> Result<BackupSummary> {
    println!("Backing up shares for VM '{}'...", request.vm_name());
    println!("  Device UUID: {}", request.device_uuid());
    println!("  Mount point: {}", config.mount_dir_for(request.device_uuid()).display());
    println!("  Source root: {}", config.source_root.display());
    println!("  Shares:      {}", request.shares().join(", "));

    let job = BackupJob::new(config, runner);
    let summary = job.run(request)?;

    print_summary(request, &summary);

    Ok(summary)
}

fn print_summary(request: &BackupRequest, summary: &BackupSummary) {
    if summary.vm_was_running() {
        println!("\n✓ VM '{}' was shut down for the backup", request.vm_name());
    } else {
        println!("\n✓ VM '{}' was already shut off", request.vm_name());
    }

    println!(
        "✓ Mounted {} at {}",
        summary.device_path.display(),
        summary.mount_dir.display()
    );

    for report in &summary.shares {
        println!(
            "✓ Share '{}' synced ({:.1}s)",
            report.share,
            report.elapsed.as_secs_f64()
        );
    }

    match &summary.manifest {
        Some(path) => println!("✓ Manifest written to {}", path.display()),
        None => println!("  Warning: backup manifest could not be written"),
    }

    println!("✓ Backup device unmounted");
    println!("✓ VM '{}' started", request.vm_name());
    println!(
        "\n✓ Backup completed successfully in {:.1}s",
        summary.elapsed.as_secs_f64()
    );
}

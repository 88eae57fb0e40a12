use std::process::ExitCode;
use vm_share_backup::{
    cli::{
        self,
        args::{self, HELP_FLAGS, VERBOSE_FLAGS},
    },
    BackupConfig, BackupError, SystemRunner,
};

const PROGRAM: &str = "vm-share-backup";

fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    // Initialize logging
    if args::has_flag(&argv, VERBOSE_FLAGS) {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    if args::has_flag(&argv, HELP_FLAGS) {
        println!("{}", args::usage(PROGRAM));
        return ExitCode::SUCCESS;
    }

    let config = BackupConfig::from_env();
    let runner = SystemRunner::new();

    match cli::backup::run_from_args(&argv, &config, &runner) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            let code = cli::backup::exit_code(&err);

            let usage_error = err
                .downcast_ref::<BackupError>()
                .is_some_and(BackupError::is_usage_error);
            if usage_error {
                eprintln!("{}\n", args::usage(PROGRAM));
            }

            tracing::debug!(exit_code = code, "Backup aborted");
            eprintln!("Error: {:#}", err);

            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

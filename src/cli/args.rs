use crate::{BackupError, Result};
use std::fmt;
use std::path::{Component, Path};

pub const VERBOSE_FLAGS: (&str, &str) = ("--verbose", "-v");
pub const HELP_FLAGS: (&str, &str) = ("--help", "-h");

/// The three named values every invocation must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredFlag {
    VmName,
    BackupDeviceUuid,
    SharesToBackup,
}

impl RequiredFlag {
    pub fn long(&self) -> &'static str {
        match self {
            RequiredFlag::VmName => "--vm-name",
            RequiredFlag::BackupDeviceUuid => "--backup-device-uuid",
            RequiredFlag::SharesToBackup => "--shares-to-backup",
        }
    }

    pub fn short(&self) -> &'static str {
        match self {
            RequiredFlag::VmName => "-vm",
            RequiredFlag::BackupDeviceUuid => "-bdu",
            RequiredFlag::SharesToBackup => "-s2b",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            RequiredFlag::VmName => 101,
            RequiredFlag::BackupDeviceUuid => 102,
            RequiredFlag::SharesToBackup => 103,
        }
    }
}

impl fmt::Display for RequiredFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.long(), self.short())
    }
}

/// One backup run: which VM to stop, which device to mount, which shares to mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRequest {
    vm_name: String,
    device_uuid: String,
    shares: Vec<String>,
}

impl BackupRequest {
    /// Build a request from the raw argument vector (program name excluded).
    pub fn from_args(args: &[String]) -> Result<Self> {
        if args.is_empty() {
            return Err(BackupError::NoArguments);
        }

        let vm_name = required_value(args, RequiredFlag::VmName)?;
        let device_uuid = required_value(args, RequiredFlag::BackupDeviceUuid)?;
        let shares = split_shares(&required_value(args, RequiredFlag::SharesToBackup)?);

        if shares.is_empty() {
            return Err(BackupError::MissingArgument {
                flag: RequiredFlag::SharesToBackup,
            });
        }

        if let Some(share) = shares.iter().find(|share| !is_share_name(share)) {
            return Err(BackupError::InvalidShare {
                share: share.clone(),
            });
        }

        Ok(Self {
            vm_name,
            device_uuid,
            shares,
        })
    }

    pub fn vm_name(&self) -> &str {
        &self.vm_name
    }

    pub fn device_uuid(&self) -> &str {
        &self.device_uuid
    }

    pub fn shares(&self) -> &[String] {
        &self.shares
    }
}

/// Value following the first occurrence of either spelling of a flag.
///
/// Returns `None` if the flag is absent or is the last token.
pub fn flag_value<'a>(args: &'a [String], long: &str, short: &str) -> Option<&'a str> {
    let index = args.iter().position(|arg| arg == long || arg == short)?;
    args.get(index + 1).map(String::as_str)
}

pub fn has_flag(args: &[String], (long, short): (&str, &str)) -> bool {
    args.iter().any(|arg| arg == long || arg == short)
}

fn required_value(args: &[String], flag: RequiredFlag) -> Result<String> {
    match flag_value(args, flag.long(), flag.short()) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(BackupError::MissingArgument { flag }),
    }
}

/// A share is exactly one plain directory name: no root, no `.`/`..`, no separators.
fn is_share_name(share: &str) -> bool {
    let mut components = Path::new(share).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !share.ends_with('/')
}

fn split_shares(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|share| !share.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn usage(program: &str) -> String {
    format!(
        "Usage: {program} {vm} <name> {bdu} <uuid> {s2b} <share1,share2,...> [--verbose|-v]\n\
         \n\
         Stops the VM, mounts the backup device at <mount base>/backup-<uuid>,\n\
         mirrors each share onto it, unmounts it and starts the VM again.",
        program = program,
        vm = RequiredFlag::VmName,
        bdu = RequiredFlag::BackupDeviceUuid,
        s2b = RequiredFlag::SharesToBackup,
    )
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod args_tests;

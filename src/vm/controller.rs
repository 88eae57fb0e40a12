use crate::{
    config::BackupConfig,
    poll::PollPolicy,
    runner::CommandRunner,
    vm::VmState,
    BackupError, Result,
};

/// How `shutdown` reached the "shut off" state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The VM was already shut off, no request was sent
    AlreadyStopped,
    /// A shutdown request was sent and confirmed after `checks` status checks
    Stopped { checks: u32, previous: VmState },
}

impl ShutdownOutcome {
    /// State the VM was in before the shutdown stage.
    pub fn previous_state(&self) -> VmState {
        match self {
            ShutdownOutcome::AlreadyStopped => VmState::ShutOff,
            ShutdownOutcome::Stopped { previous, .. } => previous.clone(),
        }
    }
}

pub struct VmController<'a> {
    runner: &'a dyn CommandRunner,
    virsh: String,
    poll: PollPolicy,
}

impl<'a> VmController<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &BackupConfig) -> Self {
        Self {
            runner,
            virsh: config.virsh_bin.clone(),
            poll: config.poll,
        }
    }

    /// Status text of the named VM, e.g. "running" or "shut off".
    ///
    /// Empty if the VM is not listed or the listing could not be obtained.
    pub fn query_status(&self, vm_name: &str) -> String {
        let output = match self
            .runner
            .run(&self.virsh, &["list".to_string(), "--all".to_string()])
        {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(vm = %vm_name, error = %e, "Failed to run VM listing");
                return String::new();
            }
        };

        if !output.success() {
            tracing::warn!(
                vm = %vm_name,
                reason = %output.failure_reason(),
                "VM listing failed"
            );
            return String::new();
        }

        parse_status(&output.stdout, vm_name).unwrap_or_default()
    }

    pub fn state(&self, vm_name: &str) -> VmState {
        VmState::from_status(&self.query_status(vm_name))
    }

    /// Gracefully shut down the VM and wait until it reports "shut off".
    pub fn shutdown(&self, vm_name: &str) -> Result<ShutdownOutcome> {
        let initial = self.state(vm_name);
        if initial.is_shut_off() {
            tracing::info!(vm = %vm_name, "VM is already shut off, nothing to do");
            return Ok(ShutdownOutcome::AlreadyStopped);
        }

        if initial == VmState::Unknown {
            tracing::warn!(vm = %vm_name, "VM not found in listing, requesting shutdown anyway");
        }

        tracing::info!(vm = %vm_name, state = %initial, "Requesting VM shutdown");

        let output = self
            .runner
            .run(&self.virsh, &["shutdown".to_string(), vm_name.to_string()])
            .map_err(|e| BackupError::ShutdownFailure {
                vm: vm_name.to_string(),
                reason: format!("failed to run {}: {}", self.virsh, e),
            })?;

        // The status poll below decides the outcome
        if !output.success() {
            tracing::warn!(
                vm = %vm_name,
                reason = %output.failure_reason(),
                "Shutdown request reported failure"
            );
        }

        let mut last_state = initial.clone();
        let confirmed = self.poll.poll_until(|attempt| {
            last_state = self.state(vm_name);
            tracing::debug!(vm = %vm_name, attempt, state = %last_state, "Waiting for shutdown");
            last_state.is_shut_off().then_some(attempt + 1)
        });

        match confirmed {
            Some(checks) => {
                tracing::info!(vm = %vm_name, checks, "VM shut off");
                Ok(ShutdownOutcome::Stopped {
                    checks,
                    previous: initial,
                })
            }
            None => {
                tracing::error!(
                    vm = %vm_name,
                    checks = self.poll.attempts,
                    state = %last_state,
                    "VM did not shut off in time"
                );
                Err(BackupError::ShutdownTimeout {
                    vm: vm_name.to_string(),
                    checks: self.poll.attempts,
                    last_status: last_state.to_string(),
                })
            }
        }
    }

    /// Request a VM start. Only the exit code is checked, the state is not polled.
    pub fn start(&self, vm_name: &str) -> Result<()> {
        tracing::info!(vm = %vm_name, "Starting VM");

        let output = self
            .runner
            .run(&self.virsh, &["start".to_string(), vm_name.to_string()])
            .map_err(|e| BackupError::StartFailure {
                vm: vm_name.to_string(),
                reason: format!("failed to run {}: {}", self.virsh, e),
            })?;

        if !output.success() {
            return Err(BackupError::StartFailure {
                vm: vm_name.to_string(),
                reason: output.failure_reason(),
            });
        }

        tracing::info!(vm = %vm_name, "VM start requested successfully");
        Ok(())
    }
}

/// Extract the state column for `vm_name` from `virsh list --all` output.
///
/// Rows look like ` 3    Backups    running` or ` -    Backups    shut off`;
/// everything after the name column is the state. The header above the
/// `----` separator is skipped.
fn parse_status(listing: &str, vm_name: &str) -> Option<String> {
    let mut lines = listing.lines();
    lines.find(|line| line.trim_start().starts_with("---"))?;

    lines.find_map(|line| {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 || fields[1] != vm_name {
            return None;
        }
        Some(fields[2..].join(" "))
    })
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod controller_tests;

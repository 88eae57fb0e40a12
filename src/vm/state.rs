use serde::Serialize;

pub const SHUT_OFF: &str = "shut off";
pub const RUNNING: &str = "running";

/// Run state of a VM as reported by `virsh list --all`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum VmState {
    Running,
    ShutOff,
    /// Transitional or unknown states ("paused", "in shutdown", ...)
    Other(String),
    /// VM not listed, or the listing failed
    Unknown,
}

impl VmState {
    pub fn from_status(status: &str) -> Self {
        match status.trim() {
            "" => VmState::Unknown,
            SHUT_OFF => VmState::ShutOff,
            RUNNING => VmState::Running,
            other => VmState::Other(other.to_string()),
        }
    }

    pub fn is_shut_off(&self) -> bool {
        matches!(self, VmState::ShutOff)
    }
}

impl std::fmt::Display for VmState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VmState::Running => write!(f, "{}", RUNNING),
            VmState::ShutOff => write!(f, "{}", SHUT_OFF),
            VmState::Other(status) => write!(f, "{}", status),
            VmState::Unknown => write!(f, "unknown"),
        }
    }
}

// VM run-state control through the virtualization CLI
pub mod controller;
pub mod state;

pub use controller::{ShutdownOutcome, VmController};
pub use state::VmState;

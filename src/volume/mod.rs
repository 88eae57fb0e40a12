// Backup volume discovery and mounting
pub mod manager;

pub use manager::{ResolveError, VolumeManager};

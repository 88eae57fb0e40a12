// Share mirroring onto the mounted backup volume
pub mod engine;

pub use engine::{ShareReport, SyncEngine};

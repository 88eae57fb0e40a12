// CLI module - argument scanning and the backup command
pub mod args;
pub mod backup;

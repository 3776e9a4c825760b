mod setup;

pub use setup::{validate_additional, validate_entry, validate_entry_with_retry, EntryContext};

pub mod config;

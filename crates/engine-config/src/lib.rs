pub mod error;
pub mod loader;
pub mod schedule;
pub mod settings;

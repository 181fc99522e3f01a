pub mod error;
pub mod runner;
pub mod scheduler;
pub mod sink;

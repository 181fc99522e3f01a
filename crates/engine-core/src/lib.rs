pub mod connectors;
pub mod error;
pub mod load;
pub mod memory;
pub mod metrics;
pub mod state;
pub mod watermark;

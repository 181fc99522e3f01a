//! Minimal RESP2 client for the destination and checkpoint store.

pub mod client;
pub mod command;
pub mod error;

pub use client::{RedisClient, RedisOptions};
pub use error::RedisError;

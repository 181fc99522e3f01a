pub mod redis;
pub mod sql;

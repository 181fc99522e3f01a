pub mod dialect;
pub mod select;

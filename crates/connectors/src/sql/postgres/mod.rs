pub mod adapter;
mod cancel;
pub mod coercion;
pub mod params;
pub mod row;
pub mod utils;

pub mod error;
pub mod query;

pub use error::PlanError;
pub use query::select::{SelectPlan, SelectSpec, build_select};

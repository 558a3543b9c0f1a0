pub mod rejection;
pub mod services;

pub use rejection::{Decision, Rejection};
pub use services::decision_engine::{BUY_ALLOCATION, DecisionEngine};

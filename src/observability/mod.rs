// Observability: metrics, logging

pub mod metrics;

pub use crate::logging::init_logging;
pub use metrics::{init, render};

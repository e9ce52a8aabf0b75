// src/output/mod.rs
//! Output handling with planning separated from execution.
//!
//! A plan is plain data; `deliver` is the only place that touches the
//! filesystem or stdout.

mod types;
mod writer;

pub use types::{CompletedOperation, DeliveryTarget, FailedOperation, OutputPlan, OutputReport};
pub use writer::deliver;

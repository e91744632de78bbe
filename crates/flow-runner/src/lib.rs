//! Flow execution layer
//!
//! This crate turns a declarative list of steps into driver calls: locator
//! chains are resolved first-match-wins under a per-step deadline, optional
//! steps downgrade a missed match to a skip, and the first hard failure ends
//! the flow with a structured report.

pub mod error;
pub mod runner;
pub mod types;

pub use error::FlowError;
pub use runner::{FlowRunner, RunnerConfig};
pub use types::{Action, Flow, FlowFailure, FlowReport, Step, StepReport, StepStatus};

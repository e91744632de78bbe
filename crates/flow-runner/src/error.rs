//! Flow execution error types

use cdp_driver::{DriverError, DriverErrorKind};
use thiserror::Error;

/// Terminal flow failures.
///
/// Every variant ends the flow; there is no retry above the per-step
/// resolution loop.
#[derive(Debug, Error)]
pub enum FlowError {
    /// No locator in a chain matched before the step deadline
    #[error("element not found: {0}")]
    ElementNotFound(String),

    /// A driver action did not finish before its deadline
    #[error("action timed out: {0}")]
    ActionTimeout(String),

    /// An expectation about the page did not hold
    #[error("assertion failed: {0}")]
    AssertionFailure(String),

    /// Flow definition rejected before execution
    #[error("invalid flow: {0}")]
    Validation(String),

    /// The flow exceeded its overall deadline
    #[error("flow timed out after {0}ms")]
    Timeout(u64),

    /// Browser-side failure outside the resolution loop
    #[error("driver failure: {0}")]
    Driver(String),
}

impl FlowError {
    /// Stable machine-readable tag used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            FlowError::ElementNotFound(_) => "element-not-found",
            FlowError::ActionTimeout(_) => "action-timeout",
            FlowError::AssertionFailure(_) => "assertion-failure",
            FlowError::Validation(_) => "validation",
            FlowError::Timeout(_) => "flow-timeout",
            FlowError::Driver(_) => "driver",
        }
    }

    /// Classify a driver error into the flow vocabulary.
    pub fn from_driver(err: DriverError) -> Self {
        match err.kind {
            DriverErrorKind::NavTimeout => FlowError::ActionTimeout(err.to_string()),
            DriverErrorKind::TargetNotFound | DriverErrorKind::OptionNotFound => {
                FlowError::ElementNotFound(err.to_string())
            }
            _ => FlowError::Driver(err.to_string()),
        }
    }
}

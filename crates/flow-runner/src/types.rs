//! Core types for flow execution

use chrono::{DateTime, Utc};
use element_locator::LocatorChain;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A single page interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Navigate to a URL and wait for the document to become usable
    Navigate { url: String },

    /// Click the first visible match of the chain
    Click { target: LocatorChain },

    /// Replace the content of the first visible match with `value`
    Fill { target: LocatorChain, value: String },

    /// Choose an option on the first visible `<select>` match
    Select { target: LocatorChain, option: String },

    /// Wait until no request has been in flight for the quiet window
    WaitNetworkQuiet,

    /// Sleep for a fixed number of milliseconds
    Pause { ms: u64 },

    /// Assert that the chain matches a visible element
    ExpectVisible { target: LocatorChain },
}

impl Action {
    /// Short tag used in step reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Navigate { .. } => "navigate",
            Action::Click { .. } => "click",
            Action::Fill { .. } => "fill",
            Action::Select { .. } => "select",
            Action::WaitNetworkQuiet => "wait_network_quiet",
            Action::Pause { .. } => "pause",
            Action::ExpectVisible { .. } => "expect_visible",
        }
    }
}

/// One step of a flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Step identifier, unique within the flow
    pub id: String,

    /// Human-readable label for logs and reports
    pub label: String,

    /// Action to perform
    pub action: Action,

    /// Optional steps skip instead of failing when nothing matches
    #[serde(default)]
    pub optional: bool,

    /// Per-step deadline override in milliseconds
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Step {
    /// Create a new step
    pub fn new(id: impl Into<String>, label: impl Into<String>, action: Action) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            action,
            optional: false,
            timeout_ms: None,
        }
    }

    /// Mark the step optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Override the step deadline
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

/// Flow definition, an ordered list of steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    /// Flow name
    pub name: String,

    /// Flow description
    pub description: String,

    /// Steps in execution order
    pub steps: Vec<Step>,

    /// Flow-level timeout in milliseconds
    pub timeout_ms: u64,
}

impl Flow {
    /// Create a new flow
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            steps: Vec::new(),
            timeout_ms: 300_000, // 5 minutes default
        }
    }

    /// Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Append a step
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }
}

/// Outcome of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Skipped,
    Failed,
}

/// Step execution record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    /// Step identifier
    pub step_id: String,

    /// Human-readable label copied from the step
    pub label: String,

    /// Action tag
    pub kind: String,

    /// Outcome
    pub status: StepStatus,

    /// Start time
    pub started_at: DateTime<Utc>,

    /// Finish time
    pub finished_at: DateTime<Utc>,

    /// Latency in milliseconds
    pub latency_ms: u64,

    /// Locator that finally matched, for chain actions
    pub matched_by: Option<String>,

    /// Error message if failed
    pub error: Option<String>,
}

impl StepReport {
    /// Create a new step report
    pub fn new(step_id: impl Into<String>, label: impl Into<String>, kind: &str) -> Self {
        let now = Utc::now();
        Self {
            step_id: step_id.into(),
            label: label.into(),
            kind: kind.to_string(),
            status: StepStatus::Failed,
            started_at: now,
            finished_at: now,
            latency_ms: 0,
            matched_by: None,
            error: None,
        }
    }

    /// Mark as passed
    pub fn passed(mut self, matched_by: Option<String>) -> Self {
        self.status = StepStatus::Passed;
        self.matched_by = matched_by;
        self
    }

    /// Mark as skipped
    pub fn skipped(mut self) -> Self {
        self.status = StepStatus::Skipped;
        self
    }

    /// Mark as failed
    pub fn failed(mut self, error: String) -> Self {
        self.status = StepStatus::Failed;
        self.error = Some(error);
        self
    }

    /// Set finish time and calculate latency
    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self.latency_ms = (self.finished_at - self.started_at).num_milliseconds() as u64;
        self
    }
}

/// Why a flow stopped early.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowFailure {
    /// Step that was executing, or about to execute, when the flow stopped
    pub step_id: String,

    /// Machine-readable failure tag
    pub kind: String,

    /// Human-readable message
    pub message: String,
}

impl FlowFailure {
    /// Build a failure record from a flow error
    pub fn new(step_id: impl Into<String>, err: &crate::error::FlowError) -> Self {
        Self {
            step_id: step_id.into(),
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Flow execution record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowReport {
    /// Unique identifier of this run
    pub run_id: Uuid,

    /// Flow name
    pub flow: String,

    /// Overall success
    pub ok: bool,

    /// Start time
    pub started_at: DateTime<Utc>,

    /// Finish time
    pub finished_at: DateTime<Utc>,

    /// Total latency in milliseconds
    pub latency_ms: u64,

    /// Per-step records, in execution order
    pub steps: Vec<StepReport>,

    /// Failure details when `ok` is false
    pub failure: Option<FlowFailure>,

    /// Screenshot captured on failure, if any
    pub screenshot: Option<PathBuf>,
}

impl FlowReport {
    /// Create a new flow report
    pub fn new(flow: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            flow: flow.into(),
            ok: false,
            started_at: now,
            finished_at: now,
            latency_ms: 0,
            steps: Vec::new(),
            failure: None,
            screenshot: None,
        }
    }

    /// Mark as successful
    pub fn succeed(mut self) -> Self {
        self.ok = true;
        self
    }

    /// Set finish time and calculate latency
    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self.latency_ms = (self.finished_at - self.started_at).num_milliseconds() as u64;
        self
    }
}

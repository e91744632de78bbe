//! Flow runner implementation

use crate::error::FlowError;
use crate::types::{Action, Flow, FlowFailure, FlowReport, Step, StepReport};
use cdp_driver::{DriverErrorKind, PageDriver};
use element_locator::{Locator, LocatorChain};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

/// Tunable bounds applied to every step.
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Default per-step deadline in milliseconds
    pub action_timeout_ms: u64,

    /// Deadline for steps marked optional
    pub optional_timeout_ms: u64,

    /// Poll interval while resolving locator chains
    pub poll_interval_ms: u64,

    /// Quiet window for network-quiet waits
    pub network_quiet_ms: u64,

    /// Deadline for network-quiet waits
    pub navigation_timeout_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            action_timeout_ms: 30_000,
            optional_timeout_ms: 5_000,
            poll_interval_ms: 100,
            network_quiet_ms: 500,
            navigation_timeout_ms: 60_000,
        }
    }
}

/// Executes flows step by step against a [`PageDriver`].
pub struct FlowRunner {
    driver: Arc<dyn PageDriver>,
    config: RunnerConfig,
}

impl FlowRunner {
    /// Create a new runner
    pub fn new(driver: Arc<dyn PageDriver>, config: RunnerConfig) -> Self {
        Self { driver, config }
    }

    /// Run a flow to completion or first terminal failure.
    ///
    /// Returns `Err` only when the flow definition itself is rejected;
    /// execution outcomes, including timeouts, land in the report.
    pub async fn run(&self, flow: &Flow) -> Result<FlowReport, FlowError> {
        info!("Executing flow: {} ({} steps)", flow.name, flow.steps.len());
        self.validate(flow)?;

        let mut report = FlowReport::new(flow.name.clone());
        debug!("Run {} started", report.run_id);

        match timeout(
            Duration::from_millis(flow.timeout_ms),
            self.run_steps(flow, &mut report),
        )
        .await
        {
            Ok(None) => {
                info!("Flow {} completed ({} steps)", flow.name, report.steps.len());
                Ok(report.succeed().finish())
            }
            Ok(Some(err)) => {
                warn!("Flow {} failed: {}", flow.name, err);
                Ok(report.finish())
            }
            Err(_) => {
                warn!("Flow {} timed out after {}ms", flow.name, flow.timeout_ms);
                let pending = flow
                    .steps
                    .get(report.steps.len())
                    .map(|step| step.id.clone())
                    .unwrap_or_default();
                let err = FlowError::Timeout(flow.timeout_ms);
                report.failure = Some(FlowFailure::new(pending, &err));
                Ok(report.finish())
            }
        }
    }

    fn validate(&self, flow: &Flow) -> Result<(), FlowError> {
        if flow.name.is_empty() {
            return Err(FlowError::Validation("flow name cannot be empty".into()));
        }
        if flow.steps.is_empty() {
            return Err(FlowError::Validation("flow has no steps".into()));
        }
        if flow.timeout_ms == 0 {
            return Err(FlowError::Validation(
                "flow timeout must be greater than 0".into(),
            ));
        }
        let mut seen = HashSet::new();
        for step in &flow.steps {
            if step.id.is_empty() {
                return Err(FlowError::Validation("step id cannot be empty".into()));
            }
            if !seen.insert(step.id.as_str()) {
                return Err(FlowError::Validation(format!(
                    "duplicate step id '{}'",
                    step.id
                )));
            }
        }
        Ok(())
    }

    /// Execute steps in order; the first terminal failure is recorded and
    /// returned, later steps never run.
    async fn run_steps(&self, flow: &Flow, report: &mut FlowReport) -> Option<FlowError> {
        for (index, step) in flow.steps.iter().enumerate() {
            debug!(
                "Step {}/{}: {} ({})",
                index + 1,
                flow.steps.len(),
                step.id,
                step.action.kind()
            );
            let (step_report, failure) = self.execute_step(step).await;
            report.steps.push(step_report);
            if let Some(err) = failure {
                report.failure = Some(FlowFailure::new(step.id.clone(), &err));
                return Some(err);
            }
        }
        None
    }

    async fn execute_step(&self, step: &Step) -> (StepReport, Option<FlowError>) {
        let report = StepReport::new(step.id.clone(), step.label.clone(), step.action.kind());
        let deadline_ms = self.step_deadline_ms(step);

        match self.perform(step, deadline_ms).await {
            Ok(matched_by) => {
                info!("Step {} passed", step.id);
                (report.passed(matched_by).finish(), None)
            }
            Err(FlowError::ElementNotFound(reason)) if step.optional => {
                debug!("Optional step {} skipped: {}", step.id, reason);
                (report.skipped().finish(), None)
            }
            Err(err) => {
                warn!("Step {} failed: {}", step.id, err);
                (report.failed(err.to_string()).finish(), Some(err))
            }
        }
    }

    fn step_deadline_ms(&self, step: &Step) -> u64 {
        if let Some(ms) = step.timeout_ms {
            return ms;
        }
        match step.action {
            Action::WaitNetworkQuiet => self.config.navigation_timeout_ms,
            _ if step.optional => self.config.optional_timeout_ms,
            _ => self.config.action_timeout_ms,
        }
    }

    async fn perform(&self, step: &Step, deadline_ms: u64) -> Result<Option<String>, FlowError> {
        match &step.action {
            Action::Navigate { url } => {
                self.driver.goto(url).await.map_err(FlowError::from_driver)?;
                Ok(None)
            }
            Action::Click { target } => {
                let locator = self.resolve(target, deadline_ms).await?;
                self.driver
                    .click(&locator)
                    .await
                    .map_err(FlowError::from_driver)?;
                Ok(Some(locator.to_string()))
            }
            Action::Fill { target, value } => {
                let locator = self.resolve(target, deadline_ms).await?;
                self.driver
                    .type_text(&locator, value)
                    .await
                    .map_err(FlowError::from_driver)?;
                Ok(Some(locator.to_string()))
            }
            Action::Select { target, option } => {
                let locator = self.resolve(target, deadline_ms).await?;
                self.driver
                    .select_option(&locator, option)
                    .await
                    .map_err(FlowError::from_driver)?;
                Ok(Some(locator.to_string()))
            }
            Action::WaitNetworkQuiet => {
                self.driver
                    .wait_network_quiet(self.config.network_quiet_ms, deadline_ms)
                    .await
                    .map_err(FlowError::from_driver)?;
                Ok(None)
            }
            Action::Pause { ms } => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
                Ok(None)
            }
            Action::ExpectVisible { target } => match self.resolve(target, deadline_ms).await {
                Ok(locator) => Ok(Some(locator.to_string())),
                Err(FlowError::ElementNotFound(reason)) => {
                    Err(FlowError::AssertionFailure(reason))
                }
                Err(err) => Err(err),
            },
        }
    }

    /// Poll the chain until a locator matches, in declaration order. The
    /// first hit wins; later locators are only probed when earlier ones
    /// missed in the same sweep.
    async fn resolve(&self, chain: &LocatorChain, deadline_ms: u64) -> Result<Locator, FlowError> {
        let deadline = Instant::now() + Duration::from_millis(deadline_ms);
        let poll = Duration::from_millis(self.config.poll_interval_ms);
        loop {
            for locator in chain.iter() {
                match self.driver.probe(locator).await {
                    Ok(Some(_)) => return Ok(locator.clone()),
                    Ok(None) => {}
                    Err(err) if matches!(err.kind, DriverErrorKind::Eval) => {
                        // transient while the page rebuilds
                        debug!("Probe for {} failed transiently: {}", locator, err);
                    }
                    Err(err) => return Err(FlowError::from_driver(err)),
                }
            }
            if Instant::now() >= deadline {
                return Err(FlowError::ElementNotFound(format!(
                    "no locator matched within {deadline_ms}ms: {chain}"
                )));
            }
            tokio::time::sleep(poll).await;
        }
    }
}

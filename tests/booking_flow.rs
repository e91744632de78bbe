//! Drives the complete booking flow against an in-memory portal double.

use async_trait::async_trait;
use carebook_cli::config::HarnessConfig;
use carebook_cli::data::SeedData;
use carebook_cli::scenarios::booking_flow;
use cdp_driver::{DriverError, DriverErrorKind, DriverResult, PageDriver};
use element_locator::{ElementHit, Locator};
use flow_runner::{Action, Flow, FlowRunner, RunnerConfig, StepStatus};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Portal double keyed by rendered locators. Probes hit whenever the
/// locator is in the visible set, so a flow built from chains exercises
/// exactly the fallback order the real page would.
struct MockPortal {
    visible: Mutex<HashSet<String>>,
    clicks: Mutex<Vec<String>>,
    fills: Mutex<Vec<(String, String)>>,
}

impl MockPortal {
    fn new(visible: HashSet<String>) -> Self {
        Self {
            visible: Mutex::new(visible),
            clicks: Mutex::new(Vec::new()),
            fills: Mutex::new(Vec::new()),
        }
    }

    fn is_visible(&self, locator: &Locator) -> bool {
        self.visible.lock().unwrap().contains(&locator.to_string())
    }

    fn clicks(&self) -> Vec<String> {
        self.clicks.lock().unwrap().clone()
    }

    fn fills(&self) -> Vec<(String, String)> {
        self.fills.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageDriver for MockPortal {
    async fn goto(&self, _url: &str) -> DriverResult<()> {
        Ok(())
    }

    async fn probe(&self, locator: &Locator) -> DriverResult<Option<ElementHit>> {
        Ok(self
            .is_visible(locator)
            .then(|| ElementHit { x: 50.0, y: 50.0 }))
    }

    async fn click(&self, locator: &Locator) -> DriverResult<()> {
        if self.is_visible(locator) {
            self.clicks.lock().unwrap().push(locator.to_string());
            Ok(())
        } else {
            Err(DriverError::new(DriverErrorKind::TargetNotFound))
        }
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> DriverResult<()> {
        if self.is_visible(locator) {
            self.fills
                .lock()
                .unwrap()
                .push((locator.to_string(), text.to_string()));
            Ok(())
        } else {
            Err(DriverError::new(DriverErrorKind::TargetNotFound))
        }
    }

    async fn select_option(&self, locator: &Locator, _option: &str) -> DriverResult<()> {
        if self.is_visible(locator) {
            Ok(())
        } else {
            Err(DriverError::new(DriverErrorKind::TargetNotFound))
        }
    }

    async fn wait_dom_ready(&self, _deadline_ms: u64) -> DriverResult<()> {
        Ok(())
    }

    async fn wait_network_quiet(&self, _quiet_ms: u64, _deadline_ms: u64) -> DriverResult<()> {
        Ok(())
    }

    async fn screenshot(&self) -> DriverResult<Vec<u8>> {
        Ok(Vec::new())
    }
}

/// Visible set rendering the primary locator of every targeted chain.
fn rendered_portal(flow: &Flow) -> HashSet<String> {
    let mut visible = HashSet::new();
    for step in &flow.steps {
        let target = match &step.action {
            Action::Click { target } => target,
            Action::Fill { target, .. } => target,
            Action::Select { target, .. } => target,
            Action::ExpectVisible { target } => target,
            _ => continue,
        };
        if let Some(primary) = target.primary() {
            visible.insert(primary.to_string());
        }
    }
    visible
}

fn quick_config() -> RunnerConfig {
    RunnerConfig {
        action_timeout_ms: 150,
        optional_timeout_ms: 60,
        poll_interval_ms: 10,
        network_quiet_ms: 5,
        navigation_timeout_ms: 150,
    }
}

#[tokio::test]
async fn booking_flow_completes_against_a_cooperative_portal() {
    let seed = SeedData::smoke();
    let flow = booking_flow(&HarnessConfig::default(), &seed);

    let mut visible = rendered_portal(&flow);
    // the login form exposes no type attribute, forcing the name fallback
    visible.remove("css:input[type=\"email\"]");
    // the patient chooser never appears, so both optional steps must skip
    visible.remove("role:button[name='Enter Patient Details']");
    visible.remove("role:button[name='Next']");

    let portal = Arc::new(MockPortal::new(visible));
    let runner = FlowRunner::new(portal.clone(), quick_config());

    let report = runner.run(&flow).await.expect("flow accepted");

    assert!(report.ok, "failure: {:?}", report.failure);
    assert_eq!(report.steps.len(), flow.steps.len());

    let skipped: Vec<&str> = report
        .steps
        .iter()
        .filter(|s| s.status == StepStatus::Skipped)
        .map(|s| s.step_id.as_str())
        .collect();
    assert_eq!(skipped, ["patient.details", "patient.next"]);

    let login = report
        .steps
        .iter()
        .find(|s| s.step_id == "login.email")
        .expect("login step ran");
    assert_eq!(login.matched_by.as_deref(), Some("css:input[name=\"email\"]"));

    let fills = portal.fills();
    let first_names: Vec<&str> = fills
        .iter()
        .filter(|(locator, _)| locator == "css:input[name=\"firstName\"]")
        .map(|(_, value)| value.as_str())
        .collect();
    assert_eq!(first_names, ["Leena", "pavan"]);

    let clicks = portal.clicks();
    let slot = clicks
        .iter()
        .position(|c| c == "css:.available-slot")
        .expect("slot clicked");
    let save_close = clicks
        .iter()
        .position(|c| c == "role:button[name='Save and Close']")
        .expect("appointment saved");
    assert!(slot < save_close, "slot picked before saving");
}

#[tokio::test]
async fn missing_slot_grid_stops_the_flow_terminally() {
    let seed = SeedData::smoke();
    let flow = booking_flow(&HarnessConfig::default(), &seed);

    let mut visible = rendered_portal(&flow);
    visible.remove("css:.available-slot");

    let portal = Arc::new(MockPortal::new(visible));
    let runner = FlowRunner::new(portal.clone(), quick_config());

    let report = runner.run(&flow).await.expect("flow accepted");

    assert!(!report.ok);
    let failure = report.failure.expect("failure recorded");
    assert_eq!(failure.step_id, "appointment.slot");
    assert_eq!(failure.kind, "element-not-found");

    let last = report.steps.last().expect("steps recorded");
    assert_eq!(last.step_id, "appointment.slot");
    assert_eq!(last.status, StepStatus::Failed);
    assert!(report.steps.iter().all(|s| !s.step_id.starts_with("verify.")));

    // the appointment was never saved
    assert!(!portal
        .clicks()
        .iter()
        .any(|c| c.contains("Save and Close")));
}

#[tokio::test]
async fn absent_listing_text_fails_the_final_assertion() {
    let seed = SeedData::smoke();
    let mut flow = booking_flow(&HarnessConfig::default(), &seed);

    // shrink the listing deadline so the negative case resolves quickly
    if let Some(step) = flow.steps.iter_mut().find(|s| s.id == "verify.listing.last") {
        step.timeout_ms = Some(200);
    }

    let mut visible = rendered_portal(&flow);
    visible.remove("text:'Ingale'");

    let portal = Arc::new(MockPortal::new(visible));
    let runner = FlowRunner::new(portal.clone(), quick_config());

    let report = runner.run(&flow).await.expect("flow accepted");

    assert!(!report.ok);
    let failure = report.failure.expect("failure recorded");
    assert_eq!(failure.step_id, "verify.listing.last");
    assert_eq!(failure.kind, "assertion-failure");
}

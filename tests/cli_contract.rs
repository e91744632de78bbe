use assert_cmd::prelude::*;
use serde_json::Value;
use std::process::Command;

fn carebook() -> Command {
    let bin = assert_cmd::cargo::cargo_bin!("carebook");
    let mut cmd = Command::new(bin);
    // isolate from the invoking shell and any user-level config file
    cmd.env("XDG_CONFIG_HOME", env!("CARGO_TARGET_TMPDIR"));
    for var in [
        "RUST_LOG",
        "CAREBOOK_BASE_URL",
        "CAREBOOK_EMAIL",
        "CAREBOOK_PASSWORD",
        "CAREBOOK_HEADLESS",
        "CAREBOOK_CHROME",
        "CAREBOOK_CHROME_PROFILE",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn list_reports_the_booking_flow() {
    let assert = carebook()
        .args(["--log-level", "error", "--output", "json", "list"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    let value: Value = serde_json::from_str(extract_json_array(&stdout)).expect("valid json");

    let flows = value.as_array().expect("flow array");
    assert_eq!(flows.len(), 1);
    assert_eq!(flows[0]["name"].as_str(), Some("booking"));
    assert!(flows[0]["steps"].as_u64().expect("step count") > 70);
}

#[test]
fn dry_run_emits_the_full_step_plan() {
    let assert = carebook()
        .args([
            "--log-level",
            "error",
            "--output",
            "json",
            "run",
            "booking",
            "--profile",
            "smoke",
            "--dry-run",
        ])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    let value: Value = serde_json::from_str(extract_json_object(&stdout)).expect("valid json");

    assert_eq!(value["name"].as_str(), Some("booking"));

    let steps = value["steps"].as_array().expect("steps array");
    assert_eq!(steps[0]["id"].as_str(), Some("nav.portal"));
    assert_eq!(
        steps.last().expect("at least one step")["id"].as_str(),
        Some("verify.listing.last")
    );

    // the smoke profile threads the fixed portal names through the plan
    let fill_values: Vec<&str> = steps
        .iter()
        .filter(|s| s["action"]["kind"].as_str() == Some("fill"))
        .filter_map(|s| s["action"]["value"].as_str())
        .collect();
    assert!(fill_values.contains(&"pavan"));
    assert!(fill_values.contains(&"Leena Brown"));

    let onboarding = steps
        .iter()
        .find(|s| s["id"].as_str() == Some("onboarding.dismiss"))
        .expect("onboarding step present");
    assert_eq!(onboarding["optional"].as_bool(), Some(true));
}

#[test]
fn human_plan_marks_optional_steps() {
    let assert = carebook()
        .args(["--log-level", "error", "run", "--dry-run"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    assert!(stdout.contains("Flow: booking"));
    assert!(stdout.contains("onboarding.dismiss"));
    assert!(stdout.contains("[optional]"));
    assert!(stdout.contains("[timeout 10000ms]"));
}

#[test]
fn unknown_flow_is_rejected() {
    let output = carebook()
        .args(["--log-level", "error", "run", "nosuch", "--dry-run"])
        .output()
        .expect("spawn carebook");

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("unknown flow"));
}

#[test]
fn check_surfaces_the_resolved_chrome_binary() {
    // any existing file stands in for Chrome; the harness binary always exists
    let bin = assert_cmd::cargo::cargo_bin!("carebook");

    let assert = carebook()
        .env("CAREBOOK_CHROME", &bin)
        .args(["--log-level", "error", "check"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    assert!(stdout.contains("Carebook Harness"));
    assert!(stdout.contains("- Portal: https://stage_ketamin.uat.provider.ecarehealth.com/"));
    assert!(stdout.contains("Chrome: "));
}

fn extract_json_object(output: &str) -> &str {
    let start = output.find('{').expect("json start");
    let end = output.rfind('}').expect("json end");
    &output[start..=end]
}

fn extract_json_array(output: &str) -> &str {
    let start = output.find('[').expect("json start");
    let end = output.rfind(']').expect("json end");
    &output[start..=end]
}

use crate::cli::output::OutputFormat;
use crate::config::HarnessConfig;
use crate::data::{DataProfile, SeedData};
use crate::scenarios;
use anyhow::{bail, Context, Result};
use cdp_driver::{ChromiumDriver, PageDriver};
use clap::Args;
use flow_runner::{Flow, FlowReport, FlowRunner, StepStatus};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};
use url::Url;

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Flow to execute
    #[arg(default_value = "booking")]
    pub flow: String,

    /// Data profile seeding the run
    #[arg(short, long, default_value = "regression")]
    pub profile: DataProfile,

    /// Run with a visible browser window
    #[arg(long)]
    pub headful: bool,

    /// Chrome executable to launch
    #[arg(long, value_name = "PATH")]
    pub chrome: Option<PathBuf>,

    /// Portal URL override
    #[arg(long)]
    pub base_url: Option<Url>,

    /// Directory for failure artifacts
    #[arg(long, value_name = "DIR")]
    pub artifacts_dir: Option<PathBuf>,

    /// Print the step plan without launching a browser
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn cmd_run(args: RunArgs, config: &HarnessConfig, output: OutputFormat) -> Result<()> {
    let mut config = config.clone();
    if let Some(base_url) = args.base_url.clone() {
        config.base_url = base_url;
    }
    if args.headful {
        config.browser.headless = false;
    }
    if let Some(chrome) = args.chrome.clone() {
        config.browser.chrome_executable = Some(chrome);
    }
    if let Some(dir) = args.artifacts_dir.clone() {
        config.artifacts.dir = dir;
    }

    let seed = SeedData::generate(args.profile);
    let flow = build_flow(&args.flow, &config, &seed)?;

    if args.dry_run {
        return render_plan(&flow, &output);
    }

    info!(
        "Seeded run: provider '{}', patient '{}'",
        seed.provider.display_name(),
        seed.patient.display_name()
    );

    let driver = Arc::new(ChromiumDriver::launch(config.driver_config()).await?);
    let runner = FlowRunner::new(driver.clone(), config.runner_config());

    let mut report = runner.run(&flow).await?;

    if !report.ok && config.artifacts.screenshot_on_failure {
        match capture_failure_screenshot(driver.as_ref(), &config, &report).await {
            Ok(path) => {
                info!("Failure screenshot: {}", path.display());
                report.screenshot = Some(path);
            }
            Err(err) => warn!("Could not capture failure screenshot: {}", err),
        }
    }

    if let Err(err) = driver.close().await {
        warn!("Browser shutdown reported: {}", err);
    }

    render_report(&report, &output)?;

    if !report.ok {
        bail!("flow '{}' failed", flow.name);
    }
    Ok(())
}

fn build_flow(name: &str, config: &HarnessConfig, seed: &SeedData) -> Result<Flow> {
    match name {
        "booking" => Ok(scenarios::booking_flow(config, seed)),
        other => bail!("unknown flow '{}', available flows: booking", other),
    }
}

async fn capture_failure_screenshot(
    driver: &ChromiumDriver,
    config: &HarnessConfig,
    report: &FlowReport,
) -> Result<PathBuf> {
    let bytes = driver.screenshot().await?;

    fs::create_dir_all(&config.artifacts.dir)
        .await
        .context("Failed to create artifacts directory")?;

    let path = config
        .artifacts
        .dir
        .join(format!("{}-{}.png", report.flow, report.run_id));
    fs::write(&path, &bytes)
        .await
        .context("Failed to write screenshot")?;

    Ok(path)
}

fn render_plan(flow: &Flow, output: &OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Human => {
            println!("Flow: {} ({} steps)", flow.name, flow.steps.len());
            if !flow.description.is_empty() {
                println!("{}", flow.description);
            }
            println!();
            for (idx, step) in flow.steps.iter().enumerate() {
                let mut notes = String::new();
                if step.optional {
                    notes.push_str(" [optional]");
                }
                if let Some(timeout) = step.timeout_ms {
                    notes.push_str(&format!(" [timeout {}ms]", timeout));
                }
                println!("{:>3}. {} - {}{}", idx + 1, step.id, step.label, notes);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(flow)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(flow)?),
    }
    Ok(())
}

fn render_report(report: &FlowReport, output: &OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Human => {
            let verdict = if report.ok { "passed" } else { "FAILED" };
            println!(
                "Flow '{}' {} in {}ms ({} steps ran)",
                report.flow,
                verdict,
                report.latency_ms,
                report.steps.len()
            );
            for step in &report.steps {
                let marker = match step.status {
                    StepStatus::Passed => "ok",
                    StepStatus::Skipped => "skip",
                    StepStatus::Failed => "FAIL",
                };
                let matched = step
                    .matched_by
                    .as_deref()
                    .map(|m| format!(" via {}", m))
                    .unwrap_or_default();
                println!(
                    "  [{:>4}] {} ({}, {}ms){}",
                    marker, step.step_id, step.kind, step.latency_ms, matched
                );
            }
            if let Some(failure) = &report.failure {
                println!();
                println!(
                    "Failed at '{}' ({}): {}",
                    failure.step_id, failure.kind, failure.message
                );
            }
            if let Some(path) = &report.screenshot {
                println!("Screenshot: {}", path.display());
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(report)?),
    }
    Ok(())
}

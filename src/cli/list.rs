use crate::cli::output::OutputFormat;
use crate::config::HarnessConfig;
use crate::data::SeedData;
use crate::scenarios;
use anyhow::Result;
use flow_runner::Flow;

pub async fn cmd_list(config: &HarnessConfig, output: OutputFormat) -> Result<()> {
    // Listing only reports shape; the fixed seed keeps the output stable.
    let seed = SeedData::smoke();
    let flows = vec![scenarios::booking_flow(config, &seed)];

    match output {
        OutputFormat::Human => {
            println!("Available flows:");
            for flow in &flows {
                println!(
                    "- {} ({} steps): {}",
                    flow.name,
                    flow.steps.len(),
                    flow.description
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summaries(&flows))?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(&summaries(&flows))?);
        }
    }

    Ok(())
}

fn summaries(flows: &[Flow]) -> Vec<serde_json::Value> {
    flows
        .iter()
        .map(|flow| {
            serde_json::json!({
                "name": flow.name,
                "steps": flow.steps.len(),
                "description": flow.description,
            })
        })
        .collect()
}

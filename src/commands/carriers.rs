use colored::*;
use eyre::Result;
use serde::Serialize;

use carrier_dispatch::carriers;
use carrier_dispatch::config::Config;

use crate::cli::{CarrierAction, OutputFormat};

#[derive(Serialize)]
struct CarrierSummary {
    name: String,
    description: String,
    actions: Vec<String>,
}

pub fn run(action: CarrierAction, config: &Config) -> Result<()> {
    match action {
        CarrierAction::List { format } => list(OutputFormat::resolve(format), config),
        CarrierAction::Info { name } => info(&name, config),
    }
}

fn list(format: OutputFormat, config: &Config) -> Result<()> {
    let registry = carriers::builtin_registry(config)?;

    let summaries: Vec<CarrierSummary> = registry
        .plugins()
        .map(|p| CarrierSummary {
            name: p.name().to_string(),
            description: p.description().to_string(),
            actions: p.actions().map(str::to_string).collect(),
        })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&summaries)?),
        OutputFormat::Text => {
            println!("{}", "Registered carriers:".bold());
            println!();

            if summaries.is_empty() {
                println!("  {}", "(none)".dimmed());
                return Ok(());
            }

            for carrier in &summaries {
                println!(
                    "  {} {} {}",
                    carrier.name.cyan(),
                    format!("[{}]", carrier.actions.join(", ")).green(),
                    carrier.description.dimmed()
                );
            }
        }
    }

    Ok(())
}

fn info(name: &str, config: &Config) -> Result<()> {
    let registry = carriers::builtin_registry(config)?;
    let plugin = registry.resolve(name)?;

    println!("{} {}", "Carrier:".bold(), plugin.name().cyan());
    if !plugin.description().is_empty() {
        println!("  {}", plugin.description().dimmed());
    }
    println!("{}", "Actions:".bold());
    for action in plugin.actions() {
        println!("  {} {}", "•".green(), action);
    }

    Ok(())
}

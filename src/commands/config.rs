use colored::*;
use eyre::Result;

use carrier_dispatch::config::Config;

use crate::cli::{ConfigAction, OutputFormat};

pub fn run(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show { format } => show(OutputFormat::resolve(format), config),
        ConfigAction::Get { key } => get(&key, config),
    }
}

fn show(format: OutputFormat, config: &Config) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(config)?);
        }
        OutputFormat::Text => {
            println!("{}", "carrier-dispatch Configuration".bold());
            println!();

            println!("log_level: {}", config.log_level.as_filter());
            println!("log_dir: {}", config.log_dir().display());
            println!();

            println!("{}:", "tracking".cyan());
            println!("  timeout_secs: {}", config.tracking.timeout_secs);
            println!("  max_concurrency: {}", config.tracking.max_concurrency);
            println!();

            println!("{}:", "carriers".cyan());
            for (name, carrier) in &config.carriers {
                println!(
                    "  {}: enabled={} base_url={}",
                    name,
                    carrier.enabled,
                    carrier.base_url.as_deref().unwrap_or("(default)")
                );
            }
        }
    }

    Ok(())
}

fn lookup(key: &str, config: &Config) -> Option<String> {
    match key {
        "log_level" | "log-level" => Some(config.log_level.as_filter().to_string()),
        "log_dir" | "log-dir" => Some(config.log_dir().display().to_string()),
        "tracking.timeout_secs" => Some(config.tracking.timeout_secs.to_string()),
        "tracking.max_concurrency" => Some(config.tracking.max_concurrency.to_string()),
        _ => {
            let rest = key.strip_prefix("carriers.")?;
            let (name, field) = rest.rsplit_once('.')?;
            let carrier = config.carrier(name);
            match field {
                "enabled" => Some(carrier.enabled.to_string()),
                "base_url" => Some(carrier.base_url.unwrap_or_default()),
                _ => None,
            }
        }
    }
}

fn get(key: &str, config: &Config) -> Result<()> {
    match lookup(key, config) {
        Some(v) => println!("{}", v),
        None => eyre::bail!("Unknown config key: {}", key),
    }

    Ok(())
}

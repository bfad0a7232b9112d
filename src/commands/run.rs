use colored::*;
use eyre::{Context, Result};
use std::fs;
use std::io::Read;
use std::time::Duration;

use carrier_dispatch::carriers;
use carrier_dispatch::config::Config;
use carrier_dispatch::{ActionContext, ConfigFields, Dispatcher, RequestData};

pub fn run(
    carrier: &str,
    action: &str,
    data: &str,
    fields: Option<&str>,
    field: &[String],
    timeout: Option<u64>,
    config: &Config,
) -> Result<()> {
    let data = read_data(data)?;
    let fields = build_fields(fields, field)?;
    execute(carrier, action, &data, &fields, timeout, config)
}

pub fn track(carrier: &str, codes: &[String], token: Option<&str>, timeout: Option<u64>, config: &Config) -> Result<()> {
    let data = serde_json::json!({ "codes": codes });

    let mut fields = serde_json::Map::new();
    if let Some(token) = token {
        fields.insert("token".to_string(), serde_json::Value::String(token.to_string()));
    }

    execute(carrier, "tracking", &data, &serde_json::Value::Object(fields), timeout, config)
}

fn execute(
    carrier: &str,
    action: &str,
    data: &RequestData,
    fields: &ConfigFields,
    timeout: Option<u64>,
    config: &Config,
) -> Result<()> {
    let dispatcher = Dispatcher::new(carriers::builtin_registry(config)?);

    let mut ctx = ActionContext::new();
    if let Some(secs) = timeout {
        ctx = ctx.with_timeout(Duration::from_secs(secs));
    }

    eprintln!("{} Running: {} {}", "→".blue(), carrier.cyan(), action.green());

    let result = dispatcher.dispatch_with(carrier, action, data, fields, &ctx)?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

/// Parse `--data`: inline JSON, `@path` for a file, or `-` for stdin
fn read_data(arg: &str) -> Result<RequestData> {
    let raw = if arg == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request data from stdin")?;
        buf
    } else if let Some(path) = arg.strip_prefix('@') {
        fs::read_to_string(path).with_context(|| format!("Failed to read request data from {}", path))?
    } else {
        arg.to_string()
    };

    serde_json::from_str(&raw).context("Request data is not valid JSON")
}

/// Merge `--fields` JSON with repeated `--field key=value` pairs
fn build_fields(fields: Option<&str>, pairs: &[String]) -> Result<ConfigFields> {
    let mut map = match fields {
        Some(raw) => match serde_json::from_str::<serde_json::Value>(raw).context("--fields is not valid JSON")? {
            serde_json::Value::Object(map) => map,
            _ => eyre::bail!("--fields must be a JSON object"),
        },
        None => serde_json::Map::new(),
    };

    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| eyre::eyre!("Invalid --field '{}' (expected KEY=VALUE)", pair))?;
        map.insert(key.trim().to_string(), serde_json::Value::String(value.to_string()));
    }

    Ok(serde_json::Value::Object(map))
}

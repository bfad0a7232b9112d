use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl OutputFormat {
    /// Resolve the effective output format.
    /// If user specified a format, use it.
    /// Otherwise: TTY → Text, non-TTY (pipe) → Json
    pub fn resolve(user_choice: Option<OutputFormat>) -> OutputFormat {
        match user_choice {
            Some(fmt) => fmt,
            None => {
                if std::io::stdout().is_terminal() {
                    OutputFormat::Text
                } else {
                    OutputFormat::Json
                }
            }
        }
    }
}

#[derive(Parser)]
#[command(
    name = "carrier-dispatch",
    about = "Resolve carrier integrations and dispatch their actions",
    version = env!("CARGO_PKG_VERSION"),
    after_help = "Logs are written to: ~/.local/share/carrier-dispatch/logs/carrier-dispatch.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to carrier-dispatch.yaml config file")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect registered carriers
    Carriers {
        #[command(subcommand)]
        action: CarrierAction,
    },

    /// Resolve a carrier, verify the action, and invoke it
    Run {
        /// Carrier name (any casing)
        carrier: String,

        /// Action name (e.g. tracking)
        action: String,

        /// Request data as JSON, @path to read a file, or - for stdin
        #[arg(long, default_value = "{}")]
        data: String,

        /// Configuration fields as a JSON object
        #[arg(long)]
        fields: Option<String>,

        /// Single configuration field (repeatable), merged over --fields
        #[arg(long = "field", value_name = "KEY=VALUE")]
        field: Vec<String>,

        /// Overall deadline in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Track codes with a carrier (shorthand for `run <carrier> tracking`)
    Track {
        /// Carrier name (any casing)
        carrier: String,

        /// Tracking codes
        #[arg(required = true)]
        codes: Vec<String>,

        /// Carrier credential (falls back to CARRIER_DISPATCH_TOKEN)
        #[arg(long, env = "CARRIER_DISPATCH_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Overall deadline in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum CarrierAction {
    /// List registered carriers and their actions
    List {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Resolve a carrier and show its actions
    Info {
        /// Carrier name (any casing)
        name: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Get a configuration value
    Get {
        /// Configuration key (dot notation)
        key: String,
    },
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use serde_json::Value;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use secure_logger::{
    classify, should_emit, Classification, Dispatcher, EnvironmentPolicy, LoggerConfig,
    RingBufferSink, Severity,
};

/// Secure logger operations tool
#[derive(Parser, Debug)]
#[command(name = "secure-logger")]
#[command(about = "Inspect and exercise the privacy-preserving logging pipeline")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "SECURE_LOGGER_CONFIG", default_value = "secure-logger.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a host identifier and show the derived policy
    Classify {
        host: String,
    },

    /// Sanitize a JSON value given as argument or on stdin
    Sanitize {
        json: Option<String>,
    },

    /// Route one record through the configured dispatcher
    Log {
        #[arg(short, long, default_value = "INFO", value_parser = parse_severity)]
        level: Severity,

        message: String,

        /// JSON payload attached to the record
        #[arg(short, long)]
        data: Option<String>,
    },

    /// Print the persisted ring buffer, oldest first
    Dump,

    /// Empty the persisted ring buffer
    Clear,
}

fn parse_severity(token: &str) -> std::result::Result<Severity, String> {
    token.parse::<Severity>().map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = LoggerConfig::load_from(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;

    init_tracing(args.verbose, classify(&config.host_source().host()));

    match args.command {
        Command::Classify { host } => print_policy(&EnvironmentPolicy::from_host(&host)),
        Command::Sanitize { json } => sanitize(&config, json)?,
        Command::Log {
            level,
            message,
            data,
        } => log_record(&config, level, &message, data)?,
        Command::Dump => dump(&config)?,
        Command::Clear => {
            RingBufferSink::open(config.store(), config.storage_key.clone())
                .clear()
                .context("Failed to clear the log buffer")?;
            println!("✅ {}", "Log buffer cleared".bright_green());
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool, classification: Classification) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("secure_logger={level},logger_cli={level}").into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Diagnostics go to stderr so command output stays machine-readable.
    match classification {
        Classification::Development => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(io::stderr),
            )
            .init(),
        Classification::Production => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_writer(io::stderr)
                    .json(),
            )
            .init(),
    }
}

fn print_policy(policy: &EnvironmentPolicy) {
    let label = match policy.classification {
        Classification::Development => policy.classification.as_str().bright_green(),
        Classification::Production => policy.classification.as_str().bright_yellow(),
    };
    println!("🧠 {} {}", "Environment:".bright_cyan(), label);

    for (key, value) in policy.summary() {
        println!("   {:<16} {}", key, value);
    }
    println!("   {:<16} {}", "Min Level", policy.min_severity);
    println!("   {:<16} {}", "Console", policy.console_enabled);
    println!("   {:<16} {}", "Sanitize", policy.sanitize_enabled);
}

fn read_input(json: Option<String>) -> Result<String> {
    match json {
        Some(json) => Ok(json),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}

/// Non-JSON input is treated as a plain string.
fn parse_payload(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.trim_end().to_string()))
}

fn sanitize(config: &LoggerConfig, json: Option<String>) -> Result<()> {
    let redactor = config.redactor().context("Invalid redaction configuration")?;
    let value = parse_payload(&read_input(json)?);
    println!("{}", serde_json::to_string_pretty(&redactor.sanitize(&value))?);
    Ok(())
}

fn log_record(config: &LoggerConfig, level: Severity, message: &str, data: Option<String>) -> Result<()> {
    let dispatcher = Dispatcher::from_config(config).context("Failed to build dispatcher")?;
    let data = data.as_deref().map(parse_payload);

    if !should_emit(level, dispatcher.policy()) {
        tracing::info!(
            level = %level,
            minimum = %dispatcher.policy().min_severity,
            "Record below minimum level, dropped"
        );
    }

    dispatcher.log(level, message, data);
    Ok(())
}

fn dump(config: &LoggerConfig) -> Result<()> {
    let store = config.store();
    let entries = RingBufferSink::load(store.as_ref(), &config.storage_key)
        .context("Failed to read the log buffer")?;
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload() {
        assert_eq!(parse_payload("{\"a\":1}"), serde_json::json!({ "a": 1 }));
        assert_eq!(parse_payload("plain text\n"), Value::String("plain text".to_string()));
    }

    #[test]
    fn test_cli_parses_log_command() {
        let args = Args::try_parse_from([
            "secure-logger",
            "log",
            "--level",
            "warn",
            "high value",
            "--data",
            "{\"value\":18}",
        ])
        .unwrap();

        match args.command {
            Command::Log { level, message, data } => {
                assert_eq!(level, Severity::Warn);
                assert_eq!(message, "high value");
                assert_eq!(data.as_deref(), Some("{\"value\":18}"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_level() {
        assert!(Args::try_parse_from(["secure-logger", "log", "--level", "loud", "x"]).is_err());
    }
}

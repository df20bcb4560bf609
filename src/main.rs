use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

use epanet_wasm::config::{Config, ConfigError};
use epanet_wasm::engine::{EngineError, EngineHandle, WasmtimeEngine};
use epanet_wasm::signature::{ArgSpec, MethodDescriptor, SIGNATURE_TABLE};
use epanet_wasm::subscriber::{self, LoggingError};
use epanet_wasm::{Arg, CallOutput, Project, Value};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("{0}")]
    Epanet(#[from] epanet_wasm::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No engine module given (use --module or [engine] module in the config file)")]
    NoModule,

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Method '{method}' expects {expected} argument(s), got {actual}")]
    Arity {
        method: String,
        expected: usize,
        actual: usize,
    },

    #[error("Argument {position} ('{value}'): {reason}")]
    BadArgument {
        position: usize,
        value: String,
        reason: String,
    },
}

#[derive(Parser)]
#[command(name = "epanet-wasm")]
#[command(about = "Inspect and call an EPANET engine compiled to WebAssembly")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "EPANET_WASM_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter (overrides the config file), e.g. "debug" or "epanet_wasm=trace"
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a project and print the engine version
    Version {
        /// Path to the EPANET module (.wasm or .wat)
        #[arg(long, env = "EPANET_WASM_MODULE")]
        module: Option<PathBuf>,
    },

    /// List the signature table
    Methods {
        /// Also report which entry points this module exports
        #[arg(long, env = "EPANET_WASM_MODULE")]
        module: Option<PathBuf>,
    },

    /// Call one method and print its result as JSON
    Call {
        /// Path to the EPANET module (.wasm or .wat)
        #[arg(long, env = "EPANET_WASM_MODULE")]
        module: Option<PathBuf>,

        /// Method name as listed by `methods`
        method: String,

        /// Arguments: numbers, strings, or comma-separated number arrays
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    subscriber::init(&config.logging)?;

    match cli.command {
        Commands::Version { module } => {
            let project = open_project(&config, module)?;
            println!("{}", project.version());
            Ok(())
        }
        Commands::Methods { module } => {
            let mut engine = match module.or_else(|| config.engine.module.clone()) {
                Some(path) => Some(WasmtimeEngine::from_file_with_options(
                    path,
                    config.engine.options(),
                )?),
                None => None,
            };
            for (name, descriptor) in SIGNATURE_TABLE {
                let since = descriptor
                    .min_version
                    .map(|v| format!(">= {v}"))
                    .unwrap_or_default();
                let status = match engine.as_mut() {
                    Some(engine) => availability(engine, descriptor),
                    None => "",
                };
                println!(
                    "{:<24} {:<28} {:<10} {}",
                    name, descriptor.native_name, since, status
                );
            }
            Ok(())
        }
        Commands::Call {
            module,
            method,
            args,
        } => {
            let descriptor = epanet_wasm::signature::find(&method)
                .ok_or_else(|| AppError::UnknownMethod(method.clone()))?;
            let args = parse_args(&method, descriptor, &args)?;

            let mut project = open_project(&config, module)?;
            let output = project.call(&method, &args)?;
            for warning in project.take_warnings() {
                eprintln!("{warning}");
            }
            println!("{}", serde_json::to_string_pretty(&output_to_json(&output))?);
            Ok(())
        }
    }
}

fn open_project(
    config: &Config,
    module: Option<PathBuf>,
) -> Result<Project<WasmtimeEngine>, AppError> {
    let path = module
        .or_else(|| config.engine.module.clone())
        .ok_or(AppError::NoModule)?;
    let engine = WasmtimeEngine::from_file_with_options(path, config.engine.options())?;
    Ok(Project::with_messages(
        engine,
        config.session.messages.lookup(),
    )?)
}

/// Parse command-line strings according to the descriptor's user inputs.
fn parse_args(
    method: &str,
    descriptor: &MethodDescriptor,
    raw: &[String],
) -> Result<Vec<Arg>, AppError> {
    let expected = descriptor.user_arity();
    if raw.len() != expected {
        return Err(AppError::Arity {
            method: method.to_string(),
            expected,
            actual: raw.len(),
        });
    }

    descriptor
        .user_inputs()
        .zip(raw)
        .enumerate()
        .map(|(index, (spec, value))| {
            let bad = |reason: &str| AppError::BadArgument {
                position: index + 1,
                value: value.clone(),
                reason: reason.to_string(),
            };
            match spec {
                ArgSpec::Scalar => parse_number(value).ok_or_else(|| bad("expected a number")),
                ArgSpec::StringPointer => Ok(Arg::Text(value.clone())),
                ArgSpec::NumberArray(_) => parse_numbers(value)
                    .map(Arg::Numbers)
                    .ok_or_else(|| bad("expected comma-separated numbers")),
                ArgSpec::LengthOf(_) => Err(bad("derived argument")),
            }
        })
        .collect()
}

/// Whether the loaded module exports the entry point behind `descriptor`.
fn availability(engine: &mut dyn EngineHandle, descriptor: &MethodDescriptor) -> &'static str {
    if engine.has_function(descriptor.native_name) {
        "available"
    } else {
        "missing"
    }
}

fn parse_number(value: &str) -> Option<Arg> {
    if let Ok(v) = value.parse::<i32>() {
        return Some(Arg::Int(v));
    }
    if let Ok(v) = value.parse::<i64>() {
        return Some(Arg::Long(v));
    }
    value.parse::<f64>().ok().map(Arg::Double)
}

fn parse_numbers(value: &str) -> Option<Vec<f64>> {
    if value.trim().is_empty() {
        return Some(Vec::new());
    }
    value
        .split(',')
        .map(|part| part.trim().parse::<f64>().ok())
        .collect()
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Int(v) => serde_json::json!(v),
        Value::Long(v) => serde_json::json!(v),
        Value::Double(v) => serde_json::json!(v),
        Value::Text(s) => serde_json::json!(s),
    }
}

fn output_to_json(output: &CallOutput) -> serde_json::Value {
    match output {
        CallOutput::None => serde_json::Value::Null,
        CallOutput::Single(value) => value_to_json(value),
        CallOutput::Record(fields) => serde_json::Value::Object(
            fields
                .iter()
                .map(|(name, value)| (name.to_string(), value_to_json(value)))
                .collect(),
        ),
    }
}

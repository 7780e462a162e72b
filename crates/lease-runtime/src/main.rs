//! # Lease Runtime
//!
//! Loads a JSON seed into the in-memory adapters and runs one operation
//! against the signature service.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (`LS_LOG_LEVEL`, `LS_JSON_LOGS`, ...)
//! 2. Load configuration (`LS_*` environment, then CLI flags)
//! 3. Read and validate the seed, wire the container
//! 4. Run the command and print the JSON response

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use lease_runtime::container::{RuntimeConfig, ServiceContainer};
use lease_runtime::{load_signature, ErrorResponse, LeaseRuntime, SignCommand};
use lease_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use shared_types::{LeaseId, ProfileId};

/// Lease signature runtime
#[derive(Parser, Debug)]
#[command(name = "lease-runtime")]
#[command(about = "Run lease signature operations against a JSON seed")]
struct Args {
    /// JSON seed with profiles, leases and signer rows
    #[arg(short, long, default_value = "demos/seed.json")]
    seed: PathBuf,

    /// Proof generator timeout in milliseconds (overrides LS_PROOF_TIMEOUT_MS)
    #[arg(long)]
    proof_timeout_ms: Option<u64>,

    /// Artifact upload timeout in milliseconds (overrides LS_STORAGE_TIMEOUT_MS)
    #[arg(long)]
    storage_timeout_ms: Option<u64>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Dump Prometheus metrics to stderr before exiting
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign a lease as the given caller
    Sign {
        #[arg(long)]
        lease: LeaseId,

        /// Authenticated caller profile
        #[arg(long)]
        profile: ProfileId,

        /// Authenticated caller email
        #[arg(long)]
        email: String,

        /// Signature image (png, jpg, svg, webp)
        #[arg(long)]
        signature_file: Option<PathBuf>,

        #[arg(long)]
        user_agent: Option<String>,

        #[arg(long)]
        ip: Option<String>,

        /// Device detail as key=value, repeatable
        #[arg(long = "device", value_parser = parse_key_value)]
        device: Vec<(String, String)>,
    },

    /// Assess the signer roster and reconcile the stored status
    Status {
        #[arg(long)]
        lease: LeaseId,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))
}

fn load_config(args: &Args) -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::from_env().context("Invalid LS_* environment")?;
    if let Some(ms) = args.proof_timeout_ms {
        config.signature.proof_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = args.storage_timeout_ms {
        config.signature.storage_timeout = Duration::from_millis(ms);
    }
    config.validate().context("Invalid command-line overrides")?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut telemetry = TelemetryConfig::from_env();
    if args.verbose {
        telemetry = telemetry.with_log_level("debug");
    }
    let _telemetry = init_telemetry(telemetry)?;

    let config = load_config(&args)?;
    let raw = std::fs::read_to_string(&args.seed)
        .with_context(|| format!("Failed to read seed {}", args.seed.display()))?;
    let container = ServiceContainer::from_json(config, &raw).context("Invalid seed")?;
    let runtime = LeaseRuntime::new(container);
    info!(seed = %args.seed.display(), "Lease runtime ready");

    let result = match args.command {
        Command::Sign {
            lease,
            profile,
            email,
            signature_file,
            user_agent,
            ip,
            device,
        } => {
            let signature = match signature_file {
                Some(path) => Some(
                    load_signature(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                ),
                None => None,
            };
            let command = SignCommand {
                lease_id: lease,
                profile_id: profile,
                email,
                signature,
                user_agent,
                ip_address: ip,
                device: device.into_iter().collect::<BTreeMap<_, _>>(),
            };
            match runtime.sign(command).await {
                Ok(outcome) => print_json(&outcome).map(|()| None),
                Err(e) => Ok(Some(e)),
            }
        }
        Command::Status { lease } => match runtime.status(lease).await {
            Ok(report) => print_json(&report).map(|()| None),
            Err(e) => Ok(Some(e)),
        },
    }?;

    if args.metrics {
        eprintln!("{}", encode_metrics()?);
    }

    if let Some(e) = result {
        print_json(&ErrorResponse::from(&e))?;
        warn!(class = e.class(), "Operation failed");
        bail!(e);
    }
    Ok(())
}

//! Local dev/smoke-test entrypoint: reads one alert batch (from a JSON
//! file or stdin, mirroring `original_source/dev/mock-alertmanager.py`'s
//! role as a local Alertmanager stand-in), runs the investigation
//! pipeline once per alert, and prints each resulting `Investigation`'s
//! `full` JSON projection to stdout.
//!
//! The production HTTP webhook receiver and its queue transport are
//! explicitly out of scope for this repository (spec.md §1) — this
//! binary exists only to drive `agent::run_investigation` by hand while
//! developing collectors, analysis passes, and the provider layer.

use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;

use agent::{run_investigation, AgentContext};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "agent-cli")]
#[command(about = "Run the investigation pipeline once against a local alert file")]
#[command(version)]
struct Cli {
    /// Path to a JSON file holding one alert or alert batch (spec.md §6
    /// "Inbound alert event" wire shape). Reads stdin when omitted or `-`.
    file: Option<PathBuf>,

    /// Time window expression anchored to each alert's `starts_at`
    /// (spec.md §3 "Time window"), e.g. `1h`, `30m`, `2h30m`.
    #[arg(long, env = "INVESTIGATION_WINDOW", default_value = "1h")]
    window: String,
}

/// Raw Alertmanager-style alert (spec.md §6 "Inbound alert event"):
/// `status` carries a nested `state`, not the flat string
/// `agent::AlertEvent` stores internally.
#[derive(Debug, Deserialize)]
struct RawAlert {
    fingerprint: String,
    #[serde(default)]
    labels: HashMap<String, String>,
    #[serde(default)]
    annotations: HashMap<String, String>,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    generator_url: String,
    status: RawStatus,
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    state: String,
}

/// Either a bare alert object or an Alertmanager-style `{"alerts": [...]}`
/// batch — local fixtures are commonly authored as one bare alert.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawInput {
    Batch { alerts: Vec<RawAlert> },
    Single(RawAlert),
}

impl RawInput {
    fn into_alerts(self) -> Vec<RawAlert> {
        match self {
            Self::Batch { alerts } => alerts,
            Self::Single(alert) => vec![alert],
        }
    }
}

fn into_alert_event(raw: RawAlert) -> agent::AlertEvent {
    // The zero-epoch sentinel means "still firing" (spec.md §6, §3).
    let ends_at = raw.ends_at.filter(|t| t.timestamp() != 0);
    agent::AlertEvent {
        fingerprint: raw.fingerprint,
        labels: raw.labels,
        annotations: raw.annotations,
        starts_at: raw.starts_at,
        ends_at,
        generator_url: raw.generator_url,
        status: raw.status.state,
    }
}

fn read_input(file: Option<&PathBuf>) -> std::io::Result<String> {
    match file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,agent=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    info!("agent-cli v{}: reading alert input", env!("CARGO_PKG_VERSION"));

    let raw = read_input(cli.file.as_ref())?;
    let input: RawInput = serde_json::from_str(&raw)?;
    let alerts = input.into_alerts();

    let config = config::AgentConfig::from_env();
    let ctx = AgentContext::from_config(config).await;

    // Each alert is investigated independently (spec.md §6); one
    // failing alert never aborts the rest of the batch (P4 totality).
    let mut investigations: Vec<Value> = Vec::with_capacity(alerts.len());
    for raw_alert in alerts {
        let alert = into_alert_event(raw_alert);
        let fingerprint = alert.fingerprint.clone();
        let investigation = run_investigation(&ctx, alert, &cli.window).await;
        if !investigation.errors.is_empty() {
            error!(fingerprint, errors = ?investigation.errors, "investigation completed with errors");
        }
        investigations.push(investigation.to_full_json());
    }

    let output = if investigations.len() == 1 {
        investigations.into_iter().next().unwrap()
    } else {
        json!({ "investigations": investigations })
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

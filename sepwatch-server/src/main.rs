//! sepwatch: CLI + web server for the conflict and alert engine.

use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use sepwatch_core::alert::Alert;
use sepwatch_core::config::{self, Config};
use sepwatch_core::conflict::Conflict;

mod engine;
mod notification;
mod upstream;
mod web;

use engine::{Engine, Snapshot, TickOutcome, TickStatus};

#[derive(Parser)]
#[command(name = "sepwatch", version, about = "Separation conflict and alert engine")]
struct Cli {
    /// Config file (default: ~/.sepwatch/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web server; snapshots arrive on POST /api/v1/tick
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Bearer token for the ingest endpoint (overrides config)
        #[arg(long, env = "SEPWATCH_TOKEN")]
        token: Option<String>,
    },

    /// Run snapshots from a JSON file through the engine and print the result
    Evaluate {
        /// JSON file with one snapshot or an array of snapshots ("-" for stdin)
        file: PathBuf,

        /// Show filtered-out alerts too
        #[arg(short, long)]
        all: bool,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// One snapshot or a sequence, ticked in order.
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotInput {
    Many(Vec<Snapshot>),
    One(Snapshot),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sepwatch=info,sepwatch_core=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port, token } => {
            let config = load(cli.config.as_ref());
            cmd_serve(config, host, port, token).await
        }
        Commands::Evaluate { file, all } => {
            let config = load(cli.config.as_ref());
            cmd_evaluate(config, file, all).await
        }
        Commands::Init { force } => cmd_init(cli.config, force),
    }
}

fn load(path: Option<&PathBuf>) -> Config {
    match path {
        Some(path) => config::load_config_from(path).unwrap_or_else(|e| {
            eprintln!("Error loading config {}: {e}", path.display());
            std::process::exit(1);
        }),
        None => config::load_config(),
    }
}

fn build_engine(config: &Config) -> Engine {
    Engine::from_config(config).unwrap_or_else(|e| {
        eprintln!("Error building engine: {e}");
        std::process::exit(1);
    })
}

async fn cmd_serve(config: Config, host: Option<String>, port: Option<u16>, token: Option<String>) {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let token = token.or_else(|| config.server.auth_token.clone());

    if config.projector_url.is_none() {
        tracing::warn!("no projector_url configured; snapshots must carry inline tracks");
    }

    let engine = Arc::new(build_engine(&config));
    if let Err(e) = web::serve(engine, token, &host, port).await {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}

async fn cmd_evaluate(config: Config, file: PathBuf, all: bool) {
    let mut text = String::new();
    let result = if file.to_str() == Some("-") {
        io::stdin().read_to_string(&mut text).map(|_| ())
    } else {
        std::fs::read_to_string(&file).map(|t| text = t)
    };
    if let Err(e) = result {
        eprintln!("Error reading {}: {e}", file.display());
        std::process::exit(1);
    }

    let snapshots = match serde_json::from_str::<SnapshotInput>(&text) {
        Ok(SnapshotInput::Many(v)) => v,
        Ok(SnapshotInput::One(s)) => vec![s],
        Err(e) => {
            eprintln!("Error parsing {}: {e}", file.display());
            std::process::exit(1);
        }
    };

    let engine = build_engine(&config);
    let mut last = TickStatus::default();
    for snapshot in snapshots {
        if let TickOutcome::Completed(status) = engine.tick(snapshot).await {
            last = status;
        }
    }

    print_status(&last);
    print_alerts(&engine.alerts(all));
    print_conflicts(&engine.conflicts(all), engine.selection().conflict.as_ref());
}

fn cmd_init(path: Option<PathBuf>, force: bool) {
    let path = path.unwrap_or_else(config::config_file);
    if path.exists() && !force {
        eprintln!("{} already exists (use --force to overwrite)", path.display());
        std::process::exit(1);
    }
    if let Some(dir) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Error creating {}: {e}", dir.display());
            std::process::exit(1);
        }
    }
    if let Err(e) = config::save_config_to(&Config::default(), &path) {
        eprintln!("Error writing {}: {e}", path.display());
        std::process::exit(1);
    }
    println!("Wrote {}", path.display());
}

fn print_status(status: &TickStatus) {
    println!();
    println!(
        "Ticks: {}, {} aircraft, {} tracks, {} conflicts, {} alerts ({} visible)",
        status.tick,
        status.aircraft,
        status.tracks,
        status.conflicts,
        status.alerts,
        status.visible_alerts
    );
    if status.weather_sampled + status.weather_failed > 0 {
        println!(
            "Weather: {} sampled, {} failed",
            status.weather_sampled, status.weather_failed
        );
    }
    if let Some(err) = &status.projector_error {
        println!("Projector: {err}");
    }
    println!();
}

fn print_alerts(alerts: &[Alert]) {
    if alerts.is_empty() {
        println!("No alerts");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Severity", "Kind", "Title", "Details", "Aircraft", "Lat", "Lon"]);
    for alert in alerts {
        table.add_row(vec![
            Cell::new(alert.severity),
            Cell::new(alert.kind()),
            Cell::new(&alert.title),
            Cell::new(&alert.details),
            Cell::new(alert.aircraft.join(", ")),
            Cell::new(format!("{:.4}", alert.location.lat)),
            Cell::new(format!("{:.4}", alert.location.lon)),
        ]);
    }
    println!("{table}");
}

fn print_conflicts(conflicts: &[Conflict], selected: Option<&sepwatch_core::types::PairKey>) {
    if conflicts.is_empty() {
        return;
    }

    println!();
    let mut table = Table::new();
    table.set_header(vec!["", "Pair", "Breach (s)", "CPA (nm)", "Vert (ft)", "CPA Lat", "CPA Lon"]);
    for c in conflicts {
        let marker = if Some(&c.pair) == selected { "*" } else { "" };
        table.add_row(vec![
            Cell::new(marker),
            Cell::new(&c.pair),
            Cell::new(format!("{:.0}", c.first_breach_s)),
            Cell::new(format!("{:.1}", c.min_h_nm)),
            Cell::new(format!("{:.0}", c.min_v_ft)),
            Cell::new(format!("{:.4}", c.cpa.lat)),
            Cell::new(format!("{:.4}", c.cpa.lon)),
        ]);
    }
    println!("{table}");
}

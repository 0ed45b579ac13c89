//! `gridsim` command-line entry point.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use contracts::{ActionResult, WorldConfig};
use kernel_api::{serve, EngineApi, ScenarioReport};
use kernel_core::ScenarioSpec;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gridsim")]
#[command(about = "Deterministic turn-based grid simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a scenario file and apply its steps as one turn
    Run {
        /// Scenario JSON file
        #[arg(env = "GRIDSIM_SCENARIO")]
        scenario: PathBuf,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the built-in locked-door demo
    Demo {
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve the HTTP API
    Serve {
        /// Address to bind to
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,

        /// Scenario to load before serving; an empty default grid otherwise
        #[arg(short, long, env = "GRIDSIM_SCENARIO")]
        scenario: Option<PathBuf>,

        /// Start from the locked-door demo
        #[arg(long, conflicts_with = "scenario")]
        demo: bool,
    },
}

fn load_scenario(path: &Path) -> Result<ScenarioSpec, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(ScenarioSpec::from_json(&raw)?)
}

fn describe(result: &ActionResult) -> String {
    if result.success {
        return format!("ok    {}", result.request);
    }
    let reason = result
        .failed_prerequisites
        .first()
        .or(result.error.as_ref())
        .map(String::as_str)
        .unwrap_or("not applied");
    format!("fail  {}: {reason}", result.request)
}

fn print_report(report: &ScenarioReport, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    for result in &report.results {
        println!("{}", describe(result));
    }
    println!("{}", report.status);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("gridsim=info".parse()?)
                .add_directive("kernel_core=info".parse()?)
                .add_directive("kernel_api=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { scenario, json } => {
            let spec = load_scenario(&scenario)?;
            let (_, report) = EngineApi::from_scenario(&spec)?;
            print_report(&report, json)?;
        }

        Commands::Demo { json } => {
            let (_, report) = EngineApi::demo()?;
            print_report(&report, json)?;
        }

        Commands::Serve {
            addr,
            scenario,
            demo,
        } => {
            let engine = match (scenario, demo) {
                (Some(path), _) => {
                    info!(path = %path.display(), "loading scenario");
                    EngineApi::from_scenario(&load_scenario(&path)?)?.0
                }
                (None, true) => EngineApi::demo()?.0,
                (None, false) => EngineApi::from_config(WorldConfig::default())?,
            };
            info!(status = %engine.status(), "starting server");
            serve(addr, engine).await?;
        }
    }

    Ok(())
}

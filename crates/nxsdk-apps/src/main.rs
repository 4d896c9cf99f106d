//! nxsdk-app - runs an example NX-SDK application on the simulated host

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use nxsdk_apps::{init_logging, run, AppKind, RunReport};
use nxsdk_bridge::SessionConfig;
use nxsdk_sim::{ScriptedEvent, TraceKind};

/// Example NX-SDK applications
#[derive(Parser, Debug)]
#[command(name = "nxsdk-app")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Session configuration (TOML)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Events to replay (JSON array)
    #[arg(short = 'e', long, global = true)]
    events: Option<PathBuf>,

    #[command(subcommand)]
    app: App,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum App {
    /// Port bandwidth custom commands
    CustomCli,
    /// Route redistribution watcher
    RibMgr,
    /// DME feature monitor
    FeatureMonitor,
    /// Interface change monitor
    IntfMonitor,
}

impl From<App> for AppKind {
    fn from(app: App) -> Self {
        match app {
            App::CustomCli => AppKind::CustomCli,
            App::RibMgr => AppKind::RibMgr,
            App::FeatureMonitor => AppKind::FeatureMonitor,
            App::IntfMonitor => AppKind::IntfMonitor,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match SessionConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("nxsdk-app: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => SessionConfig::default(),
    };
    init_logging(&config.logging.level);

    match run_app(args.app.into(), config, args.events.as_ref()) {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("nxsdk-app failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_app(
    app: AppKind,
    config: SessionConfig,
    events: Option<&PathBuf>,
) -> anyhow::Result<RunReport> {
    let events = match events {
        Some(path) => ScriptedEvent::load_file(path)
            .with_context(|| format!("cannot load events from {}", path.display()))?,
        None => Vec::new(),
    };
    info!(app = %app, events = events.len(), "--- Starting nxsdk-app ---");
    run(app, config, events)
}

fn print_report(report: &RunReport) {
    for line in &report.console {
        println!("{}", line);
    }
    for entry in &report.trace {
        let tag = match entry.kind {
            TraceKind::Event => "event".to_string(),
            TraceKind::Error => "error".to_string(),
            TraceKind::Syslog(priority) => format!("syslog:{}", priority),
        };
        println!("[{}] {}", tag, entry.text);
    }
    println!(
        "{} event(s) delivered, {} watch(es) active at shutdown",
        report.delivered, report.watches
    );
}

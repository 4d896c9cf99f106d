//! Runs an example application against the simulated host.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use nxsdk_bridge::{Session, SessionConfig};
use nxsdk_sim::{ScriptedEvent, SimHost, TraceEntry};

use crate::{custom_cli, feature_monitor, intf_monitor, rib_watch};

/// The example applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppKind {
    CustomCli,
    RibMgr,
    FeatureMonitor,
    IntfMonitor,
}

impl AppKind {
    /// Name the host gives the app when the config leaves it empty.
    pub fn default_name(&self) -> &'static str {
        match self {
            AppKind::CustomCli => "customCliApp",
            AppKind::RibMgr => "ribMgr",
            AppKind::FeatureMonitor => "featureMonitor",
            AppKind::IntfMonitor => "intfMonitor",
        }
    }

    /// Sets up the app's commands, watches and handlers on a session.
    pub fn install(&self, session: &Session) -> anyhow::Result<()> {
        match self {
            AppKind::CustomCli => {
                custom_cli::install(session)?;
            }
            AppKind::RibMgr => {
                rib_watch::install(session)?;
            }
            AppKind::FeatureMonitor => {
                feature_monitor::install(session)?;
            }
            AppKind::IntfMonitor => {
                intf_monitor::install(session)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for AppKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_name())
    }
}

/// What the host saw during a run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub console: Vec<String>,
    pub trace: Vec<TraceEntry>,
    pub delivered: usize,
    pub watches: usize,
}

/// Installs `app`, replays `events` through the host event loop and shuts
/// the session down.
pub fn run(
    app: AppKind,
    config: SessionConfig,
    events: Vec<ScriptedEvent>,
) -> anyhow::Result<RunReport> {
    let name = if config.app.name.is_empty() {
        app.default_name().to_string()
    } else {
        config.app.name.clone()
    };
    let host = Arc::new(SimHost::new(name));
    let session = Session::new(host.clone(), config);
    app.install(&session)?;

    let queued = events.len();
    host.enqueue(events);
    session.start_event_loop();
    let delivered = queued - host.pending_events();
    let watches = host.watches().len();
    session.shutdown()?;
    info!(app = %app, delivered, "Run finished");

    Ok(RunReport {
        console: host.console().take(),
        trace: host.trace().take(),
        delivered,
        watches,
    })
}

//! Consumer-facing handler contracts, one per callback domain.
//!
//! Handlers receive typed views only. They may return an error; the bridge
//! logs it and answers the host with the domain's safe default, so a failing
//! handler never takes the host down with it.

use crate::error::HandlerResult;
use crate::payload::{Adjacency, CliCommand, DmeObject, IntfChange, Interface, L3Route, MacEntry, Vrf};

/// Executes custom CLI commands.
pub trait CommandHandler: Send + Sync {
    /// Runs a command. Returning `false` makes the host report failure to
    /// the CLI session.
    fn on_command(&self, cmd: &CliCommand<'_>) -> HandlerResult<bool>;
}

/// Receives DME managed-object changes.
pub trait TreeChangeHandler: Send + Sync {
    fn on_tree_change(&self, obj: &DmeObject) -> HandlerResult<()>;

    /// Called once the initial download of a watched subtree has finished.
    fn on_download_done(&self, _dn: &str) -> HandlerResult<()> {
        Ok(())
    }
}

/// Receives route and VRF events.
pub trait RouteHandler: Send + Sync {
    fn on_route(&self, route: &L3Route) -> HandlerResult<bool>;

    fn on_vrf(&self, _vrf: &Vrf) -> HandlerResult<bool> {
        Ok(true)
    }
}

/// Receives adjacency events.
pub trait AdjacencyHandler: Send + Sync {
    fn on_adjacency(&self, adj: &Adjacency) -> HandlerResult<()>;
}

/// Receives MAC table events.
pub trait AddressHandler: Send + Sync {
    fn on_mac(&self, entry: &MacEntry) -> HandlerResult<bool>;
}

/// Receives interface events.
pub trait InterfaceHandler: Send + Sync {
    fn on_interface(&self, change: IntfChange, intf: &Interface) -> HandlerResult<bool>;
}

//! Boundary with the host runtime.
//!
//! The host owns all switch state and drives every callback. This module
//! describes what the bridge needs from it: director installation, the
//! parse tree, and a handful of output capabilities.

use std::fmt;
use std::num::NonZeroU64;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cli::CommandSpec;
use crate::director::DirectorRef;
use crate::domain::Domain;
use crate::error::HostError;
use crate::types::{AddressFamily, AppPriority, RecordFormat, SyslogPriority};

/// Opaque token the host returns for an installed director.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostHandle(NonZeroU64);

impl HostHandle {
    /// Wraps a raw host value; zero is never a valid handle.
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(HostHandle)
    }

    /// Returns the raw host value.
    pub fn as_raw(&self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for HostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Console output of the CLI session that triggered a command callback.
///
/// Only valid for the duration of one `post_cli_cb` invocation.
pub trait Console {
    /// Prints a line on the switch console.
    fn print_console(&self, text: &str);
}

/// Host-side event trace and syslog.
pub trait Tracer: Send + Sync {
    /// Records an event trace entry.
    fn event(&self, text: &str);

    /// Records an error trace entry.
    fn error(&self, text: &str);

    /// Emits a syslog message.
    fn syslog(&self, priority: SyslogPriority, text: &str);
}

/// Object a domain manager can be asked to watch.
///
/// Events are only delivered for watched objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WatchTarget {
    /// DME subtree rooted at a distinguished name.
    Dme {
        /// Distinguished name, e.g. `sys/fm`.
        dn: String,
    },
    /// Routes redistributed from a protocol.
    L3Route {
        /// Owning protocol (`bgp`, `ospf`, ...).
        protocol: String,
        /// Protocol instance tag, e.g. the BGP ASN.
        tag: Option<String>,
        /// VRF name, `all` for every VRF.
        vrf: String,
        /// Address family, `None` for both.
        af: Option<AddressFamily>,
    },
    /// VRF add/delete/state changes.
    Vrf {
        /// VRF name, `all` for every VRF.
        name: String,
    },
    /// All adjacencies of a family.
    Adjacencies {
        /// Address family.
        af: AddressFamily,
    },
    /// The whole MAC table.
    Macs,
    /// One interface, `all` for every interface.
    Interface {
        /// Interface name.
        name: String,
    },
}

impl WatchTarget {
    /// Returns the domain whose handler receives events for this target.
    pub fn domain(&self) -> Domain {
        match self {
            WatchTarget::Dme { .. } => Domain::TreeChange,
            WatchTarget::L3Route { .. } | WatchTarget::Vrf { .. } => Domain::RouteEvent,
            WatchTarget::Adjacencies { .. } => Domain::AdjacencyEvent,
            WatchTarget::Macs => Domain::AddressEvent,
            WatchTarget::Interface { .. } => Domain::InterfaceEvent,
        }
    }
}

/// The host runtime as seen from the bridge.
///
/// Implementations must be callable from any thread. The host may invoke
/// installed directors concurrently with any of these calls.
pub trait Host: Send + Sync {
    /// Installs a director for a domain and returns its handle.
    ///
    /// A host may refuse when the domain is unsupported or, if it does not
    /// allow replacement, when a director is already installed.
    fn install_handler(&self, domain: Domain, director: DirectorRef) -> Result<HostHandle, HostError>;

    /// Removes a previously installed director.
    fn remove_handler(&self, handle: HostHandle) -> Result<(), HostError>;

    /// Adds custom commands to the host parse tree.
    fn submit_commands(&self, commands: &[CommandSpec]) -> Result<(), HostError>;

    /// Runs a show command and returns its output.
    fn exec_show_cmd(&self, cmd: &str, format: RecordFormat) -> Result<String, HostError>;

    /// Returns the host tracer.
    fn tracer(&self) -> Arc<dyn Tracer>;

    /// Starts delivering events for a target.
    fn watch(&self, target: &WatchTarget) -> Result<(), HostError>;

    /// Stops delivering events for a target.
    fn unwatch(&self, target: &WatchTarget) -> Result<(), HostError>;

    /// Name the host assigned to this application.
    fn app_name(&self) -> String;

    fn set_app_desc(&self, desc: &str);

    fn set_app_priority(&self, priority: AppPriority);

    /// Blocks the calling thread running the host event loop.
    fn start_event_loop(&self);

    /// Makes a running event loop return.
    fn stop_event_loop(&self);

    /// Closes the host session.
    ///
    /// Every director must have been removed first; closing with directors
    /// still installed is undefined behaviour on the host side.
    fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_handle_rejects_zero() {
        assert!(HostHandle::from_raw(0).is_none());
        let handle = HostHandle::from_raw(42).unwrap();
        assert_eq!(handle.as_raw(), 42);
        assert_eq!(handle.to_string(), "#42");
    }

    #[test]
    fn test_watch_target_domain() {
        assert_eq!(
            WatchTarget::Dme {
                dn: "sys/fm".to_string()
            }
            .domain(),
            Domain::TreeChange
        );
        assert_eq!(
            WatchTarget::Vrf {
                name: "all".to_string()
            }
            .domain(),
            Domain::RouteEvent
        );
        assert_eq!(WatchTarget::Macs.domain(), Domain::AddressEvent);
    }
}

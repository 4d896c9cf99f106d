//! Event domains a handler can register for.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of host event.
///
/// The host keeps at most one active handler per domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// CLI command execution.
    Command,
    /// DME object tree change.
    TreeChange,
    /// RIB L3 route or VRF change.
    RouteEvent,
    /// IPv4/IPv6 adjacency change.
    AdjacencyEvent,
    /// MAC address table change.
    AddressEvent,
    /// Interface change.
    InterfaceEvent,
}

impl Domain {
    /// All domains in declaration order.
    pub const ALL: [Domain; 6] = [
        Domain::Command,
        Domain::TreeChange,
        Domain::RouteEvent,
        Domain::AdjacencyEvent,
        Domain::AddressEvent,
        Domain::InterfaceEvent,
    ];

    /// Returns the short name used in logs and configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Domain::Command => "command",
            Domain::TreeChange => "dme",
            Domain::RouteEvent => "route",
            Domain::AdjacencyEvent => "adjacency",
            Domain::AddressEvent => "mac",
            Domain::InterfaceEvent => "interface",
        }
    }

    /// Returns the numeric tag used on the C ABI.
    pub fn code(&self) -> u32 {
        match self {
            Domain::Command => 0,
            Domain::TreeChange => 1,
            Domain::RouteEvent => 2,
            Domain::AdjacencyEvent => 3,
            Domain::AddressEvent => 4,
            Domain::InterfaceEvent => 5,
        }
    }

    /// Looks up a domain by its C ABI tag.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.code() == code)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.name() == s)
            .ok_or_else(|| format!("unknown domain: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_names_round_trip() {
        for domain in Domain::ALL {
            assert_eq!(domain.name().parse::<Domain>().unwrap(), domain);
        }
        assert!("vlan".parse::<Domain>().is_err());
    }

    #[test]
    fn test_domain_codes() {
        assert_eq!(Domain::from_code(0), Some(Domain::Command));
        assert_eq!(Domain::from_code(4), Some(Domain::AddressEvent));
        assert_eq!(Domain::from_code(6), None);
    }

    #[test]
    fn test_domain_display() {
        assert_eq!(Domain::TreeChange.to_string(), "dme");
        assert_eq!(Domain::AddressEvent.to_string(), "mac");
    }
}

use std::net::IpAddr;

use super::{event_of, opt_string};
use crate::error::TranslationError;
use crate::types::{AddressFamily, EventType, MacAddress};
use crate::value::{FieldValues, FieldValuesExt};

/// An ARP/ND adjacency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjacency {
    intf: String,
    ip: IpAddr,
    mac: Option<MacAddress>,
    vrf: String,
    phy_intf: Option<String>,
    preference: u32,
    source: Option<String>,
    af: AddressFamily,
    event: EventType,
}

impl Adjacency {
    /// Builds the view from a host record.
    ///
    /// The address family follows the IP address unless the record states
    /// it, in which case both must agree.
    pub fn translate(fvs: &FieldValues) -> Result<Self, TranslationError> {
        let intf = fvs.require("intf")?.to_string();
        let ip: IpAddr = fvs.require_parsed("ip", "ip address")?;
        let derived = if ip.is_ipv6() {
            AddressFamily::Ipv6
        } else {
            AddressFamily::Ipv4
        };
        let af = match fvs.parse_field::<AddressFamily>("af", "address family")? {
            Some(af) if af != derived => {
                return Err(TranslationError::Rejected {
                    field: "af".to_string(),
                    reason: format!("{} does not match address {}", af, ip),
                })
            }
            _ => derived,
        };

        Ok(Self {
            intf,
            ip,
            mac: fvs.parse_field("mac", "mac address")?,
            vrf: opt_string(fvs, "vrf").unwrap_or_else(|| "default".to_string()),
            phy_intf: opt_string(fvs, "phy_intf"),
            preference: fvs.parse_field("preference", "integer")?.unwrap_or(0),
            source: opt_string(fvs, "source"),
            af,
            event: event_of(fvs)?,
        })
    }

    /// Interface the adjacency was learned on.
    pub fn intf(&self) -> &str {
        &self.intf
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /// Resolved MAC, absent while the adjacency is incomplete.
    pub fn mac(&self) -> Option<MacAddress> {
        self.mac
    }

    pub fn vrf(&self) -> &str {
        &self.vrf
    }

    /// Physical member interface, for adjacencies on SVIs or port channels.
    pub fn phy_intf(&self) -> Option<&str> {
        self.phy_intf.as_deref()
    }

    pub fn preference(&self) -> u32 {
        self.preference
    }

    /// Component that installed the adjacency.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn af(&self) -> AddressFamily {
        self.af
    }

    pub fn event(&self) -> EventType {
        self.event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_translate_adjacency() {
        let fvs = crate::field_values! {
            "intf" => "Vlan10",
            "ip" => "10.0.0.5",
            "mac" => "00:11:22:33:44:55",
            "phy_intf" => "Ethernet1/3",
            "event" => "add",
        };
        let adj = Adjacency::translate(&fvs).unwrap();
        assert_eq!(adj.intf(), "Vlan10");
        assert_eq!(adj.vrf(), "default");
        assert_eq!(adj.af(), AddressFamily::Ipv4);
        assert_eq!(adj.phy_intf(), Some("Ethernet1/3"));
        assert_eq!(
            adj.mac(),
            Some(MacAddress::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]))
        );
    }

    #[test]
    fn test_family_mismatch_rejected() {
        let fvs = crate::field_values! {
            "intf" => "Ethernet1/1",
            "ip" => "2001:db8::5",
            "af" => "ipv4",
        };
        assert!(matches!(
            Adjacency::translate(&fvs),
            Err(TranslationError::Rejected { .. })
        ));
    }

    #[test]
    fn test_bad_mac_is_translation_error() {
        let fvs = crate::field_values! {
            "intf" => "Ethernet1/1",
            "ip" => "10.0.0.5",
            "mac" => "zz:zz",
        };
        assert_eq!(
            Adjacency::translate(&fvs),
            Err(TranslationError::invalid("mac", "mac address", "zz:zz"))
        );
    }
}

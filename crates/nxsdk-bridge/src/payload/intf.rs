use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{event_of, list_field, opt_string};
use crate::error::TranslationError;
use crate::types::{EventType, IntfType, MacAddress, OperState};
use crate::value::{FieldValues, FieldValuesExt, IpValue};

/// Which aspect of an interface changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntfChange {
    /// Interface created or deleted.
    AddDel,
    /// IPv4 address changed.
    Ipv4Addr,
    /// IPv6 address changed.
    Ipv6Addr,
    /// Admin or operational state changed.
    State,
    /// Switched between L2 and L3.
    Layer,
    /// Port channel membership changed.
    PortMember,
    /// VRF membership changed.
    Vrf,
    /// Access VLAN changed.
    Vlan,
}

impl IntfChange {
    pub const ALL: [IntfChange; 8] = [
        IntfChange::AddDel,
        IntfChange::Ipv4Addr,
        IntfChange::Ipv6Addr,
        IntfChange::State,
        IntfChange::Layer,
        IntfChange::PortMember,
        IntfChange::Vrf,
        IntfChange::Vlan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntfChange::AddDel => "add_del",
            IntfChange::Ipv4Addr => "ipv4_addr",
            IntfChange::Ipv6Addr => "ipv6_addr",
            IntfChange::State => "state",
            IntfChange::Layer => "layer",
            IntfChange::PortMember => "port_member",
            IntfChange::Vrf => "vrf",
            IntfChange::Vlan => "vlan",
        }
    }
}

impl fmt::Display for IntfChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntfChange {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

/// An interface and its current attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    name: String,
    layer: Option<String>,
    intf_type: IntfType,
    vrf: Option<String>,
    vlan: Option<u16>,
    description: Option<String>,
    ipv4: Option<IpValue>,
    ipv6: Option<IpValue>,
    l2_address: Option<MacAddress>,
    admin: OperState,
    oper: OperState,
    mtu: Option<u32>,
    speed: Option<u32>,
    members: Vec<String>,
    event: EventType,
}

impl Interface {
    pub fn translate(fvs: &FieldValues) -> Result<Self, TranslationError> {
        let ipv4: Option<IpValue> = fvs.parse_field("ipv4", "ipv4 address")?;
        if let Some(ip) = ipv4.filter(IpValue::is_ipv6) {
            return Err(TranslationError::invalid("ipv4", "ipv4 address", ip.to_string()));
        }
        let ipv6: Option<IpValue> = fvs.parse_field("ipv6", "ipv6 address")?;
        if let Some(ip) = ipv6.filter(|ip| !ip.is_ipv6()) {
            return Err(TranslationError::invalid("ipv6", "ipv6 address", ip.to_string()));
        }

        Ok(Self {
            name: fvs.require("name")?.to_string(),
            layer: opt_string(fvs, "layer"),
            intf_type: fvs.parse_field("intf_type", "interface type")?.unwrap_or_default(),
            vrf: opt_string(fvs, "vrf"),
            vlan: fvs.parse_field("vlan", "vlan id")?,
            description: opt_string(fvs, "description"),
            ipv4,
            ipv6,
            l2_address: fvs.parse_field("l2_address", "mac address")?,
            admin: fvs.parse_field("admin", "admin state")?.unwrap_or_default(),
            oper: fvs.parse_field("oper", "oper state")?.unwrap_or_default(),
            mtu: fvs.parse_field("mtu", "integer")?,
            speed: fvs.parse_field("speed", "integer")?,
            members: list_field(fvs, "members"),
            event: event_of(fvs)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `L2` or `L3`, when reported.
    pub fn layer(&self) -> Option<&str> {
        self.layer.as_deref()
    }

    pub fn intf_type(&self) -> IntfType {
        self.intf_type
    }

    pub fn vrf(&self) -> Option<&str> {
        self.vrf.as_deref()
    }

    pub fn vlan(&self) -> Option<u16> {
        self.vlan
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn ipv4(&self) -> Option<IpValue> {
        self.ipv4
    }

    pub fn ipv6(&self) -> Option<IpValue> {
        self.ipv6
    }

    pub fn l2_address(&self) -> Option<MacAddress> {
        self.l2_address
    }

    pub fn admin_state(&self) -> OperState {
        self.admin
    }

    pub fn oper_state(&self) -> OperState {
        self.oper
    }

    pub fn mtu(&self) -> Option<u32> {
        self.mtu
    }

    /// Speed in Mbps.
    pub fn speed(&self) -> Option<u32> {
        self.speed
    }

    /// Port channel members.
    pub fn members(&self) -> &[String] {
        &self.members
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
    fn test_translate_interface() {
        let fvs = crate::field_values! {
            "name" => "port-channel10",
            "intf_type" => "port-channel",
            "layer" => "L3",
            "ipv4" => "10.0.0.1/30",
            "admin" => "up",
            "oper" => "down",
            "mtu" => "9216",
            "members" => "Ethernet1/1,Ethernet1/2",
            "event" => "update",
        };
        let intf = Interface::translate(&fvs).unwrap();
        assert_eq!(intf.name(), "port-channel10");
        assert_eq!(intf.intf_type(), IntfType::PortChannel);
        assert_eq!(intf.ipv4().map(|ip| ip.to_string()), Some("10.0.0.1/30".to_string()));
        assert_eq!(intf.admin_state(), OperState::Up);
        assert_eq!(intf.oper_state(), OperState::Down);
        assert_eq!(intf.members().len(), 2);
        assert_eq!(intf.vrf(), None);
    }

    #[test]
    fn test_ipv4_field_rejects_ipv6() {
        let fvs = crate::field_values! { "name" => "Ethernet1/1", "ipv4" => "2001:db8::1/64" };
        assert!(matches!(
            Interface::translate(&fvs),
            Err(TranslationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_intf_change_parse() {
        assert_eq!("port_member".parse::<IntfChange>(), Ok(IntfChange::PortMember));
        assert!("speed".parse::<IntfChange>().is_err());
    }
}

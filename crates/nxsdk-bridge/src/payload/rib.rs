use std::net::IpAddr;

use super::{event_of, opt_string};
use crate::error::TranslationError;
use crate::types::{AddressFamily, EventType, OperState};
use crate::value::{FieldValues, FieldValuesExt};

/// One next hop of an L3 route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L3NextHop {
    /// Next hop address.
    pub address: IpAddr,
    /// Outgoing interface.
    pub out_intf: Option<String>,
    /// VRF the next hop resolves in.
    pub vrf: Option<String>,
    /// Owning protocol.
    pub owner: Option<String>,
    /// Administrative distance.
    pub preference: u32,
    pub metric: u32,
}

/// A redistributed route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L3Route {
    vrf: String,
    address: IpAddr,
    mask_len: u8,
    event: EventType,
    next_hops: Vec<L3NextHop>,
}

impl L3Route {
    /// Builds the view from a host record.
    ///
    /// Next hops are `nh.<i>.<attr>` fields. When `nh_count` is present it
    /// must match the number of next hops exactly; otherwise consecutive
    /// indexes are read until one is missing.
    pub fn translate(fvs: &FieldValues) -> Result<Self, TranslationError> {
        let vrf = fvs.require("vrf")?.to_string();
        let address: IpAddr = fvs.require_parsed("address", "ip address")?;
        let mask_len: u8 = fvs.require_parsed("mask_len", "prefix length")?;
        let max = if address.is_ipv6() { 128 } else { 32 };
        if mask_len > max {
            return Err(TranslationError::invalid(
                "mask_len",
                "prefix length",
                mask_len.to_string(),
            ));
        }
        let event = event_of(fvs)?;

        let declared: Option<usize> = fvs.parse_field("nh_count", "integer")?;
        let mut next_hops = Vec::new();
        loop {
            let i = next_hops.len();
            let present = fvs.has_field(&format!("nh.{}.address", i));
            match declared {
                Some(n) if i < n => next_hops.push(next_hop(fvs, i)?),
                Some(n) => {
                    if present {
                        return Err(TranslationError::Rejected {
                            field: "nh_count".to_string(),
                            reason: format!("{} declared, more next hops present", n),
                        });
                    }
                    break;
                }
                None if present => next_hops.push(next_hop(fvs, i)?),
                None => break,
            }
        }

        Ok(Self {
            vrf,
            address,
            mask_len,
            event,
            next_hops,
        })
    }

    pub fn vrf(&self) -> &str {
        &self.vrf
    }

    pub fn address(&self) -> IpAddr {
        self.address
    }

    pub fn mask_len(&self) -> u8 {
        self.mask_len
    }

    /// Prefix in `addr/len` form.
    pub fn prefix(&self) -> String {
        format!("{}/{}", self.address, self.mask_len)
    }

    pub fn af(&self) -> AddressFamily {
        if self.address.is_ipv6() {
            AddressFamily::Ipv6
        } else {
            AddressFamily::Ipv4
        }
    }

    pub fn event(&self) -> EventType {
        self.event
    }

    pub fn next_hops(&self) -> &[L3NextHop] {
        &self.next_hops
    }

    pub fn next_hop_count(&self) -> usize {
        self.next_hops.len()
    }
}

fn next_hop(fvs: &FieldValues, i: usize) -> Result<L3NextHop, TranslationError> {
    let key = |attr: &str| format!("nh.{}.{}", i, attr);
    Ok(L3NextHop {
        address: fvs.require_parsed(&key("address"), "ip address")?,
        out_intf: opt_string(fvs, &key("intf")),
        vrf: opt_string(fvs, &key("vrf")),
        owner: opt_string(fvs, &key("owner")),
        preference: fvs.parse_field(&key("preference"), "integer")?.unwrap_or(0),
        metric: fvs.parse_field(&key("metric"), "integer")?.unwrap_or(0),
    })
}

/// A VRF add/delete/state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vrf {
    name: String,
    id: Option<u32>,
    state: OperState,
    event: EventType,
}

impl Vrf {
    pub fn translate(fvs: &FieldValues) -> Result<Self, TranslationError> {
        Ok(Self {
            name: fvs.require("name")?.to_string(),
            id: fvs.parse_field("id", "integer")?,
            state: fvs.parse_field("state", "oper state")?.unwrap_or_default(),
            event: event_of(fvs)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Host table id, when known.
    pub fn id(&self) -> Option<u32> {
        self.id
    }

    pub fn state(&self) -> OperState {
        self.state
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
    fn test_translate_route_with_next_hops() {
        let fvs = crate::field_values! {
            "vrf" => "default",
            "address" => "10.1.1.0",
            "mask_len" => "24",
            "event" => "add",
            "nh.0.address" => "192.168.1.1",
            "nh.0.intf" => "Ethernet1/1",
            "nh.0.owner" => "bgp-65000",
            "nh.1.address" => "192.168.2.1",
            "nh.1.preference" => "20",
        };
        let route = L3Route::translate(&fvs).unwrap();
        assert_eq!(route.prefix(), "10.1.1.0/24");
        assert_eq!(route.af(), AddressFamily::Ipv4);
        assert_eq!(route.event(), EventType::Add);
        assert_eq!(route.next_hop_count(), 2);
        assert_eq!(route.next_hops()[0].out_intf.as_deref(), Some("Ethernet1/1"));
        assert_eq!(route.next_hops()[1].preference, 20);
        assert_eq!(route.next_hops()[1].owner, None);
    }

    #[test]
    fn test_declared_count_mismatch() {
        let short = crate::field_values! {
            "vrf" => "default",
            "address" => "10.1.1.0",
            "mask_len" => "24",
            "nh_count" => "2",
            "nh.0.address" => "192.168.1.1",
        };
        assert_eq!(
            L3Route::translate(&short),
            Err(TranslationError::missing("nh.1.address"))
        );

        let long = crate::field_values! {
            "vrf" => "default",
            "address" => "10.1.1.0",
            "mask_len" => "24",
            "nh_count" => "0",
            "nh.0.address" => "192.168.1.1",
        };
        assert!(matches!(
            L3Route::translate(&long),
            Err(TranslationError::Rejected { .. })
        ));
    }

    #[test]
    fn test_mask_len_bounded_by_family() {
        let fvs = crate::field_values! {
            "vrf" => "default",
            "address" => "10.1.1.0",
            "mask_len" => "64",
        };
        assert!(L3Route::translate(&fvs).is_err());

        let fvs = crate::field_values! {
            "vrf" => "default",
            "address" => "2001:db8::",
            "mask_len" => "64",
        };
        assert_eq!(L3Route::translate(&fvs).unwrap().af(), AddressFamily::Ipv6);
    }

    #[test]
    fn test_translate_vrf() {
        let fvs = crate::field_values! { "name" => "red", "id" => "3", "state" => "up" };
        let vrf = Vrf::translate(&fvs).unwrap();
        assert_eq!(vrf.name(), "red");
        assert_eq!(vrf.id(), Some(3));
        assert_eq!(vrf.state(), OperState::Up);
        assert_eq!(vrf.event(), EventType::NoEvent);
    }
}

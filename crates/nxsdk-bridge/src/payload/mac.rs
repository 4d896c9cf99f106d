use super::{event_of, opt_string};
use crate::error::TranslationError;
use crate::types::{EventType, MacAddress, MacType};
use crate::value::{FieldValues, FieldValuesExt};

const VLAN_MIN: i64 = 1;
const VLAN_MAX: i64 = 4094;

/// A MAC address table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacEntry {
    mac: MacAddress,
    vlan: u16,
    intf: Option<String>,
    mac_type: MacType,
    event: EventType,
}

impl MacEntry {
    pub fn translate(fvs: &FieldValues) -> Result<Self, TranslationError> {
        let mac = fvs.require_parsed("mac", "mac address")?;
        let vlan: i64 = fvs.require_parsed("vlan", "vlan id")?;
        if !(VLAN_MIN..=VLAN_MAX).contains(&vlan) {
            return Err(TranslationError::OutOfRange {
                field: "vlan".to_string(),
                value: vlan,
                min: VLAN_MIN,
                max: VLAN_MAX,
            });
        }

        Ok(Self {
            mac,
            vlan: vlan as u16,
            intf: opt_string(fvs, "intf"),
            mac_type: fvs.parse_field("type", "mac type")?.unwrap_or_default(),
            event: event_of(fvs)?,
        })
    }

    pub fn mac(&self) -> MacAddress {
        self.mac
    }

    pub fn vlan(&self) -> u16 {
        self.vlan
    }

    /// Interface the MAC was learned on; absent for drop entries.
    pub fn intf(&self) -> Option<&str> {
        self.intf.as_deref()
    }

    pub fn mac_type(&self) -> MacType {
        self.mac_type
    }

    pub fn event(&self) -> EventType {
        self.event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_mac_entry() {
        let fvs = crate::field_values! {
            "mac" => "0011.2233.4455",
            "vlan" => "100",
            "intf" => "Ethernet1/2",
            "type" => "dynamic",
            "event" => "delete",
        };
        let entry = MacEntry::translate(&fvs).unwrap();
        assert_eq!(entry.mac().to_string(), "00:11:22:33:44:55");
        assert_eq!(entry.vlan(), 100);
        assert_eq!(entry.mac_type(), MacType::Dynamic);
        assert_eq!(entry.event(), EventType::Delete);
    }

    #[test]
    fn test_vlan_out_of_range() {
        let fvs = crate::field_values! { "mac" => "00:11:22:33:44:55", "vlan" => "4095" };
        assert_eq!(
            MacEntry::translate(&fvs),
            Err(TranslationError::OutOfRange {
                field: "vlan".to_string(),
                value: 4095,
                min: 1,
                max: 4094,
            })
        );
    }
}

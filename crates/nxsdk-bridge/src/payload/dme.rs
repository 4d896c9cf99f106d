use std::collections::BTreeMap;

use super::{event_of, list_field};
use crate::error::TranslationError;
use crate::types::EventType;
use crate::value::{FieldValues, FieldValuesExt};

const PROP_PREFIX: &str = "prop.";

/// A changed DME managed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmeObject {
    dn: String,
    event: EventType,
    properties: BTreeMap<String, String>,
    updated: Vec<String>,
}

impl DmeObject {
    /// Builds the view from a host record.
    ///
    /// Properties arrive as `prop.<name>` fields, the changed set as a comma
    /// separated `updated` field.
    pub fn translate(fvs: &FieldValues) -> Result<Self, TranslationError> {
        let dn = fvs.require("dn")?.to_string();
        let event = event_of(fvs)?;
        let properties = fvs
            .iter()
            .filter_map(|(f, v)| {
                f.strip_prefix(PROP_PREFIX)
                    .filter(|name| !name.is_empty())
                    .map(|name| (name.to_string(), v.clone()))
            })
            .collect();
        let updated = list_field(fvs, "updated");

        Ok(Self {
            dn,
            event,
            properties,
            updated,
        })
    }

    /// Distinguished name of the object.
    pub fn dn(&self) -> &str {
        &self.dn
    }

    pub fn event(&self) -> EventType {
        self.event
    }

    /// Current value of a property.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns true if the property changed in this event.
    pub fn is_property_changed(&self, name: &str) -> bool {
        self.updated.iter().any(|p| p == name)
    }

    pub fn updated_properties(&self) -> &[String] {
        &self.updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_translate_dme_object() {
        let fvs = crate::field_values! {
            "dn" => "sys/fm/bgp",
            "event" => "update",
            "prop.adminSt" => "enabled",
            "prop.operSt" => "up",
            "updated" => "adminSt",
        };
        let obj = DmeObject::translate(&fvs).unwrap();
        assert_eq!(obj.dn(), "sys/fm/bgp");
        assert_eq!(obj.event(), EventType::Update);
        assert_eq!(obj.property("adminSt"), Some("enabled"));
        assert!(obj.is_property_changed("adminSt"));
        assert!(!obj.is_property_changed("operSt"));
        assert_eq!(obj.properties().count(), 2);
    }

    #[test]
    fn test_translate_requires_dn() {
        let fvs = crate::field_values! { "event" => "add" };
        assert_eq!(
            DmeObject::translate(&fvs),
            Err(TranslationError::missing("dn"))
        );
    }
}

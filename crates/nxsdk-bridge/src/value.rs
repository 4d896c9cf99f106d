//! Raw host values and the typed parameter union they are converted into.
//!
//! The host hands over every event record as string field/value pairs and
//! every CLI parameter as a raw token. Nothing in this crate passes those
//! strings to a handler: payload translation converts them once, here, into
//! typed values and reports a [`TranslationError`] when that fails.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TranslationError;
use crate::types::MacAddress;

/// Key-value tuple representing a field and its value.
pub type FieldValue = (String, String);

/// Collection of field-value pairs for one host record.
pub type FieldValues = Vec<FieldValue>;

/// Helper trait for working with field-value collections.
pub trait FieldValuesExt {
    /// Gets the value for a field, if present.
    fn get_field(&self, field: &str) -> Option<&str>;

    /// Gets the value for a field, returning the default if not present.
    fn get_field_or<'a>(&'a self, field: &str, default: &'a str) -> &'a str;

    /// Checks if a field exists.
    fn has_field(&self, field: &str) -> bool;

    /// Gets a field that must be present and non-empty.
    fn require(&self, field: &str) -> Result<&str, TranslationError> {
        match self.get_field(field) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(TranslationError::missing(field)),
        }
    }

    /// Parses an optional field; an absent or empty field yields `None`.
    fn parse_field<T: FromStr>(
        &self,
        field: &str,
        expected: &'static str,
    ) -> Result<Option<T>, TranslationError> {
        match self.get_field(field) {
            None => Ok(None),
            Some(v) if v.is_empty() => Ok(None),
            Some(v) => v
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| TranslationError::invalid(field, expected, v)),
        }
    }

    /// Parses a field that must be present.
    fn require_parsed<T: FromStr>(
        &self,
        field: &str,
        expected: &'static str,
    ) -> Result<T, TranslationError> {
        self.parse_field(field, expected)?
            .ok_or_else(|| TranslationError::missing(field))
    }
}

impl FieldValuesExt for FieldValues {
    fn get_field(&self, field: &str) -> Option<&str> {
        self.iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_str())
    }

    fn get_field_or<'a>(&'a self, field: &str, default: &'a str) -> &'a str {
        self.get_field(field).unwrap_or(default)
    }

    fn has_field(&self, field: &str) -> bool {
        self.iter().any(|(f, _)| f == field)
    }
}

/// Builds a FieldValues collection from key-value pairs.
#[macro_export]
macro_rules! field_values {
    ($($field:expr => $value:expr),* $(,)?) => {
        vec![
            $(($field.to_string(), $value.to_string()),)*
        ]
    };
}

/// Declared type of a CLI parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    /// Free-form string.
    String,
    /// Signed integer.
    Integer,
    /// Interface name.
    Interface,
    /// IPv4/IPv6 address or prefix.
    IpAddr,
    /// MAC address.
    MacAddr,
    /// VRF name.
    Vrf,
}

impl ParamType {
    /// Returns a short description used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Interface => "interface",
            ParamType::IpAddr => "ip address",
            ParamType::MacAddr => "mac address",
            ParamType::Vrf => "vrf",
        }
    }
}

/// An IP address with an optional prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpValue {
    /// Address part.
    pub addr: IpAddr,
    /// Prefix length, when the value was given in `addr/len` form.
    pub prefix_len: Option<u8>,
}

impl IpValue {
    /// Returns true for IPv6 addresses.
    pub fn is_ipv6(&self) -> bool {
        self.addr.is_ipv6()
    }
}

impl fmt::Display for IpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix_len {
            Some(len) => write!(f, "{}/{}", self.addr, len),
            None => write!(f, "{}", self.addr),
        }
    }
}

impl FromStr for IpValue {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix_len) = match s.split_once('/') {
            Some((addr, len)) => (addr, Some(len.parse::<u8>().map_err(|_| ())?)),
            None => (s, None),
        };
        let addr: IpAddr = addr.parse().map_err(|_| ())?;
        let max = if addr.is_ipv6() { 128 } else { 32 };
        if prefix_len.is_some_and(|len| len > max) {
            return Err(());
        }
        Ok(IpValue { addr, prefix_len })
    }
}

/// A CLI parameter value, typed by the command schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Free-form string.
    String(String),
    /// Signed integer.
    Integer(i64),
    /// Interface name.
    Interface(String),
    /// IP address or prefix.
    IpAddr(IpValue),
    /// MAC address.
    MacAddr(MacAddress),
    /// VRF name.
    Vrf(String),
}

impl ParamValue {
    /// Returns the type tag of this value.
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::String(_) => ParamType::String,
            ParamValue::Integer(_) => ParamType::Integer,
            ParamValue::Interface(_) => ParamType::Interface,
            ParamValue::IpAddr(_) => ParamType::IpAddr,
            ParamValue::MacAddr(_) => ParamType::MacAddr,
            ParamValue::Vrf(_) => ParamType::Vrf,
        }
    }

    /// Returns the value as text for string-like variants.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) | ParamValue::Interface(s) | ParamValue::Vrf(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer for `Integer` values.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::String(s) | ParamValue::Interface(s) | ParamValue::Vrf(s) => f.write_str(s),
            ParamValue::Integer(i) => write!(f, "{}", i),
            ParamValue::IpAddr(ip) => write!(f, "{}", ip),
            ParamValue::MacAddr(mac) => write!(f, "{}", mac),
        }
    }
}

//! Typed, read-only views of host event payloads.
//!
//! Each domain has an explicit translation function from the raw host
//! record to its view. Translation runs once at the director boundary and
//! is independent of dispatch, so it can be exercised on its own.

mod adj;
mod cli;
mod dme;
mod intf;
mod mac;
mod rib;

pub use adj::Adjacency;
pub use cli::{CliCommand, RawCommand};
pub use dme::DmeObject;
pub use intf::{IntfChange, Interface};
pub use mac::MacEntry;
pub use rib::{L3NextHop, L3Route, Vrf};

use crate::error::TranslationError;
use crate::types::EventType;
use crate::value::{FieldValues, FieldValuesExt};

/// Field carrying the event type in every record.
pub const EVENT_FIELD: &str = "event";

/// Reads the optional `event` field, defaulting to [`EventType::NoEvent`].
pub(crate) fn event_of(fvs: &FieldValues) -> Result<EventType, TranslationError> {
    Ok(fvs.parse_field(EVENT_FIELD, "event type")?.unwrap_or_default())
}

/// Returns an optional, non-empty string field.
pub(crate) fn opt_string(fvs: &FieldValues, field: &str) -> Option<String> {
    fvs.get_field(field)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Splits a comma separated list field, dropping empty items.
pub(crate) fn list_field(fvs: &FieldValues, field: &str) -> Vec<String> {
    fvs.get_field(field)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

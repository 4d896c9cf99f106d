//! Scripted host events, loaded from JSON and replayed by the event loop.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use nxsdk_bridge::{FieldValues, IntfChange};

/// Script loading errors.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// File could not be read.
    #[error("failed to read event script {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// File is not a JSON array of events.
    #[error("failed to parse event script: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One host event to deliver.
///
/// ```json
/// [
///   { "type": "command", "name": "set_port_bw_threshold_cmd",
///     "keywords": ["threshold"], "params": [["<threshold>", "75"]] },
///   { "type": "route", "fields": { "vrf": "default", "address": "10.1.1.0", "mask_len": "24" } }
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptedEvent {
    /// A CLI command typed on the switch.
    Command {
        name: String,
        #[serde(default)]
        line: String,
        #[serde(default)]
        keywords: Vec<String>,
        #[serde(default)]
        params: Vec<(String, String)>,
    },
    Dme {
        fields: BTreeMap<String, String>,
    },
    DmeDownloadDone {
        dn: String,
    },
    Route {
        fields: BTreeMap<String, String>,
    },
    Vrf {
        fields: BTreeMap<String, String>,
    },
    Adjacency {
        fields: BTreeMap<String, String>,
    },
    Mac {
        fields: BTreeMap<String, String>,
    },
    Interface {
        change: IntfChange,
        fields: BTreeMap<String, String>,
    },
}

impl ScriptedEvent {
    /// Parses a JSON array of events.
    pub fn parse_script(json: &str) -> Result<Vec<Self>, ScriptError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses an event script file.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<Self>, ScriptError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse_script(&json)
    }

    /// Short name used in logs and delivery reports.
    pub fn kind(&self) -> &'static str {
        match self {
            ScriptedEvent::Command { .. } => "command",
            ScriptedEvent::Dme { .. } => "dme",
            ScriptedEvent::DmeDownloadDone { .. } => "dme_download_done",
            ScriptedEvent::Route { .. } => "route",
            ScriptedEvent::Vrf { .. } => "vrf",
            ScriptedEvent::Adjacency { .. } => "adjacency",
            ScriptedEvent::Mac { .. } => "mac",
            ScriptedEvent::Interface { .. } => "interface",
        }
    }
}

pub(crate) fn to_field_values(fields: &BTreeMap<String, String>) -> FieldValues {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_script() {
        let events = ScriptedEvent::parse_script(
            r#"[
                {"type": "command", "name": "get_port_bw_threshold_cmd"},
                {"type": "interface", "change": "state", "fields": {"name": "Ethernet1/1", "oper": "up"}},
                {"type": "dme_download_done", "dn": "sys/fm"}
            ]"#,
        )
        .unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            ScriptedEvent::Command {
                name: "get_port_bw_threshold_cmd".to_string(),
                line: String::new(),
                keywords: vec![],
                params: vec![],
            }
        );
        assert_eq!(events[1].kind(), "interface");
        assert_eq!(events[2].kind(), "dme_download_done");
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = ScriptedEvent::parse_script(r#"[{"type": "bfd"}]"#).unwrap_err();
        assert!(matches!(err, ScriptError::Parse(_)));
    }

    #[test]
    fn test_load_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"type": "mac", "fields": {{"mac": "00:11:22:33:44:55", "vlan": "10"}}}}]"#
        )
        .unwrap();

        let events = ScriptedEvent::load_file(file.path()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), "mac");
    }

    #[test]
    fn test_load_missing_file() {
        let err = ScriptedEvent::load_file("/nonexistent/events.json").unwrap_err();
        assert!(err.to_string().starts_with("failed to read event script"));
    }
}

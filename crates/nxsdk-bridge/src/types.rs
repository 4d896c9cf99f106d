//! Host code tables shared by payload views.
//!
//! The host reports these as small integers or short names; every type
//! here parses from either form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Generates `FromStr` accepting either the numeric code or the name.
macro_rules! code_table {
    ($ty:ident { $($variant:ident = $code:literal, $name:literal;)+ }) => {
        impl $ty {
            /// Returns the host code for this value.
            pub fn code(&self) -> i32 {
                match self {
                    $($ty::$variant => $code,)+
                }
            }

            /// Returns the canonical name for this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }

            /// Looks up a value by host code.
            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $($code => Some($ty::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                if let Ok(code) = s.parse::<i32>() {
                    return Self::from_code(code).ok_or(());
                }
                match s.to_ascii_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(()),
                }
            }
        }
    };
}

/// Kind of change an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EventType {
    /// Not an event (e.g. a lookup result).
    #[default]
    NoEvent,
    /// Object added.
    Add,
    /// Object deleted.
    Delete,
    /// Object updated.
    Update,
    /// Object replayed during an initial download.
    Download,
    /// Initial download finished.
    DownloadDone,
}

code_table!(EventType {
    NoEvent = 0, "no_event";
    Add = 1, "add";
    Delete = 2, "delete";
    Update = 3, "update";
    Download = 4, "download";
    DownloadDone = 5, "download_done";
});

/// IP address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// IPv4.
    Ipv4,
    /// IPv6.
    Ipv6,
}

code_table!(AddressFamily {
    Ipv4 = 0, "ipv4";
    Ipv6 = 1, "ipv6";
});

/// Admin or operational state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OperState {
    /// State not reported.
    #[default]
    Unknown,
    /// Down.
    Down,
    /// Up.
    Up,
}

code_table!(OperState {
    Unknown = -1, "unknown";
    Down = 0, "down";
    Up = 1, "up";
});

/// How a MAC entry was learned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MacType {
    /// Type not set.
    #[default]
    None,
    /// Statically configured.
    Static,
    /// Dynamically learned.
    Dynamic,
}

code_table!(MacType {
    None = 0, "none";
    Static = 1, "static";
    Dynamic = 2, "dynamic";
});

/// Interface classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IntfType {
    /// Not classified.
    #[default]
    Unknown,
    /// Ethernet port.
    Ethernet,
    /// Switched virtual interface.
    Svi,
    /// Port channel.
    PortChannel,
    /// Loopback.
    Loopback,
    /// Sub-interface.
    SubInterface,
    /// Tunnel.
    Tunnel,
    /// Management port.
    Mgmt,
}

code_table!(IntfType {
    Unknown = 0, "unknown";
    Ethernet = 1, "eth";
    Svi = 2, "svi";
    PortChannel = 3, "port-channel";
    Loopback = 4, "loopback";
    SubInterface = 5, "subintf";
    Tunnel = 6, "tunnel";
    Mgmt = 7, "mgmt";
});

/// Output format for show commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RecordFormat {
    /// Plain text.
    #[default]
    Text,
    /// JSON.
    Json,
    /// XML.
    Xml,
}

code_table!(RecordFormat {
    Text = 0, "text";
    Json = 1, "json";
    Xml = 2, "xml";
});

/// Syslog priority for host trace output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SyslogPriority {
    /// Emergency.
    Emerg,
    /// Alert.
    Alert,
    /// Critical.
    Crit,
    /// Error.
    Error,
    /// Warning.
    Warning,
    /// Notice.
    Notice,
    /// Informational.
    Info,
    /// Debug.
    Debug,
}

code_table!(SyslogPriority {
    Emerg = 0, "emerg";
    Alert = 1, "alert";
    Crit = 2, "crit";
    Error = 3, "err";
    Warning = 4, "warning";
    Notice = 5, "notice";
    Info = 6, "info";
    Debug = 7, "debug";
});

/// CPU priority the host grants an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppPriority {
    /// Low priority.
    Low,
    /// Medium priority.
    Medium,
    /// High priority.
    High,
    /// No priority limit.
    #[default]
    None,
}

code_table!(AppPriority {
    Low = 1, "low";
    Medium = 2, "medium";
    High = 3, "high";
    None = 4, "none";
});

/// A 48-bit Ethernet MAC address.
///
/// Accepts colon, hyphen and dotted (`0011.2233.4455`) notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Creates a MAC address from raw bytes.
    pub const fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex: String = if s.contains('.') {
            let groups: Vec<&str> = s.split('.').collect();
            if groups.len() != 3 || groups.iter().any(|g| g.len() != 4) {
                return Err(());
            }
            groups.concat()
        } else {
            let parts: Vec<&str> = s.split(|c| c == ':' || c == '-').collect();
            if parts.len() != 6 || parts.iter().any(|p| p.len() != 2) {
                return Err(());
            }
            parts.concat()
        };

        if !hex.is_ascii() {
            return Err(());
        }

        let mut bytes = [0u8; 6];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| ())?;
        }
        Ok(MacAddress(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_parse() {
        assert_eq!("1".parse::<EventType>(), Ok(EventType::Add));
        assert_eq!("delete".parse::<EventType>(), Ok(EventType::Delete));
        assert_eq!("UPDATE".parse::<EventType>(), Ok(EventType::Update));
        assert!("9".parse::<EventType>().is_err());
        assert_eq!(EventType::DownloadDone.code(), 5);
    }

    #[test]
    fn test_oper_state_negative_code() {
        assert_eq!("-1".parse::<OperState>(), Ok(OperState::Unknown));
        assert_eq!("up".parse::<OperState>(), Ok(OperState::Up));
    }

    #[test]
    fn test_intf_type_names() {
        assert_eq!("port-channel".parse::<IntfType>(), Ok(IntfType::PortChannel));
        assert_eq!(IntfType::Svi.to_string(), "svi");
    }

    #[test]
    fn test_mac_address_formats() {
        let colon: MacAddress = "00:11:22:33:44:55".parse().unwrap();
        let hyphen: MacAddress = "00-11-22-33-44-55".parse().unwrap();
        let dotted: MacAddress = "0011.2233.4455".parse().unwrap();
        assert_eq!(colon, hyphen);
        assert_eq!(colon, dotted);
        assert_eq!(colon.to_string(), "00:11:22:33:44:55");
    }

    #[test]
    fn test_mac_address_invalid() {
        assert!("00:11:22:33:44".parse::<MacAddress>().is_err());
        assert!("zz:11:22:33:44:55".parse::<MacAddress>().is_err());
        assert!("0011.2233".parse::<MacAddress>().is_err());
    }
}

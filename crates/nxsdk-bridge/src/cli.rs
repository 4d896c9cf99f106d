//! Declarative CLI command schema.
//!
//! Applications describe their custom commands (name, syntax, keyword help,
//! parameter types and validation attributes) and submit the whole tree to
//! the host, which owns parsing. The schema is kept on this side as well so
//! raw parameter tokens can be coerced into typed [`ParamValue`]s before a
//! command handler sees them.
//!
//! # Example
//!
//! ```
//! use nxsdk_bridge::cli::{CommandSpec, CommandTree, ParamSpec};
//!
//! let mut tree = CommandTree::new();
//! tree.add(
//!     CommandSpec::config("set_port_bw_threshold_cmd", "port bw threshold <threshold>")
//!         .keyword("threshold", "Set Port BandWidth Threshold Alert")
//!         .param("<threshold>", "Threshold Limit. Default 50%", ParamSpec::integer(1, 100)),
//! )
//! .unwrap();
//! assert!(tree.get("set_port_bw_threshold_cmd").is_some());
//! ```

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, TranslationError};
use crate::types::MacAddress;
use crate::value::{IpValue, ParamType, ParamValue};

/// Default command timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u32 = 30;

/// Default maximum string parameter length.
pub const DEFAULT_STRING_LEN: usize = 256;

/// Default integer parameter bounds.
pub const DEFAULT_INT_MIN: i64 = 0;
pub const DEFAULT_INT_MAX: i64 = 214_748_364;

/// Maximum VRF name length.
pub const MAX_VRF_NAME_LEN: usize = 32;

static PARAM_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<[A-Za-z0-9_-]+>$").expect("Invalid regex pattern"));

static INTERFACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z-]*\d+(/\d+)*(\.\d+)?$").expect("Invalid regex pattern")
});

static VRF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.:-]+$").expect("Invalid regex pattern"));

/// Whether a command is a show or config command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    /// Configuration command.
    Config,
    /// Show command.
    Show,
}

/// CLI mode a command is available in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CliMode {
    /// Configuration terminal.
    Config,
    /// Any mode.
    Exec,
}

/// String parameter attributes.
#[derive(Debug, Clone)]
pub struct StringAttr {
    /// Maximum length in bytes.
    pub max_len: usize,
    /// Optional pattern the whole value must match.
    pub pattern: Option<Regex>,
}

/// Type and validation attributes of a CLI parameter.
#[derive(Debug, Clone)]
pub enum ParamSpec {
    /// Free-form string.
    String(StringAttr),
    /// Integer within an inclusive range.
    Integer {
        /// Lower bound.
        min: i64,
        /// Upper bound.
        max: i64,
    },
    /// Interface name.
    Interface,
    /// IP address or prefix.
    IpAddr {
        /// Expect an IPv6 value.
        ipv6: bool,
        /// Expect `addr/len` form.
        prefix: bool,
    },
    /// MAC address.
    MacAddr,
    /// VRF name.
    Vrf,
}

impl ParamSpec {
    /// String parameter with default length and no pattern.
    pub fn string() -> Self {
        ParamSpec::String(StringAttr {
            max_len: DEFAULT_STRING_LEN,
            pattern: None,
        })
    }

    /// String parameter with a length limit and anchored pattern.
    pub fn string_matching(max_len: usize, pattern: &str) -> Result<Self, SchemaError> {
        let anchored = format!("^(?:{})$", pattern);
        let re = Regex::new(&anchored).map_err(|e| SchemaError::InvalidPattern {
            param: pattern.to_string(),
            reason: e.to_string(),
        })?;
        let max_len = if max_len == 0 { DEFAULT_STRING_LEN } else { max_len };
        Ok(ParamSpec::String(StringAttr {
            max_len,
            pattern: Some(re),
        }))
    }

    /// Integer parameter; an inverted range falls back to the defaults.
    pub fn integer(min: i64, max: i64) -> Self {
        if max < min {
            ParamSpec::Integer {
                min: DEFAULT_INT_MIN,
                max: DEFAULT_INT_MAX,
            }
        } else {
            ParamSpec::Integer { min, max }
        }
    }

    /// IPv4/IPv6 address or prefix parameter.
    pub fn ip(ipv6: bool, prefix: bool) -> Self {
        ParamSpec::IpAddr { ipv6, prefix }
    }

    /// Returns the declared parameter type.
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamSpec::String(_) => ParamType::String,
            ParamSpec::Integer { .. } => ParamType::Integer,
            ParamSpec::Interface => ParamType::Interface,
            ParamSpec::IpAddr { .. } => ParamType::IpAddr,
            ParamSpec::MacAddr => ParamType::MacAddr,
            ParamSpec::Vrf => ParamType::Vrf,
        }
    }

    /// Converts a raw token into a typed value, enforcing the attributes.
    pub fn coerce(&self, name: &str, raw: &str) -> Result<ParamValue, TranslationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TranslationError::missing(name));
        }
        let expected = self.param_type().as_str();

        match self {
            ParamSpec::String(attr) => {
                if raw.len() > attr.max_len {
                    return Err(TranslationError::Rejected {
                        field: name.to_string(),
                        reason: format!("longer than {} bytes", attr.max_len),
                    });
                }
                if let Some(re) = &attr.pattern {
                    if !re.is_match(raw) {
                        return Err(TranslationError::Rejected {
                            field: name.to_string(),
                            reason: format!("does not match '{}'", re.as_str()),
                        });
                    }
                }
                Ok(ParamValue::String(raw.to_string()))
            }
            ParamSpec::Integer { min, max } => {
                let value = raw
                    .parse::<i64>()
                    .map_err(|_| TranslationError::invalid(name, expected, raw))?;
                if value < *min || value > *max {
                    return Err(TranslationError::OutOfRange {
                        field: name.to_string(),
                        value,
                        min: *min,
                        max: *max,
                    });
                }
                Ok(ParamValue::Integer(value))
            }
            ParamSpec::Interface => {
                if !INTERFACE_RE.is_match(raw) {
                    return Err(TranslationError::invalid(name, expected, raw));
                }
                Ok(ParamValue::Interface(raw.to_string()))
            }
            ParamSpec::IpAddr { ipv6, prefix } => {
                let ip: IpValue = raw
                    .parse()
                    .map_err(|_| TranslationError::invalid(name, expected, raw))?;
                if ip.is_ipv6() != *ipv6 || ip.prefix_len.is_some() != *prefix {
                    let want = match (ipv6, prefix) {
                        (false, false) => "ipv4 address",
                        (false, true) => "ipv4 prefix",
                        (true, false) => "ipv6 address",
                        (true, true) => "ipv6 prefix",
                    };
                    return Err(TranslationError::invalid(name, want, raw));
                }
                Ok(ParamValue::IpAddr(ip))
            }
            ParamSpec::MacAddr => raw
                .parse::<MacAddress>()
                .map(ParamValue::MacAddr)
                .map_err(|_| TranslationError::invalid(name, expected, raw)),
            ParamSpec::Vrf => {
                if raw.len() > MAX_VRF_NAME_LEN || !VRF_RE.is_match(raw) {
                    return Err(TranslationError::invalid(name, expected, raw));
                }
                Ok(ParamValue::Vrf(raw.to_string()))
            }
        }
    }
}

/// Help and attributes attached to a syntax parameter.
#[derive(Debug, Clone)]
pub struct ParamDef {
    /// Help string.
    pub help: String,
    /// Type and validation.
    pub spec: ParamSpec,
    /// Part of the config key.
    pub is_key: bool,
    /// Maximum number of values when the parameter is additive (0 = single).
    pub repeat: u8,
}

/// One custom CLI command.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    name: String,
    kind: CommandKind,
    syntax: String,
    mode: CliMode,
    timeout_secs: u32,
    keywords: BTreeMap<String, String>,
    params: BTreeMap<String, ParamDef>,
    unknown: Vec<String>,
}

impl CommandSpec {
    fn new(kind: CommandKind, name: &str, syntax: &str) -> Self {
        let mode = match kind {
            CommandKind::Config => CliMode::Config,
            CommandKind::Show => CliMode::Exec,
        };
        let mut keywords = BTreeMap::new();
        let mut params = BTreeMap::new();
        for token in tokenize(syntax) {
            if token.starts_with('<') {
                params.insert(
                    token.to_string(),
                    ParamDef {
                        help: token.trim_matches(|c| c == '<' || c == '>').to_string(),
                        spec: ParamSpec::string(),
                        is_key: false,
                        repeat: 0,
                    },
                );
            } else {
                keywords.insert(token.to_string(), String::new());
            }
        }

        Self {
            name: name.to_string(),
            kind,
            syntax: syntax.to_string(),
            mode,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            keywords,
            params,
            unknown: Vec::new(),
        }
    }

    /// Starts a config command definition.
    pub fn config(name: &str, syntax: &str) -> Self {
        Self::new(CommandKind::Config, name, syntax)
    }

    /// Starts a show command definition.
    pub fn show(name: &str, syntax: &str) -> Self {
        Self::new(CommandKind::Show, name, syntax)
    }

    /// Sets the help string of a syntax keyword.
    pub fn keyword(mut self, keyword: &str, help: &str) -> Self {
        match self.keywords.get_mut(keyword) {
            Some(h) => *h = help.to_string(),
            None => self.unknown.push(keyword.to_string()),
        }
        self
    }

    /// Sets the help string and type of a syntax parameter.
    pub fn param(mut self, param: &str, help: &str, spec: ParamSpec) -> Self {
        match self.params.get_mut(param) {
            Some(def) => {
                def.help = help.to_string();
                def.spec = spec;
            }
            None => self.unknown.push(param.to_string()),
        }
        self
    }

    /// Makes a parameter additive, accepting up to `repeat` values.
    pub fn additive(mut self, param: &str, repeat: u8) -> Self {
        match self.params.get_mut(param) {
            Some(def) => def.repeat = repeat,
            None => self.unknown.push(param.to_string()),
        }
        self
    }

    /// Marks a parameter as part of the config key.
    pub fn key(mut self, param: &str) -> Self {
        match self.params.get_mut(param) {
            Some(def) => def.is_key = true,
            None => self.unknown.push(param.to_string()),
        }
        self
    }

    /// Overrides the execution timeout.
    pub fn timeout(mut self, secs: u32) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Overrides the CLI mode.
    pub fn mode(mut self, mode: CliMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn syntax(&self) -> &str {
        &self.syntax
    }

    pub fn cli_mode(&self) -> CliMode {
        self.mode
    }

    pub fn timeout_secs(&self) -> u32 {
        self.timeout_secs
    }

    /// Returns the help string of a keyword, if it is part of the syntax.
    pub fn keyword_help(&self, keyword: &str) -> Option<&str> {
        self.keywords.get(keyword).map(String::as_str)
    }

    /// Returns true if `keyword` is part of the syntax.
    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords.contains_key(keyword)
    }

    /// Returns the definition of a parameter.
    pub fn param_def(&self, param: &str) -> Option<&ParamDef> {
        self.params.get(param)
    }

    /// Iterates parameter names in sorted order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// Checks the definition for mistakes the host would reject.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.name.is_empty() || self.name.chars().any(char::is_whitespace) {
            return Err(SchemaError::InvalidName(self.name.clone()));
        }
        if self.keywords.is_empty() && self.params.is_empty() {
            return Err(SchemaError::EmptySyntax(self.name.clone()));
        }
        if let Some(token) = self.unknown.first() {
            return Err(SchemaError::UnknownToken {
                command: self.name.clone(),
                token: token.clone(),
            });
        }
        if let Some(bad) = self.params.keys().find(|p| !PARAM_NAME_RE.is_match(p)) {
            return Err(SchemaError::UnknownToken {
                command: self.name.clone(),
                token: bad.clone(),
            });
        }
        Ok(())
    }
}

/// Splits a syntax string into keyword and `<param>` tokens.
fn tokenize(syntax: &str) -> impl Iterator<Item = &str> {
    syntax
        .split(|c: char| c.is_whitespace() || matches!(c, '[' | ']' | '{' | '}' | '|'))
        .filter(|t| !t.is_empty())
}

/// The set of custom commands an application adds to the host parse tree.
#[derive(Debug, Clone, Default)]
pub struct CommandTree {
    commands: Vec<CommandSpec>,
    keyword_help: BTreeMap<String, String>,
}

impl CommandTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and adds a command.
    ///
    /// Keyword help given by an earlier command is inherited by later
    /// commands that leave the same keyword undocumented, and vice versa.
    pub fn add(&mut self, mut spec: CommandSpec) -> Result<(), SchemaError> {
        spec.validate()?;
        if self.get(spec.name()).is_some() {
            return Err(SchemaError::DuplicateCommand(spec.name().to_string()));
        }

        for (keyword, help) in spec.keywords.iter_mut() {
            if help.is_empty() {
                match self.keyword_help.get(keyword) {
                    Some(known) => *help = known.clone(),
                    None => *help = keyword.clone(),
                }
            } else {
                self.keyword_help.insert(keyword.clone(), help.clone());
            }
        }

        tracing::debug!(command = %spec.name(), syntax = %spec.syntax(), "Added CLI command");
        self.commands.push(spec);
        Ok(())
    }

    /// Looks up a command by name.
    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.iter().find(|c| c.name == name)
    }

    /// Returns all commands in insertion order.
    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

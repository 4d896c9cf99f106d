//! Command execution payload.

use std::collections::BTreeMap;
use std::fmt;

use crate::cli::{CommandKind, CommandSpec};
use crate::error::TranslationError;
use crate::host::Console;
use crate::value::{FieldValue, ParamValue};

/// Keyword every config command accepts as a negation prefix.
pub const NO_KEYWORD: &str = "no";

/// Command invocation as the host delivers it.
///
/// Parameter values are raw tokens; additive parameters appear once per
/// value, in the order they were entered.
pub struct RawCommand<'a> {
    /// Name the command was declared with.
    pub name: &'a str,
    /// Command line as typed.
    pub line: &'a str,
    /// Keywords present on the command line.
    pub keywords: &'a [String],
    /// Parameter name / raw token pairs.
    pub params: &'a [FieldValue],
    /// Console of the CLI session.
    pub console: &'a dyn Console,
}

impl fmt::Debug for RawCommand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawCommand")
            .field("name", &self.name)
            .field("line", &self.line)
            .field("keywords", &self.keywords)
            .field("params", &self.params)
            .finish()
    }
}

/// A parsed, typed command invocation handed to a command handler.
///
/// Borrows the host console; it cannot outlive the callback.
pub struct CliCommand<'a> {
    name: &'a str,
    line: &'a str,
    kind: CommandKind,
    keywords: &'a [String],
    params: BTreeMap<String, Vec<ParamValue>>,
    console: &'a dyn Console,
}

impl<'a> CliCommand<'a> {
    /// Converts a raw invocation using the command's declared schema.
    pub fn translate(raw: &RawCommand<'a>, spec: &CommandSpec) -> Result<Self, TranslationError> {
        for keyword in raw.keywords {
            let allowed = spec.has_keyword(keyword)
                || (keyword == NO_KEYWORD && spec.kind() == CommandKind::Config);
            if !allowed {
                return Err(TranslationError::Rejected {
                    field: keyword.clone(),
                    reason: format!("not a keyword of '{}'", spec.name()),
                });
            }
        }

        let mut params: BTreeMap<String, Vec<ParamValue>> = BTreeMap::new();
        for (name, token) in raw.params {
            let def = spec.param_def(name).ok_or_else(|| TranslationError::Rejected {
                field: name.clone(),
                reason: format!("not a parameter of '{}'", spec.name()),
            })?;
            let value = def.spec.coerce(name, token)?;
            let values = params.entry(name.clone()).or_default();
            values.push(value);

            let limit = usize::from(def.repeat.max(1));
            if values.len() > limit {
                return Err(TranslationError::Rejected {
                    field: name.clone(),
                    reason: format!("more than {} value(s)", limit),
                });
            }
        }

        Ok(Self {
            name: raw.name,
            line: raw.line,
            kind: spec.kind(),
            keywords: raw.keywords,
            params,
            console: raw.console,
        })
    }

    /// Name the command was declared with.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Command line as typed.
    pub fn line(&self) -> &str {
        self.line
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Returns true if the keyword was entered.
    pub fn is_keyword_set(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }

    /// Returns true for the `no` form of a config command.
    pub fn is_negated(&self) -> bool {
        self.is_keyword_set(NO_KEYWORD)
    }

    /// First value of a parameter.
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name).and_then(|v| v.first())
    }

    /// All values of an additive parameter.
    pub fn param_values(&self, name: &str) -> &[ParamValue] {
        self.params.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of values entered for a parameter.
    pub fn param_count(&self, name: &str) -> usize {
        self.param_values(name).len()
    }

    /// Text of a string-like parameter that must be present.
    pub fn str_param(&self, name: &str) -> Result<&str, TranslationError> {
        let value = self
            .param(name)
            .ok_or_else(|| TranslationError::missing(name))?;
        value.as_text().ok_or_else(|| TranslationError::TypeMismatch {
            field: name.to_string(),
            expected: "string",
            actual: value.param_type().as_str(),
        })
    }

    /// Text of an optional string-like parameter.
    pub fn opt_str_param(&self, name: &str) -> Option<&str> {
        self.param(name).and_then(ParamValue::as_text)
    }

    /// Value of an integer parameter that must be present.
    pub fn int_param(&self, name: &str) -> Result<i64, TranslationError> {
        let value = self
            .param(name)
            .ok_or_else(|| TranslationError::missing(name))?;
        value.as_int().ok_or_else(|| TranslationError::TypeMismatch {
            field: name.to_string(),
            expected: "integer",
            actual: value.param_type().as_str(),
        })
    }

    /// Prints on the console of the session that ran the command.
    pub fn print_console(&self, text: &str) {
        self.console.print_console(text);
    }
}

impl fmt::Debug for CliCommand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliCommand")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("keywords", &self.keywords)
            .field("params", &self.params)
            .finish()
    }
}

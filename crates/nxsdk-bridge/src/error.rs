//! Error types for the callback bridge.
//!
//! Only [`RegistrationError`], [`SchemaError`] and [`ConfigError`] ever reach
//! a caller. [`TranslationError`] and [`HandlerFault`] are produced inside a
//! director and are converted to the domain's safe default before control
//! returns to the host.

use std::io;
use thiserror::Error;

use crate::domain::Domain;
use crate::host::HostHandle;

/// Result type alias for registration operations.
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Result type returned by consumer handlers.
pub type HandlerResult<T> = anyhow::Result<T>;

/// Error codes reported by the host runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// API not used the way the host expects.
    #[error("invalid usage: {0}")]
    InvalidUsage(String),

    /// Not a valid scenario.
    #[error("invalid request: {0}")]
    Invalid(String),

    /// Null pointer passed across the boundary.
    #[error("null pointer parameter")]
    NullPointer,

    /// Requested object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Object already exists.
    #[error("already exists: {0}")]
    Exists(String),

    /// Nothing to operate on.
    #[error("empty: {0}")]
    Empty(String),

    /// Host reached one of its limits.
    #[error("max limit reached: {0}")]
    MaxLimit(String),

    /// Generic failure.
    #[error("failure: {0}")]
    Failure(String),

    /// Remote session to the host is down.
    #[error("remote session down")]
    RemoteDown,

    /// SDK objects created before a remote session drop were used.
    #[error("sdk objects obsolete after remote session drop")]
    ObsoleteObjects,

    /// Anything the host could not classify.
    #[error("unknown host error: {0}")]
    Unknown(String),
}

impl HostError {
    /// Returns the numeric code the host uses for this error.
    pub fn code(&self) -> u32 {
        match self {
            HostError::InvalidUsage(_) => 1,
            HostError::Invalid(_) => 2,
            HostError::NullPointer => 3,
            HostError::NotFound(_) => 4,
            HostError::Exists(_) => 5,
            HostError::Empty(_) => 6,
            HostError::MaxLimit(_) => 7,
            HostError::Failure(_) => 8,
            HostError::Unknown(_) => 13,
            HostError::RemoteDown => 14,
            HostError::ObsoleteObjects => 15,
        }
    }
}

/// Errors surfaced synchronously by `register` / `deregister`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The host refused to install the director.
    #[error("host rejected {domain} handler: {source}")]
    HostRejected {
        /// Domain of the rejected registration.
        domain: Domain,
        /// Error reported by the host.
        #[source]
        source: HostError,
    },

    /// The host failed to remove an installed director.
    #[error("host failed to remove handler {handle}: {source}")]
    RemoveFailed {
        /// Handle of the registration being removed.
        handle: HostHandle,
        /// Error reported by the host.
        #[source]
        source: HostError,
    },

    /// A registration for the domain is active and replacement is disabled.
    #[error("{domain} handler already registered as {existing}")]
    DomainBusy {
        /// Domain that is already taken.
        domain: Domain,
        /// Handle of the active registration.
        existing: HostHandle,
    },

    /// The session has already been shut down.
    #[error("session is closed")]
    SessionClosed,
}

impl RegistrationError {
    /// Creates a host rejection error.
    pub fn host_rejected(domain: Domain, source: HostError) -> Self {
        Self::HostRejected { domain, source }
    }

    /// Creates a removal failure error.
    pub fn remove_failed(handle: HostHandle, source: HostError) -> Self {
        Self::RemoveFailed { handle, source }
    }
}

/// A raw host payload could not be converted into its typed view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    /// A required field or parameter is absent.
    #[error("missing field '{field}'")]
    MissingField {
        /// Field or parameter name.
        field: String,
    },

    /// A value does not parse as the expected type.
    #[error("field '{field}' value '{value}' is not a valid {expected}")]
    InvalidValue {
        /// Field or parameter name.
        field: String,
        /// Expected type description.
        expected: &'static str,
        /// Raw value received.
        value: String,
    },

    /// A value is present but typed differently than requested.
    #[error("parameter '{field}' is {actual}, not {expected}")]
    TypeMismatch {
        /// Parameter name.
        field: String,
        /// Requested type.
        expected: &'static str,
        /// Actual type of the value.
        actual: &'static str,
    },

    /// An integer falls outside its declared range.
    #[error("parameter '{field}' value {value} outside {min}..={max}")]
    OutOfRange {
        /// Parameter name.
        field: String,
        /// Value received.
        value: i64,
        /// Lower bound.
        min: i64,
        /// Upper bound.
        max: i64,
    },

    /// A string violates its declared length or pattern.
    #[error("parameter '{field}' rejected: {reason}")]
    Rejected {
        /// Parameter name.
        field: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The command was never declared in the parse tree.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}

impl TranslationError {
    /// Creates a missing field error.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid(field: impl Into<String>, expected: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            expected,
            value: value.into(),
        }
    }
}

/// Consumer handler code failed during an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerFault {
    /// The handler returned an error.
    #[error("{domain} handler returned error: {message}")]
    Failed {
        /// Domain of the handler.
        domain: Domain,
        /// Rendered error chain.
        message: String,
    },

    /// The handler panicked.
    #[error("{domain} handler panicked: {message}")]
    Panicked {
        /// Domain of the handler.
        domain: Domain,
        /// Panic payload, if it was a string.
        message: String,
    },
}

/// A CLI command definition is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Command name is empty or contains whitespace.
    #[error("invalid command name '{0}'")]
    InvalidName(String),

    /// Syntax string has no tokens.
    #[error("command '{0}' has empty syntax")]
    EmptySyntax(String),

    /// A keyword or parameter was updated that is not part of the syntax.
    #[error("command '{command}' syntax has no token '{token}'")]
    UnknownToken {
        /// Command name.
        command: String,
        /// Offending token.
        token: String,
    },

    /// Two commands share a name.
    #[error("duplicate command '{0}'")]
    DuplicateCommand(String),

    /// A string parameter carries an uncompilable pattern.
    #[error("parameter '{param}' has invalid pattern: {reason}")]
    InvalidPattern {
        /// Parameter name.
        param: String,
        /// Regex compiler message.
        reason: String,
    },

    /// The host refused the parse tree.
    #[error("host rejected parse tree: {0}")]
    HostRejected(#[from] HostError),
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// File is not valid TOML for the config schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field failed validation.
    #[error("invalid configuration for {field}: {message}")]
    Invalid {
        /// Field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },
}

impl ConfigError {
    /// Creates an invalid configuration error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_rejected_display() {
        let err = RegistrationError::host_rejected(
            Domain::RouteEvent,
            HostError::Invalid("rib manager unavailable".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "host rejected route handler: invalid request: rib manager unavailable"
        );
    }

    #[test]
    fn test_domain_busy_display() {
        let err = RegistrationError::DomainBusy {
            domain: Domain::Command,
            existing: HostHandle::from_raw(7).unwrap(),
        };
        assert_eq!(err.to_string(), "command handler already registered as #7");
    }

    #[test]
    fn test_translation_error_display() {
        let err = TranslationError::missing("<threshold>");
        assert_eq!(err.to_string(), "missing field '<threshold>'");

        let err = TranslationError::invalid("mask_len", "integer", "abc");
        assert_eq!(
            err.to_string(),
            "field 'mask_len' value 'abc' is not a valid integer"
        );

        let err = TranslationError::OutOfRange {
            field: "<threshold>".to_string(),
            value: 150,
            min: 1,
            max: 100,
        };
        assert_eq!(
            err.to_string(),
            "parameter '<threshold>' value 150 outside 1..=100"
        );
    }

    #[test]
    fn test_host_error_codes() {
        assert_eq!(HostError::NullPointer.code(), 3);
        assert_eq!(HostError::Exists("x".into()).code(), 5);
        assert_eq!(HostError::RemoteDown.code(), 14);
    }

    #[test]
    fn test_handler_fault_display() {
        let fault = HandlerFault::Panicked {
            domain: Domain::TreeChange,
            message: "boom".to_string(),
        };
        assert_eq!(fault.to_string(), "dme handler panicked: boom");
    }
}

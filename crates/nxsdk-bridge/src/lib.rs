//! Callback bridge between the NX-SDK host runtime and Rust handlers.
//!
//! The host owns the switch state and calls back on its own threads when
//! a CLI command runs or a watched object changes. This crate lets an
//! application implement those callbacks as ordinary Rust traits:
//!
//! - [`handler`]: one handler trait per callback domain
//! - [`payload`]: typed views of the raw host records, with explicit
//!   translation functions
//! - [`director`]: the adapters the host actually calls; they admit,
//!   translate, invoke and contain failures
//! - [`session`]: registration, deregistration and teardown order
//! - [`cli`]: the custom command schema submitted to the host parse tree
//! - [`host`]: what the bridge needs from the host
//! - [`ffi`]: C ABI entry points for a natively compiled host
//!
//! Failures inside a callback never reach the host: they are logged with
//! `tracing` and the host gets the callback's safe default.

pub mod cli;
pub mod config;
pub mod director;
pub mod domain;
pub mod error;
pub mod ffi;
pub mod handler;
pub mod host;
pub mod payload;
pub mod session;
pub mod types;
pub mod value;

pub use cli::{CliMode, CommandKind, CommandSpec, CommandTree, ParamSpec};
pub use config::SessionConfig;
pub use director::{Director, DirectorRef, DirectorStats};
pub use domain::Domain;
pub use error::{
    ConfigError, HandlerFault, HandlerResult, HostError, RegistrationError, RegistrationResult,
    SchemaError, TranslationError,
};
pub use handler::{
    AddressHandler, AdjacencyHandler, CommandHandler, InterfaceHandler, RouteHandler,
    TreeChangeHandler,
};
pub use host::{Console, Host, HostHandle, Tracer, WatchTarget};
pub use payload::{
    Adjacency, CliCommand, DmeObject, IntfChange, Interface, L3NextHop, L3Route, MacEntry,
    RawCommand, Vrf,
};
pub use session::{DomainHandler, RegistrationHandle, Session};
pub use types::{
    AddressFamily, AppPriority, EventType, IntfType, MacAddress, MacType, OperState,
    RecordFormat, SyslogPriority,
};
pub use value::{FieldValue, FieldValues, FieldValuesExt, IpValue, ParamType, ParamValue};

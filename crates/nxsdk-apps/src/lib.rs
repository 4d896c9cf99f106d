//! Example NX-SDK applications
//!
//! Each module adds its CLI commands and watches to a [`Session`] and
//! registers its handlers; [`runner`] drives one of them against the
//! simulated host.
//!
//! [`Session`]: nxsdk_bridge::Session

pub mod custom_cli;
pub mod feature_monitor;
pub mod intf_monitor;
pub mod rib_watch;
pub mod runner;

pub use runner::{run, AppKind, RunReport};

/// Installs the `tracing` subscriber.
///
/// `RUST_LOG` overrides `level`. A subscriber installed earlier is kept.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(true)
                .with_level(true),
        )
        .try_init();
}

//! Session context: registration registry and lifecycle.
//!
//! A [`Session`] owns the connection to the host and every registration
//! made through it. There are no process globals; applications that need
//! several threads share the session behind an `Arc`.
//!
//! Teardown order matters to the host: every director must be removed
//! before the host session is closed. [`Session::shutdown`] enforces that.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::cli::CommandTree;
use crate::config::SessionConfig;
use crate::director::{Director, DirectorRef, SharedTree, Slot};
use crate::domain::Domain;
use crate::error::{HostError, RegistrationError, RegistrationResult, SchemaError};
use crate::handler::{
    AddressHandler, AdjacencyHandler, CommandHandler, InterfaceHandler, RouteHandler,
    TreeChangeHandler,
};
use crate::host::{Host, HostHandle, Tracer, WatchTarget};
use crate::types::RecordFormat;

/// A handler for any domain, as accepted by [`Session::register`].
#[derive(Clone)]
pub enum DomainHandler {
    Command(Arc<dyn CommandHandler>),
    TreeChange(Arc<dyn TreeChangeHandler>),
    Route(Arc<dyn RouteHandler>),
    Adjacency(Arc<dyn AdjacencyHandler>),
    Address(Arc<dyn AddressHandler>),
    Interface(Arc<dyn InterfaceHandler>),
}

impl DomainHandler {
    pub fn domain(&self) -> Domain {
        match self {
            DomainHandler::Command(_) => Domain::Command,
            DomainHandler::TreeChange(_) => Domain::TreeChange,
            DomainHandler::Route(_) => Domain::RouteEvent,
            DomainHandler::Adjacency(_) => Domain::AdjacencyEvent,
            DomainHandler::Address(_) => Domain::AddressEvent,
            DomainHandler::Interface(_) => Domain::InterfaceEvent,
        }
    }
}

impl fmt::Debug for DomainHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DomainHandler({})", self.domain())
    }
}

/// Consumer-side proof of a registration, used to deregister it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationHandle {
    domain: Domain,
    host: HostHandle,
    serial: u64,
}

impl RegistrationHandle {
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Handle the host assigned to the installed director.
    pub fn host_handle(&self) -> HostHandle {
        self.host
    }
}

impl fmt::Display for RegistrationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.domain, self.host)
    }
}

/// Type-erased registry entry.
trait Registration: Send + Sync {
    fn serial(&self) -> u64;

    fn is_active(&self) -> bool;

    /// Deactivates the slot; returns the host handle on the first call.
    fn deactivate(&self) -> Option<HostHandle>;
}

struct Entry<H: ?Sized> {
    serial: u64,
    slot: Arc<Slot<H>>,
}

impl<H: ?Sized + Send + Sync + 'static> Registration for Entry<H> {
    fn serial(&self) -> u64 {
        self.serial
    }

    fn is_active(&self) -> bool {
        self.slot.is_active()
    }

    fn deactivate(&self) -> Option<HostHandle> {
        self.slot.deactivate()
    }
}

/// An application's session with the host.
pub struct Session {
    host: Arc<dyn Host>,
    config: SessionConfig,
    registry: DashMap<HostHandle, Arc<dyn Registration>>,
    by_domain: DashMap<Domain, RegistrationHandle>,
    commands: SharedTree,
    /// Serializes registration changes against each other and teardown.
    registration: Mutex<()>,
    next_serial: AtomicU64,
    closed: AtomicBool,
}

impl Session {
    /// Opens a session on a host and applies the configured app identity.
    pub fn new(host: Arc<dyn Host>, config: SessionConfig) -> Self {
        host.set_app_desc(&config.app.description);
        host.set_app_priority(config.app.priority);
        info!(
            app = %host.app_name(),
            priority = %config.app.priority,
            "Opened host session"
        );

        Self {
            host,
            config,
            registry: DashMap::new(),
            by_domain: DashMap::new(),
            commands: Arc::new(RwLock::new(CommandTree::new())),
            registration: Mutex::new(()),
            next_serial: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The host this session talks to, for handlers that need its
    /// capabilities.
    pub fn host(&self) -> Arc<dyn Host> {
        Arc::clone(&self.host)
    }

    pub fn app_name(&self) -> String {
        self.host.app_name()
    }

    /// Registers a handler for its domain.
    ///
    /// With `replace_existing`, a registration already active for the domain
    /// is superseded once the host accepts the new one; otherwise the call
    /// fails with [`RegistrationError::DomainBusy`].
    pub fn register(&self, handler: DomainHandler) -> RegistrationResult<RegistrationHandle> {
        match handler {
            DomainHandler::Command(h) => self.install(Domain::Command, h, |slot| {
                DirectorRef::Command(Director::with_commands(slot, Arc::clone(&self.commands)))
            }),
            DomainHandler::TreeChange(h) => self.install(Domain::TreeChange, h, |slot| {
                DirectorRef::TreeChange(Director::new(slot))
            }),
            DomainHandler::Route(h) => {
                self.install(Domain::RouteEvent, h, |slot| DirectorRef::Route(Director::new(slot)))
            }
            DomainHandler::Adjacency(h) => self.install(Domain::AdjacencyEvent, h, |slot| {
                DirectorRef::Adjacency(Director::new(slot))
            }),
            DomainHandler::Address(h) => self.install(Domain::AddressEvent, h, |slot| {
                DirectorRef::Address(Director::new(slot))
            }),
            DomainHandler::Interface(h) => self.install(Domain::InterfaceEvent, h, |slot| {
                DirectorRef::Interface(Director::new(slot))
            }),
        }
    }

    pub fn register_command_handler<H: CommandHandler + 'static>(
        &self,
        handler: Arc<H>,
    ) -> RegistrationResult<RegistrationHandle> {
        self.register(DomainHandler::Command(handler))
    }

    pub fn register_tree_handler<H: TreeChangeHandler + 'static>(
        &self,
        handler: Arc<H>,
    ) -> RegistrationResult<RegistrationHandle> {
        self.register(DomainHandler::TreeChange(handler))
    }

    pub fn register_route_handler<H: RouteHandler + 'static>(
        &self,
        handler: Arc<H>,
    ) -> RegistrationResult<RegistrationHandle> {
        self.register(DomainHandler::Route(handler))
    }

    pub fn register_adjacency_handler<H: AdjacencyHandler + 'static>(
        &self,
        handler: Arc<H>,
    ) -> RegistrationResult<RegistrationHandle> {
        self.register(DomainHandler::Adjacency(handler))
    }

    pub fn register_address_handler<H: AddressHandler + 'static>(
        &self,
        handler: Arc<H>,
    ) -> RegistrationResult<RegistrationHandle> {
        self.register(DomainHandler::Address(handler))
    }

    pub fn register_interface_handler<H: InterfaceHandler + 'static>(
        &self,
        handler: Arc<H>,
    ) -> RegistrationResult<RegistrationHandle> {
        self.register(DomainHandler::Interface(handler))
    }

    fn install<H: ?Sized + Send + Sync + 'static>(
        &self,
        domain: Domain,
        handler: Arc<H>,
        make_director: impl FnOnce(&Arc<Slot<H>>) -> DirectorRef,
    ) -> RegistrationResult<RegistrationHandle> {
        let _guard = self.registration.lock();
        if self.closed.load(Ordering::Acquire) {
            return Err(RegistrationError::SessionClosed);
        }
        if !self.config.bridge.replace_existing {
            if let Some(existing) = self.by_domain.get(&domain) {
                return Err(RegistrationError::DomainBusy {
                    domain,
                    existing: existing.host,
                });
            }
        }

        let slot = Slot::new(domain, handler);
        let director = make_director(&slot);
        let host_handle = self.host.install_handler(domain, director).map_err(|e| {
            warn!(domain = %domain, error = %e, "Host rejected handler");
            RegistrationError::host_rejected(domain, e)
        })?;
        slot.activate(host_handle);

        let handle = RegistrationHandle {
            domain,
            host: host_handle,
            serial: self.next_serial.fetch_add(1, Ordering::Relaxed),
        };
        let entry: Arc<dyn Registration> = Arc::new(Entry {
            serial: handle.serial,
            slot,
        });
        self.registry.insert(host_handle, entry);

        if let Some(previous) = self.by_domain.insert(domain, handle) {
            self.retire(&previous);
            info!(domain = %domain, previous = %previous.host, handle = %host_handle, "Replaced handler");
        } else {
            info!(domain = %domain, handle = %host_handle, "Registered handler");
        }
        Ok(handle)
    }

    /// Drops a registration the host already superseded.
    fn retire(&self, previous: &RegistrationHandle) {
        if let Some((_, entry)) = self
            .registry
            .remove_if(&previous.host, |_, e| e.serial() == previous.serial)
        {
            entry.deactivate();
        }
    }

    fn lookup(&self, handle: &RegistrationHandle) -> Option<Arc<dyn Registration>> {
        self.registry
            .get(&handle.host)
            .filter(|e| e.serial() == handle.serial)
            .map(|e| Arc::clone(e.value()))
    }

    /// Deregisters a handler. Idempotent.
    ///
    /// Once this returns, no new invocation reaches the handler. Calls the
    /// director admitted earlier run to completion.
    pub fn deregister(&self, handle: &RegistrationHandle) -> RegistrationResult<()> {
        let _guard = self.registration.lock();
        self.deregister_locked(handle)
    }

    fn deregister_locked(&self, handle: &RegistrationHandle) -> RegistrationResult<()> {
        let Some(entry) = self.lookup(handle) else {
            debug!(handle = %handle, "Deregister of unknown or retired handle ignored");
            return Ok(());
        };

        let host_handle = entry.deactivate();
        self.registry
            .remove_if(&handle.host, |_, e| e.serial() == handle.serial);
        self.by_domain.remove_if(&handle.domain, |_, h| h == handle);

        let Some(host_handle) = host_handle else {
            return Ok(());
        };
        self.host
            .remove_handler(host_handle)
            .map_err(|e| RegistrationError::remove_failed(host_handle, e))?;
        info!(domain = %handle.domain, handle = %host_handle, "Deregistered handler");
        Ok(())
    }

    pub fn is_active(&self, handle: &RegistrationHandle) -> bool {
        self.lookup(handle).is_some_and(|e| e.is_active())
    }

    /// Domains with an active registration, in domain order.
    pub fn active_domains(&self) -> Vec<Domain> {
        let mut domains: Vec<Domain> = self.by_domain.iter().map(|e| *e.key()).collect();
        domains.sort_by_key(Domain::code);
        domains
    }

    pub fn registration_count(&self) -> usize {
        self.registry.len()
    }

    /// Caller holds the registration lock.
    fn deregister_all(&self) -> RegistrationResult<()> {
        let handles: Vec<RegistrationHandle> = self.by_domain.iter().map(|e| *e.value()).collect();
        let mut first_error = None;
        for handle in handles {
            if let Err(e) = self.deregister_locked(&handle) {
                warn!(handle = %handle, error = %e, "Deregistration failed during teardown");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Deregisters everything and closes the host session.
    ///
    /// Safe to call from any thread holding the session; later calls and
    /// registrations fail or do nothing.
    pub fn close(&self) -> RegistrationResult<()> {
        let _guard = self.registration.lock();
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let result = self.deregister_all();
        self.host.close();
        info!(app = %self.host.app_name(), "Closed host session");
        result
    }

    /// Consumes the session, tearing it down in host order.
    pub fn shutdown(self) -> RegistrationResult<()> {
        self.close()
    }

    /// Returns the host tracer.
    pub fn tracer(&self) -> Arc<dyn Tracer> {
        self.host.tracer()
    }

    pub fn exec_show_cmd(&self, cmd: &str, format: RecordFormat) -> Result<String, HostError> {
        self.host.exec_show_cmd(cmd, format)
    }

    /// Adds commands to the host parse tree.
    ///
    /// The tree is merged with commands added earlier; a name clash fails
    /// before anything reaches the host. Concurrent calls are applied one
    /// at a time.
    pub fn add_to_parse_tree(&self, tree: &CommandTree) -> Result<(), SchemaError> {
        let mut commands = self.commands.write();
        let mut merged = commands.clone();
        for spec in tree.commands() {
            merged.add(spec.clone())?;
        }
        self.host.submit_commands(tree.commands())?;
        *commands = merged;
        drop(commands);
        info!(count = tree.len(), "Added commands to parse tree");
        Ok(())
    }

    pub fn watch(&self, target: &WatchTarget) -> Result<(), HostError> {
        self.host.watch(target)?;
        debug!(?target, "Watching");
        Ok(())
    }

    pub fn unwatch(&self, target: &WatchTarget) -> Result<(), HostError> {
        self.host.unwatch(target)?;
        debug!(?target, "Stopped watching");
        Ok(())
    }

    /// Runs the host event loop on the calling thread until stopped.
    pub fn start_event_loop(&self) {
        self.host.start_event_loop();
    }

    pub fn stop_event_loop(&self) {
        self.host.stop_event_loop();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.closed.load(Ordering::Acquire) || self.registry.is_empty() {
            return;
        }
        if !self.config.bridge.auto_deregister_on_drop {
            warn!(
                registrations = self.registry.len(),
                "Session dropped without shutdown, registrations left installed"
            );
            return;
        }
        warn!(
            registrations = self.registry.len(),
            "Session dropped without shutdown, deregistering"
        );
        let _guard = self.registration.lock();
        let _ = self.deregister_all();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("registrations", &self.registry.len())
            .field("domains", &self.active_domains())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

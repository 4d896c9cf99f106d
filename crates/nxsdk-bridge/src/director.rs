//! Directors: the adapters the host calls back into.
//!
//! A director never owns the handler it serves. It holds a weak reference
//! to the registration slot, and on every host call it:
//!
//! 1. checks the slot is still active, cloning the handler under the read
//!    lock (the lock is released before the handler runs);
//! 2. translates the raw payload into its typed view;
//! 3. invokes the handler synchronously, catching errors and panics.
//!
//! Any failure along the way is logged here and answered with the domain's
//! safe default: `true` for boolean callbacks, nothing otherwise. Nothing
//! propagates back into the host.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, error, warn};

use crate::cli::CommandTree;
use crate::domain::Domain;
use crate::error::{HandlerFault, HandlerResult, TranslationError};
use crate::handler::{
    AddressHandler, AdjacencyHandler, CommandHandler, InterfaceHandler, RouteHandler,
    TreeChangeHandler,
};
use crate::host::HostHandle;
use crate::payload::{
    Adjacency, CliCommand, DmeObject, IntfChange, Interface, L3Route, MacEntry, RawCommand, Vrf,
};
use crate::value::FieldValues;

/// Parse tree shared between a session and its command director.
pub(crate) type SharedTree = Arc<RwLock<CommandTree>>;

struct SlotState<H: ?Sized> {
    handler: Option<Arc<H>>,
    host_handle: Option<HostHandle>,
}

/// Registration slot: the handler plus the host handle it is installed as.
///
/// Active iff a host handle is set. Owned by the session; directors only
/// hold weak references.
pub(crate) struct Slot<H: ?Sized> {
    domain: Domain,
    state: RwLock<SlotState<H>>,
}

impl<H: ?Sized> Slot<H> {
    pub(crate) fn new(domain: Domain, handler: Arc<H>) -> Arc<Self> {
        Arc::new(Self {
            domain,
            state: RwLock::new(SlotState {
                handler: Some(handler),
                host_handle: None,
            }),
        })
    }

    pub(crate) fn domain(&self) -> Domain {
        self.domain
    }

    /// Marks the slot active once the host has accepted its director.
    pub(crate) fn activate(&self, handle: HostHandle) {
        self.state.write().host_handle = Some(handle);
    }

    /// Deactivates the slot and releases the handler.
    ///
    /// Returns the host handle the first time only.
    pub(crate) fn deactivate(&self) -> Option<HostHandle> {
        let mut state = self.state.write();
        state.handler = None;
        state.host_handle.take()
    }

    pub(crate) fn host_handle(&self) -> Option<HostHandle> {
        self.state.read().host_handle
    }

    pub(crate) fn is_active(&self) -> bool {
        self.host_handle().is_some()
    }

    /// Returns the handler if the slot is active.
    fn admit(&self) -> Option<Arc<H>> {
        let state = self.state.read();
        state.host_handle?;
        state.handler.clone()
    }
}

/// Counters a director keeps about the calls it received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectorStats {
    /// Host calls received.
    pub invocations: u64,
    /// Calls that arrived after deregistration.
    pub rejected: u64,
    /// Calls whose payload failed to translate.
    pub translation_errors: u64,
    /// Handler errors and panics.
    pub faults: u64,
}

#[derive(Default)]
struct Counters {
    invocations: AtomicU64,
    rejected: AtomicU64,
    translation_errors: AtomicU64,
    faults: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> DirectorStats {
        DirectorStats {
            invocations: self.invocations.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            translation_errors: self.translation_errors.load(Ordering::Relaxed),
            faults: self.faults.load(Ordering::Relaxed),
        }
    }
}

/// Host-facing adapter for one registration.
pub struct Director<H: ?Sized> {
    domain: Domain,
    slot: Weak<Slot<H>>,
    counters: Counters,
    commands: Option<SharedTree>,
}

impl<H: ?Sized> Director<H> {
    pub(crate) fn new(slot: &Arc<Slot<H>>) -> Arc<Self> {
        Arc::new(Self {
            domain: slot.domain(),
            slot: Arc::downgrade(slot),
            counters: Counters::default(),
            commands: None,
        })
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Returns true while the registration behind this director is active.
    pub fn is_active(&self) -> bool {
        self.slot.upgrade().is_some_and(|s| s.is_active())
    }

    pub fn stats(&self) -> DirectorStats {
        self.counters.snapshot()
    }

    fn dispatch<T, R>(
        &self,
        callback: &'static str,
        default: R,
        translate: impl FnOnce() -> Result<T, TranslationError>,
        call: impl FnOnce(&H, &T) -> HandlerResult<R>,
    ) -> R {
        Counters::bump(&self.counters.invocations);

        let Some(handler) = self.slot.upgrade().and_then(|slot| slot.admit()) else {
            Counters::bump(&self.counters.rejected);
            debug!(domain = %self.domain, callback, "Callback after deregistration ignored");
            return default;
        };

        let payload = match translate() {
            Ok(payload) => payload,
            Err(e) => {
                Counters::bump(&self.counters.translation_errors);
                warn!(domain = %self.domain, callback, error = %e, "Dropping untranslatable payload");
                return default;
            }
        };

        let fault = match catch_unwind(AssertUnwindSafe(|| call(&*handler, &payload))) {
            Ok(Ok(result)) => return result,
            Ok(Err(e)) => HandlerFault::Failed {
                domain: self.domain,
                message: format!("{:#}", e),
            },
            Err(panic) => HandlerFault::Panicked {
                domain: self.domain,
                message: panic_message(panic.as_ref()),
            },
        };
        Counters::bump(&self.counters.faults);
        error!(callback, fault = %fault, "Handler fault contained");
        default
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl Director<dyn CommandHandler> {
    pub(crate) fn with_commands(slot: &Arc<Slot<dyn CommandHandler>>, tree: SharedTree) -> Arc<Self> {
        Arc::new(Self {
            domain: slot.domain(),
            slot: Arc::downgrade(slot),
            counters: Counters::default(),
            commands: Some(tree),
        })
    }

    /// Executes a custom command.
    pub fn post_cli_cb(&self, raw: &RawCommand<'_>) -> bool {
        self.dispatch(
            "post_cli_cb",
            true,
            || self.translate_command(raw),
            |h, cmd| h.on_command(cmd),
        )
    }

    fn translate_command<'a>(&self, raw: &RawCommand<'a>) -> Result<CliCommand<'a>, TranslationError> {
        let tree = self
            .commands
            .as_ref()
            .ok_or_else(|| TranslationError::UnknownCommand(raw.name.to_string()))?
            .read();
        let spec = tree
            .get(raw.name)
            .ok_or_else(|| TranslationError::UnknownCommand(raw.name.to_string()))?;
        CliCommand::translate(raw, spec)
    }
}

impl Director<dyn TreeChangeHandler> {
    /// Delivers a DME object change.
    pub fn post_dme_cb(&self, fvs: &FieldValues) {
        self.dispatch(
            "post_dme_cb",
            (),
            || DmeObject::translate(fvs),
            |h, obj| h.on_tree_change(obj),
        )
    }

    /// Signals the end of the initial download for a watched subtree.
    pub fn post_dme_download_done_cb(&self, dn: &str) {
        self.dispatch(
            "post_dme_download_done_cb",
            (),
            || {
                if dn.is_empty() {
                    Err(TranslationError::missing("dn"))
                } else {
                    Ok(dn)
                }
            },
            |h, dn| h.on_download_done(dn),
        )
    }
}

impl Director<dyn RouteHandler> {
    pub fn post_l3_route_cb(&self, fvs: &FieldValues) -> bool {
        self.dispatch(
            "post_l3_route_cb",
            true,
            || L3Route::translate(fvs),
            |h, route| h.on_route(route),
        )
    }

    pub fn post_vrf_cb(&self, fvs: &FieldValues) -> bool {
        self.dispatch("post_vrf_cb", true, || Vrf::translate(fvs), |h, vrf| h.on_vrf(vrf))
    }
}

impl Director<dyn AdjacencyHandler> {
    pub fn post_adj_cb(&self, fvs: &FieldValues) {
        self.dispatch(
            "post_adj_cb",
            (),
            || Adjacency::translate(fvs),
            |h, adj| h.on_adjacency(adj),
        )
    }
}

impl Director<dyn AddressHandler> {
    pub fn post_mac_cb(&self, fvs: &FieldValues) -> bool {
        self.dispatch(
            "post_mac_cb",
            true,
            || MacEntry::translate(fvs),
            |h, entry| h.on_mac(entry),
        )
    }
}

impl Director<dyn InterfaceHandler> {
    pub fn post_intf_cb(&self, change: IntfChange, fvs: &FieldValues) -> bool {
        self.dispatch(
            "post_intf_cb",
            true,
            || Interface::translate(fvs),
            |h, intf| h.on_interface(change, intf),
        )
    }
}

/// A director of any domain, as handed to the host.
#[derive(Clone)]
pub enum DirectorRef {
    Command(Arc<Director<dyn CommandHandler>>),
    TreeChange(Arc<Director<dyn TreeChangeHandler>>),
    Route(Arc<Director<dyn RouteHandler>>),
    Adjacency(Arc<Director<dyn AdjacencyHandler>>),
    Address(Arc<Director<dyn AddressHandler>>),
    Interface(Arc<Director<dyn InterfaceHandler>>),
}

impl DirectorRef {
    pub fn domain(&self) -> Domain {
        match self {
            DirectorRef::Command(d) => d.domain(),
            DirectorRef::TreeChange(d) => d.domain(),
            DirectorRef::Route(d) => d.domain(),
            DirectorRef::Adjacency(d) => d.domain(),
            DirectorRef::Address(d) => d.domain(),
            DirectorRef::Interface(d) => d.domain(),
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            DirectorRef::Command(d) => d.is_active(),
            DirectorRef::TreeChange(d) => d.is_active(),
            DirectorRef::Route(d) => d.is_active(),
            DirectorRef::Adjacency(d) => d.is_active(),
            DirectorRef::Address(d) => d.is_active(),
            DirectorRef::Interface(d) => d.is_active(),
        }
    }

    pub fn stats(&self) -> DirectorStats {
        match self {
            DirectorRef::Command(d) => d.stats(),
            DirectorRef::TreeChange(d) => d.stats(),
            DirectorRef::Route(d) => d.stats(),
            DirectorRef::Adjacency(d) => d.stats(),
            DirectorRef::Address(d) => d.stats(),
            DirectorRef::Interface(d) => d.stats(),
        }
    }
}

impl fmt::Debug for DirectorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectorRef")
            .field("domain", &self.domain())
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingRoutes {
        calls: AtomicUsize,
        fail: bool,
        panic: bool,
    }

    impl RouteHandler for CountingRoutes {
        fn on_route(&self, _route: &L3Route) -> HandlerResult<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.panic {
                panic!("route handler exploded");
            }
            if self.fail {
                anyhow::bail!("route table full");
            }
            Ok(false)
        }
    }

    fn route_fields() -> FieldValues {
        crate::field_values! { "vrf" => "default", "address" => "10.0.0.0", "mask_len" => "8" }
    }

    fn active(handler: Arc<CountingRoutes>) -> (Arc<Slot<dyn RouteHandler>>, Arc<Director<dyn RouteHandler>>) {
        let handler: Arc<dyn RouteHandler> = handler;
        let slot = Slot::new(Domain::RouteEvent, handler);
        slot.activate(HostHandle::from_raw(1).unwrap());
        let director = Director::new(&slot);
        (slot, director)
    }

    #[test]
    fn test_active_slot_delivers_handler_result() {
        let handler = Arc::new(CountingRoutes::default());
        let (_slot, director) = active(handler.clone());

        assert!(!director.post_l3_route_cb(&route_fields()));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(director.stats().invocations, 1);
    }

    #[test]
    fn test_inactive_slot_rejects() {
        let handler = Arc::new(CountingRoutes::default());
        let (slot, director) = active(handler.clone());

        assert_eq!(slot.deactivate(), HostHandle::from_raw(1));
        assert_eq!(slot.deactivate(), None);
        assert!(director.post_l3_route_cb(&route_fields()));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
        assert_eq!(director.stats().rejected, 1);

        drop(slot);
        assert!(!director.is_active());
        assert!(director.post_l3_route_cb(&route_fields()));
        assert_eq!(director.stats().rejected, 2);
    }

    #[test]
    fn test_handler_error_yields_default() {
        let handler = Arc::new(CountingRoutes {
            fail: true,
            ..Default::default()
        });
        let (_slot, director) = active(handler.clone());

        assert!(director.post_l3_route_cb(&route_fields()));
        assert_eq!(director.stats().faults, 1);
    }

    #[test]
    fn test_handler_panic_contained() {
        let handler = Arc::new(CountingRoutes {
            panic: true,
            ..Default::default()
        });
        let (_slot, director) = active(handler.clone());

        assert!(director.post_l3_route_cb(&route_fields()));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(director.stats().faults, 1);
    }

    #[test]
    fn test_translation_error_skips_handler() {
        let handler = Arc::new(CountingRoutes::default());
        let (_slot, director) = active(handler.clone());

        let bad = crate::field_values! { "vrf" => "default", "address" => "bogus", "mask_len" => "8" };
        assert!(director.post_l3_route_cb(&bad));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
        assert_eq!(director.stats().translation_errors, 1);
    }

    #[test]
    fn test_panic_message_extraction() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}

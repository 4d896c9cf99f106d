//! The simulated host.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use nxsdk_bridge::{
    AppPriority, CommandSpec, CommandTree, Console, DirectorRef, Domain, FieldValues, Host, HostError,
    HostHandle, IntfChange, RawCommand, RecordFormat, Tracer, WatchTarget,
};

use crate::recorder::{ConsoleRecorder, TraceRecorder};
use crate::script::{to_field_values, ScriptedEvent};

/// Outcome of one replayed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Event kind, as in [`ScriptedEvent::kind`].
    pub kind: &'static str,
    /// Value the director returned; `None` when no handler was installed.
    /// Unit callbacks report `Some(true)`.
    pub handled: Option<bool>,
}

#[derive(Default)]
struct HostState {
    installed: BTreeMap<Domain, (HostHandle, DirectorRef)>,
    retired: Vec<(HostHandle, DirectorRef)>,
    unsupported: BTreeSet<Domain>,
    allow_replace: bool,
    fail_remove: bool,
    commands: CommandTree,
    show_outputs: HashMap<String, String>,
    watches: Vec<WatchTarget>,
    desc: String,
    priority: AppPriority,
    closed: bool,
    close_violations: usize,
}

/// In-process host implementing [`Host`].
///
/// Keeps one director per domain. Delivery helpers look the director up
/// and release the host lock before calling it, so handlers may call back
/// into the host (or the session) freely.
pub struct SimHost {
    name: String,
    state: Mutex<HostState>,
    next_handle: AtomicU64,
    console: Arc<ConsoleRecorder>,
    trace: Arc<TraceRecorder>,
    queue: Mutex<VecDeque<ScriptedEvent>>,
    stop: AtomicBool,
}

impl SimHost {
    /// Creates a host that accepts every domain and replaces directors.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            name: app_name.into(),
            state: Mutex::new(HostState {
                allow_replace: true,
                ..Default::default()
            }),
            next_handle: AtomicU64::new(1),
            console: Arc::new(ConsoleRecorder::new()),
            trace: Arc::new(TraceRecorder::new()),
            queue: Mutex::new(VecDeque::new()),
            stop: AtomicBool::new(false),
        }
    }

    /// Refuses a second director for an occupied domain instead of
    /// replacing it.
    pub fn without_replace(self) -> Self {
        self.state.lock().allow_replace = false;
        self
    }

    /// Makes the host reject installation for a domain.
    pub fn without_domain(self, domain: Domain) -> Self {
        self.state.lock().unsupported.insert(domain);
        self
    }

    /// Sets the output of a show command.
    pub fn with_show_output(self, cmd: &str, output: &str) -> Self {
        self.set_show_output(cmd, output);
        self
    }

    pub fn set_show_output(&self, cmd: &str, output: &str) {
        self.state
            .lock()
            .show_outputs
            .insert(cmd.trim().to_string(), output.to_string());
    }

    /// Makes every following `remove_handler` fail.
    pub fn set_remove_failure(&self, fail: bool) {
        self.state.lock().fail_remove = fail;
    }

    pub fn console(&self) -> Arc<ConsoleRecorder> {
        Arc::clone(&self.console)
    }

    pub fn trace(&self) -> Arc<TraceRecorder> {
        Arc::clone(&self.trace)
    }

    pub fn installed_domains(&self) -> Vec<Domain> {
        self.state.lock().installed.keys().copied().collect()
    }

    pub fn installed_count(&self) -> usize {
        self.state.lock().installed.len()
    }

    /// The director currently installed for a domain.
    ///
    /// A caller can keep it past deregistration to play an invocation the
    /// host had already started when the handler was removed.
    pub fn installed_director(&self, domain: Domain) -> Option<DirectorRef> {
        self.state
            .lock()
            .installed
            .get(&domain)
            .map(|(_, d)| d.clone())
    }

    /// Directors removed or replaced so far, oldest first.
    pub fn retired_directors(&self) -> Vec<DirectorRef> {
        self.state.lock().retired.iter().map(|(_, d)| d.clone()).collect()
    }

    /// Names of commands in the parse tree, in submission order.
    pub fn command_names(&self) -> Vec<String> {
        self.state
            .lock()
            .commands
            .commands()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    pub fn watches(&self) -> Vec<WatchTarget> {
        self.state.lock().watches.clone()
    }

    pub fn app_desc(&self) -> String {
        self.state.lock().desc.clone()
    }

    pub fn app_priority(&self) -> AppPriority {
        self.state.lock().priority
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Times `close` was called with directors still installed.
    pub fn close_violations(&self) -> usize {
        self.state.lock().close_violations
    }

    // =========================================================================
    // Delivery
    // =========================================================================

    /// Runs a command typed on the switch.
    ///
    /// Like the real parser, the host checks the command exists and every
    /// parameter matches its declared type before calling the director; a
    /// rejected line prints an error on the console and returns
    /// `Some(false)`. Returns `None` when no command handler is installed.
    pub fn invoke_command(
        &self,
        name: &str,
        line: &str,
        keywords: &[&str],
        params: &[(&str, &str)],
    ) -> Option<bool> {
        let parse_error = {
            let state = self.state.lock();
            match state.commands.get(name) {
                None => Some(format!("% Invalid command: {}", name)),
                Some(spec) => parse_params(spec, params).err(),
            }
        };
        if let Some(message) = parse_error {
            if self.installed_director(Domain::Command).is_none() {
                return None;
            }
            self.console.print_console(&message);
            return Some(false);
        }
        self.invoke_command_unchecked(name, line, keywords, params)
    }

    /// Calls the command director without host-side parsing.
    pub fn invoke_command_unchecked(
        &self,
        name: &str,
        line: &str,
        keywords: &[&str],
        params: &[(&str, &str)],
    ) -> Option<bool> {
        let Some(DirectorRef::Command(director)) = self.installed_director(Domain::Command) else {
            return None;
        };
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_string()).collect();
        let params: FieldValues = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let line = if line.is_empty() { name } else { line };

        Some(director.post_cli_cb(&RawCommand {
            name,
            line,
            keywords: &keywords,
            params: &params,
            console: self.console.as_ref(),
        }))
    }

    pub fn deliver_dme(&self, fvs: &FieldValues) -> Option<()> {
        match self.installed_director(Domain::TreeChange)? {
            DirectorRef::TreeChange(d) => {
                d.post_dme_cb(fvs);
                Some(())
            },
            _ => None,
        }
    }

    pub fn deliver_dme_download_done(&self, dn: &str) -> Option<()> {
        match self.installed_director(Domain::TreeChange)? {
            DirectorRef::TreeChange(d) => {
                d.post_dme_download_done_cb(dn);
                Some(())
            },
            _ => None,
        }
    }

    pub fn deliver_route(&self, fvs: &FieldValues) -> Option<bool> {
        match self.installed_director(Domain::RouteEvent)? {
            DirectorRef::Route(d) => Some(d.post_l3_route_cb(fvs)),
            _ => None,
        }
    }

    pub fn deliver_vrf(&self, fvs: &FieldValues) -> Option<bool> {
        match self.installed_director(Domain::RouteEvent)? {
            DirectorRef::Route(d) => Some(d.post_vrf_cb(fvs)),
            _ => None,
        }
    }

    pub fn deliver_adjacency(&self, fvs: &FieldValues) -> Option<()> {
        match self.installed_director(Domain::AdjacencyEvent)? {
            DirectorRef::Adjacency(d) => {
                d.post_adj_cb(fvs);
                Some(())
            },
            _ => None,
        }
    }

    pub fn deliver_mac(&self, fvs: &FieldValues) -> Option<bool> {
        match self.installed_director(Domain::AddressEvent)? {
            DirectorRef::Address(d) => Some(d.post_mac_cb(fvs)),
            _ => None,
        }
    }

    pub fn deliver_interface(&self, change: IntfChange, fvs: &FieldValues) -> Option<bool> {
        match self.installed_director(Domain::InterfaceEvent)? {
            DirectorRef::Interface(d) => Some(d.post_intf_cb(change, fvs)),
            _ => None,
        }
    }

    /// Delivers one scripted event.
    pub fn deliver(&self, event: &ScriptedEvent) -> Delivery {
        let handled = match event {
            ScriptedEvent::Command {
                name,
                line,
                keywords,
                params,
            } => {
                let keywords: Vec<&str> = keywords.iter().map(String::as_str).collect();
                let params: Vec<(&str, &str)> = params
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                self.invoke_command(name, line, &keywords, &params)
            }
            ScriptedEvent::Dme { fields } => {
                self.deliver_dme(&to_field_values(fields)).map(|()| true)
            }
            ScriptedEvent::DmeDownloadDone { dn } => {
                self.deliver_dme_download_done(dn).map(|()| true)
            }
            ScriptedEvent::Route { fields } => self.deliver_route(&to_field_values(fields)),
            ScriptedEvent::Vrf { fields } => self.deliver_vrf(&to_field_values(fields)),
            ScriptedEvent::Adjacency { fields } => {
                self.deliver_adjacency(&to_field_values(fields)).map(|()| true)
            }
            ScriptedEvent::Mac { fields } => self.deliver_mac(&to_field_values(fields)),
            ScriptedEvent::Interface { change, fields } => {
                self.deliver_interface(*change, &to_field_values(fields))
            }
        };
        debug!(kind = event.kind(), ?handled, "Delivered scripted event");
        Delivery {
            kind: event.kind(),
            handled,
        }
    }

    // =========================================================================
    // Event loop
    // =========================================================================

    /// Queues events for the event loop.
    pub fn enqueue(&self, events: impl IntoIterator<Item = ScriptedEvent>) {
        self.queue.lock().extend(events);
    }

    pub fn pending_events(&self) -> usize {
        self.queue.lock().len()
    }

    /// Delivers queued events until the queue is empty or the loop is
    /// stopped.
    pub fn replay(&self) -> Vec<Delivery> {
        self.stop.store(false, Ordering::SeqCst);
        let mut deliveries = Vec::new();
        while !self.stop.load(Ordering::SeqCst) {
            let Some(event) = self.queue.lock().pop_front() else {
                break;
            };
            deliveries.push(self.deliver(&event));
        }
        deliveries
    }
}

fn parse_params(spec: &CommandSpec, params: &[(&str, &str)]) -> Result<(), String> {
    for (name, token) in params {
        let def = spec
            .param_def(name)
            .ok_or_else(|| format!("% Invalid parameter detected: {}", name))?;
        def.spec
            .coerce(name, token)
            .map_err(|e| format!("% Invalid value: {}", e))?;
    }
    Ok(())
}

impl Host for SimHost {
    fn install_handler(&self, domain: Domain, director: DirectorRef) -> Result<HostHandle, HostError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(HostError::RemoteDown);
        }
        if state.unsupported.contains(&domain) {
            return Err(HostError::Invalid(format!("{} manager unavailable", domain)));
        }
        if !state.allow_replace {
            if let Some((existing, _)) = state.installed.get(&domain) {
                return Err(HostError::Exists(format!("{} handler {}", domain, existing)));
            }
        }

        let raw = self.next_handle.fetch_add(1, Ordering::Relaxed);
        let handle = HostHandle::from_raw(raw)
            .ok_or_else(|| HostError::MaxLimit("handle space exhausted".to_string()))?;
        if let Some(previous) = state.installed.insert(domain, (handle, director)) {
            debug!(domain = %domain, previous = %previous.0, "Replaced director");
            state.retired.push(previous);
        }
        Ok(handle)
    }

    fn remove_handler(&self, handle: HostHandle) -> Result<(), HostError> {
        let mut state = self.state.lock();
        if state.fail_remove {
            return Err(HostError::Failure(format!("cannot remove {}", handle)));
        }
        let domain = state
            .installed
            .iter()
            .find(|(_, (h, _))| *h == handle)
            .map(|(d, _)| *d)
            .ok_or_else(|| HostError::NotFound(format!("handler {}", handle)))?;
        if let Some(removed) = state.installed.remove(&domain) {
            state.retired.push(removed);
        }
        Ok(())
    }

    fn submit_commands(&self, commands: &[CommandSpec]) -> Result<(), HostError> {
        let mut state = self.state.lock();
        let mut tree = state.commands.clone();
        for spec in commands {
            tree.add(spec.clone())
                .map_err(|e| HostError::Invalid(e.to_string()))?;
        }
        state.commands = tree;
        Ok(())
    }

    fn exec_show_cmd(&self, cmd: &str, _format: RecordFormat) -> Result<String, HostError> {
        self.state
            .lock()
            .show_outputs
            .get(cmd.trim())
            .cloned()
            .ok_or_else(|| HostError::NotFound(format!("no output for '{}'", cmd.trim())))
    }

    fn tracer(&self) -> Arc<dyn Tracer> {
        self.trace.clone()
    }

    fn watch(&self, target: &WatchTarget) -> Result<(), HostError> {
        let mut state = self.state.lock();
        if state.unsupported.contains(&target.domain()) {
            return Err(HostError::Invalid(format!("{} manager unavailable", target.domain())));
        }
        if !state.watches.contains(target) {
            state.watches.push(target.clone());
        }
        Ok(())
    }

    fn unwatch(&self, target: &WatchTarget) -> Result<(), HostError> {
        let mut state = self.state.lock();
        let before = state.watches.len();
        state.watches.retain(|w| w != target);
        if state.watches.len() == before {
            return Err(HostError::NotFound(format!("{:?} not watched", target)));
        }
        Ok(())
    }

    fn app_name(&self) -> String {
        self.name.clone()
    }

    fn set_app_desc(&self, desc: &str) {
        self.state.lock().desc = desc.to_string();
    }

    fn set_app_priority(&self, priority: AppPriority) {
        self.state.lock().priority = priority;
    }

    /// Replays queued events on the calling thread and returns once the
    /// queue is drained or the loop is stopped.
    fn start_event_loop(&self) {
        let deliveries = self.replay();
        info!(app = %self.name, delivered = deliveries.len(), "Event loop finished");
    }

    fn stop_event_loop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    fn close(&self) {
        let mut state = self.state.lock();
        if !state.installed.is_empty() {
            state.close_violations += 1;
            warn!(
                app = %self.name,
                installed = state.installed.len(),
                "Host session closed with handlers installed"
            );
        }
        state.closed = true;
    }
}

impl std::fmt::Debug for SimHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimHost")
            .field("name", &self.name)
            .field("installed", &self.installed_domains())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nxsdk_bridge::ParamSpec;

    fn threshold_spec() -> CommandSpec {
        CommandSpec::config("set_port_bw_threshold_cmd", "port bw threshold <threshold>")
            .param("<threshold>", "Threshold", ParamSpec::integer(1, 100))
    }

    #[test]
    fn test_submit_commands_rejects_duplicates() {
        let host = SimHost::new("test");
        host.submit_commands(&[threshold_spec()]).unwrap();
        assert_eq!(host.command_names(), vec!["set_port_bw_threshold_cmd"]);
        assert!(matches!(
            host.submit_commands(&[threshold_spec()]),
            Err(HostError::Invalid(_))
        ));
    }

    #[test]
    fn test_parse_params_checks_range() {
        let spec = threshold_spec();
        assert!(parse_params(&spec, &[("<threshold>", "75")]).is_ok());
        assert!(parse_params(&spec, &[("<threshold>", "101")]).is_err());
        assert!(parse_params(&spec, &[("<port>", "1")]).is_err());
    }

    #[test]
    fn test_watch_and_unwatch() {
        let host = SimHost::new("test");
        let target = WatchTarget::Dme {
            dn: "sys/fm".to_string(),
        };
        host.watch(&target).unwrap();
        host.watch(&target).unwrap();
        assert_eq!(host.watches().len(), 1);
        host.unwatch(&target).unwrap();
        assert!(matches!(host.unwatch(&target), Err(HostError::NotFound(_))));
    }

    #[test]
    fn test_unsupported_domain_watch() {
        let host = SimHost::new("test").without_domain(Domain::AddressEvent);
        assert!(host.watch(&WatchTarget::Macs).is_err());
    }

    #[test]
    fn test_show_output() {
        let host = SimHost::new("test").with_show_output("show int Ethernet1/1", "Ethernet1/1 is up");
        assert_eq!(
            host.exec_show_cmd(" show int Ethernet1/1 ", RecordFormat::Text).unwrap(),
            "Ethernet1/1 is up"
        );
        assert!(host.exec_show_cmd("show clock", RecordFormat::Text).is_err());
    }

    #[test]
    fn test_delivery_without_handler() {
        let host = SimHost::new("test");
        let fvs = vec![("dn".to_string(), "sys/fm".to_string())];
        assert_eq!(host.deliver_dme(&fvs), None);
        assert_eq!(host.deliver_route(&fvs), None);
        assert_eq!(host.invoke_command("x", "", &[], &[]), None);
    }

    #[test]
    fn test_close_records_state() {
        let host = SimHost::new("test");
        host.close();
        assert!(host.is_closed());
        assert_eq!(host.close_violations(), 0);
    }
}

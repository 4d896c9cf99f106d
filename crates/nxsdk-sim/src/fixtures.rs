//! Test fixtures for common host records and a recording handler.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use nxsdk_bridge::{
    AddressHandler, Adjacency, AdjacencyHandler, CliCommand, CommandHandler, DmeObject, Domain,
    EventType, FieldValues, HandlerResult, IntfChange, Interface, InterfaceHandler, L3Route,
    MacEntry, RouteHandler, TreeChangeHandler, Vrf,
};

/// Builder for a raw host record.
#[derive(Debug, Clone, Default)]
pub struct EventRecord {
    fields: FieldValues,
}

impl EventRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, replacing an earlier value for the same name
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(f, _)| *f == field) {
            Some(existing) => existing.1 = value,
            None => self.fields.push((field, value)),
        }
        self
    }

    /// Set the event type
    pub fn with_event(self, event: EventType) -> Self {
        self.with_field("event", event.as_str())
    }

    /// Remove a field
    pub fn without_field(mut self, field: &str) -> Self {
        self.fields.retain(|(f, _)| f != field);
        self
    }

    pub fn fields(&self) -> &FieldValues {
        &self.fields
    }

    pub fn into_fields(self) -> FieldValues {
        self.fields
    }
}

/// DME object fixtures
pub mod dme_fixtures {
    use super::*;

    /// Feature manager object change, as seen when a feature is toggled
    pub fn feature_change(dn: &str, admin_state: &str) -> EventRecord {
        EventRecord::new()
            .with_field("dn", dn)
            .with_field("prop.adminSt", admin_state)
            .with_field("updated", "adminSt")
            .with_event(EventType::Update)
    }
}

/// RIB fixtures
pub mod route_fixtures {
    use super::*;

    /// Route with one next hop per `(address, interface)` pair
    pub fn route(vrf: &str, address: &str, mask_len: u8, next_hops: &[(&str, &str)]) -> EventRecord {
        let mut record = EventRecord::new()
            .with_field("vrf", vrf)
            .with_field("address", address)
            .with_field("mask_len", mask_len.to_string())
            .with_event(EventType::Add);
        for (i, (nh, intf)) in next_hops.iter().enumerate() {
            record = record
                .with_field(format!("nh.{}.address", i), *nh)
                .with_field(format!("nh.{}.intf", i), *intf);
        }
        record
    }

    /// BGP route in the default VRF with a single next hop
    pub fn bgp_route(address: &str, mask_len: u8) -> EventRecord {
        route("default", address, mask_len, &[("192.168.1.1", "Ethernet1/1")])
            .with_field("nh.0.owner", "bgp-65000")
    }

    pub fn vrf(name: &str, state: &str) -> EventRecord {
        EventRecord::new()
            .with_field("name", name)
            .with_field("state", state)
            .with_event(EventType::Add)
    }
}

/// Adjacency fixtures
pub mod adjacency_fixtures {
    use super::*;

    pub fn ipv4_adjacency(intf: &str, ip: &str, mac: &str) -> EventRecord {
        EventRecord::new()
            .with_field("intf", intf)
            .with_field("ip", ip)
            .with_field("mac", mac)
            .with_event(EventType::Add)
    }
}

/// MAC table fixtures
pub mod mac_fixtures {
    use super::*;

    pub fn dynamic_mac(mac: &str, vlan: u16, intf: &str) -> EventRecord {
        EventRecord::new()
            .with_field("mac", mac)
            .with_field("vlan", vlan.to_string())
            .with_field("intf", intf)
            .with_field("type", "dynamic")
            .with_event(EventType::Add)
    }
}

/// Interface fixtures
pub mod interface_fixtures {
    use super::*;

    pub fn ethernet(name: &str, admin: &str, oper: &str) -> EventRecord {
        EventRecord::new()
            .with_field("name", name)
            .with_field("intf_type", "eth")
            .with_field("admin", admin)
            .with_field("oper", oper)
            .with_event(EventType::Update)
    }
}

/// A handler for every domain that records what it received.
///
/// Boolean callbacks answer with the configured reply (default `true`).
#[derive(Debug)]
pub struct RecordingHandler {
    calls: Mutex<Vec<(Domain, String)>>,
    reply: AtomicBool,
}

impl Default for RecordingHandler {
    fn default() -> Self {
        Self::replying(true)
    }
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(reply: bool) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reply: AtomicBool::new(reply),
        }
    }

    pub fn set_reply(&self, reply: bool) {
        self.reply.store(reply, Ordering::SeqCst);
    }

    /// Domain and a one-line summary of each call, in order.
    pub fn calls(&self) -> Vec<(Domain, String)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn record(&self, domain: Domain, summary: String) -> bool {
        self.calls.lock().push((domain, summary));
        self.reply.load(Ordering::SeqCst)
    }
}

impl CommandHandler for RecordingHandler {
    fn on_command(&self, cmd: &CliCommand<'_>) -> HandlerResult<bool> {
        Ok(self.record(Domain::Command, cmd.name().to_string()))
    }
}

impl TreeChangeHandler for RecordingHandler {
    fn on_tree_change(&self, obj: &DmeObject) -> HandlerResult<()> {
        self.record(Domain::TreeChange, obj.dn().to_string());
        Ok(())
    }

    fn on_download_done(&self, dn: &str) -> HandlerResult<()> {
        self.record(Domain::TreeChange, format!("download done {}", dn));
        Ok(())
    }
}

impl RouteHandler for RecordingHandler {
    fn on_route(&self, route: &L3Route) -> HandlerResult<bool> {
        Ok(self.record(Domain::RouteEvent, route.prefix()))
    }

    fn on_vrf(&self, vrf: &Vrf) -> HandlerResult<bool> {
        Ok(self.record(Domain::RouteEvent, format!("vrf {}", vrf.name())))
    }
}

impl AdjacencyHandler for RecordingHandler {
    fn on_adjacency(&self, adj: &Adjacency) -> HandlerResult<()> {
        self.record(Domain::AdjacencyEvent, format!("{} {}", adj.intf(), adj.ip()));
        Ok(())
    }
}

impl AddressHandler for RecordingHandler {
    fn on_mac(&self, entry: &MacEntry) -> HandlerResult<bool> {
        Ok(self.record(
            Domain::AddressEvent,
            format!("{} vlan {}", entry.mac(), entry.vlan()),
        ))
    }
}

impl InterfaceHandler for RecordingHandler {
    fn on_interface(&self, change: IntfChange, intf: &Interface) -> HandlerResult<bool> {
        Ok(self.record(Domain::InterfaceEvent, format!("{} {}", intf.name(), change)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nxsdk_bridge::FieldValuesExt;

    #[test]
    fn test_event_record_replaces_field() {
        let fields = EventRecord::new()
            .with_field("dn", "sys/fm")
            .with_field("dn", "sys/intf")
            .into_fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get_field("dn"), Some("sys/intf"));
    }

    #[test]
    fn test_route_fixture_translates() {
        let record = route_fixtures::route(
            "default",
            "10.1.1.0",
            24,
            &[("192.168.1.1", "Ethernet1/1"), ("192.168.2.1", "Ethernet1/2")],
        );
        let route = L3Route::translate(record.fields()).unwrap();
        assert_eq!(route.next_hop_count(), 2);
        assert_eq!(route.prefix(), "10.1.1.0/24");
    }

    #[test]
    fn test_fixtures_translate() {
        assert!(DmeObject::translate(dme_fixtures::feature_change("sys/fm/bgp", "enabled").fields()).is_ok());
        assert!(Vrf::translate(route_fixtures::vrf("red", "up").fields()).is_ok());
        assert!(Adjacency::translate(
            adjacency_fixtures::ipv4_adjacency("Vlan10", "10.0.0.5", "00:11:22:33:44:55").fields()
        )
        .is_ok());
        assert!(MacEntry::translate(
            mac_fixtures::dynamic_mac("00:11:22:33:44:55", 10, "Ethernet1/2").fields()
        )
        .is_ok());
        assert!(Interface::translate(interface_fixtures::ethernet("Ethernet1/1", "up", "up").fields()).is_ok());
    }
}

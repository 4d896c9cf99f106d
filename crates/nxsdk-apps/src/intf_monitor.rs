//! Interface monitor
//!
//! Logs every interface change the host reports to syslog.

use std::sync::Arc;

use nxsdk_bridge::{
    EventType, HandlerResult, IntfChange, Interface, InterfaceHandler, Session, SyslogPriority,
    Tracer, WatchTarget,
};

pub struct IntfMonitor {
    tracer: Arc<dyn Tracer>,
}

impl IntfMonitor {
    pub fn new(tracer: Arc<dyn Tracer>) -> Self {
        Self { tracer }
    }

    fn notice(&self, text: &str) {
        self.tracer.syslog(SyslogPriority::Notice, text);
    }
}

/// Syslog lines for one interface change.
pub fn describe(change: IntfChange, intf: &Interface) -> Vec<String> {
    let name = intf.name();
    let mut lines = vec![format!("Interface {} change: {}", name, change)];
    match change {
        IntfChange::AddDel => match intf.event() {
            EventType::Add => lines.push(format!("App got ADD notification for interface {}", name)),
            EventType::Delete => {
                lines.push(format!("App got DELETE notification for interface {}", name))
            }
            _ => {}
        },
        IntfChange::State => {
            lines.push(format!("State change for interface: {}", name));
            lines.push(format!(
                "new state is: admin {}, oper {}",
                intf.admin_state(),
                intf.oper_state()
            ));
        }
        IntfChange::Layer => {
            lines.push(format!("New layer: {}", intf.layer().unwrap_or("unknown")));
        }
        IntfChange::Ipv4Addr | IntfChange::Ipv6Addr => {
            let (family, address) = if change == IntfChange::Ipv4Addr {
                ("primary", intf.ipv4())
            } else {
                ("IPv6", intf.ipv6())
            };
            let address = address.map_or_else(|| "none".to_string(), |a| a.to_string());
            let verb = match intf.event() {
                EventType::Add => "added",
                EventType::Delete => "removed",
                _ => "changed",
            };
            lines.push(format!("{} address {} {} for interface {}", family, address, verb, name));
        }
        IntfChange::PortMember => {
            let event = if intf.event() == EventType::Add { "ADD" } else { "DELETE" };
            lines.push(format!("App got port member {} event for {}", event, name));
            if !intf.members().is_empty() {
                lines.push(format!("Member count: {}", intf.members().len()));
                lines.extend(intf.members().iter().map(|m| format!(" *<{}>", m)));
            }
        }
        IntfChange::Vrf => {
            lines.push(format!(
                "interface {} moved to vrf {}",
                name,
                intf.vrf().unwrap_or("default")
            ));
        }
        IntfChange::Vlan => {
            let vlan = intf.vlan().map_or_else(|| "none".to_string(), |v| v.to_string());
            lines.push(format!("interface {} new vlan is {}", name, vlan));
        }
    }
    lines
}

impl InterfaceHandler for IntfMonitor {
    fn on_interface(&self, change: IntfChange, intf: &Interface) -> HandlerResult<bool> {
        for line in describe(change, intf) {
            self.notice(&line);
        }
        Ok(true)
    }
}

/// Watches every interface and registers the monitor.
pub fn install(session: &Session) -> anyhow::Result<Arc<IntfMonitor>> {
    let tracer = session.tracer();
    session.watch(&WatchTarget::Interface {
        name: "all".to_string(),
    })?;
    let monitor = Arc::new(IntfMonitor::new(tracer.clone()));
    session.register_interface_handler(monitor.clone())?;
    tracer.syslog(
        SyslogPriority::Notice,
        &format!("Started App {}", session.app_name()),
    );
    Ok(monitor)
}

//! Feature monitor
//!
//! Watches the feature manager subtree (`sys/fm`) and reports every
//! feature that is enabled or disabled.

use std::sync::Arc;

use nxsdk_bridge::{
    DmeObject, EventType, HandlerResult, Session, SyslogPriority, Tracer, TreeChangeHandler,
    WatchTarget,
};

/// Subtree holding one object per feature.
pub const FEATURE_DN: &str = "sys/fm";

fn event_name(event: EventType) -> &'static str {
    match event {
        EventType::Add => "Add",
        EventType::Delete => "Delete",
        EventType::Update => "Update",
        _ => "Unknown",
    }
}

pub struct FeatureMonitor {
    tracer: Arc<dyn Tracer>,
}

impl FeatureMonitor {
    pub fn new(tracer: Arc<dyn Tracer>) -> Self {
        Self { tracer }
    }
}

impl TreeChangeHandler for FeatureMonitor {
    fn on_tree_change(&self, obj: &DmeObject) -> HandlerResult<()> {
        self.tracer.event(&format!("[{}]", obj.dn()));
        self.tracer.syslog(
            SyslogPriority::Notice,
            &format!(
                "Feature monitor callback: dn={} event={}",
                obj.dn(),
                event_name(obj.event())
            ),
        );
        if let Some(status) = obj.property("adminSt") {
            let feature = obj
                .property("rn")
                .or_else(|| obj.dn().rsplit('/').next())
                .unwrap_or_default();
            self.tracer.syslog(
                SyslogPriority::Notice,
                &format!("Feature \"{}\" status is {}", feature, status),
            );
        }
        Ok(())
    }

    fn on_download_done(&self, dn: &str) -> HandlerResult<()> {
        self.tracer.event(&format!("[{}] download done", dn));
        Ok(())
    }
}

/// Watches `sys/fm` and registers the monitor.
pub fn install(session: &Session) -> anyhow::Result<Arc<FeatureMonitor>> {
    let tracer = session.tracer();
    tracer.syslog(
        SyslogPriority::Emerg,
        &format!("Appname: {}", session.app_name()),
    );

    session.watch(&WatchTarget::Dme {
        dn: FEATURE_DN.to_string(),
    })?;
    let monitor = Arc::new(FeatureMonitor::new(tracer.clone()));
    session.register_tree_handler(monitor.clone())?;

    tracer.syslog(SyslogPriority::Notice, "Starting event processing...");
    Ok(monitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(event_name(EventType::Add), "Add");
        assert_eq!(event_name(EventType::Update), "Update");
        assert_eq!(event_name(EventType::DownloadDone), "Unknown");
    }
}

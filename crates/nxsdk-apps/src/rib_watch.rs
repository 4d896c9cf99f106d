//! Route redistribution watcher
//!
//! `[no] watch owner <protocol> [<tag>] [ipv4 | ipv6] [vrf <vrf-name>]`
//! starts or stops route events from a protocol; every route event is
//! written to the host event trace.

use std::sync::Arc;

use tracing::{debug, info};

use nxsdk_bridge::{
    AddressFamily, CliCommand, CommandHandler, CommandSpec, CommandTree, HandlerResult, Host,
    L3Route, ParamSpec, RouteHandler, Session, SyslogPriority, Tracer, Vrf, WatchTarget,
};

pub const WATCH_ROUTE_CMD: &str = "watch_route_cmd";

const DEFAULT_VRF: &str = "default";

pub fn command_tree() -> anyhow::Result<CommandTree> {
    let mut tree = CommandTree::new();
    tree.add(
        CommandSpec::config(
            WATCH_ROUTE_CMD,
            "watch owner <protocol> [<tag>] [ipv4 | ipv6] [vrf <vrf-name>]",
        )
        .keyword("watch", "Watch on a object")
        .keyword("owner", "Owner of the route")
        .param("<protocol>", "Owner of the Routes ex bgp, isis, ospf", ParamSpec::string())
        .key("<protocol>")
        .param(
            "<tag>",
            "Optional tag for a owner. Ex for BGP ASN is the tag, for ISIS the instance number",
            ParamSpec::string(),
        )
        .key("<tag>")
        .keyword("ipv4", "Redistribute IP Routes from protocol. Default is Both")
        .keyword("ipv6", "Redistribute IPv6 Routes from the protocol. Default is Both")
        .keyword("vrf", "VRF Information")
        .param("<vrf-name>", "VRF Name. By default vrf name is default", ParamSpec::Vrf),
    )?;
    Ok(tree)
}

/// Handles the watch command and traces the routes it brings in.
pub struct RibWatcher {
    host: Arc<dyn Host>,
    tracer: Arc<dyn Tracer>,
}

impl RibWatcher {
    pub fn new(host: Arc<dyn Host>) -> Self {
        let tracer = host.tracer();
        Self { host, tracer }
    }
}

/// Event trace line for a route.
pub fn route_trace(route: &L3Route) -> String {
    format!(
        "[{}] {} Event: {}, NH count {}",
        route.vrf(),
        route.prefix(),
        route.event().code(),
        route.next_hop_count()
    )
}

impl CommandHandler for RibWatcher {
    fn on_command(&self, cmd: &CliCommand<'_>) -> HandlerResult<bool> {
        if cmd.name() != WATCH_ROUTE_CMD {
            return Ok(false);
        }
        let protocol = cmd.str_param("<protocol>")?;
        let tag = cmd.opt_str_param("<tag>");
        let vrf = cmd.opt_str_param("<vrf-name>").unwrap_or(DEFAULT_VRF);
        let af = if cmd.is_keyword_set("ipv4") {
            Some(AddressFamily::Ipv4)
        } else if cmd.is_keyword_set("ipv6") {
            Some(AddressFamily::Ipv6)
        } else {
            None
        };

        cmd.print_console(&format!(
            "{}Redistributing {} Routes from {} tag {} in VRF {}",
            if cmd.is_negated() { "No " } else { "" },
            af.map_or("all", |af| af.as_str()),
            protocol,
            tag.unwrap_or("-"),
            vrf
        ));

        let target = WatchTarget::L3Route {
            protocol: protocol.to_string(),
            tag: tag.map(str::to_string),
            vrf: vrf.to_string(),
            af,
        };
        let result = if cmd.is_negated() {
            self.host.unwatch(&target)
        } else {
            self.host.watch(&target)
        };
        if let Err(e) = result {
            cmd.print_console(&format!("% {}", e));
            return Ok(false);
        }
        info!(?target, watching = !cmd.is_negated(), "Route watch changed");
        Ok(true)
    }
}

impl RouteHandler for RibWatcher {
    fn on_route(&self, route: &L3Route) -> HandlerResult<bool> {
        debug!(prefix = %route.prefix(), vrf = route.vrf(), "Route event");
        self.tracer.event(&route_trace(route));
        Ok(true)
    }

    fn on_vrf(&self, vrf: &Vrf) -> HandlerResult<bool> {
        self.tracer.event(&format!(
            "VRF {} Event: {}, state {}",
            vrf.name(),
            vrf.event().code(),
            vrf.state()
        ));
        Ok(true)
    }
}

/// Adds the watch command and registers for command and route events.
pub fn install(session: &Session) -> anyhow::Result<Arc<RibWatcher>> {
    session.add_to_parse_tree(&command_tree()?)?;
    let watcher = Arc::new(RibWatcher::new(session.host()));
    session.register_command_handler(watcher.clone())?;
    session.register_route_handler(watcher.clone())?;

    let tracer = session.tracer();
    tracer.syslog(
        SyslogPriority::Info,
        &format!("Started App <{}>", session.app_name()),
    );
    tracer.event("Event: Created Custom CLIs");
    Ok(watcher)
}

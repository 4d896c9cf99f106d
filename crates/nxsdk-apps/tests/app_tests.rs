//! End-to-end runs of the example applications on the simulated host

use std::io::Write;
use std::sync::Arc;

use nxsdk_apps::custom_cli::{self, GET_THRESHOLD_CMD, SAMPLE_CMD, SET_THRESHOLD_CMD};
use nxsdk_apps::{run, AppKind};
use nxsdk_bridge::{AddressFamily, Session, SessionConfig, SyslogPriority, WatchTarget};
use nxsdk_sim::{ScriptedEvent, SimHost, TraceKind};
use pretty_assertions::assert_eq;

const THRESHOLD_KEYWORDS: [&str; 3] = ["port", "bw", "threshold"];

#[test]
fn test_threshold_set_then_get() {
    let host = Arc::new(SimHost::new("customCliApp"));
    let session = Session::new(host.clone(), SessionConfig::default());
    let cli = custom_cli::install(&session).unwrap();
    assert_eq!(cli.threshold(), custom_cli::DEFAULT_THRESHOLD);

    assert_eq!(
        host.invoke_command(
            SET_THRESHOLD_CMD,
            "customCliApp port bw threshold 75",
            &THRESHOLD_KEYWORDS,
            &[("<threshold>", "75")]
        ),
        Some(true)
    );
    assert_eq!(cli.threshold(), 75);

    host.console().take();
    assert_eq!(
        host.invoke_command(GET_THRESHOLD_CMD, "", &THRESHOLD_KEYWORDS, &[]),
        Some(true)
    );
    assert!(host.console().contains("Get Port BW threshold value 75"));

    session.shutdown().unwrap();
    assert_eq!(host.close_violations(), 0);
}

#[test]
fn test_threshold_out_of_range_is_refused() {
    let host = Arc::new(SimHost::new("customCliApp"));
    let session = Session::new(host.clone(), SessionConfig::default());
    let cli = custom_cli::install(&session).unwrap();

    assert_eq!(
        host.invoke_command(SET_THRESHOLD_CMD, "", &THRESHOLD_KEYWORDS, &[("<threshold>", "0")]),
        Some(false)
    );
    assert_eq!(cli.threshold(), custom_cli::DEFAULT_THRESHOLD);

    let negate: Vec<&str> = std::iter::once("no").chain(THRESHOLD_KEYWORDS).collect();
    host.invoke_command(SET_THRESHOLD_CMD, "", &THRESHOLD_KEYWORDS, &[("<threshold>", "90")]);
    host.invoke_command(SET_THRESHOLD_CMD, "", &negate, &[]);
    assert_eq!(cli.threshold(), custom_cli::DEFAULT_THRESHOLD);
}

#[test]
fn test_port_utilization_above_threshold_raises_syslog() {
    let host = Arc::new(SimHost::new("customCliApp").with_show_output(
        "show int Ethernet1/1",
        r#"{"TABLE_interface": {"ROW_interface": {"eth_bw": "1000000", "eth_outrate1_bits": "800000000"}}}"#,
    ));
    let session = Session::new(host.clone(), SessionConfig::default());
    custom_cli::install(&session).unwrap();
    host.trace().take();

    assert_eq!(
        host.invoke_command(
            custom_cli::PORT_BW_UTIL_CMD,
            "",
            &["port", "bw", "utilization"],
            &[("<port>", "Ethernet1/1")]
        ),
        Some(true)
    );
    assert!(host.console().contains("Ethernet1/1 BW utilization 80.00%"));
    let warnings: Vec<_> = host
        .trace()
        .entries()
        .into_iter()
        .filter(|e| e.kind == TraceKind::Syslog(SyslogPriority::Warning))
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].text.contains("above threshold 50%"));

    // No canned output for this port.
    assert_eq!(
        host.invoke_command(
            custom_cli::PORT_BW_UTIL_CMD,
            "",
            &["port", "bw", "utilization"],
            &[("<port>", "Ethernet1/2")]
        ),
        Some(false)
    );
}

#[test]
fn test_sample_command_additive_param() {
    let host = Arc::new(SimHost::new("customCliApp"));
    let session = Session::new(host.clone(), SessionConfig::default());
    custom_cli::install(&session).unwrap();

    assert_eq!(
        host.invoke_command(
            SAMPLE_CMD,
            "A x1 C 1 2",
            &["A", "C"],
            &[("<id1>", "x1"), ("<id2>", "1"), ("<id2>", "2")]
        ),
        Some(true)
    );
    let console = host.console().lines();
    assert!(console.contains(&"<id1> count: 1, <id2> count: 2".to_string()));
    assert!(console.contains(&"[1] id2 value is 2".to_string()));
}

#[test]
fn test_rib_mgr_watch_then_routes() {
    let events = ScriptedEvent::parse_script(
        r#"[
            {"type": "command", "name": "watch_route_cmd",
             "keywords": ["watch", "owner", "ipv4"],
             "params": [["<protocol>", "bgp"], ["<tag>", "65000"]]},
            {"type": "route", "fields": {"vrf": "default", "address": "10.1.1.0",
             "mask_len": "24", "event": "add", "nh.0.address": "192.168.1.1"}},
            {"type": "route", "fields": {"vrf": "default", "address": "10.1.1.0",
             "mask_len": "24", "event": "delete", "nh_count": "0"}}
        ]"#,
    )
    .unwrap();

    let report = run(AppKind::RibMgr, SessionConfig::default(), events).unwrap();
    assert_eq!(report.delivered, 3);
    assert_eq!(report.watches, 1);
    assert!(report
        .console
        .contains(&"Redistributing ipv4 Routes from bgp tag 65000 in VRF default".to_string()));

    let events: Vec<String> = report
        .trace
        .iter()
        .filter(|e| e.kind == TraceKind::Event)
        .map(|e| e.text.clone())
        .collect();
    assert_eq!(
        events,
        vec![
            "Event: Created Custom CLIs",
            "[default] 10.1.1.0/24 Event: 1, NH count 1",
            "[default] 10.1.1.0/24 Event: 2, NH count 0",
        ]
    );
}

#[test]
fn test_rib_mgr_unwatch() {
    let host = Arc::new(SimHost::new("ribMgr"));
    let session = Session::new(host.clone(), SessionConfig::default());
    nxsdk_apps::rib_watch::install(&session).unwrap();

    let keywords = ["watch", "owner", "ipv6", "vrf"];
    let params = [("<protocol>", "ospf"), ("<vrf-name>", "red")];
    assert_eq!(
        host.invoke_command("watch_route_cmd", "", &keywords, &params),
        Some(true)
    );
    assert_eq!(
        host.watches(),
        vec![WatchTarget::L3Route {
            protocol: "ospf".to_string(),
            tag: None,
            vrf: "red".to_string(),
            af: Some(AddressFamily::Ipv6),
        }]
    );

    let negated = ["no", "watch", "owner", "ipv6", "vrf"];
    assert_eq!(
        host.invoke_command("watch_route_cmd", "", &negated, &params),
        Some(true)
    );
    assert!(host.watches().is_empty());

    // Unwatching again fails on the host and is reported on the console.
    assert_eq!(
        host.invoke_command("watch_route_cmd", "", &negated, &params),
        Some(false)
    );
}

#[test]
fn test_feature_monitor_traces_dn() {
    let events = ScriptedEvent::parse_script(
        r#"[
            {"type": "dme", "fields": {"dn": "sys/fm/bgp", "event": "update",
             "prop.adminSt": "enabled", "updated": "adminSt"}},
            {"type": "dme_download_done", "dn": "sys/fm"}
        ]"#,
    )
    .unwrap();

    let report = run(AppKind::FeatureMonitor, SessionConfig::default(), events).unwrap();
    let texts: Vec<&str> = report.trace.iter().map(|e| e.text.as_str()).collect();
    assert!(texts.contains(&"[sys/fm/bgp]"));
    assert!(texts.contains(&"Feature \"bgp\" status is enabled"));
    assert!(texts.contains(&"[sys/fm] download done"));
    assert_eq!(report.watches, 1);
}

#[test]
fn test_intf_monitor_state_change() {
    let events = ScriptedEvent::parse_script(
        r#"[
            {"type": "interface", "change": "state",
             "fields": {"name": "Ethernet1/1", "admin": "up", "oper": "down"}}
        ]"#,
    )
    .unwrap();

    let report = run(AppKind::IntfMonitor, SessionConfig::default(), events).unwrap();
    let syslogs: Vec<&str> = report
        .trace
        .iter()
        .filter(|e| e.kind == TraceKind::Syslog(SyslogPriority::Notice))
        .map(|e| e.text.as_str())
        .collect();
    assert!(syslogs.contains(&"State change for interface: Ethernet1/1"));
    assert!(syslogs.contains(&"new state is: admin up, oper down"));
}

#[test]
fn test_run_uses_configured_name() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[app]\nname = \"bwMonitor\"\ndescription = \"Bandwidth monitor\"\n\n[logging]\nlevel = \"debug\""
    )
    .unwrap();
    let config = SessionConfig::from_file(file.path()).unwrap();

    let report = run(AppKind::CustomCli, config, Vec::new()).unwrap();
    assert_eq!(report.delivered, 0);
    assert!(report
        .trace
        .iter()
        .any(|e| e.text == "Started App bwMonitor"));
}

#[test]
fn test_init_logging_twice_keeps_first_subscriber() {
    nxsdk_apps::init_logging("info");
    nxsdk_apps::init_logging("debug");
}

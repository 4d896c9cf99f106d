//! Port bandwidth commands
//!
//! Adds three commands to the switch CLI:
//!
//! ```text
//! show <app> port bw utilization [<port>]
//! <app> port bw threshold <threshold>
//! show <app> port bw threshold
//! ```
//!
//! plus `sample_cmd`, a config command exercising key and additive
//! parameters.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;
use tracing::{debug, info};

use nxsdk_bridge::{
    CliCommand, CommandHandler, CommandSpec, CommandTree, HandlerResult, Host, ParamSpec,
    RecordFormat, Session, SyslogPriority, Tracer,
};

pub const PORT_BW_UTIL_CMD: &str = "port_bw_util_cmd";
pub const SET_THRESHOLD_CMD: &str = "set_port_bw_threshold_cmd";
pub const GET_THRESHOLD_CMD: &str = "get_port_bw_threshold_cmd";
pub const SAMPLE_CMD: &str = "sample_cmd";

/// Threshold in percent until configured.
pub const DEFAULT_THRESHOLD: i64 = 50;

const SEPARATOR: &str = "#####################################################";

/// Builds the parse tree entries of this app.
pub fn command_tree() -> anyhow::Result<CommandTree> {
    let mut tree = CommandTree::new();
    tree.add(
        CommandSpec::show(PORT_BW_UTIL_CMD, "port bw utilization [<port>]")
            .keyword("port", "Port Information")
            .keyword("bw", "Port Bandwidth Information")
            .keyword("utilization", "Port BW utilization in (%)")
            .param(
                "<port>",
                "Optional Filter Port Ex) Ethernet1/1",
                ParamSpec::Interface,
            ),
    )?;
    // "port" and "bw" help is inherited from the first command.
    tree.add(
        CommandSpec::config(SET_THRESHOLD_CMD, "port bw threshold <threshold>")
            .keyword("threshold", "Set Port BandWidth Threshold Alert")
            .param(
                "<threshold>",
                "Threshold Limit. Default 50%",
                ParamSpec::integer(1, 100),
            ),
    )?;
    tree.add(CommandSpec::show(GET_THRESHOLD_CMD, "port bw threshold"))?;
    tree.add(
        CommandSpec::config(SAMPLE_CMD, "A <id1> {B | C <id2>}")
            .keyword("A", "A is a Keyword")
            .keyword("B", "B is a Keyword")
            .keyword("C", "C is a Keyword")
            .param("<id1>", "As id", ParamSpec::string())
            .key("<id1>")
            .param("<id2>", "Cs id", ParamSpec::integer(0, i64::from(u16::MAX)))
            .additive("<id2>", 5),
    )?;
    Ok(tree)
}

/// Command handler keeping the configured threshold.
pub struct PortBandwidthCli {
    host: Arc<dyn Host>,
    tracer: Arc<dyn Tracer>,
    threshold: AtomicI64,
}

impl PortBandwidthCli {
    pub fn new(host: Arc<dyn Host>) -> Self {
        let tracer = host.tracer();
        Self {
            host,
            tracer,
            threshold: AtomicI64::new(DEFAULT_THRESHOLD),
        }
    }

    pub fn threshold(&self) -> i64 {
        self.threshold.load(Ordering::SeqCst)
    }

    fn port_utilization(&self, cmd: &CliCommand<'_>) -> anyhow::Result<bool> {
        let Some(port) = cmd.opt_str_param("<port>") else {
            cmd.print_console("Get Port BW Utilization percent for all ports");
            return Ok(true);
        };
        cmd.print_console(&format!("Get Port BW Utilization percent for {}", port));

        let output = match self
            .host
            .exec_show_cmd(&format!("show int {}", port), RecordFormat::Json)
        {
            Ok(output) => output,
            Err(e) => {
                cmd.print_console(&format!("% Cannot read {}: {}", port, e));
                return Ok(false);
            }
        };
        match utilization(&output) {
            Some(percent) => {
                cmd.print_console(&format!("{} BW utilization {:.2}%", port, percent));
                let threshold = self.threshold();
                if percent > threshold as f64 {
                    self.tracer.syslog(
                        SyslogPriority::Warning,
                        &format!(
                            "{} BW utilization {:.2}% above threshold {}%",
                            port, percent, threshold
                        ),
                    );
                }
            }
            None => cmd.print_console(&format!("No rate information for {}", port)),
        }
        Ok(true)
    }

    fn set_threshold(&self, cmd: &CliCommand<'_>) -> anyhow::Result<bool> {
        let threshold = if cmd.is_negated() {
            DEFAULT_THRESHOLD
        } else {
            cmd.int_param("<threshold>")?
        };
        self.threshold.store(threshold, Ordering::SeqCst);
        cmd.print_console(&format!("Set Port BW threshold {}", threshold));
        info!(threshold, "Port bandwidth threshold changed");
        Ok(true)
    }

    fn sample(&self, cmd: &CliCommand<'_>) -> anyhow::Result<bool> {
        cmd.print_console(&format!(
            "<id1> count: {}, <id2> count: {}",
            cmd.param_count("<id1>"),
            cmd.param_count("<id2>")
        ));
        for (i, id) in cmd.param_values("<id1>").iter().enumerate() {
            cmd.print_console(&format!("[{}] id1 value is {}", i, id));
        }
        if cmd.is_keyword_set("C") {
            for (i, id) in cmd.param_values("<id2>").iter().enumerate() {
                cmd.print_console(&format!("[{}] id2 value is {}", i, id));
            }
        } else {
            cmd.print_console("C keyword is not set");
        }
        Ok(true)
    }
}

impl CommandHandler for PortBandwidthCli {
    fn on_command(&self, cmd: &CliCommand<'_>) -> HandlerResult<bool> {
        debug!(command = cmd.name(), line = cmd.line(), "Running custom command");
        cmd.print_console(SEPARATOR);
        let result = match cmd.name() {
            PORT_BW_UTIL_CMD => self.port_utilization(cmd),
            SET_THRESHOLD_CMD => self.set_threshold(cmd),
            GET_THRESHOLD_CMD => {
                cmd.print_console(&format!("Get Port BW threshold value {}", self.threshold()));
                Ok(true)
            }
            SAMPLE_CMD => self.sample(cmd),
            other => {
                cmd.print_console(&format!("% Unknown command {}", other));
                Ok(false)
            }
        };
        cmd.print_console(SEPARATOR);
        result
    }
}

/// Output rate as a percentage of bandwidth, from `show int <port>` JSON.
fn utilization(output: &str) -> Option<f64> {
    let doc: Value = serde_json::from_str(output).ok()?;
    let row = &doc["TABLE_interface"]["ROW_interface"];
    let row = match row {
        Value::Array(rows) => rows.first()?,
        _ => row,
    };
    let bw_kbit = number(&row["eth_bw"])?;
    let out_bits = number(&row["eth_outrate1_bits"])?;
    if bw_kbit <= 0.0 {
        return None;
    }
    Some(out_bits * 100.0 / (bw_kbit * 1000.0))
}

/// Switch JSON carries numbers both as numbers and as strings.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Adds the commands and registers the handler.
pub fn install(session: &Session) -> anyhow::Result<Arc<PortBandwidthCli>> {
    session
        .add_to_parse_tree(&command_tree()?)
        .context("failed to add custom commands")?;
    let handler = Arc::new(PortBandwidthCli::new(session.host()));
    session.register_command_handler(handler.clone())?;

    let tracer = session.tracer();
    tracer.syslog(
        SyslogPriority::Emerg,
        &format!("Started App {}", session.app_name()),
    );
    tracer.event("Event: Created Custom CLIs");
    Ok(handler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_tree_builds() {
        let tree = command_tree().unwrap();
        assert_eq!(tree.len(), 4);
        let get = tree.get(GET_THRESHOLD_CMD).unwrap();
        assert_eq!(get.keyword_help("bw"), Some("Port Bandwidth Information"));
        assert_eq!(
            tree.get(SAMPLE_CMD).unwrap().param_def("<id2>").unwrap().repeat,
            5
        );
    }

    #[test]
    fn test_utilization_from_show_output() {
        let output = r#"{"TABLE_interface": {"ROW_interface": {
            "interface": "Ethernet1/1", "eth_bw": 10000000, "eth_outrate1_bits": "2500000000"
        }}}"#;
        assert_eq!(utilization(output), Some(25.0));

        let rows = r#"{"TABLE_interface": {"ROW_interface": [
            {"eth_bw": "1000000", "eth_outrate1_bits": "500000000"}
        ]}}"#;
        assert_eq!(utilization(rows), Some(50.0));
    }

    #[test]
    fn test_utilization_without_rates() {
        assert_eq!(utilization("Ethernet1/1 is up"), None);
        assert_eq!(utilization(r#"{"TABLE_interface": {}}"#), None);
        assert_eq!(
            utilization(r#"{"TABLE_interface": {"ROW_interface": {"eth_bw": 0, "eth_outrate1_bits": 5}}}"#),
            None
        );
    }
}

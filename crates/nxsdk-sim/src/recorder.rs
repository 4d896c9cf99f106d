//! Recorders standing in for the switch console and the host trace buffer.

use parking_lot::Mutex;

use nxsdk_bridge::{Console, SyslogPriority, Tracer};

/// Collects console output of simulated CLI sessions.
#[derive(Debug, Default)]
pub struct ConsoleRecorder {
    lines: Mutex<Vec<String>>,
}

impl ConsoleRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything printed so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Returns and clears the recorded output.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock())
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|l| l.contains(needle))
    }
}

impl Console for ConsoleRecorder {
    fn print_console(&self, text: &str) {
        self.lines.lock().push(text.to_string());
    }
}

/// Kind of a recorded trace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Event,
    Error,
    Syslog(SyslogPriority),
}

/// One recorded trace entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub kind: TraceKind,
    pub text: String,
}

/// Collects host trace and syslog output.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    entries: Mutex<Vec<TraceEntry>>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<TraceEntry> {
        self.entries.lock().clone()
    }

    /// Text of event trace entries, in order.
    pub fn events(&self) -> Vec<String> {
        self.texts(|k| k == TraceKind::Event)
    }

    /// Text of error trace entries, in order.
    pub fn errors(&self) -> Vec<String> {
        self.texts(|k| k == TraceKind::Error)
    }

    /// Text of syslog entries, in order.
    pub fn syslogs(&self) -> Vec<String> {
        self.texts(|k| matches!(k, TraceKind::Syslog(_)))
    }

    pub fn take(&self) -> Vec<TraceEntry> {
        std::mem::take(&mut *self.entries.lock())
    }

    fn texts(&self, keep: impl Fn(TraceKind) -> bool) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|e| keep(e.kind))
            .map(|e| e.text.clone())
            .collect()
    }

    fn push(&self, kind: TraceKind, text: &str) {
        self.entries.lock().push(TraceEntry {
            kind,
            text: text.to_string(),
        });
    }
}

impl Tracer for TraceRecorder {
    fn event(&self, text: &str) {
        self.push(TraceKind::Event, text);
    }

    fn error(&self, text: &str) {
        self.push(TraceKind::Error, text);
    }

    fn syslog(&self, priority: SyslogPriority, text: &str) {
        self.push(TraceKind::Syslog(priority), text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_take_clears() {
        let console = ConsoleRecorder::new();
        console.print_console("Port bw threshold: 50%");
        assert!(console.contains("threshold"));
        assert_eq!(console.take(), vec!["Port bw threshold: 50%"]);
        assert!(console.lines().is_empty());
    }

    #[test]
    fn test_trace_kinds() {
        let trace = TraceRecorder::new();
        trace.event("[sys/fm]");
        trace.error("bad");
        trace.syslog(SyslogPriority::Warning, "high util");
        assert_eq!(trace.events(), vec!["[sys/fm]"]);
        assert_eq!(trace.errors(), vec!["bad"]);
        assert_eq!(trace.syslogs(), vec!["high util"]);
        assert_eq!(trace.entries().len(), 3);
    }
}

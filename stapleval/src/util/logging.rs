//! Logging support

use std::sync::Mutex;

use log::{debug, error, info, warn};

/// Enum that describes level associated with a log message
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LogLevels {
    /// Common error logging level
    Error,
    /// Common warn logging level
    Warn,
    /// Common info logging level
    Info,
    /// Common debug logging level
    Debug,
}

/// `LogSink` receives the host-level output produced while processing hosts: the host name, the
/// validity window of a fetched response, per-responder failures and terminal errors.
///
/// A sink is passed explicitly to [`process_host`](crate::process_host) and
/// [`fetch_ocsp_response`](crate::fetch_ocsp_response) so callers (and tests) decide where output goes.
pub trait LogSink: Send + Sync {
    /// Records `message` at `level`.
    fn log_message(&self, level: &LogLevels, message: &str);
}

/// `LogCrateSink` forwards messages to the `log` crate macros, i.e., to whatever logger the
/// application installed (log4rs in the case of staplecheck).
#[derive(Clone, Copy, Debug, Default)]
pub struct LogCrateSink;

impl LogSink for LogCrateSink {
    fn log_message(&self, level: &LogLevels, message: &str) {
        match level {
            LogLevels::Error => error!("{}", message),
            LogLevels::Warn => warn!("{}", message),
            LogLevels::Info => info!("{}", message),
            LogLevels::Debug => debug!("{}", message),
        }
    }
}

/// `MemorySink` retains every message it receives, in order.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(LogLevels, String)>>,
}

impl MemorySink {
    /// Creates a new empty [`MemorySink`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all messages received so far.
    pub fn entries(&self) -> Vec<(LogLevels, String)> {
        match self.entries.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns the messages received at `level`.
    pub fn messages_at(&self, level: LogLevels) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }
}

impl LogSink for MemorySink {
    fn log_message(&self, level: &LogLevels, message: &str) {
        let mut g = match self.entries.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        g.push((*level, message.to_string()));
    }
}

#[test]
fn memory_sink_test() {
    let sink = MemorySink::new();
    sink.log_message(&LogLevels::Info, "example.com");
    sink.log_message(&LogLevels::Warn, "responder failed");
    sink.log_message(&LogLevels::Info, "ProducedAt: 2024-01-01T00:00:00Z");

    assert_eq!(3, sink.entries().len());
    assert_eq!(
        vec![
            "example.com".to_string(),
            "ProducedAt: 2024-01-01T00:00:00Z".to_string()
        ],
        sink.messages_at(LogLevels::Info)
    );
    assert!(sink.messages_at(LogLevels::Error).is_empty());

    // forwarding with no logger installed is a no-op
    LogCrateSink.log_message(&LogLevels::Debug, "ignored");
}

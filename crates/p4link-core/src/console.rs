//! Caller-visible diagnostics and connection callbacks.
//!
//! A [`SessionListener`] receives free-text lines meant for whoever is
//! watching the session (a build log, a terminal). Internal diagnostics go
//! through `tracing` instead. The callback types here are registered with a
//! connection right after it is established.

use std::sync::Arc;

use tracing::{debug, info};

use crate::session::AbortFlag;
use crate::transport::{CommandCallback, ProgressCallback};

/// Sink for free-text diagnostic lines.
pub trait SessionListener: Send + Sync {
    fn log(&self, line: &str);
}

/// Listener that forwards lines to the tracing subscriber.
#[derive(Debug, Default)]
pub struct TracingListener;

impl SessionListener for TracingListener {
    fn log(&self, line: &str) {
        info!("{line}");
    }
}

/// Relays per-command progress lines to the listener and reports the abort
/// flag back to the transport so a long-running command can be cancelled.
pub struct ProgressReporter {
    listener: Arc<dyn SessionListener>,
    abort: AbortFlag,
}

impl ProgressReporter {
    pub fn new(listener: Arc<dyn SessionListener>, abort: AbortFlag) -> Self {
        Self { listener, abort }
    }
}

impl ProgressCallback for ProgressReporter {
    fn tick(&self, line: &str) -> bool {
        if !line.is_empty() {
            self.listener.log(line);
        }
        !self.abort.is_set()
    }
}

/// Logs every command issued on the connection.
#[derive(Debug, Default)]
pub struct CommandLogger;

impl CommandCallback for CommandLogger {
    fn issuing(&self, command: &str) {
        debug!(command, "issuing server command");
    }

    fn completed(&self, command: &str) {
        debug!(command, "server command completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingListener(AtomicUsize);

    impl SessionListener for CountingListener {
        fn log(&self, _line: &str) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_progress_reporter_forwards_lines() {
        let listener = Arc::new(CountingListener(AtomicUsize::new(0)));
        let reporter = ProgressReporter::new(listener.clone(), AbortFlag::new());

        assert!(reporter.tick("syncing //depot/main/..."));
        assert!(reporter.tick(""));
        assert_eq!(listener.0.load(Ordering::SeqCst), 1, "blank lines are not forwarded");
    }

    #[test]
    fn test_progress_reporter_requests_cancel_after_abort() {
        let abort = AbortFlag::new();
        let reporter = ProgressReporter::new(Arc::new(TracingListener), abort.clone());

        assert!(reporter.tick("working"));
        abort.set();
        assert!(!reporter.tick("working"));
    }
}

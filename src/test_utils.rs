use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::writer::MakeWriter;

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs {
    buf: Arc<Mutex<Vec<u8>>>,
}

pub(crate) struct CapturedLogsGuard {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn contents(&self) -> String {
        let buf = self.buf.lock().expect("log buffer lock");
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogsGuard;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedLogsGuard {
            buf: Arc::clone(&self.buf),
        }
    }
}

impl Write for CapturedLogsGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut handle = self.buf.lock().expect("log buffer lock");
        handle.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with every tracing event on this thread written to a buffer.
pub(crate) fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, logs.contents())
}

pub(crate) fn warning_count(logs: &str) -> usize {
    logs.lines().filter(|line| line.contains("WARN")).count()
}

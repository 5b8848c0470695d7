//! Host interfaces for the invocation log stream
//!
//! Lines logged while a handler runs are returned to the host in the invocation response's
//! `Logs`, which the host attaches to that execution. Anything logged outside an invocation goes
//! to the process's standard streams, which the host collects as its own log.

use std::cell::RefCell;
use std::io::Write;

thread_local! {
    static CAPTURE: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

/// Restores the capture that was active before [capture] started, even if the handler panics.
struct CaptureGuard {
    previous: Option<Option<Vec<String>>>,
}

impl CaptureGuard {
    fn finish(mut self) -> Vec<String> {
        let previous = self.previous.take().flatten();
        CAPTURE
            .with(|capture| capture.replace(previous))
            .unwrap_or_default()
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            CAPTURE.with(|capture| capture.replace(previous));
        }
    }
}

/// Runs `f` while collecting every line [log]ged on this thread.
///
/// Captures nest: an inner capture sees only its own lines and the outer capture resumes
/// afterwards.
///
/// ```rust
/// use cosmosdb_functions_host::logging;
///
/// let (value, lines) = logging::capture(|| {
///     logging::log("hello", log::Level::Info);
///     7
/// });
/// assert_eq!(value, 7);
/// assert_eq!(lines, vec!["hello"]);
/// ```
pub fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
    let guard = CaptureGuard {
        previous: Some(CAPTURE.with(|capture| capture.replace(Some(Vec::new())))),
    };
    let result = f();
    (result, guard.finish())
}

/// Whether this thread is currently inside [capture].
pub fn is_capturing() -> bool {
    CAPTURE.with(|capture| capture.borrow().is_some())
}

/// Logs a given string to the current invocation, or to the console outside of one.
pub fn log(input: &str, level: log::Level) {
    let captured = CAPTURE.with(|capture| match capture.borrow_mut().as_mut() {
        Some(lines) => {
            lines.push(input.to_string());
            true
        }
        None => false,
    });
    if !captured {
        console(input, level);
    }
}

/// Logs a given string to the console. Errors and warnings go to stderr.
pub fn console(input: &str, level: log::Level) {
    // A closed stream has nowhere left to report to.
    let _ = match level {
        log::Level::Error | log::Level::Warn => writeln!(std::io::stderr().lock(), "{input}"),
        log::Level::Info | log::Level::Debug | log::Level::Trace => {
            writeln!(std::io::stdout().lock(), "{input}")
        }
    };
}

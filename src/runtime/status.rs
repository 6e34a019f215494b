//! Last-operation status channel.
//!
//! Every fallible runtime operation leaves a code and message here: `Ok` on
//! success, a specific failure otherwise. Generated `try`/`catch` blocks read
//! and clear it. Internal invariant violations bypass the channel and abort
//! through [`fatal`].

use std::{borrow::Cow, cell::RefCell, fmt, io::Write};

use serde::Serialize;

use crate::{
    config::{self, ColorMode},
    runtime::{kind::Kind, value::Value},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(i32)]
pub enum StatusCode {
    Ok = 0,
    Error = 1,
    EndOfInput = 2,
    TypeError = 3,
    OutOfBounds = 4,
    IoError = 5,
    MathError = 6,
}

impl StatusCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusCode::Ok => "Ok",
            StatusCode::Error => "Error",
            StatusCode::EndOfInput => "EndOfInput",
            StatusCode::TypeError => "TypeError",
            StatusCode::OutOfBounds => "OutOfBounds",
            StatusCode::IoError => "IoError",
            StatusCode::MathError => "MathError",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub code: StatusCode,
    pub message: Cow<'static, str>,
}

impl Status {
    const OK: Status = Status {
        code: StatusCode::Ok,
        message: Cow::Borrowed(""),
    };

    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::Ok
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.code.label())
        } else {
            write!(f, "{}: {}", self.code.label(), self.message)
        }
    }
}

thread_local! {
    static STATUS: RefCell<Status> = const { RefCell::new(Status::OK) };
}

pub fn set(code: StatusCode, message: impl Into<Cow<'static, str>>) {
    let message = message.into();
    STATUS.with(|slot| *slot.borrow_mut() = Status { code, message });
}

pub fn set_ok() {
    STATUS.with(|slot| *slot.borrow_mut() = Status::OK);
}

pub fn clear() {
    set_ok();
}

pub fn current() -> Status {
    STATUS.with(|slot| slot.borrow().clone())
}

pub fn code() -> StatusCode {
    STATUS.with(|slot| slot.borrow().code)
}

pub fn message() -> String {
    STATUS.with(|slot| slot.borrow().message.to_string())
}

pub fn is_ok() -> bool {
    code() == StatusCode::Ok
}

/// A recoverable failure: the status to publish plus the value the operation
/// hands back instead of a result.
#[derive(Debug, Clone)]
pub struct Failure {
    pub code: StatusCode,
    pub message: Cow<'static, str>,
    pub fallback: Value,
}

impl Failure {
    pub fn new(code: StatusCode, message: impl Into<Cow<'static, str>>, fallback: Value) -> Self {
        Self {
            code,
            message: message.into(),
            fallback,
        }
    }

    pub fn error(message: impl Into<Cow<'static, str>>, fallback: Value) -> Self {
        Self::new(StatusCode::Error, message, fallback)
    }

    pub fn type_error(message: impl Into<Cow<'static, str>>, fallback: Value) -> Self {
        Self::new(StatusCode::TypeError, message, fallback)
    }

    pub fn out_of_bounds(message: impl Into<Cow<'static, str>>, fallback: Value) -> Self {
        Self::new(StatusCode::OutOfBounds, message, fallback)
    }

    pub fn io(message: impl Into<Cow<'static, str>>, fallback: Value) -> Self {
        Self::new(StatusCode::IoError, message, fallback)
    }

    pub fn math(message: impl Into<Cow<'static, str>>, fallback: Value) -> Self {
        Self::new(StatusCode::MathError, message, fallback)
    }

    /// Same failure, typed null of `kind` as the fallback.
    pub fn typed(code: StatusCode, message: impl Into<Cow<'static, str>>, kind: Kind) -> Self {
        Self::new(code, message, Value::null_typed(kind))
    }
}

pub type OpResult = Result<Value, Failure>;

/// Runs an operation and publishes its outcome on the channel.
pub fn settle(op: impl FnOnce() -> OpResult) -> Value {
    match op() {
        Ok(value) => {
            set_ok();
            value
        }
        Err(failure) => {
            set(failure.code, failure.message);
            failure.fallback
        }
    }
}

/// Runs an operation that cannot fail and marks the channel `Ok`.
pub fn ok(value: Value) -> Value {
    set_ok();
    value
}

// ---------------------------------------------------------------------------
// Fatal tier
// ---------------------------------------------------------------------------

pub fn platform() -> &'static str {
    match (std::env::consts::OS, std::env::consts::ARCH) {
        ("macos", "aarch64") => "macOS-arm64",
        ("macos", "x86_64") => "macOS-x86_64",
        ("macos", _) => "macOS-unknown",
        ("linux", "aarch64") => "Linux-arm64",
        ("linux", "x86_64") => "Linux-x86_64",
        ("linux", _) => "Linux-unknown",
        ("windows", "x86_64") => "Windows-x64",
        ("windows", _) => "Windows-x86",
        _ => "unknown-platform",
    }
}

/// Text of the fatal diagnostic.
pub fn fatal_report(message: &str, timestamp: &str, colors: bool) -> String {
    if colors {
        format!(
            "\n\x1b[38;5;27mFLYUX\x1b[38;5;39m {}\x1b[0m ({})\n\
             \x1b[31m[Err]\x1b[0m Fatal Error: {}\n\
             \x1b[33mExecution Terminated.\x1b[0m  [{}]\n",
            crate::VERSION,
            platform(),
            message,
            timestamp
        )
    } else {
        format!(
            "\nFLYUX {} ({})\n[Err] Fatal Error: {}\nExecution Terminated.  [{}]\n",
            crate::VERSION,
            platform(),
            message,
            timestamp
        )
    }
}

/// Prints the fatal diagnostic and terminates the process with the last
/// status code (1 when the channel was `Ok`).
pub fn fatal(message: &str) -> ! {
    let last = code();
    set(StatusCode::Error, message.to_string());
    log::debug!("fatal abort: {}", message);

    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let colors = match config::with(|c| c.color) {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => stderr_is_terminal(),
    };
    if let Err(err) = std::io::stdout().flush() {
        log::debug!("stdout flush before fatal report failed: {}", err);
    }
    let report = fatal_report(message, &timestamp, colors);
    if let Err(err) = std::io::stderr().write_all(report.as_bytes()) {
        log::debug!("fatal report write failed: {}", err);
    }

    let exit_code = match last {
        StatusCode::Ok => StatusCode::Error.as_i32(),
        other => other.as_i32(),
    };
    std::process::exit(exit_code)
}

fn stderr_is_terminal() -> bool {
    // SAFETY: isatty only inspects the descriptor.
    unsafe { libc::isatty(libc::STDERR_FILENO) == 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_sets_ok_on_success() {
        set(StatusCode::TypeError, "stale");
        let v = settle(|| Ok(Value::number(1.0)));
        assert_eq!(v, Value::number(1.0));
        assert_eq!(current(), Status::OK);
    }

    #[test]
    fn settle_publishes_failure_and_returns_fallback() {
        let v = settle(|| Err(Failure::typed(StatusCode::OutOfBounds, "nope", Kind::Number)));
        assert!(v.is_null());
        assert_eq!(v.declared_kind(), Kind::Number);
        assert_eq!(code(), StatusCode::OutOfBounds);
        assert_eq!(message(), "nope");
        clear();
        assert!(is_ok());
    }

    #[test]
    fn fatal_report_layout() {
        let text = fatal_report("boom", "2024-01-02 03:04:05", false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "");
        assert!(lines[1].starts_with("FLYUX 0.1 ("));
        assert_eq!(lines[2], "[Err] Fatal Error: boom");
        assert_eq!(lines[3], "Execution Terminated.  [2024-01-02 03:04:05]");
    }

    #[test]
    fn status_display() {
        set(StatusCode::IoError, "(readFile) cannot open file");
        assert_eq!(current().to_string(), "IoError: (readFile) cannot open file");
        clear();
        assert_eq!(current().to_string(), "Ok");
    }
}

use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use ogal_client::{ErrorClass, LedgerError};
use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

static JSON_MODE: OnceLock<bool> = OnceLock::new();

pub fn init(json: bool) {
    let _ = JSON_MODE.set(json);
}

pub fn is_json() -> bool {
    JSON_MODE.get().copied().unwrap_or(false)
}

pub fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    println!("{s}");
    Ok(())
}

pub fn eprintln_line(msg: &str) {
    let _ = writeln!(io::stderr(), "{msg}");
}

pub fn stderr() -> StandardStream {
    StandardStream::stderr(ColorChoice::Auto)
}

/// Colored `label: message` on stderr. Silent in JSON mode.
pub fn status(label: &str, color: Color, msg: &str) {
    if is_json() {
        return;
    }
    let mut err = stderr();
    let _ = err.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
    let _ = write!(err, "{label}");
    let _ = err.reset();
    let _ = writeln!(err, ": {msg}");
}

/// Spinner shown while a transaction is in flight; hidden in JSON mode.
pub fn spinner(msg: &str) -> ProgressBar {
    if is_json() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} ({elapsed})") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

#[derive(Debug, Serialize)]
struct ErrorOut<'a> {
    ok: bool,
    class: Option<ErrorClass>,
    message: String,
    diagnostic: &'a str,
}

/// Report a failed command. Ledger errors get their class and user message.
pub fn report_error(err: &anyhow::Error) {
    let ledger = err.downcast_ref::<LedgerError>();
    let diagnostic = match ledger {
        Some(e) => e.diagnostic(),
        None => format!("{err:#}"),
    };
    let message = ledger.map(LedgerError::user_message).unwrap_or_else(|| err.to_string());

    if is_json() {
        let out = ErrorOut {
            ok: false,
            class: ledger.map(LedgerError::class),
            message,
            diagnostic: &diagnostic,
        };
        if let Ok(s) = serde_json::to_string_pretty(&out) {
            println!("{s}");
        }
        return;
    }
    status("error", Color::Red, &message);
    eprintln_line(&diagnostic);
}

/// Process exit code per error class.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<LedgerError>().map(LedgerError::class) {
        Some(ErrorClass::Input) => 2,
        Some(ErrorClass::State) => 3,
        Some(ErrorClass::Decode) => 4,
        Some(ErrorClass::Transport) => 5,
        Some(ErrorClass::Program) => 6,
        None => 1,
    }
}

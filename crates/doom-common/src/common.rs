// common.rs — console output and the fatal error entry point

use parking_lot::{const_mutex, Mutex};

use crate::doom_error::DoomError;
use crate::i_system::ConsoleSink;

/// Distribution name shown in the startup banner.
pub const DISTNAME: &str = "rdoom";

static CONSOLE: Mutex<Option<Box<dyn ConsoleSink>>> = const_mutex(None);

// ============================================================
// Redirect buffer for com_printf
// ============================================================

static RD_BUFFER: Mutex<Option<String>> = const_mutex(None);

/// Begin redirecting printf output into a buffer.
pub fn com_begin_redirect() {
    *RD_BUFFER.lock() = Some(String::new());
}

/// End redirect and return the captured output.
pub fn com_end_redirect() -> Option<String> {
    RD_BUFFER.lock().take()
}

// ============================================================
// Console sink
// ============================================================

/// Install the host console. Replaces any previously installed sink.
pub fn set_console_sink(sink: Box<dyn ConsoleSink>) {
    *CONSOLE.lock() = Some(sink);
}

/// Remove the host console; output falls back to stdout.
pub fn clear_console_sink() -> Option<Box<dyn ConsoleSink>> {
    CONSOLE.lock().take()
}

// ============================================================
// com_printf / com_dprintf / i_error
// ============================================================

/// General-purpose print. Appends to the redirect buffer if one is active,
/// otherwise hands the text to the console sink (stdout when none).
pub fn com_printf(msg: &str) {
    {
        let mut buf = RD_BUFFER.lock();
        if let Some(ref mut s) = *buf {
            s.push_str(msg);
            return;
        }
    }

    let mut console = CONSOLE.lock();
    match console.as_mut() {
        Some(sink) => sink.write(msg),
        None => print!("{}", msg),
    }
}

/// Developer-only print.
pub fn com_dprintf(msg: &str) {
    log::debug!("{}", msg.trim_end());
}

/// Console print that is also recorded as a warning.
pub fn com_warning(msg: &str) {
    log::warn!("{}", msg.trim_end());
    com_printf(msg);
}

/// Forward a window/console title to the host.
pub fn com_set_title(title: &str) {
    if let Some(sink) = CONSOLE.lock().as_mut() {
        sink.set_title(title);
    }
}

/// The engine's single Error(message) entry point. Prints the message and
/// returns the controlled-abort error for the caller to propagate.
pub fn i_error(msg: impl Into<String>) -> DoomError {
    let msg = msg.into();
    log::error!("{}", msg);
    com_printf(&format!("Error: {}\n", msg));
    DoomError::Fatal(msg)
}

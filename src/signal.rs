// SPDX-License-Identifier: MIT
//
// Ctrl-C handling.
//
// While a command runs, SIGINT only raises `INTERRUPTED`; the engine polls
// it between hops and reports "Interrupted" with the caret unmoved. Between
// commands (waiting on stdin) SIGINT ends the process as usual.
#![allow(unsafe_code)]

use std::sync::atomic::{AtomicBool, Ordering};

/// Raised by SIGINT while a command is running.
pub static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Set for the duration of [`while_running`].
static RUNNING: AtomicBool = AtomicBool::new(false);

/// Run `f` with SIGINT turned into a raise of [`INTERRUPTED`].
pub fn while_running<T>(f: impl FnOnce() -> T) -> T {
    RUNNING.store(true, Ordering::Relaxed);
    let out = f();
    RUNNING.store(false, Ordering::Relaxed);
    out
}

/// Install the SIGINT handler.
///
/// The handler only touches atomics and calls `_exit`, both of which are
/// async-signal-safe.
#[cfg(unix)]
pub fn install() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigint_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGINT, &raw const sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn sigint_handler(_sig: libc::c_int) {
    if RUNNING.load(Ordering::Relaxed) {
        INTERRUPTED.store(true, Ordering::Relaxed);
    } else {
        unsafe { libc::_exit(130) };
    }
}

#[cfg(not(unix))]
pub fn install() {
    // Ctrl-C keeps its default behaviour.
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn sigint_while_running_raises_flag() {
        INTERRUPTED.store(false, Ordering::Relaxed);
        let raised = while_running(|| {
            sigint_handler(libc::SIGINT);
            INTERRUPTED.swap(false, Ordering::Relaxed)
        });
        assert!(raised);
        assert!(!RUNNING.load(Ordering::Relaxed));
    }
}

//! Control-signal dispositions.
//!
//! The shell cares about three signals: interrupt (SIGINT), terminate
//! (SIGTERM), and the interactive stop (SIGTSTP). While the shell itself is
//! in control the *interactive* handler set is installed; around process
//! creation the *child* set is swapped in so the new process starts with the
//! right behavior, then the interactive set is put back. Swaps happen with
//! all three signals blocked, so a signal is always handled by exactly one
//! of the two sets.
//!
//! Handlers only flip atomics, with one exception: terminate must reach the
//! rest of the process group even while the shell is blocked, so its handler
//! broadcasts directly. Everything else (toggling foreground-only mode,
//! abandoning a read) is decided by the main loop after a blocking call
//! returns.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use log::debug;
use nix::libc;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal};

use crate::errors::{ErrorKind, Result};

/// The signals the shell handles specially.
pub const CONTROL_SIGNALS: [Signal; 3] = [Signal::SIGINT, Signal::SIGTERM, Signal::SIGTSTP];

const TERMINATE_MESSAGE: &[u8] = b"\ntinysh: terminated, signalling process group\n";

static SIGNAL_CAUGHT: AtomicBool = AtomicBool::new(false);
static PENDING_STOP_TOGGLES: AtomicUsize = AtomicUsize::new(0);

/// Which behavior is installed for the control signals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandlerSet {
    /// The shell is reading input or waiting on a foreground child.
    Interactive,
    /// A child between process creation and program image replacement.
    Child { background: bool },
}

impl HandlerSet {
    pub fn handler(self, signal: Signal) -> SigHandler {
        match (self, signal) {
            (HandlerSet::Interactive, Signal::SIGINT) => SigHandler::Handler(handle_interrupt),
            (HandlerSet::Interactive, Signal::SIGTERM) => SigHandler::Handler(handle_terminate),
            (HandlerSet::Interactive, Signal::SIGTSTP) => SigHandler::Handler(handle_stop),
            // An interrupt aimed at the foreground job must not take down
            // detached jobs.
            (HandlerSet::Child { background: true }, Signal::SIGINT) => SigHandler::SigIgn,
            // Nothing could resume a stopped child.
            (HandlerSet::Child { .. }, Signal::SIGTSTP) => SigHandler::SigIgn,
            _ => SigHandler::SigDfl,
        }
    }

    /// Installs this set for all control signals.
    ///
    /// Handlers run with every control signal blocked and without
    /// `SA_RESTART`, so a blocking `read` or `waitpid` returns `EINTR`.
    pub fn install(self) -> Result<()> {
        for &sig in &CONTROL_SIGNALS {
            let action = SigAction::new(self.handler(sig), SaFlags::empty(), control_signal_set());
            // Safe: the handlers only touch atomics and call
            // async-signal-safe functions.
            unsafe { signal::sigaction(sig, &action) }
                .map_err(|_| ErrorKind::SignalSetup(format!("{:?}", sig)))?;
        }
        debug!("installed {:?} signal handlers", self);
        Ok(())
    }
}

pub fn control_signal_set() -> SigSet {
    let mut set = SigSet::empty();
    for &sig in &CONTROL_SIGNALS {
        set.add(sig);
    }
    set
}

/// RAII guard: the control signals stay blocked until it is dropped, after
/// which the previous mask is restored and anything pending is delivered.
pub struct BlockedSignals {
    previous: SigSet,
}

impl BlockedSignals {
    pub fn new() -> Result<Self> {
        let mut previous = SigSet::empty();
        signal::sigprocmask(
            SigmaskHow::SIG_BLOCK,
            Some(&control_signal_set()),
            Some(&mut previous),
        )?;
        Ok(Self { previous })
    }
}

impl Drop for BlockedSignals {
    fn drop(&mut self) {
        let temp_result = signal::sigprocmask(SigmaskHow::SIG_SETMASK, Some(&self.previous), None);
        log_if_err!(temp_result, "failed to restore signal mask");
    }
}

impl fmt::Debug for BlockedSignals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockedSignals")
    }
}

/// Unblocks the control signals in the calling process regardless of any
/// guard. A forked child calls this before replacing its image, since the
/// signal mask survives `exec`.
pub fn unblock_control_signals() -> Result<()> {
    signal::sigprocmask(SigmaskHow::SIG_UNBLOCK, Some(&control_signal_set()), None)?;
    Ok(())
}

/// Swaps in the child handler set for the duration of process creation and
/// restores the interactive set afterwards.
///
/// Call `enter` right before forking. The parent calls `restore`; the child
/// keeps the child set and calls `finish_in_child` before `exec`.
#[derive(Debug)]
pub struct ChildDispositions {
    _blocked: BlockedSignals,
}

impl ChildDispositions {
    pub fn enter(background: bool) -> Result<Self> {
        let blocked = BlockedSignals::new()?;
        HandlerSet::Child { background }.install()?;
        Ok(Self { _blocked: blocked })
    }

    pub fn restore(self) -> Result<()> {
        HandlerSet::Interactive.install()
        // Dropping `self` unblocks; pending signals now hit the interactive
        // handlers.
    }

    pub fn finish_in_child(self) -> Result<()> {
        std::mem::forget(self);
        unblock_control_signals()
    }
}

/// Whether any control signal arrived since the last call; clears the flag.
pub fn take_signal_caught() -> bool {
    SIGNAL_CAUGHT.swap(false, Ordering::SeqCst)
}

/// Number of stop signals received since the last call; clears the count.
pub fn take_stop_toggles() -> usize {
    PENDING_STOP_TOGGLES.swap(0, Ordering::SeqCst)
}

/// Records that a control signal arrived. Async-signal-safe.
pub(crate) fn note_signal_caught() {
    SIGNAL_CAUGHT.store(true, Ordering::SeqCst);
}

/// Serializes tests that read or raise the process-wide signal flags.
#[cfg(test)]
pub(crate) fn lock_signal_flags() -> std::sync::MutexGuard<'static, ()> {
    static SIGNAL_FLAGS: std::sync::Mutex<()> = std::sync::Mutex::new(());
    SIGNAL_FLAGS.lock().unwrap_or_else(|e| e.into_inner())
}

extern "C" fn handle_interrupt(_: libc::c_int) {
    note_signal_caught();
}

extern "C" fn handle_terminate(_: libc::c_int) {
    note_signal_caught();
    // Only async-signal-safe calls from here on. Resetting to the default
    // first means the copy we send ourselves ends the shell once this
    // handler returns and SIGTERM is unblocked.
    unsafe {
        libc::write(
            libc::STDOUT_FILENO,
            TERMINATE_MESSAGE.as_ptr() as *const libc::c_void,
            TERMINATE_MESSAGE.len(),
        );
        libc::signal(libc::SIGTERM, libc::SIG_DFL);
        libc::kill(0, libc::SIGTERM);
    }
}

extern "C" fn handle_stop(_: libc::c_int) {
    note_signal_caught();
    PENDING_STOP_TOGGLES.fetch_add(1, Ordering::SeqCst);
}

//! Running one external command: fork, wire up redirection in the child,
//! exec, and then either wait for it or hand it to the job table.

use std::convert::Infallible;
use std::ffi::CString;
use std::io::{self, Write};

use log::{debug, error, info};
use nix::errno::Errno;
use nix::sys::wait;
use nix::unistd::{self, ForkResult, Pid};

use crate::core::command::CommandSpec;
use crate::core::job::{CompletionCause, ProcessId};
use crate::core::redirection::RedirectionRequest;
use crate::errors::{Error, ErrorKind, Result};
use crate::shell::exit_status::ExitStatusTracker;
use crate::shell::job_control::JobTable;
use crate::shell::signals::{BlockedSignals, ChildDispositions};

/// Exit status of a child that could not set itself up or exec.
pub const CHILD_FAILURE_EXIT_STATUS: i32 = 1;

/// Launches `command`. A foreground command is waited for and its outcome
/// recorded in `exit_status`; a background command is registered in `jobs`
/// and left running. Either way, finished background jobs are announced on
/// `out` before returning.
pub fn run_external_command<W: Write>(
    command: &CommandSpec,
    jobs: &mut JobTable,
    exit_status: &mut ExitStatusTracker,
    out: &mut W,
) -> Result<()> {
    if command.is_background() && !jobs.has_capacity() {
        return Err(ErrorKind::JobLimitReached(jobs.capacity()).into());
    }
    let argv = to_c_strings(command.argv())?;

    // Anything still buffered would otherwise be written twice.
    out.flush()?;
    io::stdout().flush()?;

    let dispositions = ChildDispositions::enter(command.is_background())?;
    // Safe: the shell is single threaded, so the child gets a consistent
    // copy of the address space.
    let child = match unsafe { unistd::fork() } {
        Ok(ForkResult::Parent { child }) => child,
        Ok(ForkResult::Child) => run_child(command, &argv, dispositions),
        Err(e) => {
            error!("fork failed: {}", e);
            dispositions.restore()?;
            return Err(ErrorKind::ForkFailed.into());
        }
    };
    dispositions.restore()?;

    let pid = ProcessId::from(child);
    if command.is_background() {
        info!("started background process {}: {:?}", pid, command.argv());
        writeln!(out, "Background process {} has begun", pid)?;
        jobs.register(pid)?;
    } else {
        info!("started foreground process {}: {:?}", pid, command.argv());
        let cause = wait_for_foreground(pid)?;
        debug!("foreground process {} finished: {}", pid, cause);
        exit_status.record(cause);
        if let CompletionCause::TerminatingSignal(_) = cause {
            writeln!(out, "{}", cause)?;
        }
    }

    jobs.do_job_notification(out)
}

/// Blocks until `pid` terminates. The control signals are held off for the
/// duration and delivered to the interactive handlers afterwards.
fn wait_for_foreground(pid: ProcessId) -> Result<CompletionCause> {
    let _blocked = BlockedSignals::new()?;
    loop {
        match wait::waitpid(Pid::from(pid), None) {
            Ok(status) => match CompletionCause::from_wait_status(&status) {
                Some((_, cause)) => return Ok(cause),
                None => debug!("ignoring wait status {:?}", status),
            },
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Runs in the child after `fork`. Never returns to the shell's loop.
fn run_child(command: &CommandSpec, argv: &[CString], dispositions: ChildDispositions) -> ! {
    let Err(e) = exec_child(command, argv, dispositions);
    eprintln!("tinysh: {}", e);
    // A forked child must not run the exit handlers it inherited.
    unsafe { nix::libc::_exit(CHILD_FAILURE_EXIT_STATUS) }
}

fn exec_child(
    command: &CommandSpec,
    argv: &[CString],
    dispositions: ChildDispositions,
) -> Result<Infallible> {
    RedirectionRequest::open(command.redirects())?.apply()?;
    dispositions.finish_in_child()?;

    unistd::execvp(argv[0].as_c_str(), argv)
        .map_err(|e| Error::from(format!("{}: {}", command.program(), e.desc())))
}

fn to_c_strings(words: &[String]) -> Result<Vec<CString>> {
    words
        .iter()
        .map(|w| {
            CString::new(w.as_bytes())
                .map_err(|_| Error::syntax(format!("unexpected NUL byte in '{}'", w)))
        })
        .collect()
}

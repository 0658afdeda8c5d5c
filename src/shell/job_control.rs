use std::fmt;
use std::io::Write;

use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::core::job::{CompletionCause, Job, ProcessId};
use crate::errors::{ErrorKind, Result};

/// Default upper bound on simultaneously tracked background jobs.
pub const DEFAULT_JOB_CAPACITY: usize = 200;

/// Background processes the shell has launched and not yet reported.
pub struct JobTable {
    jobs: Vec<Job>,
    capacity: usize,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_JOB_CAPACITY)
    }
}

impl JobTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            jobs: Vec::new(),
            capacity,
        }
    }

    pub fn has_capacity(&self) -> bool {
        self.jobs.len() < self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn pids(&self) -> Vec<ProcessId> {
        self.jobs.iter().map(Job::pid).collect()
    }

    /// Starts tracking a freshly launched background process.
    pub fn register(&mut self, pid: ProcessId) -> Result<()> {
        if !self.has_capacity() {
            return Err(ErrorKind::JobLimitReached(self.capacity).into());
        }
        if self.jobs.iter().any(|job| job.pid() == pid) {
            warn!("background process {} is already tracked", pid);
            return Ok(());
        }

        debug!("tracking background process {}", pid);
        self.jobs.push(Job::new(pid));
        Ok(())
    }

    /// Checks every tracked process without blocking. Completed processes
    /// are removed and returned; running ones are left alone.
    pub fn sweep(&mut self) -> Vec<Job> {
        let mut completed = Vec::new();
        let mut still_running = Vec::with_capacity(self.jobs.len());

        for job in self.jobs.drain(..) {
            match wait::waitpid(Pid::from(job.pid()), Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => still_running.push(job),
                Ok(status) => match CompletionCause::from_wait_status(&status) {
                    Some((_, cause)) => {
                        debug!("background process {} finished: {}", job.pid(), cause);
                        completed.push(job.mark_completed(cause));
                    }
                    None => still_running.push(job),
                },
                Err(Errno::ECHILD) => {
                    warn!(
                        "background process {} was reaped elsewhere, dropping it",
                        job.pid()
                    );
                }
                Err(e) => {
                    warn!("waitpid({}) failed: {}", job.pid(), e);
                    still_running.push(job);
                }
            }
        }

        self.jobs = still_running;
        completed
    }

    /// Sweeps and announces each completed process exactly once.
    pub fn do_job_notification<W: Write>(&mut self, out: &mut W) -> Result<()> {
        for job in self.sweep() {
            writeln!(out, "{}", job)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Sends the terminate signal to every tracked process.
    pub fn terminate_all(&mut self) {
        for job in &self.jobs {
            debug!("terminating background process {}", job.pid());
            let temp_result = signal::kill(Pid::from(job.pid()), Signal::SIGTERM);
            log_if_err!(temp_result, "failed to terminate {}", job.pid());
        }
    }
}

impl fmt::Debug for JobTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} jobs\tcapacity: {}", self.jobs.len(), self.capacity)?;
        for job in &self.jobs {
            writeln!(f, "{:?}", job)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::process::Command;
    use std::thread;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::core::job::JobState;

    fn spawn(program: &str, args: &[&str]) -> ProcessId {
        let child = Command::new(program).args(args).spawn().unwrap();
        ProcessId::from(child.id())
    }

    fn sweep_until_completed(table: &mut JobTable, expected: usize) -> Vec<Job> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut completed = Vec::new();
        while completed.len() < expected && Instant::now() < deadline {
            completed.extend(table.sweep());
            thread::sleep(Duration::from_millis(10));
        }
        completed
    }

    #[test]
    fn empty_sweep_is_noop() {
        let mut table = JobTable::default();
        assert!(table.sweep().is_empty());
        assert!(table.pids().is_empty());
    }

    #[test]
    fn completed_job_is_reported_once() {
        let mut table = JobTable::default();
        let pid = spawn("sh", &["-c", "exit 3"]);
        table.register(pid).unwrap();

        let completed = sweep_until_completed(&mut table, 1);
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].pid(), pid);
        assert_eq!(completed[0].state(), JobState::Completed);
        assert_eq!(completed[0].completion_cause(), Some(CompletionCause::ExitCode(3)));

        assert!(table.sweep().is_empty());
        assert!(table.pids().is_empty());
    }

    #[test]
    fn running_jobs_stay_until_they_finish() {
        let mut table = JobTable::default();
        let sleeper = spawn("sleep", &["30"]);
        let quick = spawn("true", &[]);
        table.register(sleeper).unwrap();
        table.register(quick).unwrap();

        let completed = sweep_until_completed(&mut table, 1);
        assert_eq!(completed.iter().map(Job::pid).collect::<Vec<_>>(), vec![quick]);
        assert_eq!(table.pids(), vec![sleeper]);

        table.terminate_all();
        let completed = sweep_until_completed(&mut table, 1);
        assert_eq!(
            completed[0].completion_cause(),
            Some(CompletionCause::TerminatingSignal(Signal::SIGTERM as i32))
        );
        assert!(table.pids().is_empty());
    }

    #[test]
    fn register_respects_capacity() {
        let mut table = JobTable::with_capacity(1);
        table.register(ProcessId::from(1_000_001)).unwrap();
        assert!(!table.has_capacity());
        assert!(table.register(ProcessId::from(1_000_002)).is_err());
        assert_eq!(table.pids(), vec![ProcessId::from(1_000_001)]);
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let mut table = JobTable::default();
        table.register(ProcessId::from(1_000_003)).unwrap();
        table.register(ProcessId::from(1_000_003)).unwrap();
        assert_eq!(table.pids().len(), 1);
    }
}

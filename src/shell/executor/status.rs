use std::fmt;

use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;

/// What `waitpid` reported for one stage process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Exited(i32),
    Signaled(i32),
    Stopped(i32),
    Continued,
}

impl ProcessStatus {
    /// Classify a raw `WaitStatus`. `StillAlive` and the ptrace variants
    /// carry no state change we act on and map to `None`.
    pub fn from_wait(ws: &WaitStatus) -> Option<(Pid, ProcessStatus)> {
        match *ws {
            WaitStatus::Exited(pid, code) => Some((pid, ProcessStatus::Exited(code))),
            WaitStatus::Signaled(pid, sig, _core_dumped) => {
                Some((pid, ProcessStatus::Signaled(sig as i32)))
            }
            WaitStatus::Stopped(pid, sig) => Some((pid, ProcessStatus::Stopped(sig as i32))),
            WaitStatus::Continued(pid) => Some((pid, ProcessStatus::Continued)),
            _ => None,
        }
    }

    /// Whether the process is gone for good.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessStatus::Exited(_) | ProcessStatus::Signaled(_))
    }

    /// The shell-convention exit code: signal terminations map to 128+N.
    pub fn code(&self) -> i32 {
        match *self {
            ProcessStatus::Exited(code) => code,
            ProcessStatus::Signaled(sig) | ProcessStatus::Stopped(sig) => 128 + sig,
            ProcessStatus::Continued => 0,
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessStatus::Exited(code) => write!(f, "exited with status {}", code),
            ProcessStatus::Signaled(sig) => write!(f, "killed by signal {}", sig),
            ProcessStatus::Stopped(sig) => write!(f, "stopped by signal {}", sig),
            ProcessStatus::Continued => write!(f, "continued"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ProcessStatus::Exited(3).code(), 3);
        assert_eq!(ProcessStatus::Signaled(9).code(), 137);
        assert!(ProcessStatus::Exited(0).is_terminal());
        assert!(ProcessStatus::Signaled(15).is_terminal());
        assert!(!ProcessStatus::Stopped(19).is_terminal());
        assert!(!ProcessStatus::Continued.is_terminal());
    }
}

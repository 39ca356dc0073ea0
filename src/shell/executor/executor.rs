//! Materializes a parsed pipeline as OS processes connected by pipes.
//!
//! The per-run protocol: allocate every pipe up front, fork one child per
//! stage, wire each child's stdin/stdout from the neighbouring pipe ends,
//! close all pipe descriptors in every process that is done duplicating,
//! apply file redirections over the piped endpoints, then exec or run the
//! builtin. The parent reaps every child and reports the last stage's exit
//! code as the pipeline status.

use std::ffi::CString;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::os::fd::{AsRawFd, IntoRawFd, RawFd};
use std::process;

use log::{debug, warn};
use nix::sys::wait::{waitpid, WaitPidFlag};
use nix::unistd::{close, dup2, execv, fork, pipe, ForkResult, Pid};

use super::status::ProcessStatus;
use crate::shell::builtins::Registry;
use crate::shell::parser::ast::{Pipeline, RedirCmd};
use crate::shell::signals;

const STDIN: RawFd = 0;
const STDOUT: RawFd = 1;

#[derive(Debug)]
pub enum ExecError {
    /// A pipe or fork primitive failed. Fatal to this pipeline, not to the
    /// shell: the caller reports it and reads the next line.
    SpawnFailed(nix::Error),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::SpawnFailed(e) => write!(f, "failed to spawn pipeline: {}", e),
        }
    }
}

impl std::error::Error for ExecError {}

pub struct Executor {
    builtins: Registry,
}

impl Executor {
    pub fn new(builtins: Registry) -> Self {
        Self { builtins }
    }

    /// Run the pipeline to completion and return its exit status, i.e. the
    /// exit code of the last stage.
    pub fn execute(&self, pipeline: &Pipeline) -> Result<i32, ExecError> {
        let stages = &pipeline.stages;

        // A builtin that is the sole, unredirected stage runs in the shell
        // process itself, so mutations like `cd` remain visible afterwards.
        // In every other position a builtin runs in its forked stage and its
        // mutations die with that process.
        if let [stage] = stages.as_slice() {
            if !stage.is_redirected() && !stage.simple.name().contains('/') {
                if let Some(handler) = self.builtins.lookup(stage.simple.name()) {
                    debug!("running builtin `{}` in the shell process", stage.simple.name());
                    return Ok(handler.run(&stage.simple.words));
                }
            }
        }

        // Every pipe exists before the first fork, so each child inherits a
        // complete descriptor set and no stage can observe an unready pipe.
        let mut fds: Vec<(RawFd, RawFd)> = Vec::with_capacity(stages.len().saturating_sub(1));
        for _ in 1..stages.len() {
            match pipe() {
                Ok((read, write)) => fds.push((read.into_raw_fd(), write.into_raw_fd())),
                Err(e) => {
                    close_pipes(&fds);
                    return Err(ExecError::SpawnFailed(e));
                }
            }
        }

        let mut pids = Vec::with_capacity(stages.len());
        let mut spawn_err = None;
        for (i, stage) in stages.iter().enumerate() {
            match unsafe { fork() } {
                Ok(ForkResult::Child) => self.run_stage(stage, i, stages.len(), &fds),
                Ok(ForkResult::Parent { child }) => pids.push(child),
                Err(e) => {
                    // Stages already forked still run; reap them below.
                    spawn_err = Some(e);
                    break;
                }
            }
        }

        // The parent holds no endpoint. A write end left open here would
        // keep every downstream reader from ever seeing end-of-stream.
        close_pipes(&fds);

        let status = self.reap(&pids);
        match spawn_err {
            Some(e) => Err(ExecError::SpawnFailed(e)),
            None => Ok(status),
        }
    }

    /// Wait for every spawned stage. Non-terminal state changes (stopped,
    /// continued) are logged and waiting resumes until the process is gone.
    fn reap(&self, pids: &[Pid]) -> i32 {
        let mut last = 0;
        for (i, &pid) in pids.iter().enumerate() {
            loop {
                let flags = WaitPidFlag::WUNTRACED | WaitPidFlag::WCONTINUED;
                match waitpid(pid, Some(flags)) {
                    Ok(ws) => {
                        let Some((_, status)) = ProcessStatus::from_wait(&ws) else {
                            continue;
                        };
                        debug!("stage {} (pid {}): {}", i, pid, status);
                        if !matches!(status, ProcessStatus::Exited(0)) {
                            warn!("stage {} (pid {}): {}", i, pid, status);
                        }
                        if status.is_terminal() {
                            if i == pids.len() - 1 {
                                last = status.code();
                            }
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("waitpid({}) failed: {}", pid, e);
                        break;
                    }
                }
            }
        }
        last
    }

    /// Child-side setup and dispatch. Never returns: the process image is
    /// replaced by `execv` or the process exits with the stage's status.
    fn run_stage(&self, stage: &RedirCmd, index: usize, n_stages: usize, fds: &[(RawFd, RawFd)]) -> ! {
        signals::restore_default_signals();

        if index > 0 && dup2(fds[index - 1].0, STDIN).is_err() {
            process::exit(1);
        }
        if index < n_stages - 1 && dup2(fds[index].1, STDOUT).is_err() {
            process::exit(1);
        }
        // Both ends of every pipe, used or not. Leaving any open would hold
        // a reader's end-of-stream hostage.
        close_pipes(fds);

        // Explicit file redirections override the piped endpoints, per
        // stage. The `File` handles close on drop once duplicated.
        if let Some(path) = &stage.input {
            match File::open(path) {
                Ok(file) => {
                    if dup2(file.as_raw_fd(), STDIN).is_err() {
                        process::exit(1);
                    }
                }
                Err(e) => {
                    eprintln!("ush: {}: {}", path, e);
                    process::exit(1);
                }
            }
        }
        if let Some(path) = &stage.output {
            let opened = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path);
            match opened {
                Ok(file) => {
                    if dup2(file.as_raw_fd(), STDOUT).is_err() {
                        process::exit(1);
                    }
                }
                Err(e) => {
                    eprintln!("ush: {}: {}", path, e);
                    process::exit(1);
                }
            }
        }

        let name = stage.simple.name();
        if name.contains('/') {
            exec_external(&stage.simple.words);
        }
        if let Some(handler) = self.builtins.lookup(name) {
            process::exit(handler.run(&stage.simple.words));
        }
        eprintln!("ush: {}: command not found", name);
        process::exit(127);
    }
}

fn close_pipes(fds: &[(RawFd, RawFd)]) {
    for &(read, write) in fds {
        let _ = close(read);
        let _ = close(write);
    }
}

/// Replace the process image. Only returns control on failure, which the
/// child reports as its own exit status.
fn exec_external(words: &[String]) -> ! {
    let argv: Result<Vec<CString>, _> = words.iter().map(|w| CString::new(w.as_str())).collect();
    let argv = match argv {
        Ok(argv) => argv,
        Err(_) => {
            eprintln!("ush: argument contains a NUL byte");
            process::exit(1);
        }
    };
    let err = execv(&argv[0], &argv);
    eprintln!("ush: {}: {}", words[0], err.err().unwrap_or(nix::Error::ENOENT));
    process::exit(126);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shell::parser::{lexer::tokenize, Parser};
    use std::env;
    use std::fs;

    fn parse_line(line: &str) -> Pipeline {
        Parser::new(&tokenize(line).unwrap()).parse().unwrap()
    }

    fn executor() -> Executor {
        Executor::new(Registry::default())
    }

    #[test]
    fn test_external_command_with_output_redirection() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let line = format!("/bin/echo hello > {}", out.display());

        let status = executor().execute(&parse_line(&line)).unwrap();

        assert_eq!(status, 0);
        assert_eq!(fs::read_to_string(&out).unwrap(), "hello\n");
    }

    #[test]
    fn test_pipeline_into_builtin_wc() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("counts.txt");
        let line = format!("/bin/echo hi | wc > {}", out.display());

        let status = executor().execute(&parse_line(&line)).unwrap();

        assert_eq!(status, 0);
        // "hi\n" is one line, one word, three bytes.
        assert_eq!(fs::read_to_string(&out).unwrap(), "1 1 3\n");
    }

    #[test]
    fn test_input_redirection_feeds_first_stage() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let out = dir.path().join("out.txt");
        fs::write(&input, "one two\nthree\n").unwrap();
        let line = format!("wc < {} > {}", input.display(), out.display());

        let status = executor().execute(&parse_line(&line)).unwrap();

        assert_eq!(status, 0);
        assert_eq!(fs::read_to_string(&out).unwrap(), "2 3 14\n");
    }

    #[test]
    fn test_command_not_found_is_stage_local() {
        let status = executor()
            .execute(&parse_line("definitely-not-a-command-zzz"))
            .unwrap();
        assert_eq!(status, 127);
    }

    #[test]
    fn test_missing_input_file_fails_stage_only() {
        let status = executor()
            .execute(&parse_line("wc < /definitely/not/a/file"))
            .unwrap();
        assert_eq!(status, 1);
    }

    #[test]
    fn test_pipeline_status_is_last_stage() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        // First stage fails to resolve; the pipeline status still comes
        // from the final stage.
        let line = format!("no-such-cmd-zzz | wc > {}", out.display());
        let status = executor().execute(&parse_line(&line)).unwrap();
        assert_eq!(status, 0);
    }

    #[test]
    fn test_cd_persists_only_when_sole_unredirected_stage() {
        let original = env::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().canonicalize().unwrap();
        let exec = executor();

        let status = exec
            .execute(&parse_line(&format!("cd {}", target.display())))
            .unwrap();
        assert_eq!(status, 0);
        assert_eq!(env::current_dir().unwrap(), target);

        // Piped, the builtin runs in a forked stage; the shell's own
        // directory must not move.
        let line = format!("cd {} | wc", original.display());
        let status = exec.execute(&parse_line(&line)).unwrap();
        assert_eq!(status, 0);
        assert_eq!(env::current_dir().unwrap(), target);

        env::set_current_dir(&original).unwrap();
    }
}

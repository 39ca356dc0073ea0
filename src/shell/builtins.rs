//! Builtin commands and the registry the executor resolves them through.
//!
//! A builtin receives the full argument list (`args[0]` is its own name) and
//! returns an exit status. Whether it runs in the shell process or in a
//! forked stage is the executor's decision, not the builtin's.

use std::env;
use std::fs::{self, File};
use std::io::{self, Read};

use log::debug;

pub trait Builtin {
    fn name(&self) -> &'static str;
    fn run(&self, args: &[String]) -> i32;
}

pub struct Registry {
    handlers: Vec<Box<dyn Builtin>>,
}

impl Registry {
    pub fn new(handlers: Vec<Box<dyn Builtin>>) -> Self {
        Self { handlers }
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn Builtin> {
        self.handlers.iter().find(|h| h.name() == name).map(|h| h.as_ref())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(vec![
            Box::new(Ls),
            Box::new(Cd),
            Box::new(Pwd),
            Box::new(Wc),
        ])
    }
}

/// List the entries of the current directory, one per line.
struct Ls;

impl Builtin for Ls {
    fn name(&self) -> &'static str {
        "ls"
    }

    fn run(&self, _args: &[String]) -> i32 {
        let entries = match fs::read_dir(".") {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("ush: ls: {}", e);
                return 1;
            }
        };
        for entry in entries.flatten() {
            println!("{}", entry.file_name().to_string_lossy());
        }
        0
    }
}

/// Change the working directory of the calling process. With no argument,
/// go home. Mutates process-wide state, which is why the executor runs a
/// lone unredirected `cd` in the shell itself.
struct Cd;

impl Builtin for Cd {
    fn name(&self) -> &'static str {
        "cd"
    }

    fn run(&self, args: &[String]) -> i32 {
        let target = args.get(1).map(|s| s.as_str()).unwrap_or("~");
        let target = shellexpand::tilde(target);
        debug!("cd to {}", target);
        match env::set_current_dir(target.as_ref()) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("ush: cd: {}: {}", target, e);
                1
            }
        }
    }
}

/// Print the current working directory.
struct Pwd;

impl Builtin for Pwd {
    fn name(&self) -> &'static str {
        "pwd"
    }

    fn run(&self, _args: &[String]) -> i32 {
        match env::current_dir() {
            Ok(dir) => {
                println!("{}", dir.display());
                0
            }
            Err(e) => {
                eprintln!("ush: pwd: {}", e);
                1
            }
        }
    }
}

/// Count lines, words and bytes of the named file, or of stdin when no file
/// is given. Prints `lines words bytes`.
struct Wc;

impl Wc {
    fn count(mut source: impl Read) -> io::Result<(usize, usize, usize)> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        let text = String::from_utf8_lossy(&bytes);
        let lines = text.matches('\n').count();
        let words = text.split_whitespace().count();
        Ok((lines, words, bytes.len()))
    }
}

impl Builtin for Wc {
    fn name(&self) -> &'static str {
        "wc"
    }

    fn run(&self, args: &[String]) -> i32 {
        let counts = match args.get(1) {
            Some(path) => File::open(path).and_then(Self::count),
            None => Self::count(io::stdin().lock()),
        };
        match counts {
            Ok((lines, words, bytes)) => {
                println!("{} {} {}", lines, words, bytes);
                0
            }
            Err(e) => {
                eprintln!("ush: wc: {}", e);
                1
            }
        }
    }
}

use nix::sys::signal::{signal, SigHandler, Signal};

/// The interactive shell must survive the keyboard signals meant for the
/// commands it runs.
pub fn ignore_interactive_signals() {
    // Safety: installing SIG_IGN for these signals is async-signal-safe and
    // the handlers carry no Rust state.
    unsafe {
        let _ = signal(Signal::SIGINT, SigHandler::SigIgn);
        let _ = signal(Signal::SIGQUIT, SigHandler::SigIgn);
        let _ = signal(Signal::SIGTSTP, SigHandler::SigIgn);
    }
}

/// Forked stages inherit the shell's ignored dispositions; reset them so a
/// stage can be interrupted or stopped like any foreground process.
pub fn restore_default_signals() {
    // Safety: same as above, with SIG_DFL.
    unsafe {
        let _ = signal(Signal::SIGINT, SigHandler::SigDfl);
        let _ = signal(Signal::SIGQUIT, SigHandler::SigDfl);
        let _ = signal(Signal::SIGTSTP, SigHandler::SigDfl);
    }
}

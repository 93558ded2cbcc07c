//! Resolved command line and launch options

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;

/// A fully resolved command line, ready to be launched.
///
/// Standard streams and environment are always inherited from the
/// supervisor; there is no way to redirect them here. Program and arguments
/// are kept as raw OS strings and need not be valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

impl CommandLine {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Build from an argv vector; `None` if it is empty
    pub fn from_argv<I, S>(argv: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut iter = argv.into_iter().map(Into::into);
        let program = iter.next()?;
        Some(Self::new(program).args(iter))
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn cwd(&self) -> Option<&PathBuf> {
        self.cwd.as_ref()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Options for launching a command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Put the child in its own process group and signal the whole group.
    /// The child loses foreground access to a controlling terminal.
    pub process_group: bool,
}

/// Operator signals the supervisor relays to its child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForwardedSignal {
    Interrupt,
    Terminate,
    Hangup,
    Quit,
}

impl ForwardedSignal {
    pub const ALL: [ForwardedSignal; 4] = [
        ForwardedSignal::Interrupt,
        ForwardedSignal::Terminate,
        ForwardedSignal::Hangup,
        ForwardedSignal::Quit,
    ];

    /// POSIX signal number
    pub fn number(self) -> i32 {
        match self {
            ForwardedSignal::Hangup => 1,
            ForwardedSignal::Interrupt => 2,
            ForwardedSignal::Quit => 3,
            ForwardedSignal::Terminate => 15,
        }
    }

    /// Sent by the terminal driver to the whole foreground process group
    pub fn is_terminal_generated(self) -> bool {
        matches!(self, ForwardedSignal::Interrupt | ForwardedSignal::Quit)
    }

    pub fn name(self) -> &'static str {
        match self {
            ForwardedSignal::Hangup => "SIGHUP",
            ForwardedSignal::Interrupt => "SIGINT",
            ForwardedSignal::Quit => "SIGQUIT",
            ForwardedSignal::Terminate => "SIGTERM",
        }
    }
}

impl fmt::Display for ForwardedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

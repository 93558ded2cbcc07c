//! Command-line arguments

use clap::Parser;
use dockhand_util::parse_duration;
use std::ffi::OsString;
use std::time::Duration;

/// Long flags that may also be spelled with a single dash, Go style
const LONG_FLAGS: &[(&str, bool)] = &[
    ("cmd-timeout", true),
    ("process-group", false),
    ("no-forward-signals", false),
    ("log-level", true),
];

/// Short flags that consume the next argument
const SHORT_FLAGS_WITH_VALUE: &[&str] = &["-l"];

/// dockhand - Run a command as a container entrypoint
#[derive(Parser, Debug)]
#[command(name = "dockhand", version)]
#[command(
    about = "Run a command with pass-through stdio, killing it after an optional timeout",
    long_about = None
)]
pub struct Args {
    /// Kill the command after this long, e.g. 1s, 500ms, 1m30s (0 disables)
    #[arg(
        long = "cmd-timeout",
        env = "DOCKHAND_CMD_TIMEOUT",
        default_value = "0",
        value_name = "DURATION",
        value_parser = parse_duration
    )]
    pub cmd_timeout: Duration,

    /// Run the command in its own process group and signal the whole group
    #[arg(long)]
    pub process_group: bool,

    /// Do not relay SIGINT, SIGTERM, SIGHUP and SIGQUIT to the command.
    /// On a terminal, SIGINT and SIGQUIT are only relayed with --process-group
    #[arg(long)]
    pub no_forward_signals: bool,

    /// Log level (RUST_LOG takes precedence)
    #[arg(short, long, default_value = "warn")]
    pub log_level: String,

    /// Command to run, followed by its arguments
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<OsString>,
}

impl Args {
    /// Parse from the process arguments, accepting Go-style single-dash long flags
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_go_flags(std::env::args_os()))
    }
}

/// Rewrite `-cmd-timeout 1s` to `--cmd-timeout 1s`.
///
/// Only the supervisor's own flags are touched: rewriting stops at `--` or
/// at the first positional argument, which starts the child command.
pub fn normalize_go_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut iter = args.into_iter();
    let mut out: Vec<OsString> = iter.next().into_iter().collect();
    let mut expect_value = false;

    while let Some(arg) = iter.next() {
        if expect_value {
            out.push(arg);
            expect_value = false;
            continue;
        }

        let Some(text) = arg.to_str() else {
            out.push(arg);
            break;
        };

        if text == "--" || !text.starts_with('-') || text == "-" {
            out.push(arg);
            break;
        }

        let flag = text.strip_prefix("--").unwrap_or(&text[1..]);
        let (name, inline_value) = match flag.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (flag, None),
        };

        match LONG_FLAGS.iter().find(|(long, _)| *long == name) {
            Some((_, takes_value)) => {
                out.push(format!("--{}", flag).into());
                expect_value = *takes_value && inline_value.is_none();
            }
            None => {
                expect_value = SHORT_FLAGS_WITH_VALUE.contains(&text);
                out.push(arg);
            }
        }
    }

    out.extend(iter);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(args: &[&str]) -> Vec<String> {
        normalize_go_flags(args.iter().map(OsString::from))
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect()
    }

    #[test]
    fn single_dash_long_flag_is_rewritten() {
        assert_eq!(
            normalize(&["dockhand", "-cmd-timeout", "1s", "sleep", "10"]),
            ["dockhand", "--cmd-timeout", "1s", "sleep", "10"]
        );
        assert_eq!(
            normalize(&["dockhand", "-cmd-timeout=1s", "sleep", "10"]),
            ["dockhand", "--cmd-timeout=1s", "sleep", "10"]
        );
    }

    #[test]
    fn child_arguments_untouched() {
        assert_eq!(
            normalize(&["dockhand", "echo", "-cmd-timeout", "-process-group"]),
            ["dockhand", "echo", "-cmd-timeout", "-process-group"]
        );
        assert_eq!(
            normalize(&["dockhand", "--", "-log-level", "x"]),
            ["dockhand", "--", "-log-level", "x"]
        );
    }

    #[test]
    fn flag_values_are_not_mistaken_for_commands() {
        assert_eq!(
            normalize(&["dockhand", "-l", "debug", "-process-group", "true"]),
            ["dockhand", "-l", "debug", "--process-group", "true"]
        );
    }

    #[test]
    fn parse_timeout_and_command() {
        let args = Args::parse_from(normalize_go_flags(
            ["dockhand", "-cmd-timeout", "500ms", "sh", "-c", "exit 3"].map(OsString::from),
        ));
        assert_eq!(args.cmd_timeout, Duration::from_millis(500));
        assert_eq!(args.command, ["sh", "-c", "exit 3"]);
        assert!(!args.process_group);
    }

    #[test]
    fn timeout_defaults_to_disabled() {
        let args = Args::try_parse_from(["dockhand", "echo", "test"]).unwrap();
        assert_eq!(args.cmd_timeout, Duration::ZERO);
        assert_eq!(args.log_level, "warn");
    }

    #[test]
    fn invalid_timeout_rejected() {
        assert!(Args::try_parse_from(["dockhand", "--cmd-timeout", "soon", "true"]).is_err());
        assert!(Args::try_parse_from(["dockhand", "--cmd-timeout", "-1s", "true"]).is_err());
    }

    #[test]
    fn non_utf8_command_arguments_accepted() {
        use std::os::unix::ffi::OsStringExt;

        let raw = OsString::from_vec(b"caf\xe9".to_vec());
        let argv = [OsString::from("dockhand"), OsString::from("echo"), raw.clone()];
        let args = Args::try_parse_from(normalize_go_flags(argv)).unwrap();
        assert_eq!(args.command, [OsString::from("echo"), raw]);
    }

    #[test]
    fn command_required() {
        assert!(Args::try_parse_from(["dockhand", "--cmd-timeout", "1s"]).is_err());
    }
}

//! Command-line argument parsing.
//!
//! Usage:
//!   sigil [-p<profile>] [-c<cmd>] [-nd] [<script> [args…]]
//!
//! Everything after the script path belongs to the script, flags included.

use std::path::PathBuf;

/// One-line usage summary.
pub const USAGE: &str = "Usage: sigil [-p<profile>] [-c<cmd>] [-nd] [<script> [args...]]";

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Profile override (`-p<name>`).
    pub profile: Option<String>,
    /// Command line to run instead of a script or the REPL (`-c<cmd>`).
    pub command: Option<String>,
    /// Skip loading the profile and never write it back (`-n`).
    pub no_profile: bool,
    /// Debug logging (`-d`).
    pub debug: bool,
    /// Script file to run.
    pub script: Option<PathBuf>,
    /// Arguments passed to the script.
    pub script_args: Vec<String>,
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing.
        if arg == "--" {
            i += 1;
            break;
        }

        // First positional: the script; the rest is its argument list.
        if !arg.starts_with('-') || arg == "-" {
            break;
        }

        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'd' => args.debug = true,
                'n' => args.no_profile = true,

                // -c<cmd> / -c <cmd>
                'c' => {
                    args.command = Some(flag_value(&chars, &mut j, argv, &mut i, 'c')?);
                }

                // -p<name> / -p <name>
                'p' => {
                    args.profile = Some(flag_value(&chars, &mut j, argv, &mut i, 'p')?);
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    if let Some((script, rest)) = argv.get(i..).and_then(|r| r.split_first()) {
        args.script = Some(PathBuf::from(script));
        args.script_args = rest.to_vec();
    }
    if args.command.is_some() && args.script.is_some() {
        return Err("-c cannot be combined with a script".to_owned());
    }
    Ok(args)
}

/// Value of a flag: the rest of this argument, else the next one.
fn flag_value(chars: &[char], j: &mut usize, argv: &[String], i: &mut usize, flag: char) -> Result<String, String> {
    if *j + 1 < chars.len() {
        let s: String = chars[*j + 1..].iter().collect();
        *j = chars.len();
        Ok(s)
    } else if *i + 1 < argv.len() {
        *i += 1;
        Ok(argv[*i].clone())
    } else {
        Err(format!("-{flag} requires an argument"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|&s| s.to_owned()).collect()
    }

    #[test]
    fn empty_args() {
        let a = parse_argv(&argv(&[])).unwrap();
        assert!(!a.no_profile);
        assert!(a.script.is_none());
        assert!(a.command.is_none());
    }

    #[test]
    fn script_and_arguments() {
        let a = parse_argv(&argv(&["build.sig", "fast", "-n"])).unwrap();
        assert_eq!(a.script, Some(PathBuf::from("build.sig")));
        assert_eq!(a.script_args, vec!["fast", "-n"]);
        assert!(!a.no_profile);
    }

    #[test]
    fn combined_bool_flags() {
        let a = parse_argv(&argv(&["-nd"])).unwrap();
        assert!(a.no_profile && a.debug);
    }

    #[test]
    fn profile_embedded_and_separate() {
        let a = parse_argv(&argv(&["-pwork"])).unwrap();
        assert_eq!(a.profile.as_deref(), Some("work"));
        let a = parse_argv(&argv(&["-p", "home", "x.sig"])).unwrap();
        assert_eq!(a.profile.as_deref(), Some("home"));
        assert_eq!(a.script, Some(PathBuf::from("x.sig")));
    }

    #[test]
    fn command_embedded() {
        let a = parse_argv(&argv(&["-csay hello"])).unwrap();
        assert_eq!(a.command.as_deref(), Some("say hello"));
    }

    #[test]
    fn double_dash_script() {
        let a = parse_argv(&argv(&["-n", "--", "-odd.sig"])).unwrap();
        assert_eq!(a.script, Some(PathBuf::from("-odd.sig")));
    }

    #[test]
    fn missing_flag_value() {
        assert!(parse_argv(&argv(&["-c"])).is_err());
    }

    #[test]
    fn command_with_script_rejected() {
        assert!(parse_argv(&argv(&["-c", "say x", "s.sig"])).is_err());
    }

    #[test]
    fn unknown_flag() {
        assert!(parse_argv(&argv(&["-z"])).is_err());
    }
}

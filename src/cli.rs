//! Command-line interface for crustify.
//!
//! Defines CLI arguments using clap builder API

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

/// CLI arguments parsed from command line
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Files or directories to analyze
    pub inputs: Vec<PathBuf>,

    /// Language override (otherwise guessed from the extension)
    pub lang: Option<String>,

    /// Config file path
    pub config: Option<PathBuf>,

    /// Braced-init alignment span in lines
    pub span: Option<usize>,

    /// Braced-init alignment threshold in columns
    pub thresh: Option<usize>,

    /// Columns per tab stop in the input
    pub tab_size: Option<usize>,

    /// Recursive directory processing
    pub recursive: bool,

    /// Exclude patterns for files/directories (glob patterns)
    pub exclude: Vec<String>,

    /// Write detected settings here instead of stdout
    pub output: Option<PathBuf>,

    /// Print the classified token stream instead of settings
    pub dump_tokens: bool,

    /// Enable debug output
    pub debug: bool,

    /// Silent mode (no output)
    pub silent: bool,
}

/// Build the clap Command for parsing CLI arguments
#[must_use]
pub fn build_cli() -> Command {
    Command::new("crustify")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Detects spacing conventions in C-family source code")
        .arg(
            Arg::new("inputs")
                .help("Files or directories to analyze")
                .value_name("FILE")
                .num_args(1..)
                .required(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("lang")
                .short('l')
                .long("lang")
                .help("Language: c, cpp, d, cs, java, oc, oc+, vala, pawn, ecma [default: from extension]")
                .value_name("LANG"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to configuration file (overrides auto-discovery)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("span")
                .long("span")
                .help("Align braced initializer lists within this many lines [default: 0 = off]")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("thresh")
                .long("thresh")
                .help("Maximum column distance for braced-init alignment [default: 0 = unlimited]")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("tab-size")
                .short('t')
                .long("tab-size")
                .help("Columns per tab stop in the input [default: 8]")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("recursive")
                .short('r')
                .long("recursive")
                .help("Recursively analyze directories")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("exclude")
                .short('e')
                .long("exclude")
                .help("Exclude files/directories matching pattern (glob syntax, can be repeated)")
                .value_name("PATTERN")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Write detected settings to this file instead of stdout")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("dump-tokens")
                .long("dump-tokens")
                .help("Print the classified token stream instead of settings")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .short('D')
                .long("debug")
                .help("Enable debug output (stage summaries and votes)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('S')
                .long("silent")
                .help("Silent mode (no output, errors only through exit status)")
                .action(ArgAction::SetTrue),
        )
}

/// Parse CLI arguments from command line
#[must_use]
pub fn parse_args() -> CliArgs {
    args_from_matches(&build_cli().get_matches())
}

/// Parse CLI arguments from an iterator (for testing)
#[must_use]
pub fn parse_args_from<I, T>(args: I) -> CliArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    args_from_matches(&build_cli().get_matches_from(args))
}

/// Convert clap `ArgMatches` to `CliArgs`
fn args_from_matches(matches: &clap::ArgMatches) -> CliArgs {
    CliArgs {
        inputs: matches
            .get_many::<PathBuf>("inputs")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        lang: matches.get_one::<String>("lang").cloned(),
        config: matches.get_one::<PathBuf>("config").cloned(),
        span: matches.get_one::<usize>("span").copied(),
        thresh: matches.get_one::<usize>("thresh").copied(),
        tab_size: matches.get_one::<usize>("tab-size").copied(),
        recursive: matches.get_flag("recursive"),
        exclude: matches
            .get_many::<String>("exclude")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        output: matches.get_one::<PathBuf>("output").cloned(),
        dump_tokens: matches.get_flag("dump-tokens"),
        debug: matches.get_flag("debug"),
        silent: matches.get_flag("silent"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_builds() {
        let cmd = build_cli();
        assert_eq!(cmd.get_name(), "crustify");
        cmd.debug_assert();
    }

    #[test]
    fn test_cli_requires_input() {
        assert!(build_cli().try_get_matches_from(vec!["crustify"]).is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let args = parse_args_from(vec!["crustify", "a.c"]);
        assert_eq!(args.inputs, vec![PathBuf::from("a.c")]);
        assert!(args.lang.is_none());
        assert!(args.span.is_none());
        assert!(!args.recursive);
        assert!(!args.dump_tokens);
        assert!(args.exclude.is_empty());
    }

    #[test]
    fn test_alignment_options() {
        let args = parse_args_from(vec!["crustify", "--span", "3", "--thresh", "12", "a.cpp"]);
        assert_eq!(args.span, Some(3));
        assert_eq!(args.thresh, Some(12));
    }

    #[test]
    fn test_lang_and_output() {
        let args = parse_args_from(vec![
            "crustify", "-l", "pawn", "-o", "out.toml", "x.inc", "y.inc",
        ]);
        assert_eq!(args.lang.as_deref(), Some("pawn"));
        assert_eq!(args.output, Some(PathBuf::from("out.toml")));
        assert_eq!(args.inputs.len(), 2);
    }

    #[test]
    fn test_exclude_repeated() {
        let args = parse_args_from(vec![
            "crustify", "-r", "-e", "*/build/*", "--exclude", "*.h", "src",
        ]);
        assert!(args.recursive);
        assert_eq!(args.exclude, vec!["*/build/*".to_string(), "*.h".to_string()]);
    }

    #[test]
    fn test_flags() {
        let args = parse_args_from(vec!["crustify", "--dump-tokens", "-D", "-S", "a.c"]);
        assert!(args.dump_tokens);
        assert!(args.debug);
        assert!(args.silent);
    }

    #[test]
    fn test_invalid_span() {
        let result = build_cli().try_get_matches_from(vec!["crustify", "--span", "wide", "a.c"]);
        assert!(result.is_err());
    }
}

//! Inline directive parsing for `crustify:` comments
//!
//! Supports in-file overrides via special comments:
//! `// crustify: sp_arith=force sp_after_comma=add --span 2`
//!
//! `name=value` pairs set options explicitly, so detection leaves them alone.

use std::sync::LazyLock;

use log::warn;
use regex::Regex;

use crate::detect::{OptionId, Settings, SpaceOption};
use crate::process::AnalysisOptions;

/// Pattern to match crustify directives in line or block comments
static CRUSTIFY_DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?://+|/\*+|\*)\s*crustify:\s*(.*?)\s*(?:\*+/)?\s*$").unwrap()
});

/// Parsed directive settings
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirectiveOverrides {
    pub options: Vec<(OptionId, SpaceOption)>,
    pub span: Option<usize>,
    pub thresh: Option<usize>,
    pub tab_size: Option<usize>,
}

impl DirectiveOverrides {
    /// Check if any overrides are set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
            && self.span.is_none()
            && self.thresh.is_none()
            && self.tab_size.is_none()
    }

    /// Apply to the settings table and the analysis knobs of one file
    pub fn apply(&self, settings: &mut Settings, analysis: &mut AnalysisOptions) {
        for &(id, value) in &self.options {
            settings.set_explicit(id, value);
        }
        if let Some(v) = self.span {
            analysis.span = v;
        }
        if let Some(v) = self.thresh {
            analysis.thresh = v;
        }
        if let Some(v) = self.tab_size {
            analysis.tab_size = v;
        }
    }
}

/// Check if a line contains a crustify directive
#[must_use]
pub fn is_directive_line(line: &str) -> bool {
    CRUSTIFY_DIRECTIVE_RE.is_match(line)
}

/// Parse a crustify directive line
///
/// # Returns
/// * `Some(DirectiveOverrides)` if the line is a directive with at least one setting
/// * `None` otherwise
#[must_use]
pub fn parse_directive(line: &str) -> Option<DirectiveOverrides> {
    let caps = CRUSTIFY_DIRECTIVE_RE.captures(line)?;
    let args_str = caps.get(1)?.as_str();
    parse_directive_args(args_str)
}

fn parse_directive_args(args_str: &str) -> Option<DirectiveOverrides> {
    let mut overrides = DirectiveOverrides::default();
    let tokens: Vec<&str> = args_str.split_whitespace().collect();
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i];
        match token {
            "--span" | "--thresh" | "--tab-size" => {
                i += 1;
                let value = tokens.get(i).and_then(|v| v.parse().ok());
                match token {
                    "--span" => overrides.span = value,
                    "--thresh" => overrides.thresh = value,
                    _ => overrides.tab_size = value,
                }
            }
            _ => {
                if let Some((name, value)) = token.split_once('=') {
                    match (name.parse::<OptionId>(), value.parse::<SpaceOption>()) {
                        (Ok(id), Ok(value)) => overrides.options.push((id, value)),
                        (Err(e), _) | (_, Err(e)) => warn!("crustify directive: {e}"),
                    }
                }
            }
        }
        i += 1;
    }

    if overrides.is_empty() {
        None
    } else {
        Some(overrides)
    }
}

/// Scan input for crustify directives and return the first found
///
/// Only the first directive is used (subsequent ones are ignored).
pub fn find_directive<R: std::io::BufRead>(input: &mut R) -> Option<DirectiveOverrides> {
    let mut buffer = String::new();

    while input.read_line(&mut buffer).ok()? > 0 {
        if is_directive_line(&buffer) {
            return parse_directive(&buffer);
        }
        buffer.clear();
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_directive_line() {
        assert!(is_directive_line("// crustify: sp_arith=force"));
        assert!(is_directive_line("  /* CRUSTIFY: --span 2 */"));
        assert!(is_directive_line(" * crustify: sp_bool=add"));
        assert!(!is_directive_line("// this is a regular comment"));
        assert!(!is_directive_line("x = 1;"));
    }

    #[test]
    fn test_parse_directive_options() {
        let overrides = parse_directive("// crustify: sp_arith=force sp_after_comma=Add").unwrap();
        assert_eq!(
            overrides.options,
            vec![
                (OptionId::SpArith, SpaceOption::Force),
                (OptionId::SpAfterComma, SpaceOption::Add)
            ]
        );
    }

    #[test]
    fn test_parse_directive_block_comment() {
        let overrides = parse_directive("/* crustify: --span 3 --thresh 12 */").unwrap();
        assert_eq!(overrides.span, Some(3));
        assert_eq!(overrides.thresh, Some(12));
        assert!(overrides.options.is_empty());
    }

    #[test]
    fn test_parse_directive_skips_invalid() {
        let overrides = parse_directive("// crustify: sp_nope=add sp_bool=sometimes --tab-size 4").unwrap();
        assert!(overrides.options.is_empty());
        assert_eq!(overrides.tab_size, Some(4));
    }

    #[test]
    fn test_parse_invalid_directive() {
        assert!(parse_directive("// crustify:").is_none());
        assert!(parse_directive("// crustify: hello").is_none());
    }

    #[test]
    fn test_apply_marks_explicit() {
        let overrides = parse_directive("// crustify: sp_compare=remove --span 2").unwrap();
        let mut settings = Settings::new();
        let mut analysis = AnalysisOptions::default();
        overrides.apply(&mut settings, &mut analysis);
        assert!(settings.is_explicit(OptionId::SpCompare));
        assert_eq!(settings.get(OptionId::SpCompare), SpaceOption::Remove);
        assert_eq!(analysis.span, 2);
    }

    #[test]
    fn test_find_directive() {
        let src = "#include <x.h>\n// crustify: sp_bool=force\nint a;\n";
        let overrides = find_directive(&mut src.as_bytes()).unwrap();
        assert_eq!(overrides.options, vec![(OptionId::SpBool, SpaceOption::Force)]);
    }
}

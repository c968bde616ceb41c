//! Analysis pipeline
//!
//! Runs the stages over one buffer in a fixed order:
//! tokenize, cleanup, levels, Pawn prescan, retyping, colon roles, then
//! alignment and/or option detection.

use std::io::{Read, Write};

use log::debug;

use crate::chunk::{ChunkFlags, ChunkList};
use crate::config::Config;
use crate::detect::{detect_spacing, Settings};
use crate::format::{align_braced_init_lists, combine_labels, fix_symbols};
use crate::lang::LangFlags;
use crate::parser::{tokenize, tokenize_cleanup};
use crate::scope::{brace_cleanup, pawn_prescan};
use crate::Result;

/// Knobs that affect analysis, as opposed to the options being detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Columns per tab stop when computing chunk columns
    pub tab_size: usize,
    /// Line span of braced-init alignment groups; 0 disables alignment
    pub span: usize,
    /// Column threshold of alignment groups; 0 means unlimited
    pub thresh: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            tab_size: 8,
            span: 0,
            thresh: 0,
        }
    }
}

impl From<&Config> for AnalysisOptions {
    fn from(config: &Config) -> Self {
        Self {
            tab_size: config.input_tab_size,
            span: config.align.braced_init_list_span,
            thresh: config.align.braced_init_list_thresh,
        }
    }
}

/// Tokenize and classify `data`, handing the store to the caller
#[must_use]
pub fn analyze(data: &[u8], lang: LangFlags, options: &AnalysisOptions) -> ChunkList {
    let mut list = tokenize(data, lang, options.tab_size);
    tokenize_cleanup(&mut list, lang);
    brace_cleanup(&mut list, lang);
    if lang.intersects(LangFlags::PAWN) {
        pawn_prescan(&mut list);
    }
    fix_symbols(&mut list, lang);
    combine_labels(&mut list);
    align_braced_init_lists(&mut list, options.span, options.thresh);
    debug!("analyze: {} chunk(s) for {lang}", list.len());
    list
}

/// Detect spacing options from `data` into `settings`
///
/// Explicit entries in `settings` are left alone. The token store is
/// released before returning.
pub fn detect_options(
    data: &[u8],
    lang: LangFlags,
    settings: &mut Settings,
    options: &AnalysisOptions,
) {
    let mut list = analyze(data, lang, options);
    detect_spacing(&list, settings);
    list.clear();
}

/// Read a whole source and detect its options
pub fn detect_reader<R: Read>(
    mut input: R,
    lang: LangFlags,
    settings: &mut Settings,
    options: &AnalysisOptions,
) -> Result<()> {
    let mut buffer = Vec::new();
    input.read_to_end(&mut buffer)?;
    detect_options(&buffer, lang, settings, options);
    Ok(())
}

/// Write one line per chunk: position, level, kind, parent, flags and text
pub fn dump_tokens<W: Write>(list: &ChunkList, output: &mut W) -> Result<()> {
    for id in list.iter() {
        let chunk = &list[id];
        let text = if chunk.is_newline() {
            format!("<{} nl>", chunk.nl_count)
        } else if chunk.is_virtual() {
            "<virtual>".to_string()
        } else {
            chunk.text.escape_debug().to_string()
        };
        let aligned = if chunk.has_flag(ChunkFlags::ALIGNED) {
            " aligned"
        } else {
            ""
        };
        writeln!(
            output,
            "{:>4}:{:<3} col {:<3} lvl {}/{} pp {} {:<14} {:<12} {:#06x}{aligned} {text}",
            chunk.orig_line,
            chunk.orig_col,
            chunk.column,
            chunk.level,
            chunk.brace_level,
            chunk.pp_level,
            chunk.kind.to_string(),
            chunk.parent_kind.to_string(),
            chunk.flags.bits(),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::chunk::TokenKind;
    use crate::detect::{OptionId, SpaceOption};

    #[test]
    fn test_analyze_runs_every_stage() {
        let list = analyze(
            b"int main(void) {\n    x = a ? b : c;\n}\n",
            LangFlags::C,
            &AnalysisOptions::default(),
        );
        let kinds = list.kinds();
        assert!(kinds.contains(&TokenKind::FuncDef));
        assert!(kinds.contains(&TokenKind::CondColon));
        assert!(!kinds.contains(&TokenKind::Colon));
    }

    #[test]
    fn test_pawn_prescan_only_for_pawn() {
        let src = b"main()\n{\n}\n";
        let pawn = analyze(src, LangFlags::PAWN, &AnalysisOptions::default());
        assert!(pawn.kinds().contains(&TokenKind::FuncDef));
        let c = analyze(src, LangFlags::C, &AnalysisOptions::default());
        // without a return type C still sees a definition at file scope
        assert!(c.kinds().contains(&TokenKind::FuncDef));
    }

    #[test]
    fn test_detect_options_writes_settings() {
        let mut settings = Settings::new();
        detect_options(
            b"x = a + b;\ny = c + d;\n",
            LangFlags::C,
            &mut settings,
            &AnalysisOptions::default(),
        );
        assert_eq!(settings.get(OptionId::SpArith), SpaceOption::Force);
        assert_eq!(settings.get(OptionId::SpBeforeSemi), SpaceOption::Remove);
    }

    #[test]
    fn test_detect_reader() {
        let mut settings = Settings::new();
        detect_reader(
            Cursor::new("f(a,b);\n"),
            LangFlags::C,
            &mut settings,
            &AnalysisOptions::default(),
        )
        .unwrap();
        assert_eq!(settings.get(OptionId::SpAfterComma), SpaceOption::Remove);
    }

    #[test]
    fn test_alignment_enabled_by_span() {
        let options = AnalysisOptions {
            span: 1,
            ..Default::default()
        };
        let list = analyze(b"Foo alpha{1};\nFoo b{2};\n", LangFlags::CPP, &options);
        let aligned = list
            .iter()
            .filter(|&id| list[id].has_flag(ChunkFlags::ALIGNED))
            .count();
        assert_eq!(aligned, 2);
    }

    #[test]
    fn test_dump_tokens() {
        let list = analyze(b"if (a)\n    b;\n", LangFlags::C, &AnalysisOptions::default());
        let mut out = Vec::new();
        dump_tokens(&list, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("SPAREN_OPEN"));
        assert!(text.contains("VBRACE_OPEN"));
        assert!(text.contains("<virtual>"));
        assert!(text.contains("<1 nl>"));
    }
}

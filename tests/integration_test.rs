//! Integration tests for crustify
//!
//! These tests verify that the components work together correctly

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::io::{BufReader, Cursor, Write};

use crustify::detect::collect_votes;
use crustify::process::dump_tokens;
use crustify::{
    analyze, detect_options, find_directive, AnalysisOptions, ChunkFlags, ChunkList, Config,
    LangFlags, OptionId, Settings, SpaceOption, SpaceVotes, TokenKind,
};

fn count_kind(list: &ChunkList, kind: TokenKind) -> usize {
    list.iter().filter(|&id| list[id].kind == kind).count()
}

fn assert_balanced(list: &ChunkList) {
    let openers = list.iter().filter(|&id| list[id].kind.is_opener()).count();
    let closers = list
        .iter()
        .filter(|&id| list[id].kind.is_closer() && !list[id].has_flag(ChunkFlags::UNMATCHED))
        .count();
    assert_eq!(openers, closers);
    assert_eq!(
        count_kind(list, TokenKind::VBraceOpen),
        count_kind(list, TokenKind::VBraceClose)
    );
}

#[test]
fn test_detect_typical_c_file() {
    let src = "\
#include <stdio.h>

static int add(int a, int b)
{
    return a + b;
}

int main(void)
{
    int i;
    for (i = 0; i < 10; i++) {
        if (i == 3 && i != 4)
            printf(\"%d\\n\", add(i, 2));
    }
    return 0;
}
";
    let mut settings = Settings::new();
    detect_options(
        src.as_bytes(),
        LangFlags::C,
        &mut settings,
        &AnalysisOptions::default(),
    );

    assert_eq!(settings.get(OptionId::SpArith), SpaceOption::Force);
    assert_eq!(settings.get(OptionId::SpAfterComma), SpaceOption::Force);
    assert_eq!(settings.get(OptionId::SpBeforeComma), SpaceOption::Remove);
    assert_eq!(settings.get(OptionId::SpCompare), SpaceOption::Force);
    assert_eq!(settings.get(OptionId::SpBool), SpaceOption::Force);
    assert_eq!(settings.get(OptionId::SpBeforeSparen), SpaceOption::Force);
    assert_eq!(settings.get(OptionId::SpInsideSparen), SpaceOption::Remove);
    assert_eq!(settings.get(OptionId::SpFuncCallParen), SpaceOption::Remove);
    assert_eq!(settings.get(OptionId::SpBeforeSemi), SpaceOption::Remove);
}

#[test]
fn test_arith_gap_scenario_keeps_literal_rule() {
    // gaps 0, 0 and 1; the operand after the second `+` is on the next line
    let src = "x = a+b;\ny = c +\n    d;\n";
    let list = analyze(src.as_bytes(), LangFlags::C, &AnalysisOptions::default());
    let votes = collect_votes(&list, OptionId::SpArith);
    assert_eq!(
        votes,
        SpaceVotes {
            add: 0,
            remove: 2,
            force: 1
        }
    );
    // remove votes veto a decision unless they are the only evidence
    assert_eq!(votes.result(), SpaceOption::Ignore);
}

#[test]
fn test_vote_table() {
    let cases = [
        ((0, 0, 0), SpaceOption::Ignore),
        ((0, 0, 3), SpaceOption::Force),
        ((2, 0, 1), SpaceOption::Add),
        ((0, 4, 0), SpaceOption::Remove),
        ((1, 1, 1), SpaceOption::Ignore),
        ((0, 5, 5), SpaceOption::Ignore),
    ];
    for ((add, remove, force), expected) in cases {
        let votes = SpaceVotes { add, remove, force };
        assert_eq!(votes.result(), expected, "{votes:?}");
    }
}

#[test]
fn test_unterminated_comment_is_balanced() {
    let src = "int main(void) {\n    if (x) {\n        y = 1; /* never closed\n";
    let list = analyze(src.as_bytes(), LangFlags::C, &AnalysisOptions::default());
    assert!(!list.is_empty());
    assert_balanced(&list);

    let comment = list
        .iter()
        .find(|&id| list[id].kind == TokenKind::CommentMulti)
        .unwrap();
    assert!(list[comment].text.ends_with("never closed\n"));
    let tail = list.tail().unwrap();
    assert_eq!(list[tail].level, 0);

    let mut settings = Settings::new();
    detect_options(src.as_bytes(), LangFlags::C, &mut settings, &AnalysisOptions::default());
    assert_eq!(settings.get(OptionId::SpAfterAssign), SpaceOption::Force);
}

#[test]
fn test_preprocessor_branches_balance() {
    let src = "\
void f(void)
{
#ifdef USE_LOOP
    while (x) {
#else
    if (x)
#endif
        g();
#ifdef USE_LOOP
    }
#endif
}
";
    let list = analyze(src.as_bytes(), LangFlags::C, &AnalysisOptions::default());
    // the #else branch is given the brace the #ifdef branch opened
    let mirrored = list
        .iter()
        .filter(|&id| list[id].kind == TokenKind::BraceOpen && list[id].is_virtual())
        .count();
    assert_eq!(mirrored, 1);
    let g = list.iter().find(|&id| list[id].text == "g").unwrap();
    assert_eq!(list[g].level, 2);
    let tail = list.tail().unwrap();
    assert_eq!(list[tail].level, 0);
}

#[test]
fn test_alignment_groups_by_span() {
    let src = "Foo alpha{1};\nFoo b{2};\nFoo cc{3};\n\n\nFoo d{4};\nFoo eee{5};\n";
    let options = AnalysisOptions {
        span: 1,
        ..Default::default()
    };
    let list = analyze(src.as_bytes(), LangFlags::CPP, &options);
    let columns: Vec<usize> = list
        .iter()
        .filter(|&id| list[id].kind == TokenKind::BraceOpen)
        .map(|id| list[id].column)
        .collect();
    assert_eq!(columns, vec![10, 10, 10, 8, 8]);
}

#[test]
fn test_explicit_settings_survive_detection() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("crustify.toml");
    std::fs::write(&config_path, "[options]\nsp_arith = \"add\"\n").unwrap();
    let config = Config::from_toml_file(&config_path).unwrap();

    let src = "// crustify: sp_after_comma=remove\nx = a+b;\nf(a, b);\n";
    let mut settings = config.settings();
    let mut options = AnalysisOptions::from(&config);
    let overrides = find_directive(&mut BufReader::new(Cursor::new(src))).unwrap();
    overrides.apply(&mut settings, &mut options);

    detect_options(src.as_bytes(), LangFlags::C, &mut settings, &options);
    assert_eq!(settings.get(OptionId::SpArith), SpaceOption::Add);
    assert_eq!(settings.get(OptionId::SpAfterComma), SpaceOption::Remove);
    assert_eq!(settings.get(OptionId::SpBeforeComma), SpaceOption::Remove);
}

#[test]
fn test_settings_render_as_toml() {
    let mut settings = Settings::new();
    detect_options(
        b"x = a + b;\n",
        LangFlags::C,
        &mut settings,
        &AnalysisOptions::default(),
    );
    let text = toml::to_string(&settings.to_table()).unwrap();
    assert!(text.contains("sp_arith = \"force\""));
    assert!(text.contains("sp_bool = \"ignore\""));
}

#[test]
fn test_language_from_extension_drives_keywords() {
    let mut file = tempfile::Builder::new().suffix(".cs").tempfile().unwrap();
    writeln!(file, "string s = \"a\";").unwrap();
    let lang = LangFlags::from_extension(file.path()).unwrap();
    assert_eq!(lang, LangFlags::CS);

    let data = std::fs::read(file.path()).unwrap();
    let list = analyze(&data, lang, &AnalysisOptions::default());
    let s = list.iter().find(|&id| list[id].text == "s").unwrap();
    assert!(list[s].has_flag(ChunkFlags::VAR_DEF));
}

#[test]
fn test_pawn_end_to_end() {
    let src = "new Float:speed = 1.0\nmain()\n{\n    speed = speed*2\n}\n";
    let list = analyze(src.as_bytes(), LangFlags::PAWN, &AnalysisOptions::default());
    assert!(count_kind(&list, TokenKind::VSemicolon) >= 2);
    assert_eq!(count_kind(&list, TokenKind::TagColon), 1);
    assert!(list.iter().any(|id| list[id].kind == TokenKind::FuncDef));
    assert_balanced(&list);
}

#[test]
fn test_dump_tokens_lists_every_chunk() {
    let list = analyze(b"a = b;\n", LangFlags::C, &AnalysisOptions::default());
    let mut out = Vec::new();
    dump_tokens(&list, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), list.len());
}

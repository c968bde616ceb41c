/// Lexical tables: keywords, punctuators, number literals and directives
///
/// Regexes are compiled once on first use via `LazyLock`.
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::chunk::TokenKind;
use crate::lang::LangFlags;

/// Build an anchored regex from a compile-time constant pattern.
///
/// # Panics
///
/// Panics if the pattern is invalid. All patterns in this module are
/// constants covered by tests, so this only fires on a broken build.
fn build_re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|_| panic!("Invalid regex pattern: {pattern}"))
}

// ===== NUMBERS =====

pub static HEX_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(r"^0[xX][0-9a-fA-F_']*(\.[0-9a-fA-F_']*)?([pP][+-]?[0-9]+)?[uUlLzZ]*")
});
pub static BIN_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^0[bB][01_']+[uUlLzZ]*"));
pub static DEC_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(r"^(?:[0-9][0-9_']*(\.[0-9_']*)?|(\.[0-9][0-9_']*))([eE][+-]?[0-9]+)?([a-zA-Z_]*)")
});

// ===== IDENTIFIERS / DIRECTIVES =====

pub static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^[A-Za-z_$][A-Za-z0-9_$]*"));

/// Languages where `L"..."`/`u8"..."` style prefixes glue onto string literals
pub const STRING_PREFIXES: &[&str] = &["L", "u", "U", "u8", "R", "LR", "uR", "UR", "u8R"];

const ALL: LangFlags = LangFlags::ALL;
const C_LIKE: LangFlags = LangFlags(0x1ff & !(1 << 8));

/// Keyword table: spelling, kind and the languages where it applies
///
/// The first entry whose language set intersects the active flags wins.
const KEYWORDS: &[(&str, TokenKind, LangFlags)] = &[
    ("if", TokenKind::If, ALL),
    ("else", TokenKind::Else, ALL),
    ("for", TokenKind::For, ALL),
    ("foreach", TokenKind::For, LangFlags(LangFlags::D.0 | LangFlags::CS.0 | LangFlags::VALA.0)),
    ("while", TokenKind::While, ALL),
    ("do", TokenKind::Do, ALL),
    ("switch", TokenKind::Switch, ALL),
    ("case", TokenKind::Case, ALL),
    ("default", TokenKind::Default, ALL),
    ("return", TokenKind::Return, ALL),
    ("break", TokenKind::Break, ALL),
    ("continue", TokenKind::Continue, ALL),
    ("goto", TokenKind::Goto, ALL),
    ("sizeof", TokenKind::Sizeof, C_LIKE),
    ("struct", TokenKind::Struct, C_LIKE),
    ("union", TokenKind::Union, C_LIKE),
    ("enum", TokenKind::Enum, ALL),
    ("class", TokenKind::Class, ALL),
    ("interface", TokenKind::Class, LangFlags(LangFlags::D.0 | LangFlags::CS.0 | LangFlags::JAVA.0 | LangFlags::VALA.0)),
    ("typedef", TokenKind::Typedef, C_LIKE),
    ("const", TokenKind::Qualifier, ALL),
    ("volatile", TokenKind::Qualifier, C_LIKE),
    ("static", TokenKind::Qualifier, ALL),
    ("extern", TokenKind::Qualifier, C_LIKE),
    ("inline", TokenKind::Qualifier, C_LIKE),
    ("register", TokenKind::Qualifier, C_LIKE),
    ("restrict", TokenKind::Qualifier, LangFlags::C),
    ("mutable", TokenKind::Qualifier, LangFlags::CPP),
    ("constexpr", TokenKind::Qualifier, LangFlags::CPP),
    ("virtual", TokenKind::Qualifier, LangFlags(LangFlags::CPP.0 | LangFlags::CS.0 | LangFlags::VALA.0)),
    ("final", TokenKind::Qualifier, LangFlags(LangFlags::D.0 | LangFlags::JAVA.0)),
    ("stock", TokenKind::Qualifier, LangFlags::PAWN),
    ("forward", TokenKind::Qualifier, LangFlags::PAWN),
    ("native", TokenKind::Qualifier, LangFlags(LangFlags::PAWN.0 | LangFlags::JAVA.0)),
    ("public", TokenKind::Access, C_LIKE),
    ("private", TokenKind::Access, C_LIKE),
    ("protected", TokenKind::Access, C_LIKE),
    ("namespace", TokenKind::Namespace, LangFlags(LangFlags::CPP.0 | LangFlags::CS.0 | LangFlags::VALA.0)),
    ("operator", TokenKind::Operator, LangFlags(LangFlags::CPP.0 | LangFlags::CS.0 | LangFlags::D.0)),
    ("new", TokenKind::Qualifier, LangFlags::PAWN),
    ("new", TokenKind::New, ALL),
    ("delete", TokenKind::Delete, LangFlags(LangFlags::CPP.0 | LangFlags::D.0 | LangFlags::ECMA.0)),
    ("try", TokenKind::Try, ALL),
    ("catch", TokenKind::Catch, ALL),
    ("throw", TokenKind::Throw, ALL),
    ("using", TokenKind::Using, LangFlags(LangFlags::CPP.0 | LangFlags::CS.0)),
    ("void", TokenKind::Type, C_LIKE),
    ("char", TokenKind::Type, C_LIKE),
    ("short", TokenKind::Type, C_LIKE),
    ("int", TokenKind::Type, C_LIKE),
    ("long", TokenKind::Type, C_LIKE),
    ("float", TokenKind::Type, C_LIKE),
    ("double", TokenKind::Type, C_LIKE),
    ("signed", TokenKind::Type, C_LIKE),
    ("unsigned", TokenKind::Type, C_LIKE),
    ("bool", TokenKind::Type, C_LIKE),
    ("_Bool", TokenKind::Type, LangFlags::C),
    ("wchar_t", TokenKind::Type, LangFlags(LangFlags::C.0 | LangFlags::CPP.0)),
    ("auto", TokenKind::Type, LangFlags(LangFlags::CPP.0 | LangFlags::D.0)),
    ("byte", TokenKind::Type, LangFlags(LangFlags::JAVA.0 | LangFlags::CS.0 | LangFlags::D.0)),
    ("boolean", TokenKind::Type, LangFlags::JAVA),
    ("string", TokenKind::Type, LangFlags(LangFlags::CS.0 | LangFlags::D.0 | LangFlags::VALA.0)),
    ("var", TokenKind::Type, LangFlags(LangFlags::CS.0 | LangFlags::VALA.0 | LangFlags::ECMA.0)),
];

static KEYWORD_MAP: LazyLock<HashMap<&'static str, Vec<(TokenKind, LangFlags)>>> =
    LazyLock::new(|| {
        let mut map: HashMap<&'static str, Vec<(TokenKind, LangFlags)>> = HashMap::new();
        for &(word, kind, langs) in KEYWORDS {
            map.entry(word).or_default().push((kind, langs));
        }
        map
    });

/// Look up the keyword kind of `word` for the active languages
#[must_use]
pub fn keyword_kind(word: &str, lang: LangFlags) -> Option<TokenKind> {
    KEYWORD_MAP.get(word).and_then(|entries| {
        entries
            .iter()
            .find(|(_, langs)| langs.intersects(lang))
            .map(|(kind, _)| *kind)
    })
}

/// Punctuators, longest spelling first within each length
const PUNCTUATORS: &[(&str, TokenKind)] = &[
    ("<<=", TokenKind::Assign),
    (">>=", TokenKind::Assign),
    ("...", TokenKind::Ellipsis),
    ("->*", TokenKind::Member),
    ("<=>", TokenKind::Compare),
    ("::", TokenKind::DcMember),
    ("->", TokenKind::Member),
    (".*", TokenKind::Member),
    ("++", TokenKind::IncDecAfter),
    ("--", TokenKind::IncDecAfter),
    ("==", TokenKind::Compare),
    ("!=", TokenKind::Compare),
    ("<=", TokenKind::Compare),
    (">=", TokenKind::Compare),
    ("&&", TokenKind::Bool),
    ("||", TokenKind::Bool),
    ("+=", TokenKind::Assign),
    ("-=", TokenKind::Assign),
    ("*=", TokenKind::Assign),
    ("/=", TokenKind::Assign),
    ("%=", TokenKind::Assign),
    ("&=", TokenKind::Assign),
    ("|=", TokenKind::Assign),
    ("^=", TokenKind::Assign),
    ("<<", TokenKind::Arith),
    (">>", TokenKind::Arith),
    ("##", TokenKind::Pound),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("&", TokenKind::Amp),
    ("/", TokenKind::Arith),
    ("%", TokenKind::Arith),
    ("|", TokenKind::Arith),
    ("^", TokenKind::Arith),
    ("~", TokenKind::Inv),
    ("!", TokenKind::Not),
    ("=", TokenKind::Assign),
    ("<", TokenKind::Compare),
    (">", TokenKind::Compare),
    ("?", TokenKind::Question),
    (":", TokenKind::Colon),
    (";", TokenKind::Semicolon),
    (",", TokenKind::Comma),
    (".", TokenKind::Dot),
    ("(", TokenKind::ParenOpen),
    (")", TokenKind::ParenClose),
    ("{", TokenKind::BraceOpen),
    ("}", TokenKind::BraceClose),
    ("[", TokenKind::SquareOpen),
    ("]", TokenKind::SquareClose),
    ("#", TokenKind::Pound),
];

/// Longest punctuator at the start of `rest`
#[must_use]
pub fn match_punctuator(rest: &str) -> Option<(&'static str, TokenKind)> {
    PUNCTUATORS
        .iter()
        .find(|(p, _)| rest.starts_with(p))
        .map(|&(p, kind)| (p, kind))
}

/// Kind of a preprocessor directive word
#[must_use]
pub fn directive_kind(word: &str) -> TokenKind {
    match word {
        "if" | "ifdef" | "ifndef" => TokenKind::PpIf,
        "else" | "elif" | "elifdef" | "elifndef" => TokenKind::PpElse,
        "endif" => TokenKind::PpEndif,
        "define" => TokenKind::PpDefine,
        "include" | "include_next" | "import" | "tryinclude" => TokenKind::PpInclude,
        "pragma" | "error" | "warning" | "line" | "region" | "endregion" | "emit" => {
            TokenKind::PpPragma
        }
        _ => TokenKind::PpOther,
    }
}

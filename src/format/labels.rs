/// `Labels` - Give every plain colon its role
///
/// Roles are tried in a fixed priority order, so a colon inside a ternary
/// within a `case` expression still resolves to the ternary.
use log::{debug, trace};

use crate::chunk::{ChunkFlags, ChunkId, ChunkList, TokenKind};

/// Classify all remaining `Colon` chunks
pub fn combine_labels(list: &mut ChunkList) {
    // Levels of `?` and `case`/`default` still waiting for their colon
    let mut questions: Vec<usize> = Vec::new();
    let mut cases: Vec<usize> = Vec::new();
    let mut classified = 0usize;

    let mut cur = list.head();
    while let Some(pc) = cur {
        cur = list.next(pc);
        let chunk = &list[pc];
        if !chunk.is_significant() || (chunk.is_virtual() && !chunk.kind.is_semicolon()) {
            continue;
        }
        let (kind, level) = (chunk.kind, chunk.level);

        match kind {
            TokenKind::Question => questions.push(level),
            TokenKind::Case | TokenKind::Default => cases.push(level),
            TokenKind::Semicolon | TokenKind::VSemicolon => {
                questions.retain(|&l| l < level);
                cases.retain(|&l| l < level);
            }
            k if k.is_closer() => {
                questions.retain(|&l| l <= level);
                cases.retain(|&l| l <= level);
            }
            TokenKind::Colon => {
                let role = if questions.last() == Some(&level) {
                    questions.pop();
                    TokenKind::CondColon
                } else if cases.last() == Some(&level) {
                    cases.pop();
                    TokenKind::CaseColon
                } else {
                    colon_role(list, pc)
                };
                if role != TokenKind::Colon {
                    classified += 1;
                }
                apply_role(list, pc, role);
            }
            _ => {}
        }
    }

    debug!("combine_labels: {classified} colon(s) classified");
}

fn apply_role(list: &mut ChunkList, pc: ChunkId, role: TokenKind) {
    list[pc].kind = role;
    if role == TokenKind::LabelColon {
        if let Some(word) = list.prev_ncnl(pc) {
            list[word].kind = TokenKind::Label;
        }
    }
    trace!(
        "{}:{} colon is {role}",
        list[pc].orig_line,
        list[pc].orig_col
    );
}

/// Roles decided by the surrounding structure
fn colon_role(list: &ChunkList, pc: ChunkId) -> TokenKind {
    let opener = list[pc]
        .level
        .checked_sub(1)
        .and_then(|outer| list.prev_where(pc, |c| c.kind.is_opener() && c.level == outer));
    if opener.is_some_and(|o| list[o].kind == TokenKind::SParenOpen && list[o].parent_kind == TokenKind::For) {
        return TokenKind::ForColon;
    }

    let Some(prev) = list.prev_ncnl(pc) else {
        return TokenKind::Colon;
    };
    let before = &list[prev];
    if before.kind == TokenKind::Access {
        return TokenKind::AccessColon;
    }
    let in_parens = opener.is_some_and(|o| !list[o].kind.is_brace_open());
    if before.kind == TokenKind::Word
        && !in_parens
        && before.has_flag(ChunkFlags::STMT_START)
        && first_on_line(list, prev)
    {
        return TokenKind::LabelColon;
    }
    if list[pc].has_flag(ChunkFlags::IN_STRUCT)
        && opener.is_some_and(|o| list[o].kind == TokenKind::BraceOpen)
        && matches!(before.kind, TokenKind::Word | TokenKind::Type)
    {
        return TokenKind::BitColon;
    }
    if before.kind == TokenKind::FParenClose || follows_class_head(list, prev) {
        return TokenKind::ClassColon;
    }
    TokenKind::Colon
}

fn first_on_line(list: &ChunkList, pc: ChunkId) -> bool {
    list.prev_nc(pc).map_or(true, |p| list[p].is_newline())
}

/// `class Name :`, `struct Name :`, `enum Name :`
fn follows_class_head(list: &ChunkList, name: ChunkId) -> bool {
    if !matches!(list[name].kind, TokenKind::Type | TokenKind::Word) {
        return false;
    }
    list.prev_ncnl(name).is_some_and(|kw| {
        matches!(
            list[kw].kind,
            TokenKind::Class | TokenKind::Struct | TokenKind::Union | TokenKind::Enum
        )
    })
}

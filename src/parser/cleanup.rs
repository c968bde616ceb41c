/// `Cleanup` - Local merges and retypes on the raw lexer output
///
/// Every rule looks at a chunk and at most two neighbours. Levels do not
/// exist yet, so nothing here reads or writes them. Running the pass twice
/// leaves the stream unchanged.
use log::{debug, trace};

use super::patterns::IDENT_RE;
use crate::chunk::{ChunkId, ChunkList, TokenKind};
use crate::lang::LangFlags;

/// Apply the bounded-window cleanup rules to the whole stream
pub fn tokenize_cleanup(list: &mut ChunkList, lang: LangFlags) {
    let before = list.len();
    let mut cur = list.head();

    while let Some(pc) = cur {
        match list[pc].kind {
            TokenKind::SquareOpen => merge_empty_square(list, pc),
            TokenKind::Else => mark_else_if(list, pc),
            TokenKind::Operator => mark_operator_value(list, pc),
            TokenKind::Struct | TokenKind::Union | TokenKind::Enum | TokenKind::Class => {
                mark_tag_type(list, pc);
            }
            TokenKind::PpDefine => mark_macro_name(list, pc),
            TokenKind::IncDecAfter | TokenKind::IncDecBefore => fix_inc_dec(list, pc),
            TokenKind::Word | TokenKind::Type if lang.intersects(LangFlags::PAWN) => {
                mark_pawn_tag(list, pc);
            }
            _ => {}
        }
        cur = list.next(pc);
    }

    debug!(
        "tokenize_cleanup: {before} -> {} chunks",
        list.len()
    );
}

/// Fold `next` into `pc`, joining the texts with `joiner`
fn merge_next(list: &mut ChunkList, pc: ChunkId, next: ChunkId, joiner: &str) {
    let removed = list.remove(next);
    let chunk = &mut list[pc];
    chunk.text.push_str(joiner);
    chunk.text.push_str(&removed.text);
    chunk.orig_col_end = removed.orig_col_end;
}

/// `[` `]` is one empty-subscript chunk
fn merge_empty_square(list: &mut ChunkList, pc: ChunkId) {
    let Some(next) = list.next(pc) else { return };
    if list[next].kind != TokenKind::SquareClose {
        return;
    }
    let removed = list.remove(next);
    let chunk = &mut list[pc];
    chunk.kind = TokenKind::TSquare;
    chunk.text = "[]".to_string();
    chunk.orig_col_end = removed.orig_col_end;
    trace!("cleanup: [] at {}:{}", chunk.orig_line, chunk.orig_col);
}

/// An `if` on the same line as a preceding `else` is an `else if`
fn mark_else_if(list: &mut ChunkList, pc: ChunkId) {
    if let Some(next) = list.next_nc(pc) {
        if list[next].kind == TokenKind::If {
            list[next].kind = TokenKind::ElseIf;
        }
    }
}

/// The symbol after `operator` names the overloaded operator
fn mark_operator_value(list: &mut ChunkList, pc: ChunkId) {
    let Some(next) = list.next_nc(pc) else { return };
    match list[next].kind {
        TokenKind::ParenOpen => {
            if let Some(close) = list.next(next) {
                if list[close].kind == TokenKind::ParenClose {
                    merge_next(list, next, close, "");
                    list[next].kind = TokenKind::OperatorVal;
                }
            }
        }
        TokenKind::Assign
        | TokenKind::Arith
        | TokenKind::Compare
        | TokenKind::Bool
        | TokenKind::Not
        | TokenKind::Inv
        | TokenKind::Plus
        | TokenKind::Minus
        | TokenKind::Star
        | TokenKind::Amp
        | TokenKind::IncDecAfter
        | TokenKind::IncDecBefore
        | TokenKind::TSquare
        | TokenKind::Member
        | TokenKind::Comma
        | TokenKind::New
        | TokenKind::Delete => {
            list[next].kind = TokenKind::OperatorVal;
        }
        _ => {}
    }
}

/// `struct foo` / `enum bar`: the tag names a type
fn mark_tag_type(list: &mut ChunkList, pc: ChunkId) {
    if let Some(next) = list.next_ncnl(pc) {
        if list[next].kind == TokenKind::Word {
            list[next].kind = TokenKind::Type;
        }
    }
}

/// `#define NAME` and `#define NAME(`
fn mark_macro_name(list: &mut ChunkList, pc: ChunkId) {
    let Some(name) = list.next_nc(pc) else { return };
    if list[name].is_newline() || !IDENT_RE.is_match(&list[name].text) {
        return;
    }
    let is_func = list.next(name).is_some_and(|paren| {
        list[paren].kind == TokenKind::ParenOpen && list[paren].ws_before == 0
    });
    list[name].kind = if is_func {
        TokenKind::MacroFunc
    } else {
        TokenKind::Macro
    };
}

/// `++`/`--` follow a value or precede one
fn fix_inc_dec(list: &mut ChunkList, pc: ChunkId) {
    let after = list
        .prev_ncnl(pc)
        .is_some_and(|prev| list[prev].kind.ends_value());
    list[pc].kind = if after {
        TokenKind::IncDecAfter
    } else {
        TokenKind::IncDecBefore
    };
}

/// Pawn `Float:x`: a word glued to a colon glued to the next token
fn mark_pawn_tag(list: &mut ChunkList, pc: ChunkId) {
    let Some(colon) = list.next(pc) else { return };
    if list[colon].kind != TokenKind::Colon || list[colon].ws_before != 0 {
        return;
    }
    let Some(after) = list.next(colon) else { return };
    if list[after].is_newline() || list[after].ws_before != 0 {
        return;
    }
    list[pc].kind = TokenKind::Tag;
    list[colon].kind = TokenKind::TagColon;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize;

    fn cleaned(src: &str, lang: LangFlags) -> ChunkList {
        let mut list = tokenize(src.as_bytes(), lang, 8);
        tokenize_cleanup(&mut list, lang);
        list
    }

    fn kinds_of(list: &ChunkList) -> Vec<(String, TokenKind)> {
        list.iter()
            .filter(|&id| !list[id].is_newline())
            .map(|id| (list[id].text.clone(), list[id].kind))
            .collect()
    }

    #[test]
    fn test_empty_square_merges() {
        let list = cleaned("int a[] = x[ ];", LangFlags::C);
        let toks = kinds_of(&list);
        assert_eq!(toks[2], ("[]".to_string(), TokenKind::TSquare));
        assert_eq!(toks[5], ("[]".to_string(), TokenKind::TSquare));
        assert_eq!(toks.len(), 7);
    }

    #[test]
    fn test_else_if() {
        let list = cleaned("if (a) b; else if (c) d;", LangFlags::C);
        let toks = kinds_of(&list);
        assert_eq!(toks[6].1, TokenKind::Else);
        assert_eq!(toks[7].1, TokenKind::ElseIf);

        let list = cleaned("else\nif (c) d;", LangFlags::C);
        assert_eq!(kinds_of(&list)[1].1, TokenKind::If);
    }

    #[test]
    fn test_operator_values() {
        let list = cleaned("bool operator==(X a); int operator()(int);", LangFlags::CPP);
        let toks = kinds_of(&list);
        assert_eq!(toks[2], ("==".to_string(), TokenKind::OperatorVal));
        let call = toks.iter().find(|(t, _)| t == "()").unwrap();
        assert_eq!(call.1, TokenKind::OperatorVal);
    }

    #[test]
    fn test_struct_tag_becomes_type() {
        let list = cleaned("struct point p; enum color c;", LangFlags::C);
        let toks = kinds_of(&list);
        assert_eq!(toks[1].1, TokenKind::Type);
        assert_eq!(toks[2].1, TokenKind::Word);
        assert_eq!(toks[5].1, TokenKind::Type);
    }

    #[test]
    fn test_define_names() {
        let list = cleaned("#define MAX(a, b) x\n#define LIMIT (3)\n", LangFlags::C);
        let toks = kinds_of(&list);
        assert_eq!(toks[2], ("MAX".to_string(), TokenKind::MacroFunc));
        let limit = toks.iter().find(|(t, _)| t == "LIMIT").unwrap();
        assert_eq!(limit.1, TokenKind::Macro);
    }

    #[test]
    fn test_inc_dec_direction() {
        let list = cleaned("i++; ++j; a = -- b; (x)--;", LangFlags::C);
        let incdec: Vec<TokenKind> = kinds_of(&list)
            .into_iter()
            .filter(|(t, _)| t == "++" || t == "--")
            .map(|(_, k)| k)
            .collect();
        assert_eq!(
            incdec,
            vec![
                TokenKind::IncDecAfter,
                TokenKind::IncDecBefore,
                TokenKind::IncDecBefore,
                TokenKind::IncDecAfter,
            ]
        );
    }

    #[test]
    fn test_pawn_tags() {
        let list = cleaned("new Float:x = 1.0;\nlabel:\n", LangFlags::PAWN);
        let toks = kinds_of(&list);
        assert_eq!(toks[1], ("Float".to_string(), TokenKind::Tag));
        assert_eq!(toks[2].1, TokenKind::TagColon);
        let label = toks.iter().find(|(t, _)| t == "label").unwrap();
        assert_eq!(label.1, TokenKind::Word);
    }

    #[test]
    fn test_pawn_rule_only_for_pawn() {
        let list = cleaned("a ? b:c;", LangFlags::C);
        assert!(kinds_of(&list).iter().all(|(_, k)| *k != TokenKind::Tag));
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let src = "struct s a[]; if (x) y++; else if (z) --w;\n#define F(x) x\n";
        let mut list = cleaned(src, LangFlags::CPP);
        let once = kinds_of(&list);
        tokenize_cleanup(&mut list, LangFlags::CPP);
        assert_eq!(kinds_of(&list), once);
    }
}

/// `Pawn` - Function heads at file scope
///
/// Pawn declares functions without a return type, so `name(args)` at brace
/// level zero is a definition when a brace follows and a prototype when the
/// statement ends instead.
use log::{debug, trace};

use crate::chunk::{ChunkFlags, ChunkId, ChunkList, TokenKind};

/// Mark file-scope function definitions and prototypes
pub fn pawn_prescan(list: &mut ChunkList) {
    let mut found = 0usize;
    let mut cur = list.head();

    while let Some(pc) = cur {
        cur = list.next(pc);

        let chunk = &list[pc];
        if chunk.kind != TokenKind::Word
            || chunk.brace_level != 0
            || chunk.level != 0
            || chunk.has_flag(ChunkFlags::IN_PREPROC)
            || !starts_declaration(list, pc)
        {
            continue;
        }
        let Some(open) = list.next_ncnl(pc) else { continue };
        if list[open].kind != TokenKind::ParenOpen {
            continue;
        }
        let Some(close) = list.skip_to_match(open) else { continue };
        let Some(after) = list.next_ncnl(close) else { continue };

        let kind = match list[after].kind {
            TokenKind::BraceOpen => TokenKind::FuncDef,
            k if k.is_semicolon() => TokenKind::FuncProto,
            _ => continue,
        };

        list[pc].kind = kind;
        list[open].kind = TokenKind::FParenOpen;
        list[open].parent_kind = kind;
        list[close].kind = TokenKind::FParenClose;
        list[close].parent_kind = kind;
        if kind == TokenKind::FuncDef {
            list[after].parent_kind = kind;
            if let Some(body_end) = list.skip_to_match(after) {
                list[body_end].parent_kind = kind;
            }
        }
        found += 1;
        trace!("pawn: {} is {kind}", list[pc].text);
        cur = list.next(close);
    }

    debug!("pawn_prescan: {found} function head(s)");
}

/// Only qualifiers and tags may precede a function name in its statement
fn starts_declaration(list: &ChunkList, pc: ChunkId) -> bool {
    let Some(prev) = list.prev_ncnl(pc) else {
        return true;
    };
    let prev = &list[prev];
    prev.has_flag(ChunkFlags::IN_PREPROC)
        || matches!(
            prev.kind,
            TokenKind::Semicolon
                | TokenKind::VSemicolon
                | TokenKind::BraceClose
                | TokenKind::VBraceClose
                | TokenKind::Qualifier
                | TokenKind::TagColon
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::LangFlags;
    use crate::parser::{lexer::tokenize, tokenize_cleanup};
    use crate::scope::brace_cleanup;

    fn prescanned(src: &str) -> ChunkList {
        let lang = LangFlags::PAWN;
        let mut list = tokenize(src.as_bytes(), lang, 8);
        tokenize_cleanup(&mut list, lang);
        brace_cleanup(&mut list, lang);
        pawn_prescan(&mut list);
        list
    }

    fn kind_of(list: &ChunkList, text: &str) -> TokenKind {
        list.iter()
            .find(|&id| list[id].text == text)
            .map(|id| list[id].kind)
            .unwrap()
    }

    #[test]
    fn test_definition_and_body_parent() {
        let list = prescanned("main()\n{\n    foo(1)\n}\n");
        assert_eq!(kind_of(&list, "main"), TokenKind::FuncDef);
        // calls inside bodies are left for the retyper
        assert_eq!(kind_of(&list, "foo"), TokenKind::Word);
        let parents: Vec<TokenKind> = list
            .iter()
            .filter(|&id| list[id].kind.is_brace_open() || list[id].kind.is_brace_close())
            .filter(|&id| !list[id].is_virtual())
            .map(|id| list[id].parent_kind)
            .collect();
        assert_eq!(parents, vec![TokenKind::FuncDef, TokenKind::FuncDef]);
    }

    #[test]
    fn test_prototypes() {
        let list = prescanned("forward OnInit(id);\nnative Helper()\n");
        assert_eq!(kind_of(&list, "OnInit"), TokenKind::FuncProto);
        assert_eq!(kind_of(&list, "Helper"), TokenKind::FuncProto);
        let open = list
            .iter()
            .find(|&id| list[id].kind == TokenKind::FParenOpen)
            .unwrap();
        assert_eq!(list[open].parent_kind, TokenKind::FuncProto);
    }

    #[test]
    fn test_expression_call_untouched() {
        let list = prescanned("new x = max(a, b)\n");
        assert_eq!(kind_of(&list, "max"), TokenKind::Word);
    }
}

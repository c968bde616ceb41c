/// `Symbols` - Context-sensitive retyping once levels are known
///
/// One forward pass over the significant chunks. Each rule looks at the
/// chunk, its nearest neighbours and, for grouped constructs, the chunks up to
/// the matching closer. Compound names are merged first so the rules see
/// `unsigned int` and `ns::name` as single chunks.
use log::{debug, trace};

use crate::chunk::{ChunkFlags, ChunkId, ChunkList, TokenKind};
use crate::lang::LangFlags;
use crate::parser::patterns::keyword_kind;

/// Languages where `*` and `&` build pointer and reference types
const POINTER_LANGS: LangFlags = LangFlags(
    LangFlags::C.0 | LangFlags::CPP.0 | LangFlags::D.0 | LangFlags::CS.0 | LangFlags::OC.0 | LangFlags::VALA.0,
);

/// Reclassify ambiguous chunks across the whole stream
pub fn fix_symbols(list: &mut ChunkList, lang: LangFlags) {
    let merged = merge_compounds(list, lang);
    let pointers = lang.intersects(POINTER_LANGS);
    let mut retyped = 0usize;
    let mut openers = OpenerTrack::default();

    let mut cur = list.head();
    while let Some(pc) = cur {
        if list[pc].is_significant() && !list[pc].is_virtual() {
            mark_statement_start(list, pc);
            let enclosing = openers.enclosing(list, pc);
            if fix_chunk(list, pc, enclosing, pointers) {
                retyped += 1;
            }
        }
        openers.note(list, pc);
        cur = list.next(pc);
    }

    debug!("fix_symbols: {merged} merge(s), {retyped} construct(s) retyped");
}

fn fix_chunk(
    list: &mut ChunkList,
    pc: ChunkId,
    enclosing: Option<ChunkId>,
    pointers: bool,
) -> bool {
    match list[pc].kind {
        TokenKind::Word | TokenKind::Type => {
            mark_function(list, pc, enclosing) || mark_declaration(list, pc, enclosing, pointers)
        }
        TokenKind::MacroFunc => mark_function(list, pc, enclosing),
        TokenKind::Qualifier => mark_declaration(list, pc, enclosing, pointers),
        TokenKind::Sizeof => mark_sizeof(list, pc),
        TokenKind::ParenOpen => mark_cast(list, pc),
        TokenKind::Plus | TokenKind::Minus | TokenKind::Star | TokenKind::Amp => {
            resolve_operator(list, pc, pointers)
        }
        TokenKind::BraceOpen => mark_braced_init(list, pc),
        TokenKind::Enum
        | TokenKind::Struct
        | TokenKind::Union
        | TokenKind::Class
        | TokenKind::Namespace => mark_aggregate(list, pc),
        _ => false,
    }
}

/// The chunk before `pc` ends a statement
fn follows_statement_end(list: &ChunkList, pc: ChunkId) -> bool {
    let Some(prev) = list.prev_ncnl(pc) else {
        return true;
    };
    let prev = &list[prev];
    (prev.has_flag(ChunkFlags::IN_PREPROC) && !list[pc].has_flag(ChunkFlags::IN_PREPROC))
        || matches!(
            prev.kind,
            TokenKind::Semicolon
                | TokenKind::VSemicolon
                | TokenKind::BraceOpen
                | TokenKind::BraceClose
                | TokenKind::VBraceOpen
                | TokenKind::VBraceClose
        )
}

fn mark_statement_start(list: &mut ChunkList, pc: ChunkId) {
    if follows_statement_end(list, pc) {
        list[pc].flags.insert(ChunkFlags::STMT_START);
    }
}

/// Latest opener seen at each level during the forward pass
///
/// Ids are kept rather than kinds: later rules retype openers ahead of the
/// cursor, so the kind and parent are read when asked for.
#[derive(Debug, Default)]
struct OpenerTrack {
    by_level: Vec<Option<ChunkId>>,
}

impl OpenerTrack {
    fn note(&mut self, list: &ChunkList, id: ChunkId) {
        let chunk = &list[id];
        if !chunk.kind.is_opener() {
            return;
        }
        if self.by_level.len() <= chunk.level {
            self.by_level.resize(chunk.level + 1, None);
        }
        self.by_level[chunk.level] = Some(id);
    }

    /// Innermost opener enclosing `pc`
    fn enclosing(&self, list: &ChunkList, pc: ChunkId) -> Option<ChunkId> {
        let outer = list[pc].level.checked_sub(1)?;
        self.by_level.get(outer).copied().flatten()
    }
}

fn retype(list: &mut ChunkList, id: ChunkId, kind: TokenKind) {
    let chunk = &mut list[id];
    if chunk.kind != kind {
        trace!(
            "retype {}:{} '{}' {} -> {kind}",
            chunk.orig_line,
            chunk.orig_col,
            chunk.text,
            chunk.kind
        );
        chunk.kind = kind;
    }
}

/// Set the parent of an opener and its matching closer
fn set_group_parent(list: &mut ChunkList, open: ChunkId, parent: TokenKind) {
    list[open].parent_kind = parent;
    if let Some(close) = list.skip_to_match(open) {
        list[close].parent_kind = parent;
    }
}

// ===== MERGES =====

/// `unsigned int` and `ns::name` become single chunks
fn merge_compounds(list: &mut ChunkList, lang: LangFlags) -> usize {
    let mut merged = 0;
    let mut cur = list.head();

    while let Some(pc) = cur {
        while let Some(next) = list.next(pc) {
            let (a, b) = (&list[pc], &list[next]);
            if a.kind == TokenKind::Type
                && b.kind == TokenKind::Type
                && (a.has_flag(ChunkFlags::CONTINUATION)
                    || keyword_kind(&a.text, lang) == Some(TokenKind::Type))
                && keyword_kind(&b.text, lang) == Some(TokenKind::Type)
            {
                join(list, pc, &[next], " ");
            } else if matches!(a.kind, TokenKind::Word | TokenKind::Type)
                && b.kind == TokenKind::DcMember
                && b.ws_before == 0
            {
                let Some(name) = list.next(next) else { break };
                if list[name].kind != TokenKind::Word || list[name].ws_before != 0 {
                    break;
                }
                join(list, pc, &[next, name], "");
                list[pc].kind = TokenKind::Word;
            } else {
                break;
            }
            merged += 1;
        }
        cur = list.next(pc);
    }
    merged
}

fn join(list: &mut ChunkList, pc: ChunkId, rest: &[ChunkId], sep: &str) {
    for &id in rest {
        let removed = list.remove(id);
        let chunk = &mut list[pc];
        if !sep.is_empty() {
            chunk.text.push_str(sep);
        }
        chunk.text.push_str(&removed.text);
        chunk.orig_col_end = removed.orig_col_end;
    }
    list[pc].flags.insert(ChunkFlags::CONTINUATION);
    trace!("merged '{}'", list[pc].text);
}

// ===== FUNCTIONS =====

/// Whether a name at `pc` may declare a function rather than call one
fn at_declaration_scope(list: &ChunkList, enclosing: Option<ChunkId>) -> bool {
    match enclosing {
        None => true,
        Some(open) => {
            let opener = &list[open];
            opener.kind == TokenKind::BraceOpen
                && matches!(
                    opener.parent_kind,
                    TokenKind::Class | TokenKind::Struct | TokenKind::Union | TokenKind::Namespace
                )
        }
    }
}

/// `name (` is a call, a definition or a prototype
fn mark_function(list: &mut ChunkList, pc: ChunkId, enclosing: Option<ChunkId>) -> bool {
    let Some(open) = list.next_ncnl(pc) else {
        return false;
    };
    if list[open].kind != TokenKind::ParenOpen || list[open].level != list[pc].level {
        return false;
    }
    // `void (*fp)(int)` is a declarator, not a call
    if list
        .next_ncnl(open)
        .is_some_and(|first| list[first].kind == TokenKind::Star)
    {
        return false;
    }
    let Some(close) = list.skip_to_match(open) else {
        return false;
    };

    let kind = if list[pc].kind == TokenKind::MacroFunc {
        TokenKind::MacroFunc
    } else if at_declaration_scope(list, enclosing) && !in_initializer_list(list, pc) {
        classify_function_head(list, pc, close)
    } else {
        TokenKind::FuncCall
    };

    if kind != TokenKind::MacroFunc {
        retype(list, pc, kind);
    }
    retype(list, open, TokenKind::FParenOpen);
    retype(list, close, TokenKind::FParenClose);
    list[open].parent_kind = kind;
    list[close].parent_kind = kind;

    if matches!(kind, TokenKind::FuncDef | TokenKind::FuncProto) {
        mark_return_type(list, pc);
    }
    if kind == TokenKind::FuncDef {
        let body = list.next_where(close, |c| {
            c.kind == TokenKind::BraceOpen || c.kind.is_semicolon()
        });
        if let Some(body) = body.filter(|&b| list[b].kind == TokenKind::BraceOpen) {
            set_group_parent(list, body, TokenKind::FuncDef);
        }
    }
    true
}

/// `Foo() : a(1), b(2)`: member initializers are calls
fn in_initializer_list(list: &ChunkList, pc: ChunkId) -> bool {
    list.prev_ncnl(pc)
        .is_some_and(|prev| matches!(list[prev].kind, TokenKind::Colon | TokenKind::Comma))
}

fn classify_function_head(list: &ChunkList, pc: ChunkId, close: ChunkId) -> TokenKind {
    let after = list.next_where(close, |c| {
        c.is_significant()
            && c.kind != TokenKind::Qualifier
            && !matches!(c.text.as_str(), "override" | "noexcept" | "final")
    });
    let Some(after) = after else {
        return TokenKind::FuncCall;
    };
    match list[after].kind {
        TokenKind::BraceOpen | TokenKind::Colon => TokenKind::FuncDef,
        k if k.is_semicolon() => {
            let typed = list.prev_ncnl(pc).is_some_and(|prev| {
                let prev = &list[prev];
                prev.kind.is_type_like()
                    || matches!(prev.kind, TokenKind::Word | TokenKind::Star | TokenKind::Amp)
                    || prev.kind == TokenKind::Inv
            });
            if typed {
                TokenKind::FuncProto
            } else {
                TokenKind::FuncCall
            }
        }
        _ => TokenKind::FuncCall,
    }
}

/// Words and stars before a function name form its return type
fn mark_return_type(list: &mut ChunkList, pc: ChunkId) {
    let mut cur = list.prev_ncnl(pc);
    while let Some(id) = cur {
        match list[id].kind {
            TokenKind::Word => retype(list, id, TokenKind::Type),
            TokenKind::Star => retype(list, id, TokenKind::PtrType),
            TokenKind::Amp => retype(list, id, TokenKind::ByRef),
            TokenKind::Type | TokenKind::Qualifier | TokenKind::PtrType | TokenKind::ByRef => {}
            _ => break,
        }
        cur = list.prev_ncnl(id);
    }
}

fn mark_sizeof(list: &mut ChunkList, pc: ChunkId) -> bool {
    let Some(open) = list.next_ncnl(pc) else {
        return false;
    };
    if list[open].kind != TokenKind::ParenOpen {
        return false;
    }
    set_group_parent(list, open, TokenKind::Sizeof);
    true
}

// ===== DECLARATIONS =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclContext {
    Statement,
    Parameter,
}

/// `enclosing` is the opener around `pc`, which also encloses a comma before it
fn declaration_context(
    list: &ChunkList,
    pc: ChunkId,
    enclosing: Option<ChunkId>,
) -> Option<DeclContext> {
    if follows_statement_end(list, pc) {
        return Some(DeclContext::Statement);
    }
    let prev = &list[list.prev_ncnl(pc)?];
    match prev.kind {
        TokenKind::Colon => Some(DeclContext::Statement),
        TokenKind::FParenOpen => Some(DeclContext::Parameter),
        TokenKind::SParenOpen => match prev.parent_kind {
            TokenKind::For => Some(DeclContext::Statement),
            TokenKind::Catch => Some(DeclContext::Parameter),
            _ => None,
        },
        TokenKind::Comma => enclosing
            .filter(|&open| list[open].kind == TokenKind::FParenOpen)
            .map(|_| DeclContext::Parameter),
        _ => None,
    }
}

/// `new x`, `static Float:x`: a leading keyword declares without naming a type
fn declared_by_keyword(list: &ChunkList, pc: ChunkId) -> bool {
    let mut keyword = None;
    let mut cur = list.prev_ncnl(pc);
    while let Some(id) = cur {
        match list[id].kind {
            TokenKind::Tag | TokenKind::TagColon => {}
            TokenKind::New | TokenKind::Qualifier => keyword = Some(id),
            _ => break,
        }
        cur = list.prev_ncnl(id);
    }
    keyword.is_some_and(|id| list[id].has_flag(ChunkFlags::STMT_START))
}

/// Chunks that may follow the name in a declaration
fn ends_declarator(list: &ChunkList, id: ChunkId) -> bool {
    let chunk = &list[id];
    match chunk.kind {
        TokenKind::Semicolon
        | TokenKind::VSemicolon
        | TokenKind::Comma
        | TokenKind::TSquare
        | TokenKind::SquareOpen
        | TokenKind::FParenClose
        | TokenKind::SParenClose
        | TokenKind::ParenClose
        | TokenKind::BraceOpen
        | TokenKind::Colon => true,
        TokenKind::Assign => chunk.text == "=",
        _ => false,
    }
}

/// `Type name`, `Word Word` and `Word * Word` at a statement or parameter start
fn mark_declaration(
    list: &mut ChunkList,
    pc: ChunkId,
    enclosing: Option<ChunkId>,
    pointers: bool,
) -> bool {
    let keyword = declared_by_keyword(list, pc);
    let Some(context) =
        declaration_context(list, pc, enclosing).or(keyword.then_some(DeclContext::Statement))
    else {
        return false;
    };

    let mut head = Vec::new();
    let mut cur = Some(pc);
    while let Some(id) = cur {
        match list[id].kind {
            TokenKind::Type
            | TokenKind::Qualifier
            | TokenKind::Word
            | TokenKind::Struct
            | TokenKind::Union
            | TokenKind::Enum
            | TokenKind::Class
            | TokenKind::PtrType
            | TokenKind::ByRef => head.push(id),
            TokenKind::Star | TokenKind::Amp if pointers && !head.is_empty() => head.push(id),
            _ => break,
        }
        cur = list.next_ncnl(id);
    }

    let Some(term) = cur else { return false };
    let Some((&name, types)) = head.split_last() else {
        return false;
    };
    if list[name].kind != TokenKind::Word
        || !(keyword
            || types
                .iter()
                .any(|&t| matches!(list[t].kind, TokenKind::Word | TokenKind::Type)))
        || !ends_declarator(list, term)
    {
        return false;
    }

    for &id in types {
        match list[id].kind {
            TokenKind::Word => retype(list, id, TokenKind::Type),
            TokenKind::Star => retype(list, id, TokenKind::PtrType),
            TokenKind::Amp => retype(list, id, TokenKind::ByRef),
            _ => {}
        }
    }
    list[name].flags.insert(ChunkFlags::VAR_DEF);
    trace!("declares '{}'", list[name].text);

    if context == DeclContext::Statement
        && matches!(
            list[term].kind,
            TokenKind::Comma
                | TokenKind::Assign
                | TokenKind::BraceOpen
                | TokenKind::SquareOpen
                | TokenKind::TSquare
        )
    {
        mark_more_declarators(list, term, pointers);
    }
    true
}

/// `int a, *b, c = 1;`: the names after each comma, starting at the end of the first
fn mark_more_declarators(list: &mut ChunkList, start: ChunkId, pointers: bool) {
    let level = list[start].level;
    let mut expect_name = false;
    let mut cur = Some(start);

    while let Some(id) = cur {
        let chunk = &list[id];
        if chunk.level < level {
            break;
        }
        if chunk.level == level {
            match chunk.kind {
                TokenKind::Semicolon | TokenKind::VSemicolon => break,
                TokenKind::Comma => expect_name = true,
                TokenKind::Assign | TokenKind::BraceOpen => expect_name = false,
                TokenKind::Star if expect_name && pointers => retype(list, id, TokenKind::PtrType),
                TokenKind::Amp if expect_name && pointers => retype(list, id, TokenKind::ByRef),
                TokenKind::Word if expect_name => {
                    list[id].flags.insert(ChunkFlags::VAR_DEF);
                    expect_name = false;
                }
                _ => {}
            }
        }
        cur = list.next_ncnl(id);
    }
}

// ===== CASTS AND OPERATORS =====

fn starts_operand(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Word
            | TokenKind::Number
            | TokenKind::NumberFp
            | TokenKind::String
            | TokenKind::Char
            | TokenKind::ParenOpen
            | TokenKind::FuncCall
            | TokenKind::Macro
            | TokenKind::Not
            | TokenKind::Inv
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Amp
            | TokenKind::IncDecBefore
            | TokenKind::Sizeof
    )
}

/// `(type) operand`
fn mark_cast(list: &mut ChunkList, pc: ChunkId) -> bool {
    if list[pc].parent_kind != TokenKind::None {
        return false;
    }
    let Some(close) = list.skip_to_match(pc) else {
        return false;
    };

    let mut inner = Vec::new();
    let mut cur = list.next_ncnl(pc);
    while let Some(id) = cur.filter(|&id| id != close) {
        inner.push(id);
        cur = list.next_ncnl(id);
    }
    let Some(&last) = inner.last() else {
        return false;
    };

    let allowed = inner.iter().all(|&id| {
        matches!(
            list[id].kind,
            TokenKind::Type
                | TokenKind::Qualifier
                | TokenKind::Word
                | TokenKind::Star
                | TokenKind::Amp
                | TokenKind::PtrType
                | TokenKind::ByRef
                | TokenKind::TSquare
                | TokenKind::Struct
                | TokenKind::Union
                | TokenKind::Enum
        )
    });
    let has_type = inner.iter().any(|&id| {
        matches!(
            list[id].kind,
            TokenKind::Type | TokenKind::Qualifier | TokenKind::Struct | TokenKind::Union | TokenKind::Enum
        )
    });
    let words = inner
        .iter()
        .filter(|&&id| list[id].kind == TokenKind::Word)
        .count();
    let ends_ptr = matches!(
        list[last].kind,
        TokenKind::Star | TokenKind::Amp | TokenKind::PtrType | TokenKind::ByRef
    );
    if !allowed || !(has_type || (ends_ptr && words == 1)) {
        return false;
    }
    if !list
        .next_ncnl(close)
        .is_some_and(|after| starts_operand(list[after].kind))
    {
        return false;
    }

    for &id in &inner {
        match list[id].kind {
            TokenKind::Word => retype(list, id, TokenKind::Type),
            TokenKind::Star => retype(list, id, TokenKind::PtrType),
            TokenKind::Amp => retype(list, id, TokenKind::ByRef),
            _ => {}
        }
    }
    list[pc].parent_kind = TokenKind::Cast;
    list[close].parent_kind = TokenKind::Cast;
    true
}

/// Whether the chunk leaves a value for a following binary operator
fn is_value(list: &ChunkList, id: ChunkId) -> bool {
    let chunk = &list[id];
    chunk.kind.ends_value()
        && !(chunk.kind == TokenKind::ParenClose && chunk.parent_kind == TokenKind::Cast)
}

/// Binary, unary or declarator meaning of `+ - * &`
fn resolve_operator(list: &mut ChunkList, pc: ChunkId, pointers: bool) -> bool {
    let prev = list.prev_ncnl(pc);
    let value = prev.is_some_and(|p| is_value(list, p));
    let typed = pointers && prev.is_some_and(|p| list[p].kind.is_type_like());

    let kind = match list[pc].kind {
        TokenKind::Plus if value => TokenKind::Arith,
        TokenKind::Plus => TokenKind::Pos,
        TokenKind::Minus if value => TokenKind::Arith,
        TokenKind::Minus => TokenKind::Neg,
        TokenKind::Star if typed => TokenKind::PtrType,
        TokenKind::Star if value || !pointers => TokenKind::Arith,
        TokenKind::Star => TokenKind::Deref,
        TokenKind::Amp if typed => TokenKind::ByRef,
        TokenKind::Amp if value || !pointers => TokenKind::Arith,
        TokenKind::Amp => TokenKind::Addr,
        _ => return false,
    };
    retype(list, pc, kind);
    true
}

// ===== BRACES =====

/// `Foo x{1}` and `int{3}`
fn mark_braced_init(list: &mut ChunkList, pc: ChunkId) -> bool {
    if list[pc].parent_kind != TokenKind::None {
        return false;
    }
    let Some(prev) = list.prev_ncnl(pc) else {
        return false;
    };
    let prev = &list[prev];
    if !(prev.has_flag(ChunkFlags::VAR_DEF) || prev.kind == TokenKind::Type) {
        return false;
    }
    set_group_parent(list, pc, TokenKind::BracedInit);
    true
}

/// `enum e {`, `struct s {`, `class c : base {`, `namespace n {`
fn mark_aggregate(list: &mut ChunkList, pc: ChunkId) -> bool {
    let kind = list[pc].kind;
    if kind == TokenKind::Class
        && list
            .prev_ncnl(pc)
            .is_some_and(|prev| list[prev].kind == TokenKind::Enum)
    {
        return false;
    }

    let level = list[pc].level;
    let mut cur = list.next_ncnl(pc);
    let open = loop {
        let Some(id) = cur else { return false };
        let chunk = &list[id];
        if chunk.level < level {
            return false;
        }
        if chunk.level == level {
            match chunk.kind {
                TokenKind::BraceOpen => break id,
                TokenKind::Semicolon
                | TokenKind::VSemicolon
                | TokenKind::Assign
                | TokenKind::ParenOpen
                | TokenKind::FParenOpen
                | TokenKind::BraceClose
                | TokenKind::VBraceClose => return false,
                _ => {}
            }
        }
        cur = list.next_ncnl(id);
    };

    set_group_parent(list, open, kind);
    let flag = match kind {
        TokenKind::Enum => ChunkFlags::IN_ENUM,
        TokenKind::Namespace => return true,
        _ => ChunkFlags::IN_STRUCT,
    };
    let Some(close) = list.skip_to_match(open) else {
        return true;
    };
    let mut cur = list.next(open);
    while let Some(id) = cur.filter(|&id| id != close) {
        list[id].flags.insert(flag);
        cur = list.next(id);
    }
    true
}

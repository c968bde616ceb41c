/// `BraceCleanup` - Nesting levels and virtual structure
///
/// Walks the stream once with a stack of open constructs and assigns
/// `level`, `brace_level` and `pp_level` to every chunk. Brace-less statement
/// bodies are wrapped in virtual braces, and every `#if` branch is balanced
/// against the first one so later passes see properly nested input.
use log::{debug, trace, warn};

use super::types::{BraceStage, ParseFrame};
use crate::chunk::{Chunk, ChunkFlags, ChunkId, ChunkList, TokenKind};
use crate::lang::LangFlags;

/// Resolve nesting for the whole stream
pub fn brace_cleanup(list: &mut ChunkList, lang: LangFlags) {
    let mut resolver = Resolver {
        list,
        lang,
        frame: ParseFrame::new(),
        pp_stack: Vec::new(),
        pp_line: None,
        line_pp_level: 0,
        virtual_count: 0,
        unmatched: 0,
    };
    resolver.run();
}

/// One open `#if` region
#[derive(Debug, Clone)]
struct PpBranch {
    /// Frame at the `#if`
    start: ParseFrame,
    /// Frame at the end of the first branch, once an `#else` was seen
    first_end: Option<ParseFrame>,
}

struct Resolver<'a> {
    list: &'a mut ChunkList,
    lang: LangFlags,
    frame: ParseFrame,
    pp_stack: Vec<PpBranch>,
    /// Scratch frame of the directive line being resolved
    pp_line: Option<ParseFrame>,
    line_pp_level: usize,
    virtual_count: usize,
    unmatched: usize,
}

impl Resolver<'_> {
    fn frame(&self) -> &ParseFrame {
        self.pp_line.as_ref().unwrap_or(&self.frame)
    }

    fn frame_mut(&mut self) -> &mut ParseFrame {
        match &mut self.pp_line {
            Some(frame) => frame,
            None => &mut self.frame,
        }
    }

    fn run(&mut self) {
        let mut cur = self.list.head();
        while let Some(pc) = cur {
            self.process(pc);
            cur = self.list.next_where(pc, |c| !c.is_virtual());
        }
        self.finish();
        debug!(
            "brace_cleanup: {} chunks, {} virtual inserted, {} unmatched closers",
            self.list.len(),
            self.virtual_count,
            self.unmatched
        );
    }

    fn process(&mut self, pc: ChunkId) {
        let in_pp = self.list[pc].has_flag(ChunkFlags::IN_PREPROC);
        if !in_pp && self.pp_line.is_some() {
            self.end_directive_line(pc);
        }
        if self.list[pc].kind == TokenKind::Preproc {
            self.start_directive_line(pc);
            return;
        }

        let pp_level = if in_pp {
            self.line_pp_level
        } else {
            self.pp_stack.len()
        };
        self.mark_pp(pc, pp_level);

        if !self.list[pc].is_significant() {
            if self.list[pc].kind == TokenKind::Newline
                && !in_pp
                && self.lang.intersects(LangFlags::PAWN)
            {
                self.pawn_statement_end(pc);
            }
            self.set_levels(pc);
            return;
        }
        self.parse_chunk(pc);
    }

    fn mark_pp(&mut self, pc: ChunkId, pp_level: usize) {
        let chunk = &mut self.list[pc];
        chunk.pp_level = pp_level;
        if pp_level > 0 {
            chunk.flags.insert(ChunkFlags::IN_PP_BRANCH);
        } else {
            chunk.flags.remove(ChunkFlags::IN_PP_BRANCH);
        }
    }

    fn set_levels(&mut self, pc: ChunkId) {
        let (level, brace_level) = {
            let frame = self.frame();
            (frame.level, frame.brace_level)
        };
        let chunk = &mut self.list[pc];
        chunk.level = level;
        chunk.brace_level = brace_level;
    }

    fn set_top_stage(&mut self, stage: BraceStage) {
        if let Some(top) = self.frame_mut().top_mut() {
            top.stage = stage;
        }
    }

    /// Insert a zero-width chunk before or after `at`, at the current levels
    fn insert_virtual(
        &mut self,
        kind: TokenKind,
        parent: TokenKind,
        at: ChunkId,
        after: bool,
    ) -> ChunkId {
        let src = &self.list[at];
        let mut chunk = Chunk::virtual_at(kind, src);
        if after {
            chunk.orig_col = src.orig_col_end;
            chunk.orig_col_end = src.orig_col_end;
            chunk.column = src.end_column();
        }
        chunk.parent_kind = parent;
        chunk.level = self.frame().level;
        chunk.brace_level = self.frame().brace_level;
        chunk.pp_level = if self.pp_line.is_some() {
            chunk.flags.insert(ChunkFlags::IN_PREPROC);
            self.line_pp_level
        } else {
            self.pp_stack.len()
        };
        if chunk.pp_level > 0 {
            chunk.flags.insert(ChunkFlags::IN_PP_BRANCH);
        } else {
            chunk.flags.remove(ChunkFlags::IN_PP_BRANCH);
        }

        self.virtual_count += 1;
        trace!(
            "virtual {kind} (parent {parent}) at {}:{}",
            chunk.orig_line,
            chunk.orig_col
        );
        if after {
            self.list.insert_after(at, chunk)
        } else {
            self.list.insert_before(at, chunk)
        }
    }

    fn parse_chunk(&mut self, pc: ChunkId) {
        if self.check_stage(pc) {
            self.set_levels(pc);
            return;
        }

        let kind = self.list[pc].kind;
        if kind.is_opener() {
            self.open(pc);
        } else if kind.is_closer() {
            self.close(pc);
        } else {
            self.set_levels(pc);
            if kind.is_semicolon() {
                self.end_statement(pc);
            } else {
                self.push_keyword(kind);
            }
        }
    }

    /// Advance a pending statement keyword; true if `pc` was consumed by it
    fn check_stage(&mut self, pc: ChunkId) -> bool {
        loop {
            let Some(top) = self.frame().top().copied() else {
                return false;
            };
            if top.is_opener() {
                return false;
            }
            let kind = self.list[pc].kind;

            match top.stage {
                BraceStage::Paren1 => {
                    if kind == TokenKind::ParenOpen {
                        self.list[pc].kind = TokenKind::SParenOpen;
                        self.list[pc].parent_kind = top.kind;
                        self.set_top_stage(BraceStage::Brace2);
                        return false;
                    }
                    if kind.is_closer() {
                        self.frame_mut().pop();
                        continue;
                    }
                    self.set_top_stage(BraceStage::Brace2);
                }
                BraceStage::Brace2 => {
                    if kind.is_closer() {
                        self.frame_mut().pop();
                        continue;
                    }
                    self.set_top_stage(BraceStage::Body);
                    if kind == TokenKind::BraceOpen {
                        self.list[pc].parent_kind = top.kind;
                    } else {
                        let vbrace = self.insert_virtual(TokenKind::VBraceOpen, top.kind, pc, false);
                        self.frame_mut()
                            .push_opener(TokenKind::VBraceOpen, top.kind, Some(vbrace));
                    }
                    return false;
                }
                BraceStage::Body => return false,
                BraceStage::Else => {
                    if kind == TokenKind::Else {
                        let chained = self
                            .list
                            .next_ncnl(pc)
                            .is_some_and(|next| self.list[next].kind == TokenKind::ElseIf);
                        if chained {
                            // the `else if` carries on as its own entry
                            self.frame_mut().pop();
                        } else if let Some(entry) = self.frame_mut().top_mut() {
                            entry.kind = TokenKind::Else;
                            entry.parent = TokenKind::Else;
                            entry.stage = BraceStage::Brace2;
                        }
                        return true;
                    }
                    self.abandon_statement(pc);
                }
                BraceStage::While => {
                    if kind == TokenKind::While {
                        self.list[pc].kind = TokenKind::WhileOfDo;
                        self.set_top_stage(BraceStage::WodParen);
                        return true;
                    }
                    self.abandon_statement(pc);
                }
                BraceStage::WodParen => {
                    if kind == TokenKind::ParenOpen {
                        self.list[pc].kind = TokenKind::SParenOpen;
                        self.list[pc].parent_kind = TokenKind::WhileOfDo;
                        self.set_top_stage(BraceStage::WodSemi);
                        return false;
                    }
                    self.abandon_statement(pc);
                }
                BraceStage::WodSemi => {
                    self.frame_mut().pop();
                    if kind.is_semicolon() {
                        self.list[pc].parent_kind = TokenKind::WhileOfDo;
                        return false;
                    }
                    self.close_after_statement(pc);
                }
                BraceStage::Catch => {
                    if kind == TokenKind::Catch {
                        if let Some(entry) = self.frame_mut().top_mut() {
                            entry.kind = TokenKind::Catch;
                            entry.parent = TokenKind::Catch;
                            entry.stage = BraceStage::Paren1;
                        }
                        return true;
                    }
                    self.abandon_statement(pc);
                }
            }
        }
    }

    fn push_keyword(&mut self, kind: TokenKind) {
        match kind {
            TokenKind::If
            | TokenKind::ElseIf
            | TokenKind::For
            | TokenKind::While
            | TokenKind::Switch
            | TokenKind::Catch => self.frame_mut().push_statement(kind, BraceStage::Paren1),
            TokenKind::Else | TokenKind::Do | TokenKind::Try => {
                self.frame_mut().push_statement(kind, BraceStage::Brace2);
            }
            _ => {}
        }
    }

    fn open(&mut self, pc: ChunkId) {
        let kind = self.list[pc].kind;
        if kind == TokenKind::BraceOpen
            && self.list[pc].parent_kind == TokenKind::None
            && self.in_expression(pc)
        {
            self.list[pc].parent_kind = TokenKind::BracedInit;
        }
        self.set_levels(pc);
        let parent = self.list[pc].parent_kind;
        self.frame_mut().push_opener(kind, parent, Some(pc));
    }

    /// A `{` in expression context starts an initializer list
    fn in_expression(&self, pc: ChunkId) -> bool {
        let Some(prev) = self.list.prev_ncnl(pc) else {
            return false;
        };
        let prev = &self.list[prev];
        match prev.kind {
            TokenKind::Assign | TokenKind::Return => true,
            TokenKind::BraceOpen => prev.parent_kind == TokenKind::BracedInit,
            TokenKind::Comma
            | TokenKind::ParenOpen
            | TokenKind::SParenOpen
            | TokenKind::FParenOpen
            | TokenKind::SquareOpen => self.frame().top().is_some_and(|top| {
                top.kind.is_paren_open()
                    || top.kind == TokenKind::SquareOpen
                    || top.parent == TokenKind::BracedInit
            }),
            _ => false,
        }
    }

    fn close(&mut self, pc: ChunkId) {
        let kind = self.list[pc].kind;
        let matched = self
            .frame()
            .innermost_opener()
            .filter(|&index| self.frame().stack[index].kind.pairs_with(kind));

        let Some(index) = matched else {
            self.unmatched += 1;
            self.list[pc].flags.insert(ChunkFlags::UNMATCHED);
            self.set_levels(pc);
            let chunk = &self.list[pc];
            warn!(
                "unmatched '{}' at {}:{}",
                chunk.text, chunk.orig_line, chunk.orig_col
            );
            return;
        };

        // unwind virtual braces and statements opened inside the group
        while self.frame().stack.len() > index + 1 {
            if let Some(entry) = self.frame_mut().pop() {
                if entry.kind == TokenKind::VBraceOpen {
                    self.insert_virtual(TokenKind::VBraceClose, entry.parent, pc, false);
                }
            }
        }

        let Some(opener) = self.frame_mut().pop() else {
            return;
        };
        if let Some(closer) = opener.kind.closer() {
            self.list[pc].kind = closer;
        }
        self.list[pc].parent_kind = opener.parent;
        self.set_levels(pc);
        if kind.is_brace_close() {
            self.body_done(pc);
        }
    }

    fn end_statement(&mut self, pc: ChunkId) {
        if let Some(vbrace) = self.close_vbrace_after(pc) {
            self.body_done(vbrace);
        }
    }

    /// Close the virtual brace on top of the frame, if any
    fn close_vbrace_after(&mut self, after: ChunkId) -> Option<ChunkId> {
        if self.frame().top().map(|e| e.kind) != Some(TokenKind::VBraceOpen) {
            return None;
        }
        let entry = self.frame_mut().pop()?;
        Some(self.insert_virtual(TokenKind::VBraceClose, entry.parent, after, true))
    }

    /// A statement body just ended after `after`; finish the owning statements
    fn body_done(&mut self, mut after: ChunkId) {
        loop {
            let Some(top) = self.frame_mut().top_mut() else {
                return;
            };
            if top.is_opener() || top.stage != BraceStage::Body {
                return;
            }
            match top.kind {
                TokenKind::If | TokenKind::ElseIf => {
                    top.stage = BraceStage::Else;
                    return;
                }
                TokenKind::Do => {
                    top.stage = BraceStage::While;
                    return;
                }
                TokenKind::Try | TokenKind::Catch => {
                    top.stage = BraceStage::Catch;
                    return;
                }
                _ => {}
            }
            self.frame_mut().pop();
            match self.close_vbrace_after(after) {
                Some(vbrace) => after = vbrace,
                None => return,
            }
        }
    }

    /// The optional continuation (`else`, `catch`) did not come
    fn abandon_statement(&mut self, pc: ChunkId) {
        self.frame_mut().pop();
        self.close_after_statement(pc);
    }

    fn close_after_statement(&mut self, pc: ChunkId) {
        let in_line = self.pp_line.is_some();
        let last = self.list.prev_where(pc, |c| {
            c.is_significant() && (in_line || !c.has_flag(ChunkFlags::IN_PREPROC))
        });
        if let Some(last) = last {
            if let Some(vbrace) = self.close_vbrace_after(last) {
                self.body_done(vbrace);
            }
        }
    }

    /// Pawn statements may end at a newline instead of a semicolon
    fn pawn_statement_end(&mut self, nl: ChunkId) {
        if self
            .frame()
            .top()
            .is_some_and(|e| e.is_opener() && !e.kind.is_brace_open())
        {
            return;
        }
        let Some(prev) = self.list.prev_nc(nl) else {
            return;
        };
        let last = &self.list[prev];
        if last.is_newline() || last.has_flag(ChunkFlags::IN_PREPROC) || !last.kind.ends_value() {
            return;
        }
        if let Some(next) = self.list.next_ncnl(nl) {
            if continues_expression(self.list[next].kind) {
                return;
            }
        }
        let vsemi = self.insert_virtual(TokenKind::VSemicolon, TokenKind::None, prev, true);
        self.parse_chunk(vsemi);
    }

    fn start_directive_line(&mut self, hash: ChunkId) {
        match self.list[hash].parent_kind {
            TokenKind::PpIf => {
                self.line_pp_level = self.pp_stack.len();
                self.pp_stack.push(PpBranch {
                    start: self.frame.clone(),
                    first_end: None,
                });
            }
            TokenKind::PpElse => {
                if let Some(branch) = self.pp_stack.last() {
                    let start = branch.start.clone();
                    match branch.first_end.clone() {
                        None => {
                            let end = self.frame.clone();
                            if let Some(branch) = self.pp_stack.last_mut() {
                                branch.first_end = Some(end);
                            }
                        }
                        Some(target) => self.balance_branch(hash, &target),
                    }
                    self.frame = start;
                    self.line_pp_level = self.pp_stack.len() - 1;
                } else {
                    self.stray_directive(hash);
                }
            }
            TokenKind::PpEndif => {
                if let Some(branch) = self.pp_stack.last() {
                    if let Some(target) = branch.first_end.clone() {
                        self.balance_branch(hash, &target);
                        self.frame = target;
                    }
                    self.pp_stack.pop();
                    self.line_pp_level = self.pp_stack.len();
                } else {
                    self.stray_directive(hash);
                }
            }
            _ => self.line_pp_level = self.pp_stack.len(),
        }

        self.mark_pp(hash, self.line_pp_level);
        self.set_levels(hash);
        self.pp_line = Some(ParseFrame::seeded(&self.frame));
    }

    fn stray_directive(&mut self, hash: ChunkId) {
        let chunk = &self.list[hash];
        warn!(
            "#{} without #if at {}:{}",
            self.list
                .next_ncnl(hash)
                .map_or("", |word| self.list[word].text.as_str()),
            chunk.orig_line,
            chunk.orig_col
        );
        self.line_pp_level = self.pp_stack.len();
    }

    fn end_directive_line(&mut self, pc: ChunkId) {
        if let Some(last) = self.list.prev(pc) {
            self.drain_directive_frame(last);
        }
        self.pp_line = None;
    }

    /// Close every group left open on a directive line
    fn drain_directive_frame(&mut self, mut after: ChunkId) {
        while let Some(entry) = self.pp_line.as_mut().and_then(ParseFrame::pop) {
            if let Some(closer) = entry.kind.closer() {
                after = self.insert_virtual(closer, entry.parent, after, true);
            }
        }
    }

    /// Make the branch ending at `hash` finish in the same state as `target`
    fn balance_branch(&mut self, hash: ChunkId, target: &ParseFrame) {
        let keep = self.frame.common_depth(target);
        let (closed, opened) = (self.frame.stack.len() - keep, target.stack.len() - keep);

        while self.frame.stack.len() > keep {
            let Some(entry) = self.frame.pop() else { break };
            if let Some(closer) = entry.kind.closer() {
                self.insert_virtual(closer, entry.parent, hash, false);
            }
        }
        for entry in &target.stack[keep..] {
            if entry.is_opener() {
                let open = self.insert_virtual(entry.kind, entry.parent, hash, false);
                self.frame.push_opener(entry.kind, entry.parent, Some(open));
            } else {
                self.frame.stack.push(*entry);
            }
        }

        if closed > 0 || opened > 0 {
            let chunk = &self.list[hash];
            debug!(
                "balanced #if branch at line {}: closed {closed}, opened {opened}",
                chunk.orig_line
            );
        }
    }

    fn finish(&mut self) {
        let Some(mut last) = self.list.tail() else {
            return;
        };
        if self.pp_line.is_some() {
            self.drain_directive_frame(last);
            self.pp_line = None;
            last = self.list.tail().unwrap_or(last);
        }
        while let Some(entry) = self.frame.pop() {
            if let Some(closer) = entry.kind.closer() {
                last = self.insert_virtual(closer, entry.parent, last, true);
            }
        }
        if !self.pp_stack.is_empty() {
            debug!("{} #if region(s) open at end of input", self.pp_stack.len());
        }
    }
}

/// Tokens that carry an expression over a line break
fn continues_expression(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Arith
            | TokenKind::Assign
            | TokenKind::Compare
            | TokenKind::Bool
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Amp
            | TokenKind::Question
            | TokenKind::Colon
            | TokenKind::Comma
            | TokenKind::Dot
            | TokenKind::Member
            | TokenKind::DcMember
            | TokenKind::BraceOpen
            | TokenKind::ParenOpen
            | TokenKind::SquareOpen
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{lexer::tokenize, tokenize_cleanup};

    fn resolve(src: &str, lang: LangFlags) -> ChunkList {
        let mut list = tokenize(src.as_bytes(), lang, 8);
        tokenize_cleanup(&mut list, lang);
        brace_cleanup(&mut list, lang);
        list
    }

    /// Significant chunks as text, virtual ones spelled `{v`, `}v`, `;v`
    fn render(list: &ChunkList) -> String {
        list.iter()
            .map(|id| &list[id])
            .filter(|c| c.is_significant())
            .map(|c| match (c.is_virtual(), c.kind) {
                (true, TokenKind::VBraceOpen) => "{v".to_string(),
                (true, TokenKind::VBraceClose) => "}v".to_string(),
                (true, TokenKind::VSemicolon) => ";v".to_string(),
                (true, kind) => format!("<{kind}>"),
                (false, _) => c.text.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn find(list: &ChunkList, text: &str) -> ChunkId {
        list.iter().find(|&id| list[id].text == text).unwrap()
    }

    #[test]
    fn test_virtual_braces_around_single_statement() {
        let list = resolve("if (a) b = 1;\n", LangFlags::C);
        assert_eq!(render(&list), "if ( a ) {v b = 1 ; }v");
        let paren = find(&list, "(");
        assert_eq!(list[paren].kind, TokenKind::SParenOpen);
        assert_eq!(list[paren].parent_kind, TokenKind::If);
        assert_eq!(list[find(&list, ")")].kind, TokenKind::SParenClose);
        assert_eq!(list[find(&list, "b")].level, 1);
        assert_eq!(list[find(&list, "a")].level, 1);
    }

    #[test]
    fn test_nested_brace_less_bodies_cascade() {
        let list = resolve("if (a) if (b) x; else y; z;", LangFlags::C);
        assert_eq!(
            render(&list),
            "if ( a ) {v if ( b ) {v x ; }v else {v y ; }v }v z ;"
        );
        assert_eq!(list[find(&list, "x")].level, 2);
        assert_eq!(list[find(&list, "z")].level, 0);
    }

    #[test]
    fn test_else_if_chain() {
        let list = resolve("if (a) x; else if (b) y; else z;", LangFlags::C);
        assert_eq!(
            render(&list),
            "if ( a ) {v x ; }v else if ( b ) {v y ; }v else {v z ; }v"
        );
        let tail = list.tail().unwrap();
        assert_eq!(list[tail].parent_kind, TokenKind::Else);
    }

    #[test]
    fn test_do_while() {
        let list = resolve("do x++; while (a);", LangFlags::C);
        assert_eq!(render(&list), "do {v x ++ ; }v while ( a ) ;");
        assert_eq!(list[find(&list, "while")].kind, TokenKind::WhileOfDo);
        let semi = list.tail().unwrap();
        assert_eq!(list[semi].parent_kind, TokenKind::WhileOfDo);
        assert_eq!(list[semi].level, 0);
    }

    #[test]
    fn test_braced_bodies_get_keyword_parent() {
        let list = resolve("for (i = 0; i < n; i++) { x; }", LangFlags::C);
        let open = find(&list, "{");
        let close = find(&list, "}");
        assert_eq!(list[open].parent_kind, TokenKind::For);
        assert_eq!(list[close].parent_kind, TokenKind::For);
        assert_eq!(list[find(&list, "x")].level, 1);
        assert_eq!(list[find(&list, "n")].level, 1);
        assert!(list.iter().all(|id| !list[id].is_virtual()));
    }

    #[test]
    fn test_braced_init_parents() {
        let list = resolve("int a[] = { 1, { 2 } }; f({3});", LangFlags::C);
        let braces: Vec<TokenKind> = list
            .iter()
            .filter(|&id| list[id].kind == TokenKind::BraceOpen)
            .map(|id| list[id].parent_kind)
            .collect();
        assert_eq!(braces, vec![TokenKind::BracedInit; 3]);

        let list = resolve("void f() { }", LangFlags::C);
        assert_eq!(list[find(&list, "{")].parent_kind, TokenKind::None);
    }

    #[test]
    fn test_unmatched_closer_is_noop() {
        let list = resolve("a ) b ; } c", LangFlags::C);
        let paren = find(&list, ")");
        assert!(list[paren].has_flag(ChunkFlags::UNMATCHED));
        assert!(list[find(&list, "}")].has_flag(ChunkFlags::UNMATCHED));
        assert!(list.iter().all(|id| list[id].level == 0));
    }

    #[test]
    fn test_open_groups_closed_at_eof() {
        let list = resolve("{ ( [ x", LangFlags::C);
        let tail: Vec<(TokenKind, usize)> = list
            .iter()
            .filter(|&id| list[id].is_virtual())
            .map(|id| (list[id].kind, list[id].level))
            .collect();
        assert_eq!(
            tail,
            vec![
                (TokenKind::SquareClose, 2),
                (TokenKind::ParenClose, 1),
                (TokenKind::BraceClose, 0),
            ]
        );
        assert_eq!(list[find(&list, "x")].level, 3);
    }

    #[test]
    fn test_preproc_branches_with_same_shape() {
        let src = "#if A\nif (x) {\n#else\nif (y) {\n#endif\n  z;\n}\n";
        let list = resolve(src, LangFlags::C);
        assert!(list.iter().all(|id| !list[id].is_virtual()));
        let x = find(&list, "x");
        assert_eq!(list[x].pp_level, 1);
        assert!(list[x].has_flag(ChunkFlags::IN_PP_BRANCH));
        let z = find(&list, "z");
        assert_eq!(list[z].level, 1);
        assert_eq!(list[z].pp_level, 0);
        let close = find(&list, "}");
        assert_eq!(list[close].level, 0);
        assert!(!list[close].has_flag(ChunkFlags::UNMATCHED));
    }

    #[test]
    fn test_preproc_short_branch_gets_virtual_opener() {
        let src = "#ifdef X\nvoid f() {\n#else\nvoid g() {\n}\n#endif\n}\n";
        let list = resolve(src, LangFlags::C);
        let virtuals: Vec<TokenKind> = list
            .iter()
            .filter(|&id| list[id].is_virtual())
            .map(|id| list[id].kind)
            .collect();
        assert_eq!(virtuals, vec![TokenKind::BraceOpen]);
        let last_close = list
            .iter()
            .filter(|&id| list[id].kind == TokenKind::BraceClose)
            .last()
            .unwrap();
        assert_eq!(list[last_close].level, 0);
        assert!(!list[last_close].has_flag(ChunkFlags::UNMATCHED));
    }

    #[test]
    fn test_preproc_deep_branch_gets_virtual_closer() {
        let src = "#if A\nx;\n#else\nif (b) {\n#endif\ny;\n";
        let list = resolve(src, LangFlags::C);
        let virtuals: Vec<(TokenKind, usize)> = list
            .iter()
            .filter(|&id| list[id].is_virtual())
            .map(|id| (list[id].kind, list[id].level))
            .collect();
        assert_eq!(virtuals, vec![(TokenKind::BraceClose, 0)]);
        assert_eq!(list[find(&list, "y")].level, 0);
    }

    #[test]
    fn test_stray_directives_ignored() {
        let list = resolve("#endif\nx;\n#else\ny;\n", LangFlags::C);
        assert_eq!(list[find(&list, "x")].level, 0);
        assert_eq!(list[find(&list, "y")].pp_level, 0);
    }

    #[test]
    fn test_directive_line_uses_scratch_frame() {
        let list = resolve("#define BEGIN {\nx;\n", LangFlags::C);
        let brace = find(&list, "{");
        assert!(list[brace].has_flag(ChunkFlags::IN_PREPROC));
        assert_eq!(list[find(&list, "x")].level, 0);
    }

    #[test]
    fn test_directive_line_openers_closed_at_line_end() {
        let list = resolve("#define M { ( [\nint x;\n", LangFlags::C);
        let closers: Vec<(TokenKind, usize, bool)> = list
            .iter()
            .filter(|&id| list[id].is_virtual())
            .map(|id| {
                let chunk = &list[id];
                (chunk.kind, chunk.level, chunk.has_flag(ChunkFlags::IN_PREPROC))
            })
            .collect();
        assert_eq!(
            closers,
            vec![
                (TokenKind::SquareClose, 2, true),
                (TokenKind::ParenClose, 1, true),
                (TokenKind::BraceClose, 0, true),
            ]
        );
        // the closers sit before the newline that ends the directive
        let nl = list
            .iter()
            .find(|&id| list[id].is_newline())
            .unwrap();
        let before_nl = list.prev(nl).unwrap();
        assert_eq!(list[before_nl].kind, TokenKind::BraceClose);
        assert_eq!(list[find(&list, "x")].level, 0);
        assert_eq!(list[find(&list, "x")].brace_level, 0);
    }

    #[test]
    fn test_directive_line_closes_inside_if_branch() {
        let src = "#if A\n#define M {\n#endif\nx;\n";
        let list = resolve(src, LangFlags::C);
        let opens = list.iter().filter(|&id| list[id].kind.is_opener()).count();
        let closes = list.iter().filter(|&id| list[id].kind.is_closer()).count();
        assert_eq!(opens, closes);
        let x = find(&list, "x");
        assert_eq!(list[x].level, 0);
        assert_eq!(list[x].pp_level, 0);
    }

    #[test]
    fn test_pawn_virtual_semicolons() {
        let src = "main()\n{\n    new a = 1\n    if (a)\n        a++\n}\n";
        let list = resolve(src, LangFlags::PAWN);
        assert_eq!(
            render(&list),
            "main ( ) { new a = 1 ;v if ( a ) {v a ++ ;v }v }"
        );
        let close = list
            .iter()
            .filter(|&id| list[id].kind == TokenKind::BraceClose)
            .last()
            .unwrap();
        assert_eq!(list[close].level, 0);
    }
}

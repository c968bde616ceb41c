/// `Aligner` - Vertical alignment of braced initializer lists
///
/// Aligns the opening brace of `Type name{...}` initializers that appear on
/// consecutive lines:
/// 1. Paren and square groups are skipped; their line span still counts
/// 2. Nested statement braces open a scope that is aligned on its own
/// 3. A closing brace ends the current scope
/// 4. Only the first braced initializer on a line that declares exactly one
///    variable becomes an anchor; a second declaration on the line drops the group
///
/// Open scopes live on an explicit stack, so nesting depth is bounded by
/// memory rather than by the call stack.
use log::debug;

use crate::chunk::{ChunkFlags, ChunkId, ChunkList, TokenKind};

use super::align_stack::AlignStack;

/// Alignment state of one brace scope
struct Scope {
    stack: AlignStack,
    var_def_cnt: usize,
    equ_count: usize,
    /// Line breaks seen in this scope and the scopes it contained
    nl_count: usize,
}

impl Scope {
    fn new(span: usize, thresh: usize) -> Self {
        Self {
            stack: AlignStack::new(span, thresh),
            var_def_cnt: 0,
            equ_count: 0,
            nl_count: 0,
        }
    }

    fn new_lines(&mut self, list: &mut ChunkList, count: usize) {
        self.stack.new_lines(list, count);
        self.nl_count += count;
        self.var_def_cnt = 0;
        self.equ_count = 0;
    }
}

/// Align braced initializer lists from `first` to the end of its brace scope
///
/// Returns the chunk after the closing brace that ended the scope, or `None`
/// at the end of the stream. Line breaks seen on the way, including those
/// inside nested scopes, are added to `nl_count`.
pub fn align_braced_init_list(
    list: &mut ChunkList,
    first: Option<ChunkId>,
    span: usize,
    thresh: usize,
    nl_count: &mut usize,
) -> Option<ChunkId> {
    let mut scopes = vec![Scope::new(span, thresh)];
    let mut pc = first;

    while let Some(id) = pc {
        let kind = list[id].kind;
        let nested = scopes.len() > 1;

        if kind.is_brace_open() && list[id].parent_kind != TokenKind::BracedInit {
            scopes.push(Scope::new(span, thresh));
            pc = list.next(id);
            continue;
        }

        let Some(scope) = scopes.last_mut() else {
            break;
        };

        if kind.is_paren_open() || kind == TokenKind::SquareOpen {
            pc = skip_group(list, id, &mut scope.stack);
            continue;
        }

        if kind.is_brace_close() {
            let lines = scope.nl_count;
            scope.stack.end(list);
            if !nested {
                *nl_count += lines;
                return list.next(id);
            }
            scopes.pop();
            if lines > 0 {
                if let Some(outer) = scopes.last_mut() {
                    outer.new_lines(list, lines);
                }
            }
            pc = list.next(id);
            continue;
        }

        if list[id].is_newline() {
            let lines = list[id].nl_count.max(1);
            scope.new_lines(list, lines);
        } else if list[id].has_flag(ChunkFlags::VAR_DEF) {
            scope.var_def_cnt += 1;
        } else if scope.var_def_cnt > 1 {
            scope.stack.reset();
        } else if scope.equ_count == 0 && kind == TokenKind::BraceOpen {
            // only braced initializers get this far
            scope.equ_count += 1;
            if scope.var_def_cnt != 0 {
                scope.stack.add(list, id);
            }
        }

        if kind == TokenKind::BraceOpen {
            // the initializer body is data, not a nested scope
            pc = skip_group(list, id, &mut scope.stack);
            continue;
        }
        pc = list.next(id);
    }

    // end of input: close the scopes innermost first
    while let Some(mut scope) = scopes.pop() {
        scope.stack.end(list);
        match scopes.last_mut() {
            Some(outer) if scope.nl_count > 0 => outer.new_lines(list, scope.nl_count),
            Some(_) => {}
            None => *nl_count += scope.nl_count,
        }
    }
    None
}

/// Step over a bracketed group, feeding its line span to the stack
fn skip_group(list: &mut ChunkList, open: ChunkId, stack: &mut AlignStack) -> Option<ChunkId> {
    let Some(close) = list.skip_to_match(open) else {
        return list.next(open);
    };
    let lines = list[close].orig_line.saturating_sub(list[open].orig_line);
    if lines > 0 {
        stack.new_lines(list, lines);
    }
    list.next(close)
}

/// Run the alignment over the whole stream
pub fn align_braced_init_lists(list: &mut ChunkList, span: usize, thresh: usize) {
    if span == 0 {
        return;
    }
    let mut nl_count = 0;
    let mut pc = list.head();
    while pc.is_some() {
        pc = align_braced_init_list(list, pc, span, thresh, &mut nl_count);
    }
    let aligned = list
        .iter()
        .filter(|&id| list[id].has_flag(ChunkFlags::ALIGNED))
        .count();
    debug!("align_braced_init_lists: {aligned} anchor(s) aligned over {nl_count} line(s)");
}

/// `AlignStack` - Groups anchors on nearby lines into one column
///
/// Anchors are collected while they stay within `span` lines of the previous
/// anchor and within `thresh` columns of the group. When either limit is
/// exceeded the open group is flushed: every anchor, and the rest of its line,
/// moves right to the group's widest column.
use log::trace;

use crate::chunk::{ChunkFlags, ChunkId, ChunkList};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Anchor {
    id: ChunkId,
    /// Newline sequence number when the anchor was added
    seq: usize,
}

/// Open alignment group
#[derive(Debug, Clone)]
pub struct AlignStack {
    span: usize,
    /// Maximum column distance to the group, 0 for unlimited
    thresh: usize,
    anchors: Vec<Anchor>,
    min_col: usize,
    max_col: usize,
    seq: usize,
}

impl AlignStack {
    #[must_use]
    pub fn new(span: usize, thresh: usize) -> Self {
        Self {
            span,
            thresh,
            anchors: Vec::new(),
            min_col: usize::MAX,
            max_col: 0,
            seq: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    fn within_thresh(&self, col: usize) -> bool {
        self.thresh == 0
            || self.anchors.is_empty()
            || (col <= self.max_col + self.thresh && col + self.thresh >= self.min_col)
    }

    /// Add `id` as an anchor, flushing the open group first if it is out of reach
    pub fn add(&mut self, list: &mut ChunkList, id: ChunkId) {
        let col = list[id].column;
        let too_far = self
            .anchors
            .last()
            .is_some_and(|last| self.seq - last.seq > self.span);
        if too_far || !self.within_thresh(col) {
            self.flush(list);
        }

        self.anchors.push(Anchor { id, seq: self.seq });
        self.min_col = self.min_col.min(col);
        self.max_col = self.max_col.max(col);
        trace!(
            "align: anchor {}:{} col {col} ({} in group)",
            list[id].orig_line,
            list[id].orig_col,
            self.anchors.len()
        );
    }

    /// Account for `count` line breaks; a group left behind by `span` is flushed
    pub fn new_lines(&mut self, list: &mut ChunkList, count: usize) {
        self.seq += count;
        if self
            .anchors
            .last()
            .is_some_and(|last| self.seq - last.seq > self.span)
        {
            self.flush(list);
        }
    }

    /// Drop the open group without moving anything
    pub fn reset(&mut self) {
        self.anchors.clear();
        self.min_col = usize::MAX;
        self.max_col = 0;
    }

    /// Align the open group if it has at least two anchors
    ///
    /// The target is the largest anchor column in the group, whichever anchor
    /// holds it. Anchors only move right, so no line loses text to overlap.
    pub fn flush(&mut self, list: &mut ChunkList) {
        if self.anchors.len() >= 2 {
            let target = self
                .anchors
                .iter()
                .map(|a| list[a.id].column)
                .max()
                .unwrap_or(0);
            for anchor in &self.anchors {
                let delta = target.saturating_sub(list[anchor.id].column);
                if delta > 0 {
                    shift_rest_of_line(list, anchor.id, delta);
                }
                list[anchor.id].flags.insert(ChunkFlags::ALIGNED);
            }
            trace!("align: {} anchor(s) to col {target}", self.anchors.len());
        }
        self.reset();
    }

    /// Flush whatever is still open
    pub fn end(&mut self, list: &mut ChunkList) {
        self.flush(list);
    }
}

/// Move `id` and everything after it on the same line right by `delta`
fn shift_rest_of_line(list: &mut ChunkList, id: ChunkId, delta: usize) {
    let mut cur = Some(id);
    while let Some(c) = cur {
        if list[c].is_newline() {
            break;
        }
        list[c].column += delta;
        cur = list.next(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{Chunk, TokenKind};

    /// One `{` per line at the given columns, newline chunks in between
    fn lines(cols: &[usize]) -> (ChunkList, Vec<ChunkId>) {
        let mut list = ChunkList::new();
        let mut anchors = Vec::new();
        for (line, &col) in cols.iter().enumerate() {
            let mut brace = Chunk::new(TokenKind::BraceOpen, "{");
            brace.orig_line = line + 1;
            brace.orig_col = col;
            brace.orig_col_end = col + 1;
            brace.column = col;
            anchors.push(list.push_back(brace));
            let mut tail = Chunk::new(TokenKind::Semicolon, ";");
            tail.column = col + 1;
            tail.orig_col = col + 1;
            tail.orig_col_end = col + 2;
            list.push_back(tail);
            let mut nl = Chunk::new(TokenKind::Newline, "\n");
            nl.nl_count = 1;
            list.push_back(nl);
        }
        (list, anchors)
    }

    fn run(list: &mut ChunkList, anchors: &[ChunkId], span: usize, thresh: usize) {
        let mut stack = AlignStack::new(span, thresh);
        for &id in anchors {
            stack.add(list, id);
            stack.new_lines(list, 1);
        }
        stack.end(list);
    }

    #[test]
    fn test_group_moves_to_widest_column() {
        let (mut list, anchors) = lines(&[10, 6, 7]);
        run(&mut list, &anchors, 1, 8);
        for &id in &anchors {
            assert_eq!(list[id].column, 10);
            assert!(list[id].has_flag(ChunkFlags::ALIGNED));
        }
        // the rest of the line follows its anchor
        let tail = list.next(anchors[1]).unwrap();
        assert_eq!(list[tail].column, 11);
    }

    #[test]
    fn test_narrowest_first_still_moves_to_widest() {
        let (mut list, anchors) = lines(&[4, 9, 6]);
        run(&mut list, &anchors, 1, 0);
        let cols: Vec<usize> = anchors.iter().map(|&id| list[id].column).collect();
        assert_eq!(cols, vec![9, 9, 9]);
        let tail = list.next(anchors[0]).unwrap();
        assert_eq!(list[tail].column, 10);
    }

    #[test]
    fn test_single_anchor_untouched() {
        let (mut list, anchors) = lines(&[6]);
        run(&mut list, &anchors, 1, 0);
        assert_eq!(list[anchors[0]].column, 6);
        assert!(!list[anchors[0]].has_flag(ChunkFlags::ALIGNED));
    }

    #[test]
    fn test_threshold_splits_groups() {
        let (mut list, anchors) = lines(&[5, 6, 30, 28]);
        run(&mut list, &anchors, 1, 4);
        let cols: Vec<usize> = anchors.iter().map(|&id| list[id].column).collect();
        assert_eq!(cols, vec![6, 6, 30, 30]);
    }

    #[test]
    fn test_span_splits_groups() {
        let (mut list, anchors) = lines(&[8, 4]);
        let mut stack = AlignStack::new(1, 0);
        stack.add(&mut list, anchors[0]);
        stack.new_lines(&mut list, 3);
        assert!(stack.is_empty());
        stack.add(&mut list, anchors[1]);
        stack.end(&mut list);
        assert_eq!(list[anchors[1]].column, 4);
    }

    #[test]
    fn test_reset_discards_group() {
        let (mut list, anchors) = lines(&[8, 4]);
        let mut stack = AlignStack::new(2, 0);
        stack.add(&mut list, anchors[0]);
        stack.add(&mut list, anchors[1]);
        assert_eq!(stack.len(), 2);
        stack.reset();
        stack.end(&mut list);
        assert_eq!(list[anchors[1]].column, 4);
    }
}

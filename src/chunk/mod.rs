//! The token store.
//!
//! Every pass of the pipeline reads and rewrites one [`ChunkList`]:
//! - [`Chunk`]: one lexical unit with its kind, position, nesting level and flags
//! - [`ChunkList`]: an arena of chunks linked in source order by stable [`ChunkId`] handles
//! - [`TokenKind`] / [`ChunkFlags`]: the closed classification and the structural flag set

pub mod list;
pub mod types;

pub use list::{ChunkId, ChunkIter, ChunkList};
pub use types::{ChunkFlags, TokenKind};

/// One token of source text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    /// Source text (empty for virtual chunks)
    pub text: String,
    pub kind: TokenKind,
    /// Construct this chunk belongs to (e.g. the `if` owning a brace)
    pub parent_kind: TokenKind,
    /// 1-based source line of the first character
    pub orig_line: usize,
    /// 1-based source column of the first character
    pub orig_col: usize,
    /// Column just past the last character, on the chunk's last line
    pub orig_col_end: usize,
    /// Current column; starts at `orig_col`, moved by alignment
    pub column: usize,
    /// Number of line breaks in a newline chunk
    pub nl_count: usize,
    /// Paren/brace/square depth
    pub level: usize,
    /// Brace depth only
    pub brace_level: usize,
    /// Depth of enclosing `#if` regions
    pub pp_level: usize,
    pub flags: ChunkFlags,
    /// Width of the whitespace before this chunk on the same line
    pub ws_before: usize,
}

impl Chunk {
    /// Create a chunk with the given kind and text and no position
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind,
            ..Default::default()
        }
    }

    /// Create a zero-width virtual chunk positioned at `at`
    #[must_use]
    pub fn virtual_at(kind: TokenKind, at: &Chunk) -> Self {
        let mut flags = ChunkFlags::VIRTUAL;
        if at.flags.contains(ChunkFlags::IN_PP_BRANCH) {
            flags.insert(ChunkFlags::IN_PP_BRANCH);
        }
        Self {
            text: String::new(),
            kind,
            parent_kind: TokenKind::None,
            orig_line: at.orig_line,
            orig_col: at.orig_col,
            orig_col_end: at.orig_col,
            column: at.column,
            nl_count: 0,
            level: at.level,
            brace_level: at.brace_level,
            pp_level: at.pp_level,
            flags,
            ws_before: 0,
        }
    }

    #[must_use]
    pub fn is_newline(&self) -> bool {
        self.kind.is_newline()
    }

    #[must_use]
    pub fn is_comment(&self) -> bool {
        self.kind.is_comment()
    }

    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.flags.contains(ChunkFlags::VIRTUAL)
    }

    /// Newlines and comments carry no syntax
    #[must_use]
    pub fn is_significant(&self) -> bool {
        !self.is_newline() && !self.is_comment()
    }

    /// Length of the text in characters
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Column just past the chunk at its current position
    #[must_use]
    pub fn end_column(&self) -> usize {
        if self.text.contains('\n') {
            self.orig_col_end
        } else {
            self.column + self.orig_col_end.saturating_sub(self.orig_col)
        }
    }

    #[must_use]
    pub fn has_flag(&self, flag: ChunkFlags) -> bool {
        self.flags.contains(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_column_single_line() {
        let mut chunk = Chunk::new(TokenKind::Word, "foo");
        chunk.orig_col = 5;
        chunk.orig_col_end = 8;
        chunk.column = 5;
        assert_eq!(chunk.end_column(), 8);
        chunk.column = 9;
        assert_eq!(chunk.end_column(), 12);
    }

    #[test]
    fn test_end_column_multi_line() {
        let mut chunk = Chunk::new(TokenKind::CommentMulti, "/* a\n b */");
        chunk.orig_col = 3;
        chunk.column = 3;
        chunk.orig_col_end = 6;
        assert_eq!(chunk.end_column(), 6);
    }

    #[test]
    fn test_virtual_at() {
        let mut at = Chunk::new(TokenKind::Word, "x");
        at.orig_line = 4;
        at.orig_col = 7;
        at.orig_col_end = 8;
        at.column = 7;
        at.level = 2;
        let v = Chunk::virtual_at(TokenKind::VBraceOpen, &at);
        assert!(v.is_virtual());
        assert!(v.is_empty());
        assert_eq!(v.orig_line, 4);
        assert_eq!(v.level, 2);
        assert_eq!(v.end_column(), 7);
    }
}

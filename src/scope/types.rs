/// Parse frame entries for the level resolver
use std::fmt;

use crate::chunk::{ChunkId, TokenKind};

/// Where a statement keyword is in its `keyword (head) body` sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BraceStage {
    /// Expecting the parenthesised head (`if (`)
    Paren1,
    /// Expecting the body: a brace or a single statement
    Brace2,
    /// Inside the body
    Body,
    /// After an `if` body: an `else` may follow
    Else,
    /// After a `do` body: `while` must follow
    While,
    /// `while` of a do-while, expecting its paren
    WodParen,
    /// After the do-while paren, expecting `;`
    WodSemi,
    /// After a `try` or `catch` body: another `catch` may follow
    Catch,
}

impl fmt::Display for BraceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BraceStage::Paren1 => "PAREN1",
            BraceStage::Brace2 => "BRACE2",
            BraceStage::Body => "BODY",
            BraceStage::Else => "ELSE",
            BraceStage::While => "WHILE",
            BraceStage::WodParen => "WOD_PAREN",
            BraceStage::WodSemi => "WOD_SEMI",
            BraceStage::Catch => "CATCH",
        };
        write!(f, "{name}")
    }
}

/// One open construct: an opener chunk or a pending statement keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameEntry {
    /// Opener kind, or the statement keyword kind
    pub kind: TokenKind,
    /// Parent copied onto the matching closer
    pub parent: TokenKind,
    /// Only meaningful for statement entries
    pub stage: BraceStage,
    pub open: Option<ChunkId>,
}

impl FrameEntry {
    #[must_use]
    pub fn is_opener(&self) -> bool {
        self.kind.is_opener()
    }

    #[must_use]
    pub fn is_statement(&self) -> bool {
        !self.is_opener()
    }
}

/// Stack of open constructs plus the levels they produce
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseFrame {
    pub stack: Vec<FrameEntry>,
    pub level: usize,
    pub brace_level: usize,
}

impl ParseFrame {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty frame starting at the levels of `outer`
    #[must_use]
    pub fn seeded(outer: &ParseFrame) -> Self {
        Self {
            stack: Vec::new(),
            level: outer.level,
            brace_level: outer.brace_level,
        }
    }

    #[must_use]
    pub fn top(&self) -> Option<&FrameEntry> {
        self.stack.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut FrameEntry> {
        self.stack.last_mut()
    }

    pub fn push_opener(&mut self, kind: TokenKind, parent: TokenKind, open: Option<ChunkId>) {
        self.stack.push(FrameEntry {
            kind,
            parent,
            stage: BraceStage::Body,
            open,
        });
        self.level += 1;
        if kind.is_brace_open() {
            self.brace_level += 1;
        }
    }

    pub fn push_statement(&mut self, kind: TokenKind, stage: BraceStage) {
        self.stack.push(FrameEntry {
            kind,
            parent: kind,
            stage,
            open: None,
        });
    }

    /// Pop the top entry, unwinding the levels an opener added
    pub fn pop(&mut self) -> Option<FrameEntry> {
        let entry = self.stack.pop()?;
        if entry.is_opener() {
            self.level = self.level.saturating_sub(1);
            if entry.kind.is_brace_open() {
                self.brace_level = self.brace_level.saturating_sub(1);
            }
        }
        Some(entry)
    }

    /// Index of the innermost source opener, skipping virtual braces and statements
    #[must_use]
    pub fn innermost_opener(&self) -> Option<usize> {
        self.stack
            .iter()
            .rposition(|e| e.is_opener() && e.kind != TokenKind::VBraceOpen)
    }

    /// Length of the common prefix of two stacks, compared by kind
    #[must_use]
    pub fn common_depth(&self, other: &ParseFrame) -> usize {
        self.stack
            .iter()
            .zip(&other.stack)
            .take_while(|(a, b)| a.kind == b.kind)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_pop_levels() {
        let mut frame = ParseFrame::new();
        frame.push_opener(TokenKind::BraceOpen, TokenKind::None, None);
        frame.push_statement(TokenKind::If, BraceStage::Paren1);
        frame.push_opener(TokenKind::SParenOpen, TokenKind::If, None);
        assert_eq!(frame.level, 2);
        assert_eq!(frame.brace_level, 1);

        assert_eq!(frame.pop().map(|e| e.kind), Some(TokenKind::SParenOpen));
        assert_eq!(frame.level, 1);
        assert_eq!(frame.pop().map(|e| e.kind), Some(TokenKind::If));
        assert_eq!(frame.level, 1);
        frame.pop();
        assert_eq!((frame.level, frame.brace_level), (0, 0));
        assert!(frame.pop().is_none());
    }

    #[test]
    fn test_innermost_opener_skips_virtual() {
        let mut frame = ParseFrame::new();
        frame.push_opener(TokenKind::ParenOpen, TokenKind::None, None);
        frame.push_statement(TokenKind::If, BraceStage::Body);
        frame.push_opener(TokenKind::VBraceOpen, TokenKind::If, None);
        assert_eq!(frame.innermost_opener(), Some(0));
        assert!(frame.stack[1].is_statement());
    }

    #[test]
    fn test_common_depth() {
        let mut a = ParseFrame::new();
        a.push_opener(TokenKind::BraceOpen, TokenKind::None, None);
        a.push_opener(TokenKind::ParenOpen, TokenKind::None, None);
        let mut b = ParseFrame::new();
        b.push_opener(TokenKind::BraceOpen, TokenKind::None, None);
        assert_eq!(a.common_depth(&b), 1);
        b.push_opener(TokenKind::SquareOpen, TokenKind::None, None);
        assert_eq!(a.common_depth(&b), 1);
        assert_eq!(ParseFrame::seeded(&a).level, 2);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(BraceStage::WodSemi.to_string(), "WOD_SEMI");
    }
}

//! Spacing option detection.
//!
//! Scans a fully classified token stream and infers spacing options from how
//! the file is already written:
//! - [`votes`]: the per-option vote accumulator and its decision rule
//! - [`settings`]: option ids, values and the explicit/detected settings table
//!
//! Each detector looks at one category of chunk and votes on the gap to its
//! neighbours. Options the user set explicitly are never overwritten.

pub mod settings;
pub mod votes;

use log::debug;

use crate::chunk::{ChunkFlags, ChunkId, ChunkList, TokenKind};

pub use settings::{OptionId, Settings, SpaceOption};
pub use votes::SpaceVotes;

/// Neighbour on the left, skipping virtual chunks
fn before(list: &ChunkList, id: ChunkId) -> Option<ChunkId> {
    list.prev_where(id, |c| !c.is_virtual())
}

/// Neighbour on the right, skipping virtual chunks
fn after(list: &ChunkList, id: ChunkId) -> Option<ChunkId> {
    list.next_where(id, |c| !c.is_virtual())
}

fn vote_before(votes: &mut SpaceVotes, list: &ChunkList, id: ChunkId) {
    if let Some(prev) = before(list, id) {
        votes.vote(&list[prev], &list[id]);
    }
}

fn vote_after(votes: &mut SpaceVotes, list: &ChunkList, id: ChunkId) {
    if let Some(next) = after(list, id) {
        votes.vote(&list[id], &list[next]);
    }
}

/// Significant source chunks in stream order
fn source_chunks(list: &ChunkList) -> impl Iterator<Item = ChunkId> + '_ {
    list.iter()
        .filter(|&id| list[id].is_significant() && !list[id].is_virtual())
}

/// Votes for one option over the whole stream
#[must_use]
pub fn collect_votes(list: &ChunkList, option: OptionId) -> SpaceVotes {
    let mut votes = SpaceVotes::new();

    for id in source_chunks(list) {
        let chunk = &list[id];
        let next_kind = after(list, id).map(|n| list[n].kind);
        match option {
            OptionId::SpArith if chunk.kind == TokenKind::Arith => {
                vote_after(&mut votes, list, id);
                vote_before(&mut votes, list, id);
            }
            OptionId::SpBeforeAssign
                if chunk.kind == TokenKind::Assign && !chunk.has_flag(ChunkFlags::IN_ENUM) =>
            {
                vote_before(&mut votes, list, id);
            }
            OptionId::SpAfterAssign
                if chunk.kind == TokenKind::Assign && !chunk.has_flag(ChunkFlags::IN_ENUM) =>
            {
                vote_after(&mut votes, list, id);
            }
            OptionId::SpEnumAssign
                if chunk.kind == TokenKind::Assign && chunk.has_flag(ChunkFlags::IN_ENUM) =>
            {
                vote_before(&mut votes, list, id);
                vote_after(&mut votes, list, id);
            }
            OptionId::SpBool if chunk.kind == TokenKind::Bool => {
                vote_before(&mut votes, list, id);
                vote_after(&mut votes, list, id);
            }
            OptionId::SpCompare if chunk.kind == TokenKind::Compare => {
                vote_before(&mut votes, list, id);
                vote_after(&mut votes, list, id);
            }
            OptionId::SpBeforeComma if chunk.kind == TokenKind::Comma => {
                vote_before(&mut votes, list, id);
            }
            OptionId::SpAfterComma if chunk.kind == TokenKind::Comma => {
                vote_after(&mut votes, list, id);
            }
            OptionId::SpBeforeSemi if chunk.kind == TokenKind::Semicolon => {
                // `for (;;)` says nothing about statement ends
                let empty = before(list, id).is_some_and(|p| {
                    matches!(list[p].kind, TokenKind::Semicolon | TokenKind::SParenOpen)
                });
                if !empty {
                    vote_before(&mut votes, list, id);
                }
            }
            OptionId::SpInsideParen
                if chunk.kind == TokenKind::ParenOpen && next_kind != Some(TokenKind::ParenClose) =>
            {
                vote_after(&mut votes, list, id);
            }
            OptionId::SpInsideParen if chunk.kind == TokenKind::ParenClose => {
                let empty = before(list, id).is_some_and(|p| list[p].kind == TokenKind::ParenOpen);
                if !empty {
                    vote_before(&mut votes, list, id);
                }
            }
            OptionId::SpParenBrace
                if chunk.kind.is_paren_close() && next_kind == Some(TokenKind::BraceOpen) =>
            {
                vote_after(&mut votes, list, id);
            }
            OptionId::SpBeforeSparen
                if chunk.kind.takes_sparen() && next_kind == Some(TokenKind::SParenOpen) =>
            {
                vote_after(&mut votes, list, id);
            }
            OptionId::SpInsideSparen if chunk.kind == TokenKind::SParenOpen => {
                vote_after(&mut votes, list, id);
            }
            OptionId::SpInsideSparen if chunk.kind == TokenKind::SParenClose => {
                vote_before(&mut votes, list, id);
            }
            OptionId::SpFuncCallParen
                if chunk.kind == TokenKind::FuncCall && next_kind == Some(TokenKind::FParenOpen) =>
            {
                vote_after(&mut votes, list, id);
            }
            _ => {}
        }
    }
    votes
}

/// Run every detector and store the results that are not explicit
pub fn detect_spacing(list: &ChunkList, settings: &mut Settings) {
    for option in OptionId::ALL {
        if settings.is_explicit(option) {
            debug!("{option}: explicit, not detected");
            continue;
        }
        let votes = collect_votes(list, option);
        let value = votes.result();
        debug!(
            "{option}: add={} remove={} force={} -> {value}",
            votes.add, votes.remove, votes.force
        );
        settings.set_detected(option, value);
    }
}

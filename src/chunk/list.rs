/// `ChunkList` - arena-backed doubly linked token stream
///
/// Chunks live in slots addressed by [`ChunkId`] handles. Links are stored as
/// handles, so removing a chunk only has to repair its two neighbours. A freed
/// slot bumps its generation; a handle to a removed chunk can never reach the
/// chunk that later reuses the slot.
use std::ops::{Index, IndexMut};

use super::{Chunk, TokenKind};

/// Stable handle to a chunk in a [`ChunkList`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    chunk: Option<Chunk>,
    prev: Option<ChunkId>,
    next: Option<ChunkId>,
}

/// Ordered, mutable token stream
#[derive(Debug, Default)]
pub struct ChunkList {
    slots: Vec<Slot>,
    free: Vec<u32>,
    head: Option<ChunkId>,
    tail: Option<ChunkId>,
    len: usize,
}

impl ChunkList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn head(&self) -> Option<ChunkId> {
        self.head
    }

    #[must_use]
    pub fn tail(&self) -> Option<ChunkId> {
        self.tail
    }

    /// Whether `id` refers to a live chunk
    #[must_use]
    pub fn contains(&self, id: ChunkId) -> bool {
        self.slots
            .get(id.index as usize)
            .is_some_and(|slot| slot.generation == id.generation && slot.chunk.is_some())
    }

    #[must_use]
    pub fn get(&self, id: ChunkId) -> Option<&Chunk> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.chunk.as_ref())
    }

    pub fn get_mut(&mut self, id: ChunkId) -> Option<&mut Chunk> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.chunk.as_mut())
    }

    fn slot(&self, id: ChunkId) -> &Slot {
        match self.slots.get(id.index as usize) {
            Some(slot) if slot.generation == id.generation && slot.chunk.is_some() => slot,
            _ => panic!("stale chunk handle {id:?}"),
        }
    }

    fn slot_mut(&mut self, id: ChunkId) -> &mut Slot {
        match self.slots.get_mut(id.index as usize) {
            Some(slot) if slot.generation == id.generation && slot.chunk.is_some() => slot,
            _ => panic!("stale chunk handle {id:?}"),
        }
    }

    fn alloc(&mut self, chunk: Chunk) -> ChunkId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.chunk = Some(chunk);
            slot.prev = None;
            slot.next = None;
            return ChunkId {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).expect("chunk arena exceeds u32 slots");
        self.slots.push(Slot {
            generation: 0,
            chunk: Some(chunk),
            prev: None,
            next: None,
        });
        ChunkId {
            index,
            generation: 0,
        }
    }

    /// Append a chunk at the end of the stream
    pub fn push_back(&mut self, chunk: Chunk) -> ChunkId {
        let id = self.alloc(chunk);
        match self.tail {
            Some(tail) => {
                self.slot_mut(tail).next = Some(id);
                self.slot_mut(id).prev = Some(tail);
            }
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    /// Insert a chunk directly after `after`
    pub fn insert_after(&mut self, after: ChunkId, chunk: Chunk) -> ChunkId {
        let next = self.slot(after).next;
        let id = self.alloc(chunk);
        {
            let slot = self.slot_mut(id);
            slot.prev = Some(after);
            slot.next = next;
        }
        self.slot_mut(after).next = Some(id);
        match next {
            Some(next) => self.slot_mut(next).prev = Some(id),
            None => self.tail = Some(id),
        }
        id
    }

    /// Insert a chunk directly before `before`
    pub fn insert_before(&mut self, before: ChunkId, chunk: Chunk) -> ChunkId {
        let prev = self.slot(before).prev;
        let id = self.alloc(chunk);
        {
            let slot = self.slot_mut(id);
            slot.prev = prev;
            slot.next = Some(before);
        }
        self.slot_mut(before).prev = Some(id);
        match prev {
            Some(prev) => self.slot_mut(prev).next = Some(id),
            None => self.head = Some(id),
        }
        id
    }

    /// Unlink and return a chunk
    ///
    /// Both neighbours are relinked before the slot is released.
    pub fn remove(&mut self, id: ChunkId) -> Chunk {
        let (prev, next) = {
            let slot = self.slot(id);
            (slot.prev, slot.next)
        };
        match prev {
            Some(prev) => self.slot_mut(prev).next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.slot_mut(next).prev = prev,
            None => self.tail = prev,
        }
        let slot = self.slot_mut(id);
        let chunk = slot.chunk.take().expect("live slot holds a chunk");
        slot.prev = None;
        slot.next = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        chunk
    }

    /// Release every chunk, invalidating all outstanding handles
    pub fn clear(&mut self) {
        while let Some(head) = self.head {
            self.remove(head);
        }
    }

    #[must_use]
    pub fn next(&self, id: ChunkId) -> Option<ChunkId> {
        self.slot(id).next
    }

    #[must_use]
    pub fn prev(&self, id: ChunkId) -> Option<ChunkId> {
        self.slot(id).prev
    }

    /// First chunk after `id` matching `pred`
    pub fn next_where(&self, id: ChunkId, pred: impl Fn(&Chunk) -> bool) -> Option<ChunkId> {
        let mut cur = self.next(id);
        while let Some(c) = cur {
            if pred(&self[c]) {
                return Some(c);
            }
            cur = self.next(c);
        }
        None
    }

    /// Last chunk before `id` matching `pred`
    pub fn prev_where(&self, id: ChunkId, pred: impl Fn(&Chunk) -> bool) -> Option<ChunkId> {
        let mut cur = self.prev(id);
        while let Some(c) = cur {
            if pred(&self[c]) {
                return Some(c);
            }
            cur = self.prev(c);
        }
        None
    }

    /// Next chunk that is not a newline
    #[must_use]
    pub fn next_nnl(&self, id: ChunkId) -> Option<ChunkId> {
        self.next_where(id, |c| !c.is_newline())
    }

    #[must_use]
    pub fn prev_nnl(&self, id: ChunkId) -> Option<ChunkId> {
        self.prev_where(id, |c| !c.is_newline())
    }

    /// Next chunk that is not a comment
    #[must_use]
    pub fn next_nc(&self, id: ChunkId) -> Option<ChunkId> {
        self.next_where(id, |c| !c.is_comment())
    }

    #[must_use]
    pub fn prev_nc(&self, id: ChunkId) -> Option<ChunkId> {
        self.prev_where(id, |c| !c.is_comment())
    }

    /// Next chunk that is neither a newline nor a comment
    #[must_use]
    pub fn next_ncnl(&self, id: ChunkId) -> Option<ChunkId> {
        self.next_where(id, Chunk::is_significant)
    }

    #[must_use]
    pub fn prev_ncnl(&self, id: ChunkId) -> Option<ChunkId> {
        self.prev_where(id, Chunk::is_significant)
    }

    /// Next chunk of `kind`, optionally restricted to one level
    #[must_use]
    pub fn next_of_kind(
        &self,
        id: ChunkId,
        kind: TokenKind,
        level: Option<usize>,
    ) -> Option<ChunkId> {
        self.next_where(id, |c| c.kind == kind && level.map_or(true, |l| c.level == l))
    }

    /// Previous chunk of `kind`, optionally restricted to one level
    #[must_use]
    pub fn prev_of_kind(
        &self,
        id: ChunkId,
        kind: TokenKind,
        level: Option<usize>,
    ) -> Option<ChunkId> {
        self.prev_where(id, |c| c.kind == kind && level.map_or(true, |l| c.level == l))
    }

    /// The closer matching the opener `open`
    ///
    /// Relies on levels: the matching closer is the first later chunk back at
    /// the opener's level.
    #[must_use]
    pub fn skip_to_match(&self, open: ChunkId) -> Option<ChunkId> {
        let opener = &self[open];
        if !opener.kind.is_opener() {
            return None;
        }
        let level = opener.level;
        let kind = opener.kind;
        self.next_where(open, |c| c.level <= level && c.kind.is_closer())
            .filter(|&close| kind.pairs_with(self[close].kind) && self[close].level == level)
    }

    /// Iterate over chunk handles in stream order
    #[must_use]
    pub fn iter(&self) -> ChunkIter<'_> {
        ChunkIter {
            list: self,
            cur: self.head,
        }
    }

    /// Snapshot of all handles in stream order
    #[must_use]
    pub fn ids(&self) -> Vec<ChunkId> {
        self.iter().collect()
    }

    /// Texts in stream order (test and debug helper)
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.iter().map(|id| self[id].text.as_str()).collect()
    }

    /// Kinds in stream order (test and debug helper)
    #[must_use]
    pub fn kinds(&self) -> Vec<TokenKind> {
        self.iter().map(|id| self[id].kind).collect()
    }
}

impl Index<ChunkId> for ChunkList {
    type Output = Chunk;

    fn index(&self, id: ChunkId) -> &Chunk {
        self.slot(id).chunk.as_ref().expect("live slot holds a chunk")
    }
}

impl IndexMut<ChunkId> for ChunkList {
    fn index_mut(&mut self, id: ChunkId) -> &mut Chunk {
        self.slot_mut(id)
            .chunk
            .as_mut()
            .expect("live slot holds a chunk")
    }
}

/// Forward iterator over chunk handles
pub struct ChunkIter<'a> {
    list: &'a ChunkList,
    cur: Option<ChunkId>,
}

impl Iterator for ChunkIter<'_> {
    type Item = ChunkId;

    fn next(&mut self) -> Option<ChunkId> {
        let id = self.cur?;
        self.cur = self.list.next(id);
        Some(id)
    }
}

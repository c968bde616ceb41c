/// `SpaceVotes` - Evidence for one spacing option
use crate::chunk::Chunk;

use super::settings::SpaceOption;

/// Counts of observed gaps: wider than one column, none, exactly one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpaceVotes {
    pub add: usize,
    pub remove: usize,
    pub force: usize,
}

impl SpaceVotes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the gap between two adjacent chunks
    ///
    /// Pairs that straddle a line break carry no spacing information.
    pub fn vote(&mut self, first: &Chunk, second: &Chunk) {
        if first.is_newline() || second.is_newline() {
            return;
        }
        #[allow(clippy::cast_possible_wrap)]
        let gap = second.column as i64 - first.end_column() as i64;
        match gap {
            0 => self.remove += 1,
            1 => self.force += 1,
            _ => self.add += 1,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add == 0 && self.remove == 0 && self.force == 0
    }

    /// Decide the option value
    ///
    /// Any `remove` vote vetoes `add`/`force` unless it is the only kind
    /// seen; mixed evidence gives `Ignore`.
    #[must_use]
    pub fn result(&self) -> SpaceOption {
        if self.is_empty() {
            SpaceOption::Ignore
        } else if self.remove == 0 {
            if self.force > self.add {
                SpaceOption::Force
            } else {
                SpaceOption::Add
            }
        } else if self.force == 0 && self.add == 0 {
            SpaceOption::Remove
        } else {
            SpaceOption::Ignore
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::TokenKind;

    fn at(text: &str, column: usize) -> Chunk {
        let mut chunk = Chunk::new(TokenKind::Word, text);
        chunk.orig_col = column;
        chunk.column = column;
        chunk.orig_col_end = column + text.len();
        chunk
    }

    fn votes(add: usize, remove: usize, force: usize) -> SpaceVotes {
        SpaceVotes { add, remove, force }
    }

    #[test]
    fn test_documented_results() {
        assert_eq!(votes(0, 0, 0).result(), SpaceOption::Ignore);
        assert_eq!(votes(0, 0, 3).result(), SpaceOption::Force);
        assert_eq!(votes(2, 0, 1).result(), SpaceOption::Add);
        assert_eq!(votes(0, 4, 0).result(), SpaceOption::Remove);
        assert_eq!(votes(1, 1, 1).result(), SpaceOption::Ignore);
        assert_eq!(votes(0, 5, 5).result(), SpaceOption::Ignore);
        assert_eq!(votes(0, 2, 1).result(), SpaceOption::Ignore);
    }

    #[test]
    fn test_result_table() {
        for add in 0..4 {
            for remove in 0..4 {
                for force in 0..4 {
                    let expected = if add + remove + force == 0 {
                        SpaceOption::Ignore
                    } else if remove == 0 && force > add {
                        SpaceOption::Force
                    } else if remove == 0 {
                        SpaceOption::Add
                    } else if add == 0 && force == 0 {
                        SpaceOption::Remove
                    } else {
                        SpaceOption::Ignore
                    };
                    assert_eq!(
                        votes(add, remove, force).result(),
                        expected,
                        "add={add} remove={remove} force={force}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_vote_gaps() {
        let mut v = SpaceVotes::new();
        v.vote(&at("a", 1), &at("+", 2));
        v.vote(&at("a", 1), &at("+", 3));
        v.vote(&at("a", 1), &at("+", 6));
        assert_eq!(v, votes(1, 1, 1));
    }

    #[test]
    fn test_newline_pairs_skipped() {
        let mut v = SpaceVotes::new();
        let mut nl = Chunk::new(TokenKind::Newline, "\n");
        nl.nl_count = 1;
        v.vote(&at("a", 1), &nl);
        v.vote(&nl, &at("b", 1));
        assert!(v.is_empty());
    }
}

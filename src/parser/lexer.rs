/// `Lexer` - Turns a raw source buffer into the initial chunk stream
///
/// Tracks line and column (tabs expanded) for every chunk, the whitespace
/// width before it, and whether it sits on a preprocessor directive line.
/// Malformed input never aborts: an unterminated comment swallows the rest
/// of the buffer, an unterminated string the rest of its line, and any byte
/// that starts no known token becomes a one-character `Unknown` chunk.
use log::{debug, trace};

use super::patterns::{
    directive_kind, keyword_kind, match_punctuator, BIN_RE, DEC_RE, HEX_RE, IDENT_RE,
    STRING_PREFIXES,
};
use crate::chunk::{Chunk, ChunkFlags, ChunkId, ChunkList, TokenKind};
use crate::lang::LangFlags;

/// Tokenize `data` for the given languages
///
/// Invalid UTF-8 is replaced, so every buffer produces a stream.
#[must_use]
pub fn tokenize(data: &[u8], lang: LangFlags, tab_size: usize) -> ChunkList {
    let text = String::from_utf8_lossy(data);
    let mut lexer = Lexer::new(&text, lang, tab_size.max(1));
    lexer.run();
    debug!(
        "tokenize: {} bytes -> {} chunks ({lang})",
        data.len(),
        lexer.list.len()
    );
    lexer.list
}

/// State of the preprocessor line being lexed
#[derive(Debug, Default)]
struct PreprocState {
    active: bool,
    hash: Option<ChunkId>,
    directive: Option<TokenKind>,
    expect_directive: bool,
}

struct Lexer<'a> {
    text: &'a str,
    pos: usize,
    line: usize,
    col: usize,
    tab_size: usize,
    lang: LangFlags,
    list: ChunkList,
    pp: PreprocState,
    /// Only whitespace or comments seen since the last newline
    at_line_start: bool,
    /// Whitespace width accumulated since the previous chunk
    ws_before: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str, lang: LangFlags, tab_size: usize) -> Self {
        Self {
            text,
            pos: 0,
            line: 1,
            col: 1,
            tab_size,
            lang,
            list: ChunkList::new(),
            pp: PreprocState::default(),
            at_line_start: true,
            ws_before: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn next_tab_stop(&self, col: usize) -> usize {
        ((col - 1) / self.tab_size + 1) * self.tab_size + 1
    }

    /// Consume `len` bytes, updating line and column
    fn advance(&mut self, len: usize) {
        let end = self.pos + len;
        for ch in self.text[self.pos..end].chars() {
            match ch {
                '\n' => {
                    self.line += 1;
                    self.col = 1;
                }
                '\t' => self.col = self.next_tab_stop(self.col),
                '\r' => {}
                _ => self.col += 1,
            }
        }
        self.pos = end;
    }

    /// Emit the next `len` bytes as one chunk
    fn emit(&mut self, kind: TokenKind, len: usize) -> ChunkId {
        let start_line = self.line;
        let start_col = self.col;
        let text = self.text[self.pos..self.pos + len].to_string();
        self.advance(len);

        let mut chunk = Chunk::new(kind, text);
        chunk.orig_line = start_line;
        chunk.orig_col = start_col;
        chunk.orig_col_end = self.col;
        chunk.column = start_col;
        chunk.ws_before = std::mem::take(&mut self.ws_before);
        if kind == TokenKind::Newline {
            chunk.nl_count = chunk.text.matches('\n').count().max(1);
        }
        if self.pp.active && kind != TokenKind::Newline {
            chunk.flags.insert(ChunkFlags::IN_PREPROC);
        }
        trace!(
            "lex {}:{} {kind} {:?}",
            chunk.orig_line,
            chunk.orig_col,
            chunk.text
        );
        self.list.push_back(chunk)
    }

    fn run(&mut self) {
        while self.pos < self.text.len() {
            let Some(c) = self.peek_at(0) else { break };

            match c {
                ' ' | '\t' | '\x0b' | '\x0c' => {
                    let before = self.col;
                    self.advance(c.len_utf8());
                    self.ws_before += self.col - before;
                }
                '\n' | '\r' => self.lex_newlines(),
                _ => {
                    if !self.lex_token(c) {
                        self.emit(TokenKind::Unknown, c.len_utf8());
                    }
                    if !self.list.tail().is_some_and(|t| self.list[t].is_comment()) {
                        self.at_line_start = false;
                    }
                }
            }
        }
    }

    /// Newline runs become one chunk; blank lines holding only whitespace are absorbed
    fn lex_newlines(&mut self) {
        let bytes = self.rest().as_bytes();
        let mut i = 0;
        let mut end = 0;
        loop {
            match bytes.get(i) {
                Some(b'\r') if bytes.get(i + 1) == Some(&b'\n') => {
                    i += 2;
                    end = i;
                }
                Some(b'\n' | b'\r') => {
                    i += 1;
                    end = i;
                }
                Some(b' ' | b'\t') => i += 1,
                _ => break,
            }
        }
        self.ws_before = 0;
        let id = self.emit(TokenKind::Newline, end);
        // lone '\r' line endings still count as line breaks
        let cr_only = self.list[id].text.matches('\r').count()
            - self.list[id].text.matches("\r\n").count();
        if cr_only > 0 {
            let lf = self.list[id].text.matches('\n').count();
            self.list[id].nl_count = lf + cr_only;
            self.line += cr_only;
            self.col = 1;
        }
        self.pp = PreprocState::default();
        self.at_line_start = true;
    }

    /// Lex one token starting with `c`; false if nothing matched
    fn lex_token(&mut self, c: char) -> bool {
        let rest = self.rest();

        if c == '\\' {
            if let Some(len) = line_continuation_len(rest) {
                self.emit(TokenKind::NlCont, len);
                return true;
            }
        }

        if rest.starts_with("//") {
            let len = line_comment_len(rest);
            self.emit(TokenKind::CommentCpp, len);
            return true;
        }
        if rest.starts_with("/*") {
            let len = block_comment_len(rest, "/*", "*/", false);
            self.emit_comment(len);
            return true;
        }
        if self.lang.intersects(LangFlags::D) && rest.starts_with("/+") {
            let len = block_comment_len(rest, "/+", "+/", true);
            self.emit_comment(len);
            return true;
        }

        if self.pp.active {
            if self.pp.directive == Some(TokenKind::PpPragma) {
                let len = preproc_body_len(rest);
                if len > 0 {
                    self.emit(TokenKind::PreprocBody, len);
                    return true;
                }
            }
            if self.pp.directive == Some(TokenKind::PpInclude) && c == '<' {
                if let Some(len) = rest.find('>').filter(|&n| !rest[..n].contains('\n')) {
                    self.emit(TokenKind::String, len + 1);
                    return true;
                }
            }
        }

        if c == '#'
            && self.at_line_start
            && !self.pp.active
            && self.lang.has_preprocessor()
        {
            let id = self.emit(TokenKind::Preproc, 1);
            self.list[id].flags.insert(ChunkFlags::IN_PREPROC);
            self.pp = PreprocState {
                active: true,
                hash: Some(id),
                directive: None,
                expect_directive: true,
            };
            return true;
        }

        if let Some((len, kind)) = self.string_literal_len(rest) {
            self.emit(kind, len);
            return true;
        }

        if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|n| n.is_ascii_digit())) {
            let (len, kind) = number_len(rest);
            if len > 0 {
                self.finish_directive(None);
                self.emit(kind, len);
                return true;
            }
        }

        if let Some(m) = IDENT_RE.find(rest) {
            let word = m.as_str();
            let kind = if self.pp.expect_directive {
                directive_kind(word)
            } else {
                keyword_kind(word, self.lang).unwrap_or(TokenKind::Word)
            };
            let is_directive = self.pp.expect_directive;
            let id = self.emit(kind, m.end());
            if is_directive {
                self.finish_directive(Some((id, kind)));
            }
            return true;
        }

        if let Some((punct, kind)) = match_punctuator(rest) {
            self.finish_directive(None);
            self.emit(kind, punct.len());
            return true;
        }

        self.finish_directive(None);
        false
    }

    /// Record the directive kind on the `#` chunk once its word is known
    fn finish_directive(&mut self, word: Option<(ChunkId, TokenKind)>) {
        if !self.pp.expect_directive {
            return;
        }
        self.pp.expect_directive = false;
        let kind = word.map_or(TokenKind::PpOther, |(_, kind)| kind);
        self.pp.directive = Some(kind);
        if let Some(hash) = self.pp.hash {
            self.list[hash].parent_kind = kind;
        }
    }

    fn emit_comment(&mut self, len: usize) {
        let kind = if self.rest()[..len].contains('\n') {
            TokenKind::CommentMulti
        } else {
            TokenKind::Comment
        };
        self.emit(kind, len);
    }

    /// Length and kind of a string or char literal starting at `rest`
    fn string_literal_len(&self, rest: &str) -> Option<(usize, TokenKind)> {
        let first = rest.chars().next()?;

        if self.lang.intersects(LangFlags::CS) && rest.starts_with("@\"") {
            return Some((1 + quoted_len(&rest[1..], '"', None, true, true), TokenKind::String));
        }
        if self.lang.intersects(LangFlags::D) {
            if first == '`' {
                return Some((quoted_len(rest, '`', None, true, false), TokenKind::String));
            }
            if rest.starts_with("r\"") {
                return Some((1 + quoted_len(&rest[1..], '"', None, true, false), TokenKind::String));
            }
        }

        if first == '"' {
            return Some((quoted_len(rest, '"', Some('\\'), false, false), TokenKind::String));
        }
        if first == '\'' {
            return Some((quoted_len(rest, '\'', Some('\\'), false, false), TokenKind::Char));
        }

        // Encoding prefixes glue onto the literal: L"..", u8"..", R"(..)"
        if self.lang.intersects(LangFlags::C | LangFlags::CPP | LangFlags::OC) {
            let ident = IDENT_RE.find(rest)?;
            let prefix = ident.as_str();
            if !STRING_PREFIXES.contains(&prefix) {
                return None;
            }
            let after = &rest[prefix.len()..];
            if prefix.ends_with('R') && after.starts_with('"') && self.lang.intersects(LangFlags::CPP) {
                return Some((prefix.len() + raw_string_len(after), TokenKind::String));
            }
            if after.starts_with('"') {
                return Some((
                    prefix.len() + quoted_len(after, '"', Some('\\'), false, false),
                    TokenKind::String,
                ));
            }
            if after.starts_with('\'') && !prefix.ends_with('R') {
                return Some((
                    prefix.len() + quoted_len(after, '\'', Some('\\'), false, false),
                    TokenKind::Char,
                ));
            }
        }
        None
    }
}

/// `\` followed by optional blanks and a line break
fn line_continuation_len(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut i = 1;
    while matches!(bytes.get(i), Some(b' ' | b'\t')) {
        i += 1;
    }
    match bytes.get(i) {
        Some(b'\r') if bytes.get(i + 1) == Some(&b'\n') => Some(i + 2),
        Some(b'\n' | b'\r') => Some(i + 1),
        _ => None,
    }
}

/// A `//` comment runs to the end of the line; a trailing `\` continues it
fn line_comment_len(rest: &str) -> usize {
    let mut end = 0;
    loop {
        match rest[end..].find(['\n', '\r']) {
            Some(n) => {
                let line_end = end + n;
                if rest[..line_end].trim_end_matches([' ', '\t']).ends_with('\\') {
                    end = line_end + 1;
                    if rest[line_end..].starts_with("\r\n") {
                        end += 1;
                    }
                } else {
                    return line_end;
                }
            }
            None => return rest.len(),
        }
    }
}

/// Block comment length; unterminated comments take the rest of the buffer
fn block_comment_len(rest: &str, open: &str, close: &str, nested: bool) -> usize {
    let mut depth = 0usize;
    let mut i = 0;
    while i < rest.len() {
        if rest[i..].starts_with(open) && (nested || depth == 0) {
            depth += 1;
            i += open.len();
        } else if rest[i..].starts_with(close) {
            depth -= 1;
            i += close.len();
            if depth == 0 {
                return i;
            }
        } else {
            i += rest[i..].chars().next().map_or(1, char::len_utf8);
        }
    }
    rest.len()
}

/// Quoted literal length, including both quotes
///
/// Without `multiline`, an unescaped line break ends an unterminated literal
/// just before the break.
fn quoted_len(
    rest: &str,
    quote: char,
    escape: Option<char>,
    multiline: bool,
    doubled_quote: bool,
) -> usize {
    let mut chars = rest.char_indices().skip(1).peekable();
    while let Some((i, ch)) = chars.next() {
        if Some(ch) == escape {
            chars.next();
            continue;
        }
        if ch == quote {
            if doubled_quote && chars.peek().is_some_and(|&(_, n)| n == quote) {
                chars.next();
                continue;
            }
            return i + ch.len_utf8();
        }
        if !multiline && (ch == '\n' || ch == '\r') {
            return i;
        }
    }
    rest.len()
}

/// C++ raw string `"delim( ... )delim"` starting at the opening quote
fn raw_string_len(rest: &str) -> usize {
    let Some(open) = rest.find('(') else {
        return quoted_len(rest, '"', None, false, false);
    };
    let delim = &rest[1..open];
    if delim.len() > 16 || delim.contains(|c: char| c.is_whitespace() || c == '"') {
        return quoted_len(rest, '"', None, false, false);
    }
    let terminator = format!("){delim}\"");
    rest[open..]
        .find(&terminator)
        .map_or(rest.len(), |n| open + n + terminator.len())
}

/// Rest of a `#pragma`-style line, following backslash continuations
fn preproc_body_len(rest: &str) -> usize {
    let mut end = 0;
    loop {
        match rest[end..].find(['\n', '\r']) {
            Some(n) => {
                let line_end = end + n;
                let trimmed = rest[..line_end].trim_end_matches([' ', '\t']);
                if trimmed.ends_with('\\') {
                    end = line_end + 1;
                    if rest[line_end..].starts_with("\r\n") {
                        end += 1;
                    }
                } else {
                    return trimmed.len();
                }
            }
            None => return rest.trim_end_matches([' ', '\t']).len(),
        }
    }
}

/// Numeric literal length and kind
fn number_len(rest: &str) -> (usize, TokenKind) {
    if let Some(m) = HEX_RE.captures(rest) {
        let is_fp = m.get(1).is_some() || m.get(2).is_some();
        let len = m.get(0).map_or(0, |m| m.end());
        if len > 2 {
            return (len, fp_kind(is_fp));
        }
    }
    if let Some(m) = BIN_RE.find(rest) {
        return (m.end(), TokenKind::Number);
    }
    if let Some(caps) = DEC_RE.captures(rest) {
        let suffix = caps.get(4).map_or("", |m| m.as_str());
        let is_fp = caps.get(1).is_some()
            || caps.get(2).is_some()
            || caps.get(3).is_some()
            || suffix.eq_ignore_ascii_case("f");
        return (caps.get(0).map_or(0, |m| m.end()), fp_kind(is_fp));
    }
    (0, TokenKind::Number)
}

fn fp_kind(is_fp: bool) -> TokenKind {
    if is_fp {
        TokenKind::NumberFp
    } else {
        TokenKind::Number
    }
}

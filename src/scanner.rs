//! Single-pass tokenizer that splits source text into code, comments and
//! string literals.
//!
//! The scanner never rejects input. Unterminated strings fall back to code and
//! an unterminated block comment runs to the end of the input, marked as not
//! closed. The returned tokens always partition the input exactly.

use std::borrow::Cow;

use crate::error::{Result, StripError};
use crate::profile::{BlockComment, LanguageProfile, Literal};

/// What a span of input is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Code,
    LineComment,
    BlockComment { closed: bool },
    StringLiteral,
}

impl TokenKind {
    pub fn is_comment(self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::BlockComment { .. })
    }
}

/// A labelled byte span `[start, end)` of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanToken {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl ScanToken {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// Scanner output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
    pub tokens: Vec<ScanToken>,
    /// String literals that never closed and were kept as code
    pub unterminated_literals: usize,
}

/// Tokenize `source` with the rules of `profile`.
pub fn scan(source: &str, profile: &LanguageProfile) -> Result<Scan> {
    let mut scanner = Scanner::new(source, profile);
    scanner.run();
    let scan = scanner.finish();
    verify_partition(source, &scan.tokens)?;
    Ok(scan)
}

/// Check that `tokens` cover `source` contiguously with no empty spans.
pub fn verify_partition(source: &str, tokens: &[ScanToken]) -> Result<()> {
    let mut expected = 0;
    for token in tokens {
        if token.start != expected {
            return Err(StripError::InternalScan {
                offset: expected,
                reason: format!("token starts at {} instead of {expected}", token.start),
            });
        }
        if token.is_empty() {
            return Err(StripError::InternalScan {
                offset: token.start,
                reason: "zero-length token".to_string(),
            });
        }
        if token.end > source.len() || !source.is_char_boundary(token.end) {
            return Err(StripError::InternalScan {
                offset: token.end,
                reason: "token ends outside the input or inside a character".to_string(),
            });
        }
        expected = token.end;
    }
    if expected != source.len() {
        return Err(StripError::InternalScan {
            offset: expected,
            reason: format!("tokens stop {} bytes short of the input", source.len() - expected),
        });
    }
    Ok(())
}

#[derive(Debug)]
enum State {
    Code,
    LineComment,
    BlockComment { rule: BlockComment, depth: usize },
    InString(OpenString),
}

#[derive(Debug)]
struct OpenString {
    close: Cow<'static, str>,
    escape: Option<char>,
    multiline: bool,
}

enum LiteralMatch {
    /// The whole literal was recognised up front (char and regex literals).
    Complete(usize),
    Open { len: usize, string: OpenString },
    /// A regex literal that runs into the end of the line: kept as code.
    Unclosed(usize),
}

impl LiteralMatch {
    fn len(&self) -> usize {
        match self {
            LiteralMatch::Complete(len)
            | LiteralMatch::Open { len, .. }
            | LiteralMatch::Unclosed(len) => *len,
        }
    }
}

/// Keywords after which a `/` starts a regex literal rather than a division.
const REGEX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case",
    "do", "else", "yield", "await",
];

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    profile: &'a LanguageProfile,
    pos: usize,
    /// Start of the token currently being built
    start: usize,
    state: State,
    tokens: Vec<ScanToken>,
    unterminated: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str, profile: &'a LanguageProfile) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            profile,
            pos: 0,
            start: 0,
            state: State::Code,
            tokens: Vec::new(),
            unterminated: 0,
        }
    }

    fn run(&mut self) {
        while self.pos < self.src.len() {
            let state = std::mem::replace(&mut self.state, State::Code);
            self.state = match state {
                State::Code => self.step_code(),
                State::LineComment => self.step_line_comment(),
                State::BlockComment { rule, depth } => self.step_block(rule, depth),
                State::InString(open) => self.step_string(open),
            };
        }
    }

    fn finish(mut self) -> Scan {
        let end = self.src.len();
        match std::mem::replace(&mut self.state, State::Code) {
            State::Code => self.emit(TokenKind::Code, self.start, end),
            State::InString(_) => {
                // Unterminated literal: keep everything from its opening
                // delimiter as code.
                self.unterminated += 1;
                self.emit(TokenKind::Code, self.start, end);
            }
            State::LineComment => self.emit(TokenKind::LineComment, self.start, end),
            State::BlockComment { .. } => {
                self.emit(TokenKind::BlockComment { closed: false }, self.start, end)
            }
        }
        Scan {
            tokens: self.tokens,
            unterminated_literals: self.unterminated,
        }
    }

    fn step_code(&mut self) -> State {
        let src = self.src;
        let rest = &src[self.pos..];

        if let Some(found) = self.match_literal(rest) {
            let open_at = self.pos;
            self.pos += found.len();
            return match found {
                // Stays part of the surrounding code token.
                LiteralMatch::Unclosed(_) => {
                    self.unterminated += 1;
                    State::Code
                }
                LiteralMatch::Complete(_) => {
                    self.emit(TokenKind::Code, self.start, open_at);
                    self.emit(TokenKind::StringLiteral, open_at, self.pos);
                    self.start = self.pos;
                    State::Code
                }
                LiteralMatch::Open { string, .. } => {
                    self.emit(TokenKind::Code, self.start, open_at);
                    self.start = open_at;
                    State::InString(string)
                }
            };
        }

        if let Some(rule) = self.match_block(rest) {
            self.emit(TokenKind::Code, self.start, self.pos);
            self.start = self.pos;
            self.pos += rule.open.len();
            return State::BlockComment { rule, depth: 1 };
        }

        if let Some(marker) = longest_prefix(rest, self.profile.code_markers.iter().copied()) {
            self.pos += marker.len();
            return State::Code;
        }

        if let Some(marker) = longest_prefix(rest, self.profile.line_comments.iter().copied()) {
            self.emit(TokenKind::Code, self.start, self.pos);
            self.start = self.pos;
            self.pos += marker.len();
            return State::LineComment;
        }

        self.pos += self.char_len();
        State::Code
    }

    fn step_line_comment(&mut self) -> State {
        let mut from = self.pos;
        let end = loop {
            let Some(offset) = self.src[from..].find('\n') else {
                break self.src.len();
            };
            let newline = from + offset;
            let line_end = if newline > 0 && self.bytes[newline - 1] == b'\r' {
                newline - 1
            } else {
                newline
            };
            if self.profile.line_continuation
                && line_end > self.pos
                && self.bytes[line_end - 1] == b'\\'
            {
                from = newline + 1;
                continue;
            }
            break line_end;
        };

        self.emit(TokenKind::LineComment, self.start, end);
        self.pos = end;
        self.start = end;
        State::Code
    }

    fn step_block(&mut self, rule: BlockComment, mut depth: usize) -> State {
        let nested = self.profile.nested_blocks;
        let src = self.src;
        while self.pos < src.len() {
            let rest = &src[self.pos..];
            let anchored_ok = !rule.line_start || self.at_line_start();

            if nested && anchored_ok && starts_with_marker(rest, rule.open, rule.line_start) {
                depth += 1;
                self.pos += rule.open.len();
                continue;
            }

            if anchored_ok && starts_with_marker(rest, rule.close, rule.line_start) {
                self.pos += rule.close.len();
                depth = if nested { depth - 1 } else { 0 };
                if depth == 0 {
                    if rule.line_start {
                        self.pos = self.line_end_from(self.pos);
                    }
                    self.emit(TokenKind::BlockComment { closed: true }, self.start, self.pos);
                    self.start = self.pos;
                    return State::Code;
                }
                continue;
            }

            self.pos += self.char_len();
        }

        self.emit(
            TokenKind::BlockComment { closed: false },
            self.start,
            self.src.len(),
        );
        self.start = self.src.len();
        State::Code
    }

    fn step_string(&mut self, open: OpenString) -> State {
        let src = self.src;
        while self.pos < src.len() {
            let rest = &src[self.pos..];
            let Some(c) = rest.chars().next() else { break };

            if Some(c) == open.escape {
                self.pos += c.len_utf8();
                if self.src[self.pos..].starts_with("\r\n") {
                    self.pos += 2;
                } else if self.pos < self.src.len() {
                    self.pos += self.char_len();
                }
                continue;
            }

            if rest.starts_with(open.close.as_ref()) {
                self.pos += open.close.len();
                self.emit(TokenKind::StringLiteral, self.start, self.pos);
                self.start = self.pos;
                return State::Code;
            }

            if c == '\n' && !open.multiline {
                // The line ended first: the would-be literal is code, and
                // scanning resumes at the terminator.
                self.unterminated += 1;
                self.emit(TokenKind::Code, self.start, self.pos);
                self.start = self.pos;
                return State::Code;
            }

            self.pos += c.len_utf8();
        }
        State::InString(open)
    }

    fn match_literal(&self, rest: &str) -> Option<LiteralMatch> {
        self.profile
            .literals
            .iter()
            .filter_map(|literal| self.literal_at(literal, rest))
            .max_by_key(LiteralMatch::len)
    }

    fn literal_at(&self, literal: &Literal, rest: &str) -> Option<LiteralMatch> {
        match *literal {
            Literal::Quoted {
                open,
                close,
                escape,
                multiline,
            } => rest.starts_with(open).then(|| LiteralMatch::Open {
                len: open.len(),
                string: OpenString {
                    close: Cow::Borrowed(close),
                    escape,
                    multiline,
                },
            }),
            Literal::Char => char_literal_len(rest).map(LiteralMatch::Complete),
            Literal::RawHashed => {
                let after_r = rest.strip_prefix('r')?;
                if !matches!(self.ident_before(), "" | "b" | "c") {
                    return None;
                }
                let hashes = after_r.bytes().take_while(|b| *b == b'#').count();
                if after_r.as_bytes().get(hashes) != Some(&b'"') {
                    return None;
                }
                Some(LiteralMatch::Open {
                    len: hashes + 2,
                    string: OpenString {
                        close: Cow::Owned(format!("\"{}", "#".repeat(hashes))),
                        escape: None,
                        multiline: true,
                    },
                })
            }
            Literal::Regex => {
                if !rest.starts_with('/')
                    || rest.starts_with("//")
                    || rest.starts_with("/*")
                    || !self.regex_allowed()
                {
                    return None;
                }
                Some(match regex_literal_len(rest) {
                    (len, true) => LiteralMatch::Complete(len),
                    (len, false) => LiteralMatch::Unclosed(len),
                })
            }
            Literal::CppRaw => {
                let body = rest.strip_prefix("R\"")?;
                if !matches!(self.ident_before(), "" | "u8" | "u" | "U" | "L") {
                    return None;
                }
                let delim_len = body
                    .bytes()
                    .take(17)
                    .position(|b| b == b'(')
                    .filter(|len| *len <= 16)?;
                let delim = &body[..delim_len];
                if delim
                    .bytes()
                    .any(|b| b.is_ascii_whitespace() || matches!(b, b')' | b'\\' | b'"'))
                {
                    return None;
                }
                Some(LiteralMatch::Open {
                    len: 2 + delim_len + 1,
                    string: OpenString {
                        close: Cow::Owned(format!("){delim}\"")),
                        escape: None,
                        multiline: true,
                    },
                })
            }
        }
    }

    fn match_block(&self, rest: &str) -> Option<BlockComment> {
        let at_line_start = self.at_line_start();
        self.profile
            .block_comments
            .iter()
            .filter(|rule| {
                starts_with_marker(rest, rule.open, rule.line_start)
                    && (!rule.line_start || at_line_start)
            })
            .max_by_key(|rule| rule.open.len())
            .copied()
    }

    fn emit(&mut self, kind: TokenKind, start: usize, end: usize) {
        if start >= end {
            return;
        }
        if kind == TokenKind::Code
            && let Some(last) = self.tokens.last_mut()
            && last.kind == TokenKind::Code
            && last.end == start
        {
            last.end = end;
            return;
        }
        self.tokens.push(ScanToken { kind, start, end });
    }

    fn char_len(&self) -> usize {
        self.src[self.pos..]
            .chars()
            .next()
            .map_or(1, char::len_utf8)
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.bytes[self.pos - 1] == b'\n'
    }

    /// Offset of the line terminator (`\n` or `\r\n`) at or after `from`.
    fn line_end_from(&self, from: usize) -> usize {
        match self.src[from..].find('\n') {
            Some(offset) => {
                let newline = from + offset;
                if newline > from && self.bytes[newline - 1] == b'\r' {
                    newline - 1
                } else {
                    newline
                }
            }
            None => self.src.len(),
        }
    }

    /// Whether a `/` here can start a regex literal: at the start of the
    /// input, after an operator or opener, or after a keyword like `return`.
    fn regex_allowed(&self) -> bool {
        let head = self.src[..self.pos].trim_end();
        let Some(last) = head.chars().next_back() else {
            return true;
        };
        if "(,=:[!&|?{};".contains(last) {
            return true;
        }
        let run = head
            .bytes()
            .rev()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'$')
            .count();
        REGEX_KEYWORDS.contains(&&head[head.len() - run..])
    }

    /// The identifier characters immediately before the current position.
    fn ident_before(&self) -> &'a str {
        let src = self.src;
        let head = &src[..self.pos];
        let run = head
            .bytes()
            .rev()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        &head[head.len() - run..]
    }
}

/// Length of a complete char literal at the start of `rest`, if there is one.
///
/// Accepts `'x'` and escapes such as `'\n'` or `'\u{1F600}'`. Anything else
/// (`'a` lifetimes, `'sym` symbols) is not a literal.
fn char_literal_len(rest: &str) -> Option<usize> {
    let body = rest.strip_prefix('\'')?;
    let mut chars = body.char_indices();
    let (_, first) = chars.next()?;
    match first {
        '\'' | '\n' | '\r' => None,
        '\\' => {
            let (_, escaped) = chars.next()?;
            if escaped == '\n' {
                return None;
            }
            for (idx, c) in chars.take(10) {
                match c {
                    '\'' => return Some(1 + idx + 1),
                    '\n' => return None,
                    _ => {}
                }
            }
            None
        }
        _ => {
            let (idx, next) = chars.next()?;
            (next == '\'').then_some(1 + idx + 1)
        }
    }
}

/// Length of the regex literal at the start of `rest` (which begins with
/// `/`), flags included, and whether it closed before the end of the line.
fn regex_literal_len(rest: &str) -> (usize, bool) {
    let mut in_class = false;
    let mut chars = rest.char_indices().skip(1);
    while let Some((idx, c)) = chars.next() {
        match c {
            '\n' | '\r' => return (idx, false),
            '\\' => match chars.next() {
                Some((next, '\n' | '\r')) => return (next, false),
                Some(_) => {}
                None => return (rest.len(), false),
            },
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => {
                let end = idx + 1;
                let flags = rest[end..]
                    .bytes()
                    .take_while(|b| b.is_ascii_alphabetic())
                    .count();
                return (end + flags, true);
            }
            _ => {}
        }
    }
    (rest.len(), false)
}

/// `rest` starts with `marker`; whole-word markers must also be followed by
/// whitespace or the end of input.
fn starts_with_marker(rest: &str, marker: &str, whole_word: bool) -> bool {
    let Some(after) = rest.strip_prefix(marker) else {
        return false;
    };
    !whole_word || after.chars().next().is_none_or(char::is_whitespace)
}

fn longest_prefix<'m>(rest: &str, markers: impl Iterator<Item = &'m str>) -> Option<&'m str> {
    markers
        .filter(|marker| rest.starts_with(*marker))
        .max_by_key(|marker| marker.len())
}

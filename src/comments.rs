//! Remove comment tokens from scanned source.
//!
//! - Code and string literal tokens are copied byte for byte.
//! - Line terminators inside removed comments are kept, so line `n` of the
//!   output is line `n` of the input (`\r\n` stays `\r\n`).
//! - Whitespace that a removed comment leaves at the end of a line is
//!   trimmed. Whitespace belonging to a string literal never is.
//! - With `preserve_structure` off, lines that only became blank because of
//!   the removal are dropped. Lines that were blank already are kept.

use crate::scanner::{ScanToken, TokenKind};

/// Knobs for [`strip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripOptions {
    pub preserve_structure: bool,
}

impl Default for StripOptions {
    fn default() -> Self {
        Self {
            preserve_structure: true,
        }
    }
}

/// Stripped text plus the line bookkeeping the stats need.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StripOutput {
    pub code: String,
    /// Lines in `code`, counting a final line emptied by the removal
    pub lines: usize,
    /// Lines that held nothing but comments (and whitespace)
    pub lines_cleared: usize,
    /// Lines that kept code after a comment was cut from them
    pub lines_trimmed: usize,
}

pub fn strip(source: &str, tokens: &[ScanToken], options: StripOptions) -> StripOutput {
    let mut writer = LineWriter::new(source.len());

    for token in tokens {
        let text = token.text(source);
        match token.kind {
            TokenKind::Code => writer.push_code(text),
            TokenKind::StringLiteral => writer.push_literal(text),
            TokenKind::LineComment | TokenKind::BlockComment { .. } => writer.remove(text),
        }
    }

    writer.finish(options)
}

#[derive(Debug, Clone, Copy)]
struct Line {
    start: usize,
    touched: bool,
}

#[derive(Debug)]
struct LineWriter {
    out: String,
    lines: Vec<Line>,
    /// Trimming never goes below this offset (end of the last string literal)
    floor: usize,
    /// Only whitespace followed the last removed comment on this line
    cut_at_end: bool,
}

impl LineWriter {
    fn new(capacity: usize) -> Self {
        Self {
            out: String::with_capacity(capacity),
            lines: vec![Line {
                start: 0,
                touched: false,
            }],
            floor: 0,
            cut_at_end: false,
        }
    }

    fn push_code(&mut self, text: &str) {
        for piece in text.split_inclusive('\n') {
            match piece.strip_suffix('\n') {
                Some(body) => {
                    let (body, terminator) = match body.strip_suffix('\r') {
                        Some(body) => (body, "\r\n"),
                        None => (body, "\n"),
                    };
                    self.push_inline(body);
                    self.end_line(terminator, false);
                }
                None => self.push_inline(piece),
            }
        }
    }

    fn push_inline(&mut self, text: &str) {
        self.out.push_str(text);
        if text.chars().any(|c| !c.is_whitespace()) {
            self.cut_at_end = false;
        }
    }

    fn push_literal(&mut self, text: &str) {
        let mut pieces = text.split('\n');
        if let Some(first) = pieces.next() {
            self.out.push_str(first);
        }
        for piece in pieces {
            self.out.push('\n');
            self.open_line(false);
            self.out.push_str(piece);
        }
        self.floor = self.out.len();
        self.cut_at_end = false;
    }

    fn remove(&mut self, text: &str) {
        self.current().touched = true;
        let mut pieces = text.split('\n').peekable();
        // The first piece sits on the current line and is dropped with the
        // rest of the comment body.
        let mut previous = pieces.next().unwrap_or_default();
        while let Some(piece) = pieces.next() {
            let terminator = if previous.ends_with('\r') { "\r\n" } else { "\n" };
            let last = pieces.peek().is_none();
            self.cut_at_end = true;
            self.end_line(terminator, !last || !piece.is_empty());
            previous = piece;
        }
        self.cut_at_end = !previous.is_empty();
    }

    fn end_line(&mut self, terminator: &str, next_touched: bool) {
        if self.cut_at_end {
            self.trim_tail();
        }
        self.out.push_str(terminator);
        self.open_line(next_touched);
        self.cut_at_end = false;
    }

    fn open_line(&mut self, touched: bool) {
        self.lines.push(Line {
            start: self.out.len(),
            touched,
        });
    }

    fn current(&mut self) -> &mut Line {
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    fn trim_tail(&mut self) {
        let keep = self.out.trim_end_matches([' ', '\t']).len().max(self.floor);
        self.out.truncate(keep);
    }

    fn finish(mut self, options: StripOptions) -> StripOutput {
        if self.cut_at_end {
            self.trim_tail();
        }

        let total = self.out.len();
        let spans: Vec<(Line, &str)> = self
            .lines
            .iter()
            .enumerate()
            .map(|(idx, line)| {
                let end = self.lines.get(idx + 1).map_or(total, |next| next.start);
                (*line, &self.out[line.start..end])
            })
            .collect();

        let mut lines_cleared = 0;
        let mut lines_trimmed = 0;
        for (line, text) in &spans {
            if line.touched {
                if text.trim().is_empty() {
                    lines_cleared += 1;
                } else {
                    lines_trimmed += 1;
                }
            }
        }

        let counts = |line: &Line, text: &str| !text.is_empty() || line.touched;

        let (code, lines) = if options.preserve_structure {
            let lines = spans.iter().filter(|(line, text)| counts(line, text)).count();
            (self.out.clone(), lines)
        } else {
            let mut code = String::with_capacity(total);
            let mut lines = 0;
            for (line, text) in &spans {
                if line.touched && text.trim().is_empty() {
                    continue;
                }
                if counts(line, text) {
                    lines += 1;
                }
                code.push_str(text);
            }
            (code, lines)
        };

        StripOutput {
            code,
            lines,
            lines_cleared,
            lines_trimmed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::profile_for;
    use crate::scanner::scan;

    fn run(src: &str, language: &str, preserve_structure: bool) -> StripOutput {
        let profile = profile_for(language).unwrap();
        let scanned = scan(src, profile).unwrap();
        strip(src, &scanned.tokens, StripOptions { preserve_structure })
    }

    #[test]
    fn trailing_line_comment_and_its_whitespace_are_removed() {
        let out = run("x = 1  # comment\ny = 2\n", "python", true);
        assert_eq!(out.code, "x = 1\ny = 2\n");
        assert_eq!(out.lines, 2);
        assert_eq!(out.lines_trimmed, 1);
        assert_eq!(out.lines_cleared, 0);
    }

    #[test]
    fn block_comment_newlines_are_preserved() {
        let out = run("/* line1\nline2 */\ncode();\n", "cpp", true);
        assert_eq!(out.code, "\n\ncode();\n");
        assert_eq!(out.lines, 3);
        assert_eq!(out.lines_cleared, 2);
    }

    #[test]
    fn comment_only_lines_become_empty_but_stay() {
        let out = run("    # indented\nprint(1)\n", "python", true);
        assert_eq!(out.code, "\nprint(1)\n");
    }

    #[test]
    fn inline_block_comment_keeps_surrounding_code() {
        let out = run("int a = /* x */ 1;\n", "c", true);
        assert_eq!(out.code, "int a =  1;\n");
        assert_eq!(out.lines_trimmed, 1);
    }

    #[test]
    fn whitespace_after_trailing_block_comment_is_trimmed() {
        let out = run("a();   /* why */   \nb();\n", "java", true);
        assert_eq!(out.code, "a();\nb();\n");
    }

    #[test]
    fn untouched_trailing_whitespace_is_kept() {
        let out = run("a();   \nb(); // x\n", "java", true);
        assert_eq!(out.code, "a();   \nb();\n");
    }

    #[test]
    fn whitespace_inside_strings_is_never_trimmed() {
        let src = "/* c */ s = \"\"\"text   \nmore\"\"\"\n";
        let out = run(src, "java", true);
        assert_eq!(out.code, " s = \"\"\"text   \nmore\"\"\"\n");

        let out = run("s = \"a  \"   # c\n", "python", true);
        assert_eq!(out.code, "s = \"a  \"\n");
    }

    #[test]
    fn php_attributes_and_js_regexes_survive() {
        let out = run("<?php\n#[Route('/home')]\nclass A {} // c\n", "php", true);
        assert_eq!(out.code, "<?php\n#[Route('/home')]\nclass A {}\n");

        let out = run(
            "const u = s.replace(/^https?:\\/\\//, ''); // strip\nf();\n",
            "javascript",
            true,
        );
        assert_eq!(out.code, "const u = s.replace(/^https?:\\/\\//, '');\nf();\n");
    }

    #[test]
    fn crlf_line_endings_survive() {
        let out = run("a = 1 # c\r\n/* x\r\ny */b\r\n", "php", true);
        assert_eq!(out.code, "a = 1\r\n\r\nb\r\n");
    }

    #[test]
    fn unclosed_block_comment_strips_to_end() {
        let out = run("int x;\n/* never closed", "c", true);
        assert_eq!(out.code, "int x;\n");
        assert_eq!(out.lines, 2);
    }

    #[test]
    fn emptied_final_line_still_counts() {
        let out = run("x\n# c", "python", true);
        assert_eq!(out.code, "x\n");
        assert_eq!(out.lines, 2);
    }

    #[test]
    fn compact_mode_drops_lines_emptied_by_removal() {
        let src = "# header\n\nx = 1\n# note\n# note 2\n\ny = 2  # tail\n";
        let out = run(src, "python", false);
        assert_eq!(out.code, "\nx = 1\n\ny = 2\n");
        assert_eq!(out.lines, 4);
        assert_eq!(out.lines_cleared, 3);
    }

    #[test]
    fn compact_mode_drops_multiline_block_comments() {
        let out = run("/* line1\nline2 */\ncode();\n", "cpp", false);
        assert_eq!(out.code, "code();\n");
        assert_eq!(out.lines, 1);
    }

    #[test]
    fn comment_free_code_is_unchanged() {
        let src = "fn main() {\n    println!(\"// {}\", 1);\n}\n";
        let out = run(src, "rust", true);
        assert_eq!(out.code, src);
        assert_eq!(out.lines_cleared + out.lines_trimmed, 0);
    }

    #[test]
    fn block_comment_ending_with_newline_does_not_add_a_line() {
        let out = run("/* a\n", "c", true);
        assert_eq!(out.code, "\n");
        assert_eq!(out.lines, 1);
    }
}

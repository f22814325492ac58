//! Numbers reported alongside stripped code.

use serde::Serialize;

use crate::comments::StripOutput;
use crate::scanner::{Scan, TokenKind};

/// Counts describing one strip operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StripStats {
    pub original_lines: usize,
    pub processed_lines: usize,
    /// Comment tokens removed; a block comment spanning many lines counts once
    pub removed: usize,
    pub line_comments: usize,
    pub block_comments: usize,
    /// Block comments still open at the end of the input
    pub unclosed_comments: usize,
    /// String literals left unterminated and kept as code
    pub unterminated_literals: usize,
    pub lines_cleared: usize,
    pub lines_trimmed: usize,
    pub original_size: usize,
    pub processed_size: usize,
    /// Percentage of bytes removed, two decimals
    pub compression_ratio: f64,
}

impl StripStats {
    pub fn compute(source: &str, scan: &Scan, output: &StripOutput) -> Self {
        let mut stats = StripStats {
            original_lines: count_lines(source),
            processed_lines: output.lines,
            unterminated_literals: scan.unterminated_literals,
            lines_cleared: output.lines_cleared,
            lines_trimmed: output.lines_trimmed,
            original_size: source.len(),
            processed_size: output.code.len(),
            compression_ratio: compression_ratio(source.len(), output.code.len()),
            ..Default::default()
        };

        for token in &scan.tokens {
            match token.kind {
                TokenKind::LineComment => stats.line_comments += 1,
                TokenKind::BlockComment { closed } => {
                    stats.block_comments += 1;
                    if !closed {
                        stats.unclosed_comments += 1;
                    }
                }
                TokenKind::Code | TokenKind::StringLiteral => {}
            }
        }
        stats.removed = stats.line_comments + stats.block_comments;
        stats
    }
}

/// Number of lines in `text`. A final line terminator does not start a new
/// line and empty text has no lines.
pub fn count_lines(text: &str) -> usize {
    text.lines().count()
}

fn compression_ratio(before: usize, after: usize) -> f64 {
    if before == 0 {
        return 0.0;
    }
    let ratio = (1.0 - after as f64 / before as f64) * 100.0;
    (ratio * 100.0).round() / 100.0
}

//! Per-language lexical rules and the read-only registry that serves them.
//!
//! A profile only knows enough about a language to tell comments apart from
//! code and string literals. Markers inside one category are matched longest
//! first by the scanner, so `"""` wins over `"` without any ordering here.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::error::{Result, StripError};

/// A comment with distinct open and close markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockComment {
    pub open: &'static str,
    pub close: &'static str,
    /// Both markers only count in column 0 and the close marker swallows the
    /// rest of its line (Ruby `=begin` / `=end`).
    pub line_start: bool,
}

impl BlockComment {
    pub const fn new(open: &'static str, close: &'static str) -> Self {
        Self {
            open,
            close,
            line_start: false,
        }
    }

    pub const fn anchored(open: &'static str, close: &'static str) -> Self {
        Self {
            open,
            close,
            line_start: true,
        }
    }
}

/// How a string or character literal starts and ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    /// Fixed delimiters, e.g. `"…"`, `"""…"""` or C# `@"…"`.
    Quoted {
        open: &'static str,
        close: &'static str,
        escape: Option<char>,
        multiline: bool,
    },
    /// `'x'` or `'\n'`; anything else starting with `'` is code (lifetimes,
    /// Scala symbols).
    Char,
    /// Rust raw strings: `r"…"`, `r#"…"#`, `r##"…"##`.
    RawHashed,
    /// C++ raw strings: `R"delim(…)delim"`.
    CppRaw,
    /// JavaScript regex literals `/…/flags`, only where an expression can
    /// start. Never `//` or `/*`.
    Regex,
}

impl Literal {
    /// Same opening and closing delimiter, backslash escapes, one line.
    pub const fn quoted(delim: &'static str) -> Self {
        Literal::Quoted {
            open: delim,
            close: delim,
            escape: Some('\\'),
            multiline: false,
        }
    }

    /// Same as [`Literal::quoted`] but allowed to span lines.
    pub const fn multiline(delim: &'static str) -> Self {
        Literal::Quoted {
            open: delim,
            close: delim,
            escape: Some('\\'),
            multiline: true,
        }
    }

    /// Multi-line literal without any escape character.
    pub const fn raw(open: &'static str, close: &'static str) -> Self {
        Literal::Quoted {
            open,
            close,
            escape: None,
            multiline: true,
        }
    }

    /// The fixed text every occurrence of this literal starts with.
    pub fn opener(&self) -> &'static str {
        match self {
            Literal::Quoted { open, .. } => open,
            Literal::Char => "'",
            Literal::RawHashed => "r",
            Literal::CppRaw => "R\"",
            Literal::Regex => "/",
        }
    }
}

/// Lexical rules for one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageProfile {
    /// Lowercase identifier, e.g. `"python"`, `"cpp"`
    pub id: &'static str,
    pub line_comments: &'static [&'static str],
    pub block_comments: &'static [BlockComment],
    /// Whether an open marker inside a block comment starts a nested one
    pub nested_blocks: bool,
    /// Whether a backslash right before the newline continues a line comment
    pub line_continuation: bool,
    /// Code that starts with a line comment marker (PHP attributes `#[`);
    /// matched before line comments
    pub code_markers: &'static [&'static str],
    pub literals: &'static [Literal],
    /// File extensions without the dot; the first one is the default
    pub extensions: &'static [&'static str],
    pub mime: &'static str,
}

impl LanguageProfile {
    /// Extension used when a download needs a file name and none was given.
    pub fn default_extension(&self) -> &'static str {
        self.extensions.first().copied().unwrap_or("txt")
    }

    /// Every (category, marker) pair the scanner may match in code state.
    /// Regex literals are left out: they never start where `//` or `/*` does.
    pub fn markers(&self) -> Vec<(&'static str, &'static str)> {
        let mut out = Vec::new();
        out.extend(
            self.literals
                .iter()
                .filter(|l| !matches!(l, Literal::Regex))
                .map(|l| ("literal", l.opener())),
        );
        out.extend(self.block_comments.iter().map(|b| ("block", b.open)));
        out.extend(self.line_comments.iter().map(|m| ("line", *m)));
        out
    }
}

const SLASH_LINE: &[&str] = &["//"];
const SLASH_STAR: &[BlockComment] = &[BlockComment::new("/*", "*/")];

const C_LITERALS: &[Literal] = &[Literal::quoted("\""), Literal::quoted("'")];

static PROFILES: [LanguageProfile; 17] = [
    LanguageProfile {
        id: "python",
        line_comments: &["#"],
        block_comments: &[],
        nested_blocks: false,
        line_continuation: false,
        code_markers: &[],
        literals: &[
            Literal::multiline("\"\"\""),
            Literal::multiline("'''"),
            Literal::quoted("\""),
            Literal::quoted("'"),
        ],
        extensions: &["py", "pyw", "pyi"],
        mime: "text/x-python",
    },
    LanguageProfile {
        id: "javascript",
        line_comments: SLASH_LINE,
        block_comments: SLASH_STAR,
        nested_blocks: false,
        line_continuation: false,
        code_markers: &[],
        literals: &[
            Literal::quoted("\""),
            Literal::quoted("'"),
            Literal::multiline("`"),
            Literal::Regex,
        ],
        extensions: &["js", "mjs", "cjs", "jsx"],
        mime: "application/javascript",
    },
    LanguageProfile {
        id: "typescript",
        line_comments: SLASH_LINE,
        block_comments: SLASH_STAR,
        nested_blocks: false,
        line_continuation: false,
        code_markers: &[],
        literals: &[
            Literal::quoted("\""),
            Literal::quoted("'"),
            Literal::multiline("`"),
            Literal::Regex,
        ],
        extensions: &["ts", "tsx", "mts", "cts"],
        mime: "application/typescript",
    },
    LanguageProfile {
        id: "java",
        line_comments: SLASH_LINE,
        block_comments: SLASH_STAR,
        nested_blocks: false,
        line_continuation: false,
        code_markers: &[],
        literals: &[
            Literal::multiline("\"\"\""),
            Literal::quoted("\""),
            Literal::quoted("'"),
        ],
        extensions: &["java"],
        mime: "text/x-java",
    },
    LanguageProfile {
        id: "c",
        line_comments: SLASH_LINE,
        block_comments: SLASH_STAR,
        nested_blocks: false,
        line_continuation: true,
        code_markers: &[],
        literals: C_LITERALS,
        extensions: &["c", "h"],
        mime: "text/x-c",
    },
    LanguageProfile {
        id: "cpp",
        line_comments: SLASH_LINE,
        block_comments: SLASH_STAR,
        nested_blocks: false,
        line_continuation: true,
        code_markers: &[],
        literals: &[Literal::CppRaw, Literal::quoted("\""), Literal::quoted("'")],
        extensions: &["cpp", "cc", "cxx", "hpp", "hh", "hxx"],
        mime: "text/x-c++",
    },
    LanguageProfile {
        id: "csharp",
        line_comments: SLASH_LINE,
        block_comments: SLASH_STAR,
        nested_blocks: false,
        line_continuation: false,
        code_markers: &[],
        literals: &[
            Literal::raw("\"\"\"", "\"\"\""),
            Literal::raw("@\"", "\""),
            Literal::raw("@$\"", "\""),
            Literal::quoted("\""),
            Literal::quoted("'"),
        ],
        extensions: &["cs"],
        mime: "text/x-csharp",
    },
    LanguageProfile {
        id: "go",
        line_comments: SLASH_LINE,
        block_comments: SLASH_STAR,
        nested_blocks: false,
        line_continuation: false,
        code_markers: &[],
        literals: &[
            Literal::quoted("\""),
            Literal::quoted("'"),
            Literal::raw("`", "`"),
        ],
        extensions: &["go"],
        mime: "text/x-go",
    },
    LanguageProfile {
        id: "rust",
        line_comments: SLASH_LINE,
        block_comments: SLASH_STAR,
        nested_blocks: true,
        line_continuation: false,
        code_markers: &[],
        literals: &[Literal::RawHashed, Literal::multiline("\""), Literal::Char],
        extensions: &["rs"],
        mime: "text/x-rust",
    },
    LanguageProfile {
        id: "php",
        line_comments: &["//", "#"],
        block_comments: SLASH_STAR,
        nested_blocks: false,
        line_continuation: false,
        code_markers: &["#["],
        literals: &[Literal::multiline("\""), Literal::multiline("'")],
        extensions: &["php"],
        mime: "application/x-httpd-php",
    },
    LanguageProfile {
        id: "ruby",
        line_comments: &["#"],
        block_comments: &[BlockComment::anchored("=begin", "=end")],
        nested_blocks: false,
        line_continuation: false,
        code_markers: &[],
        literals: &[Literal::multiline("\""), Literal::multiline("'")],
        extensions: &["rb", "rake", "gemspec"],
        mime: "text/x-ruby",
    },
    LanguageProfile {
        id: "swift",
        line_comments: SLASH_LINE,
        block_comments: SLASH_STAR,
        nested_blocks: true,
        line_continuation: false,
        code_markers: &[],
        literals: &[Literal::multiline("\"\"\""), Literal::quoted("\"")],
        extensions: &["swift"],
        mime: "text/x-swift",
    },
    LanguageProfile {
        id: "kotlin",
        line_comments: SLASH_LINE,
        block_comments: SLASH_STAR,
        nested_blocks: true,
        line_continuation: false,
        code_markers: &[],
        literals: &[
            Literal::raw("\"\"\"", "\"\"\""),
            Literal::quoted("\""),
            Literal::quoted("'"),
        ],
        extensions: &["kt", "kts"],
        mime: "text/x-kotlin",
    },
    LanguageProfile {
        id: "scala",
        line_comments: SLASH_LINE,
        block_comments: SLASH_STAR,
        nested_blocks: true,
        line_continuation: false,
        code_markers: &[],
        literals: &[
            Literal::raw("\"\"\"", "\"\"\""),
            Literal::quoted("\""),
            Literal::Char,
        ],
        extensions: &["scala", "sc"],
        mime: "text/x-scala",
    },
    LanguageProfile {
        id: "html",
        line_comments: &[],
        block_comments: &[BlockComment::new("<!--", "-->")],
        nested_blocks: false,
        line_continuation: false,
        code_markers: &[],
        literals: &[],
        extensions: &["html", "htm", "xhtml"],
        mime: "text/html",
    },
    LanguageProfile {
        id: "css",
        line_comments: &[],
        block_comments: SLASH_STAR,
        nested_blocks: false,
        line_continuation: false,
        code_markers: &[],
        literals: &[Literal::quoted("\""), Literal::quoted("'")],
        extensions: &["css"],
        mime: "text/css",
    },
    LanguageProfile {
        id: "sql",
        line_comments: &["--"],
        block_comments: SLASH_STAR,
        nested_blocks: false,
        line_continuation: false,
        code_markers: &[],
        literals: &[Literal::raw("'", "'"), Literal::raw("\"", "\"")],
        extensions: &["sql"],
        mime: "application/sql",
    },
];

static REGISTRY: Lazy<BTreeMap<&'static str, &'static LanguageProfile>> =
    Lazy::new(|| PROFILES.iter().map(|p| (p.id, p)).collect());

/// Look up a profile by its exact lowercase identifier.
pub fn profile_for(id: &str) -> Result<&'static LanguageProfile> {
    REGISTRY
        .get(id)
        .copied()
        .ok_or_else(|| StripError::UnsupportedLanguage(id.to_string()))
}

/// Find the profile claiming a file extension (case-insensitive, no dot).
pub fn for_extension(ext: &str) -> Option<&'static LanguageProfile> {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    PROFILES
        .iter()
        .find(|p| p.extensions.iter().any(|e| *e == ext))
}

/// Sorted identifiers of every registered language.
pub fn languages() -> Vec<&'static str> {
    REGISTRY.keys().copied().collect()
}

/// Every registered profile, sorted by identifier.
pub fn all() -> impl Iterator<Item = &'static LanguageProfile> {
    REGISTRY.values().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: &[&str] = &[
        "python",
        "javascript",
        "typescript",
        "java",
        "c",
        "cpp",
        "csharp",
        "go",
        "rust",
        "php",
        "ruby",
        "swift",
        "kotlin",
        "scala",
        "html",
        "css",
        "sql",
    ];

    #[test]
    fn every_required_language_is_registered() {
        for id in REQUIRED {
            let profile = profile_for(id).unwrap();
            assert_eq!(profile.id, *id);
        }
        assert_eq!(languages().len(), REQUIRED.len());
    }

    #[test]
    fn languages_are_sorted() {
        let ids = languages();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn lookup_is_exact_and_lowercase() {
        assert!(matches!(
            profile_for("Python"),
            Err(StripError::UnsupportedLanguage(ref s)) if s == "Python"
        ));
        assert!(profile_for("cobol").is_err());
        assert!(profile_for("").is_err());
    }

    #[test]
    fn markers_of_different_kinds_never_prefix_each_other() {
        for profile in all() {
            let markers = profile.markers();
            for (kind_a, a) in &markers {
                for (kind_b, b) in &markers {
                    if kind_a != kind_b {
                        assert!(
                            !b.starts_with(a),
                            "{}: {kind_a} marker {a:?} is a prefix of {kind_b} marker {b:?}",
                            profile.id
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn extensions_are_unique_across_profiles() {
        let mut seen = std::collections::HashSet::new();
        for profile in all() {
            for ext in profile.extensions {
                assert!(seen.insert(*ext), "{ext} claimed twice");
            }
        }
    }

    #[test]
    fn for_extension_ignores_case_and_dot() {
        assert_eq!(for_extension(".PY").map(|p| p.id), Some("python"));
        assert_eq!(for_extension("hpp").map(|p| p.id), Some("cpp"));
        assert_eq!(for_extension("txt"), None);
    }

    #[test]
    fn default_extension_is_first_listed() {
        assert_eq!(profile_for("cpp").unwrap().default_extension(), "cpp");
        assert_eq!(profile_for("typescript").unwrap().default_extension(), "ts");
    }
}

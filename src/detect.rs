//! Working out which profile applies: by name, by file extension, or by
//! looking at the code itself.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;
use crate::profile::{self, LanguageProfile};

/// Names people type instead of the registry identifier.
const ALIASES: &[(&str, &str)] = &[
    ("c++", "cpp"),
    ("cxx", "cpp"),
    ("c#", "csharp"),
    ("cs", "csharp"),
    ("js", "javascript"),
    ("node", "javascript"),
    ("ts", "typescript"),
    ("py", "python"),
    ("python3", "python"),
    ("rb", "ruby"),
    ("rs", "rust"),
    ("golang", "go"),
    ("kt", "kotlin"),
    ("htm", "html"),
];

/// Resolve a user-supplied language name (any case, aliases allowed).
pub fn resolve_language(name: &str) -> Result<&'static LanguageProfile> {
    let normalized = name.trim().to_ascii_lowercase();
    let id = ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map_or(normalized.as_str(), |(_, id)| *id);
    profile::profile_for(id)
}

/// Pick a profile from a file name's extension.
pub fn language_for_path(path: &Path) -> Option<&'static LanguageProfile> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(profile::for_extension)
}

/// Patterns that hint at a language.
const HINT_PATTERNS: &[(&str, &[&str])] = &[
    (
        "python",
        &[
            r"(?m)^\s*def\s+\w+\s*\(.*\)\s*(->\s*[\w\[\], ]+)?:",
            r"(?m)^\s*(from\s+[\w.]+\s+)?import\s+\w+",
            r#"if\s+__name__\s*==\s*["']__main__["']"#,
            r"(?m)^\s*elif\b",
            r"\bself\.\w+",
        ],
    ),
    (
        "javascript",
        &[
            r"\bfunction\s+\w+\s*\(",
            r"\b(const|let|var)\s+\w+\s*=",
            r"console\.log\s*\(",
            r"\bdocument\.\w+",
            r#"\brequire\(\s*['"]"#,
        ],
    ),
    (
        "typescript",
        &[
            r"\binterface\s+\w+\s*\{",
            r"\btype\s+\w+\s*=",
            r":\s*(string|number|boolean)\b",
            r"\bexport\s+(interface|type|class)\b",
        ],
    ),
    (
        "java",
        &[
            r"\bpublic\s+(final\s+)?class\s+\w+",
            r"public\s+static\s+void\s+main",
            r"(?m)^\s*import\s+[\w.]+(\.\*)?;",
            r"System\.out\.print",
            r"(?m)^\s*package\s+[\w.]+;",
        ],
    ),
    (
        "c",
        &[
            r"#include\s*<\w+\.h>",
            r"\bint\s+main\s*\(",
            r"\bprintf\s*\(",
            r"\bmalloc\s*\(",
            r"\btypedef\s+struct\b",
        ],
    ),
    (
        "cpp",
        &[
            r"#include\s*<\w+>",
            r"using\s+namespace\s+std",
            r"\bstd::\w+",
            r"\btemplate\s*<",
            r"\bcout\s*<<",
        ],
    ),
    (
        "csharp",
        &[
            r"(?m)^\s*using\s+System",
            r"\bnamespace\s+[\w.]+",
            r"Console\.Write(Line)?\s*\(",
            r"\{\s*get;\s*set;\s*\}",
        ],
    ),
    (
        "go",
        &[
            r"(?m)^\s*package\s+\w+\s*$",
            r"(?m)^\s*import\s+\(",
            r"\bfunc\s+(\(\w+\s+\*?\w+\)\s*)?\w+\s*\(",
            r"\bfmt\.\w+",
            r":=",
        ],
    ),
    (
        "rust",
        &[
            r"\bfn\s+\w+\s*[<(]",
            r"\blet\s+mut\s+\w+",
            r"(?m)^\s*use\s+\w+::",
            r"\w+!\s*\(",
            r"\bimpl\b",
        ],
    ),
    (
        "php",
        &[
            r"<\?php",
            r"\$\w+\s*=",
            r"\becho\s+",
            r"\bfunction\s+\w+\s*\(",
        ],
    ),
    (
        "ruby",
        &[
            r"(?m)^\s*def\s+\w+[?!]?\s*$",
            r"(?m)^\s*end\s*$",
            r#"(?m)^\s*require\s+['"]"#,
            r"\bputs\s+",
            r"\bdo\s*\|",
        ],
    ),
    (
        "swift",
        &[
            r"(?m)^\s*import\s+(UIKit|Foundation|SwiftUI)\b",
            r"\bfunc\s+\w+\s*\(",
            r"\bvar\s+\w+\s*:\s*\w+",
            r"\bguard\s+let\b",
        ],
    ),
    (
        "kotlin",
        &[
            r"\bfun\s+\w+\s*\(",
            r"\bval\s+\w+",
            r"\bprintln\s*\(",
            r"(?m)^\s*package\s+[\w.]+\s*$",
            r"\bdata\s+class\b",
        ],
    ),
    (
        "scala",
        &[
            r"\bobject\s+\w+",
            r"\bdef\s+\w+\s*[(\[:=]",
            r"\bval\s+\w+",
            r"\bcase\s+class\b",
            r"\bextends\s+App\b",
        ],
    ),
    (
        "html",
        &[
            r"(?i)<!DOCTYPE\s+html>",
            r"(?i)<html[\s>]",
            r"(?i)<head[\s>]",
            r"(?i)<body[\s>]",
            r"</\w+>",
        ],
    ),
    (
        "css",
        &[
            r"(?m)^\s*[.#]?[\w-]+\s*\{",
            r"(?m)^\s*[\w-]+\s*:\s*[^;{]+;",
            r"@media\b",
        ],
    ),
    (
        "sql",
        &[
            r"(?i)\bSELECT\s+",
            r"(?i)\bFROM\s+\w+",
            r"(?i)\bWHERE\s+",
            r"(?i)\bINSERT\s+INTO\b",
            r"(?i)\bCREATE\s+TABLE\b",
        ],
    ),
];

/// [`HINT_PATTERNS`] compiled once.
static HINTS: Lazy<Vec<(&'static str, Vec<Regex>)>> = Lazy::new(|| {
    HINT_PATTERNS
        .iter()
        .map(|(id, patterns)| {
            let compiled = patterns
                .iter()
                .filter_map(|pattern| match Regex::new(pattern) {
                    Ok(re) => Some(re),
                    Err(err) => {
                        tracing::warn!(language = *id, %err, "skipping detection pattern");
                        None
                    }
                })
                .collect();
            (*id, compiled)
        })
        .collect()
});

/// Guess the language of `code` from keyword patterns.
///
/// Each language scores the average number of matches per pattern; the best
/// score wins, earlier table entries winning ties. Returns `None` when no
/// pattern matches at all.
pub fn detect_language(code: &str) -> Option<&'static str> {
    if code.trim().is_empty() {
        return None;
    }

    let mut best: Option<(&'static str, f64)> = None;
    for (id, patterns) in HINTS.iter() {
        if patterns.is_empty() {
            continue;
        }
        let hits: usize = patterns.iter().map(|re| re.find_iter(code).count()).sum();
        let score = hits as f64 / patterns.len() as f64;
        if score > 0.0 && best.is_none_or(|(_, top)| score > top) {
            best = Some((*id, score));
        }
    }

    tracing::debug!(?best, "language detection");
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StripError;

    #[test]
    fn aliases_and_case_resolve() {
        assert_eq!(resolve_language("C++").unwrap().id, "cpp");
        assert_eq!(resolve_language(" Python ").unwrap().id, "python");
        assert_eq!(resolve_language("c#").unwrap().id, "csharp");
        assert_eq!(resolve_language("golang").unwrap().id, "go");
    }

    #[test]
    fn unknown_names_are_unsupported() {
        assert_eq!(
            resolve_language("Brainfuck"),
            Err(StripError::UnsupportedLanguage("brainfuck".to_string()))
        );
    }

    #[test]
    fn language_for_path_uses_extension() {
        assert_eq!(language_for_path(Path::new("a/b/main.RS")).map(|p| p.id), Some("rust"));
        assert_eq!(language_for_path(Path::new("x.tsx")).map(|p| p.id), Some("typescript"));
        assert!(language_for_path(Path::new("README")).is_none());
        assert!(language_for_path(Path::new("notes.txt")).is_none());
    }

    #[test]
    fn detects_python() {
        let code = "import os\n\ndef main():\n    print(os.getcwd())\n\nif __name__ == '__main__':\n    main()\n";
        assert_eq!(detect_language(code), Some("python"));
    }

    #[test]
    fn detects_go() {
        let code = "package main\n\nimport (\n\t\"fmt\"\n)\n\nfunc main() {\n\tx := 1\n\tfmt.Println(x)\n}\n";
        assert_eq!(detect_language(code), Some("go"));
    }

    #[test]
    fn detects_sql_html_and_php() {
        assert_eq!(
            detect_language("SELECT id, name FROM users WHERE id = 1;\n"),
            Some("sql")
        );
        assert_eq!(
            detect_language("<!DOCTYPE html>\n<html>\n<body><p>Hi</p></body>\n</html>\n"),
            Some("html")
        );
        assert_eq!(
            detect_language("<?php\n$name = 'x';\necho $name;\n"),
            Some("php")
        );
    }

    #[test]
    fn every_hint_pattern_compiles() {
        for (id, patterns) in HINT_PATTERNS {
            assert!(profile::profile_for(id).is_ok(), "{id} is not a language");
            for pattern in *patterns {
                assert!(Regex::new(pattern).is_ok(), "{id}: bad pattern {pattern}");
            }
        }
        assert_eq!(HINTS.len(), HINT_PATTERNS.len());
    }

    #[test]
    fn nothing_to_go_on() {
        assert_eq!(detect_language(""), None);
        assert_eq!(detect_language("   \n"), None);
        assert_eq!(detect_language("hello world"), None);
    }
}

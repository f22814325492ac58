use std::collections::HashSet;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder};
use serde::Serialize;

pub mod comments;
pub mod detect;
pub mod error;
pub mod profile;
pub mod scanner;
pub mod serve;
pub mod stats;

pub use crate::comments::StripOptions;
pub use crate::error::StripError;
pub use crate::profile::LanguageProfile;
pub use crate::stats::StripStats;

/// Cleaned code for one input, with the language it was processed as.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StripResult {
    pub code: String,
    pub language: &'static str,
    pub stats: StripStats,
}

/// Strip comments from `code`.
///
/// `language` is a registry id or alias; empty or `auto` guesses it from the
/// code. Blank code is rejected with [`StripError::EmptyInput`].
pub fn remove_comments(
    code: &str,
    language: &str,
    options: StripOptions,
) -> error::Result<StripResult> {
    if code.trim().is_empty() {
        return Err(StripError::EmptyInput);
    }

    let language = language.trim();
    let profile = if language.is_empty() || language.eq_ignore_ascii_case("auto") {
        let id = detect::detect_language(code).ok_or(StripError::UndetectedLanguage)?;
        profile::profile_for(id)?
    } else {
        detect::resolve_language(language)?
    };

    strip_with_profile(code, profile, options)
}

/// Strip comments from `code` using an already resolved profile.
///
/// Unlike [`remove_comments`] this accepts empty input, which comes back
/// unchanged.
pub fn strip_with_profile(
    code: &str,
    profile: &'static LanguageProfile,
    options: StripOptions,
) -> error::Result<StripResult> {
    let scanned = scanner::scan(code, profile)?;
    let output = comments::strip(code, &scanned.tokens, options);
    let stats = StripStats::compute(code, &scanned, &output);

    tracing::debug!(
        language = profile.id,
        removed = stats.removed,
        original_lines = stats.original_lines,
        processed_lines = stats.processed_lines,
        "stripped comments"
    );

    Ok(StripResult {
        code: output.code,
        language: profile.id,
        stats,
    })
}

/// Configuration passed from the CLI layer (main.rs) into the file walker.
#[derive(Debug)]
pub struct StripConfig {
    pub paths: Vec<PathBuf>,
    /// Force one language for every file instead of going by extension.
    pub language: Option<String>,
    /// Only process these extensions; empty means every known extension.
    pub exts: HashSet<String>,
    pub follow_symlinks: bool,
    pub no_gitignore: bool,
    pub json: bool,
    pub excludes: Vec<String>,
    pub max_bytes: Option<u64>,
    pub options: StripOptions,
    pub in_place: bool,
    pub stats: bool,
}

#[derive(Serialize)]
struct FileEntry<'a> {
    path: &'a str,
    file_name: String,
    language: &'static str,
    content: &'a str,
    stats: &'a StripStats,
}

pub fn run_with_config(cfg: StripConfig) -> Result<()> {
    let forced = cfg
        .language
        .as_deref()
        .map(detect::resolve_language)
        .transpose()?;
    let exclude_globset = build_exclude_globset(&cfg.excludes)?;

    let mut had_error = false;
    let mut first_file = true;

    if cfg.json {
        println!("[");
    }

    for raw_root in &cfg.paths {
        if raw_root.as_os_str() == "-" {
            if let Err(err) = process_stdin(&cfg, forced, &mut first_file) {
                eprintln!("Error processing stdin: {:#}", err);
                had_error = true;
            }
            continue;
        }

        // Canonicalise roots so running from arbitrary working dirs is reliable.
        let canon_root = match raw_root.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Skipping root {:?}: {}", raw_root, e);
                had_error = true;
                continue;
            }
        };

        let mut builder = WalkBuilder::new(&canon_root);
        builder.follow_links(cfg.follow_symlinks);

        // Helps avoid edge cases where process CWD is invalid and global ignores need a base.
        builder.current_dir(canon_root.clone());

        if cfg.no_gitignore {
            builder
                .git_ignore(false)
                .git_exclude(false)
                .git_global(false)
                .ignore(false);
        } else {
            builder
                .git_ignore(true)
                .git_exclude(true)
                .git_global(true)
                .ignore(true)
                .require_git(false);
        }

        // Values moved into the 'static filter closure must be owned separately.
        let root_for_filter = canon_root.clone();
        let exclude_globset = exclude_globset.clone();

        builder.filter_entry(move |entry: &DirEntry| {
            // Always keep the root.
            if entry.depth() == 0 {
                return true;
            }

            // Apply user exclude globs, relative to the current root.
            if let Some(ref gs) = exclude_globset {
                let path = entry.path();
                let rel = path.strip_prefix(&root_for_filter).unwrap_or(path);
                let rel_norm = normalize_for_matching(rel);

                if gs.is_match(&rel_norm) {
                    return false;
                }

                // If this is a directory, also try a trailing slash to make patterns
                // like `tests/**` able to prune the whole subtree early.
                if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false)
                    && !rel_norm.ends_with('/')
                {
                    let rel_dir = format!("{rel_norm}/");
                    if gs.is_match(&rel_dir) {
                        return false;
                    }
                }
            }

            true
        });

        for result in builder.build() {
            let entry = match result {
                Ok(e) => e,
                Err(err) => {
                    eprintln!("Walk error: {err}");
                    had_error = true;
                    continue;
                }
            };

            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            let path = entry.path();
            if !cfg.exts.is_empty() && !matches_ext(path, &cfg.exts) {
                continue;
            }

            let Some(profile) = forced.or_else(|| detect::language_for_path(path)) else {
                continue;
            };

            let display_path = make_display_path(&canon_root, path);

            if let Some(limit) = cfg.max_bytes
                && let Ok(meta) = fs::metadata(path)
                && meta.len() > limit
            {
                eprintln!(
                    "Skipping {} (size {} bytes > max {} bytes)",
                    display_path,
                    meta.len(),
                    limit
                );
                continue;
            }

            if let Err(err) = process_file(&cfg, path, &display_path, profile, &mut first_file) {
                eprintln!("Error processing {}: {:#}", display_path, err);
                had_error = true;
            }
        }
    }

    if cfg.json {
        println!("\n]");
    }

    if had_error {
        anyhow::bail!("One or more files could not be processed. See stderr for details.");
    }

    Ok(())
}

fn process_stdin(
    cfg: &StripConfig,
    forced: Option<&'static LanguageProfile>,
    first_file: &mut bool,
) -> Result<()> {
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read stdin")?;

    let profile = match forced {
        Some(profile) => profile,
        None => detect::detect_language(&text)
            .map(profile::profile_for)
            .transpose()?
            .context("Could not detect the language of stdin; pass --language")?,
    };

    let result = strip_with_profile(&text, profile, cfg.options)?;
    emit(cfg, "-", "-", &result, first_file)
}

fn process_file(
    cfg: &StripConfig,
    path: &Path,
    display_path: &str,
    profile: &'static LanguageProfile,
    first_file: &mut bool,
) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", display_path))?;
    let text = String::from_utf8(bytes)
        .with_context(|| format!("{} is not valid UTF-8", display_path))?;

    let result = strip_with_profile(&text, profile, cfg.options)?;

    if cfg.in_place {
        if result.code != text {
            fs::write(path, &result.code)
                .with_context(|| format!("Failed to write {}", display_path))?;
        }
        eprintln!(
            "Stripped {}: {} comments removed",
            display_path, result.stats.removed
        );
        return Ok(());
    }

    let file_name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    emit(cfg, display_path, &file_name, &result, first_file)
}

/// Print one stripped input as a headed block or as a JSON array element.
fn emit(
    cfg: &StripConfig,
    display_path: &str,
    file_name: &str,
    result: &StripResult,
    first_file: &mut bool,
) -> Result<()> {
    if cfg.stats {
        eprintln!(
            "{}: {} comments removed ({} -> {} lines, {}% smaller)",
            display_path,
            result.stats.removed,
            result.stats.original_lines,
            result.stats.processed_lines,
            result.stats.compression_ratio
        );
    }

    if cfg.json {
        if !*first_file {
            println!(",");
        }
        let entry = FileEntry {
            path: display_path,
            file_name: file_name.to_string(),
            language: result.language,
            content: &result.code,
            stats: &result.stats,
        };
        print!("{}", serde_json::to_string(&entry)?);
        *first_file = false;
        return Ok(());
    }

    if display_path == "-" {
        print!("{}", result.code);
        return Ok(());
    }

    println!("========== FILE: {} ==========", display_path);
    print!("{}", result.code);

    // Ensure there is a trailing newline before the separator between files.
    if !result.code.ends_with('\n') {
        println!();
    }
    println!();

    *first_file = false;
    Ok(())
}

/// Build a GlobSet from the user–provided `--exclude` patterns.
/// Returns `Ok(None)` if there are no patterns.
fn build_exclude_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();

    for pat in patterns {
        let pat = pat.trim();
        if pat.is_empty() {
            continue;
        }

        let glob =
            Glob::new(pat).with_context(|| format!("Invalid --exclude glob pattern: {pat}"))?;
        builder.add(glob);
    }

    let set = builder
        .build()
        .context("Failed to build exclude glob set")?;

    Ok(Some(set))
}

/// Case-insensitive extension match, using the provided extension set.
pub fn matches_ext(path: &Path, exts: &HashSet<String>) -> bool {
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => exts.contains(&ext.to_ascii_lowercase()),
        None => false,
    }
}

/// Produce a display path relative to `root` (stable regardless of current working directory).
pub fn make_display_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);

    // If root is a file and path == root, rel is empty.
    if rel.as_os_str().is_empty() {
        return path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
    }

    normalize_for_matching(rel)
}

/// Convert paths to a stable, slash-separated form for matching/printing.
fn normalize_for_matching(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

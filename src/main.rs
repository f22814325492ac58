use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use uncomment::serve::config::{Config as ServeConfig, DEFAULT_MAX_BODY_BYTES};
use uncomment::{StripConfig, StripOptions, profile, run_with_config};

/// uncomment - strip comments from source code.
#[derive(Parser, Debug)]
#[command(
    name = "uncomment",
    author,
    version,
    about = "Strip comments from source code in 17 languages",
    long_about = r#"Strip comments from source code without touching string literals.

Comment-only lines are kept as empty lines so line numbers still match the
original, unless --compact is given. Files are picked by extension and walked
the way git sees the tree:
  • respects .gitignore / .ignore / git exclude files
  • allows adding extra exclude globs
  • `-` reads one snippet from stdin

Typical usage:
  uncomment strip src
  uncomment strip -t py,rs --in-place .
  cat query.sql | uncomment strip -l sql -
  uncomment serve --addr 0.0.0.0:8000
"#
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Strip comments from files, directory trees or stdin.
    Strip(StripArgs),

    /// List the supported language ids.
    Languages {
        /// Print a JSON array instead of one id per line.
        #[arg(long = "json")]
        json: bool,
    },

    /// Run the HTTP API.
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct StripArgs {
    /// Paths to process (files or directories, `-` for stdin). Defaults to
    /// the current directory.
    #[arg(value_name = "PATH", default_value = ".")]
    paths: Vec<PathBuf>,

    /// Treat every input as this language instead of going by extension.
    #[arg(short = 'l', long = "language", value_name = "LANG")]
    language: Option<String>,

    /// Only process these file extensions (e.g. py, rs).
    ///
    /// Can be repeated or comma-separated:
    ///   uncomment strip -t py,rs
    ///   uncomment strip -t py -t rs
    #[arg(
        short = 't',
        long = "type",
        alias = "ext",
        value_name = "EXT",
        action = ArgAction::Append,
        value_delimiter = ','
    )]
    exts: Vec<String>,

    /// Follow symbolic links during traversal.
    #[arg(long = "follow-symlinks")]
    follow_symlinks: bool,

    /// Disable reading .gitignore / .ignore / git exclude files.
    #[arg(long = "no-gitignore")]
    no_gitignore: bool,

    /// Additional glob patterns to exclude (files or directories).
    ///
    /// Patterns are evaluated relative to each PATH root, e.g.:
    ///
    ///   uncomment strip --exclude 'migrations/**'
    ///   uncomment strip --exclude 'tests/**,*.gen.py'
    #[arg(
        long = "exclude",
        short = 'E',
        value_name = "GLOB",
        action = ArgAction::Append,
        value_delimiter = ','
    )]
    excludes: Vec<String>,

    /// Maximum file size to process, in bytes (skip larger files).
    #[arg(long = "max-bytes", value_name = "N")]
    max_bytes: Option<u64>,

    /// Drop lines left empty by removed comments.
    #[arg(long = "compact")]
    compact: bool,

    /// Output as a JSON array of objects { "path", "language", "content", "stats" }.
    #[arg(long = "json", conflicts_with = "in_place")]
    json: bool,

    /// Rewrite files in place instead of printing them.
    #[arg(long = "in-place", short = 'i')]
    in_place: bool,

    /// Print per-file statistics to stderr.
    #[arg(long = "stats")]
    stats: bool,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long = "addr", env = "UNCOMMENT_ADDR", default_value = "127.0.0.1:8000")]
    addr: String,

    /// Directory with a static front-end to serve for unknown paths.
    #[arg(long = "static-dir", env = "UNCOMMENT_STATIC_DIR", value_name = "DIR")]
    static_dir: Option<PathBuf>,

    /// Largest accepted request body, in bytes.
    #[arg(
        long = "max-body-bytes",
        env = "UNCOMMENT_MAX_BODY_BYTES",
        value_name = "N",
        default_value_t = DEFAULT_MAX_BODY_BYTES
    )]
    max_body_bytes: usize,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Strip(args) => strip(args),
        Command::Languages { json } => list_languages(json),
        Command::Serve(args) => serve(args),
    }
}

fn strip(args: StripArgs) -> Result<()> {
    // Normalise extensions to lowercase, no leading dot.
    let mut ext_set = HashSet::new();
    for e in &args.exts {
        let norm = e.trim().trim_start_matches('.').to_ascii_lowercase();
        if !norm.is_empty() {
            ext_set.insert(norm);
        }
    }

    let cfg = StripConfig {
        paths: args.paths,
        language: args.language,
        exts: ext_set,
        follow_symlinks: args.follow_symlinks,
        no_gitignore: args.no_gitignore,
        json: args.json,
        excludes: args.excludes,
        max_bytes: args.max_bytes,
        options: StripOptions {
            preserve_structure: !args.compact,
        },
        in_place: args.in_place,
        stats: args.stats,
    };

    run_with_config(cfg)
}

fn list_languages(json: bool) -> Result<()> {
    let languages = profile::languages();
    if json {
        println!("{}", serde_json::to_string(&languages)?);
    } else {
        for id in languages {
            println!("{id}");
        }
    }
    Ok(())
}

fn serve(args: ServeArgs) -> Result<()> {
    let config = ServeConfig {
        listen_addr: args.addr,
        static_dir: args.static_dir,
        max_body_bytes: args.max_body_bytes,
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start the async runtime")?;
    runtime.block_on(uncomment::serve::run(config))
}

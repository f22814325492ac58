use std::path::PathBuf;

/// Upload and form bodies above this many bytes are rejected.
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Configuration for the serve subcommand.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub static_dir: Option<PathBuf>,
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8000".to_string(),
            static_dir: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

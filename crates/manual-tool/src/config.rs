use std::env;
use std::path::PathBuf;

use chess_manual::RecFormat;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Target format for `batch` and for outputs without a usable extension.
    pub output_format: RecFormat,
    /// Default input root for `batch`.
    pub manual_dir: Option<PathBuf>,
    /// Keep converting after a file fails.
    pub continue_on_error: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_format: RecFormat::PgnCc,
            manual_dir: None,
            continue_on_error: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            output_format: lookup("XQ_OUTPUT_FORMAT")
                .and_then(|v| RecFormat::parse(&v))
                .unwrap_or(defaults.output_format),
            manual_dir: lookup("XQ_MANUAL_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            continue_on_error: lookup("XQ_CONTINUE_ON_ERROR")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.continue_on_error),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

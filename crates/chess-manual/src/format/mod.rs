//! Record formats, selected by file extension.

pub mod bin;
pub mod cc;
pub mod json;
pub mod pgn;
pub mod xqf;

use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecFormat {
    Xqf,
    Bin,
    Json,
    PgnIccs,
    PgnZh,
    PgnCc,
}

impl RecFormat {
    pub const ALL: [RecFormat; 6] = [
        RecFormat::Xqf,
        RecFormat::Bin,
        RecFormat::Json,
        RecFormat::PgnIccs,
        RecFormat::PgnZh,
        RecFormat::PgnCc,
    ];

    /// Extension including the leading dot.
    pub fn ext(self) -> &'static str {
        match self {
            RecFormat::Xqf => ".xqf",
            RecFormat::Bin => ".bin",
            RecFormat::Json => ".json",
            RecFormat::PgnIccs => ".pgn_iccs",
            RecFormat::PgnZh => ".pgn_zh",
            RecFormat::PgnCc => ".pgn_cc",
        }
    }

    /// Exact extension match, with or without the leading dot.
    pub fn parse(ext: &str) -> Option<RecFormat> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        RecFormat::ALL.into_iter().find(|f| f.ext()[1..] == ext)
    }

    /// Format for an extension; anything unrecognised is treated as tabular text.
    pub fn from_ext(ext: &str) -> RecFormat {
        RecFormat::parse(ext).unwrap_or(RecFormat::PgnCc)
    }

    pub fn from_path(path: &Path) -> RecFormat {
        RecFormat::from_ext(path.extension().and_then(|e| e.to_str()).unwrap_or_default())
    }

    pub fn is_text(self) -> bool {
        matches!(self, RecFormat::PgnIccs | RecFormat::PgnZh | RecFormat::PgnCc)
    }
}

impl fmt::Display for RecFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ext()[1..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_map() {
        for fmt in RecFormat::ALL {
            assert_eq!(RecFormat::from_ext(fmt.ext()), fmt);
        }
        assert_eq!(RecFormat::from_ext("PGN_ZH"), RecFormat::PgnZh);
        assert_eq!(RecFormat::from_ext("txt"), RecFormat::PgnCc);
        assert_eq!(RecFormat::parse("txt"), None);
        assert_eq!(RecFormat::from_path(Path::new("a/b/game.xqf")), RecFormat::Xqf);
        assert_eq!(RecFormat::from_path(Path::new("noext")), RecFormat::PgnCc);
    }
}

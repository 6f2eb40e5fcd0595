use std::path::PathBuf;

/// Errors that can occur building or parsing messages.
#[derive(Debug, thiserror::Error)]
pub enum MsgError {
    /// More character ranges than the word generator supports.
    #[error("too many character ranges ({count}, max {max})")]
    TooManyRanges { count: usize, max: usize },

    /// A character range is empty, too long or otherwise malformed.
    #[error("bad character range {index}: {reason}")]
    BadRange { index: usize, reason: String },

    /// More inserted words than the word generator supports.
    #[error("too many inserted words ({count}, max {max})")]
    TooManyWords { count: usize, max: usize },

    /// A word insert position lies past the last range.
    #[error("word insert position {pos} beyond {num_ranges} ranges")]
    BadInsertPos { pos: u8, num_ranges: usize },

    /// Comparator salt uses more than 12 bits.
    #[error("bad salt 0x{0:04x} (12 bits max)")]
    BadSalt(u16),

    /// Comparator hash count out of range.
    #[error("bad hash count {count} (expected 1..={max})")]
    BadHashCount { count: usize, max: usize },

    /// Comparator hashes are not sorted ascending.
    #[error("hashes not sorted ascending at index {index}")]
    UnsortedHashes { index: usize },

    /// A word list entry contains a NUL byte.
    #[error("word {index} contains a NUL byte")]
    WordContainsNul { index: usize },

    /// The packet type is not a known result type.
    #[error("unexpected packet type 0x{0:02x}")]
    UnknownType(u8),

    /// A result packet is shorter than its type requires.
    #[error("truncated packet type 0x{pkt_type:02x} ({len} bytes, need {need})")]
    Truncated { pkt_type: u8, len: usize, need: usize },

    /// Packet construction failed.
    #[error("packet error: {0}")]
    Packet(#[from] pkt_comm::PktCommError),

    /// A configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A configuration file exceeds the size limit.
    #[error("config file {path} too large ({size} bytes, max {max})")]
    ConfigTooLarge { path: PathBuf, size: u64, max: u64 },

    /// A configuration file is not valid JSON for the expected message.
    #[error("invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, MsgError>;

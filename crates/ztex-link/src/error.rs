/// Errors reported by a link-layer adapter.
///
/// [`Io`](LinkError::Io) and [`Closed`](LinkError::Closed) are raised by
/// adapters over real USB device handles; [`MemoryLink`](crate::MemoryLink)
/// only produces `Transfer`.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The transfer failed with a negative completion code from the adapter.
    #[error("link transfer failed with code {code}")]
    Transfer { code: i32 },

    /// The adapter reported more bytes than it was offered.
    #[error("link reported {reported} bytes for a {offered}-byte transfer")]
    Overrun { reported: usize, offered: usize },

    /// Link parameters are unusable.
    #[error("invalid link parameters: {0}")]
    InvalidParams(String),

    /// An I/O error occurred on the underlying device handle.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The link has been closed.
    #[error("link closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, LinkError>;

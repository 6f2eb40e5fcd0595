use crate::packet::Packet;

/// Errors that can occur in packet construction and framing.
#[derive(Debug, thiserror::Error)]
pub enum PktCommError {
    /// Packet type 0 is reserved.
    #[error("invalid packet type 0")]
    InvalidType,

    /// The payload exceeds the protocol maximum.
    #[error("packet too large ({size} bytes, max {max})")]
    PacketTooLarge { size: usize, max: usize },

    /// A received header carries an unsupported protocol version.
    #[error("unsupported packet version {0} (expected 1)")]
    BadVersion(u8),

    /// A received packet failed checksum verification.
    #[error("checksum mismatch (header 0x{expected:02x}, computed 0x{computed:02x})")]
    BadChecksum { expected: u8, computed: u8 },

    /// A packet queue had no free slot.
    #[error(transparent)]
    QueueFull(#[from] QueueFull),

    /// The link layer reported a failed or inconsistent transfer.
    #[error("link error: {0}")]
    Link(#[from] ztex_link::LinkError),

    /// Input completion was reported while earlier bytes were still held
    /// back by a full input queue.
    #[error("input completed while {held} received bytes are still held")]
    InputHeld { held: usize },

    /// Channel configuration is unusable.
    #[error("invalid channel configuration: {0}")]
    InvalidConfig(String),

    /// The channel hit an earlier fatal error and must be recreated.
    #[error("channel failed: {0}")]
    ChannelFailed(String),
}

impl PktCommError {
    /// True for errors that mean the byte stream can no longer be trusted.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            PktCommError::InvalidType
                | PktCommError::PacketTooLarge { .. }
                | PktCommError::BadVersion(_)
                | PktCommError::BadChecksum { .. }
        )
    }
}

/// A push onto a full queue. The rejected packet is handed back.
#[derive(Debug, thiserror::Error)]
#[error("packet queue full ({capacity} slots)")]
pub struct QueueFull {
    pub packet: Packet,
    pub capacity: usize,
}

impl QueueFull {
    /// Take back ownership of the rejected packet.
    pub fn into_packet(self) -> Packet {
        self.packet
    }
}

pub type Result<T> = std::result::Result<T, PktCommError>;

use bytes::{Buf, BufMut, BytesMut};
use ztex_link::LinkParams;

use crate::error::{PktCommError, Result};
use crate::packet::Packet;
use crate::queue::PKT_QUEUE_MAX;

/// Packet protocol version.
pub const PKT_COMM_VERSION: u8 = 1;

/// Header: version, type, checksum, reserved, length (3), reserved, id (2).
pub const HEADER_LEN: usize = 10;

/// Maximum payload length. A packet may span many link transfers.
pub const PKT_MAX_LEN: usize = 4 * 65536;

const CHECKSUM_OFFSET: usize = 2;

/// A packet header as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub pkt_type: u8,
    pub checksum: u8,
    pub reserved0: u8,
    pub data_len: usize,
    pub reserved1: u8,
    pub id: u16,
}

impl Header {
    /// Header for an outbound packet, checksum not yet stamped.
    pub fn for_packet(packet: &Packet) -> Self {
        Self {
            version: PKT_COMM_VERSION,
            pkt_type: packet.pkt_type(),
            checksum: 0,
            reserved0: 0,
            data_len: packet.data_len(),
            reserved1: 0,
            id: packet.id(),
        }
    }

    /// Read a header from its raw bytes. No validation is done.
    pub fn parse(raw: &[u8; HEADER_LEN]) -> Self {
        Self {
            version: raw[0],
            pkt_type: raw[1],
            checksum: raw[2],
            reserved0: raw[3],
            data_len: raw[4] as usize | (raw[5] as usize) << 8 | (raw[6] as usize) << 16,
            reserved1: raw[7],
            id: u16::from_le_bytes([raw[8], raw[9]]),
        }
    }

    /// Raw header bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let len = self.data_len;
        let id = self.id.to_le_bytes();
        [
            self.version,
            self.pkt_type,
            self.checksum,
            self.reserved0,
            len as u8,
            (len >> 8) as u8,
            (len >> 16) as u8,
            self.reserved1,
            id[0],
            id[1],
        ]
    }

    /// Check version, type and length of a received header.
    pub fn validate(&self) -> Result<()> {
        if self.version != PKT_COMM_VERSION {
            return Err(PktCommError::BadVersion(self.version));
        }
        if self.pkt_type == 0 {
            return Err(PktCommError::InvalidType);
        }
        if self.data_len > PKT_MAX_LEN {
            return Err(PktCommError::PacketTooLarge {
                size: self.data_len,
                max: PKT_MAX_LEN,
            });
        }
        Ok(())
    }
}

/// Packet checksum: XOR of every header byte except the checksum itself and
/// every payload byte, inverted.
pub fn checksum(header: &[u8; HEADER_LEN], data: &[u8]) -> u8 {
    let folded = header
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != CHECKSUM_OFFSET)
        .map(|(_, b)| *b)
        .chain(data.iter().copied())
        .fold(0u8, |acc, b| acc ^ b);
    !folded
}

/// Encode a packet into the wire format.
///
/// Wire format:
/// ```text
/// ┌─────────┬──────┬──────────┬──────┬──────────────┬──────┬─────────┬──────────────┐
/// │ Version │ Type │ Checksum │ Rsvd │ Length       │ Rsvd │ Id      │ Payload      │
/// │ (1B)    │ (1B) │ (1B)     │ (1B) │ (3B LE)      │ (1B) │ (2B LE) │ (Length B)   │
/// └─────────┴──────┴──────────┴──────┴──────────────┴──────┴─────────┴──────────────┘
/// ```
pub fn encode_packet(packet: &Packet, dst: &mut BytesMut) {
    let mut raw = Header::for_packet(packet).to_bytes();
    raw[CHECKSUM_OFFSET] = checksum(&raw, packet.data());
    dst.reserve(HEADER_LEN + packet.data_len());
    dst.put_slice(&raw);
    dst.put_slice(packet.data());
}

/// Decode a packet from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete packet yet.
/// On success, consumes the packet bytes from the buffer.
pub fn decode_packet(src: &mut BytesMut) -> Result<Option<Packet>> {
    if src.len() < HEADER_LEN {
        return Ok(None);
    }

    let mut raw = [0u8; HEADER_LEN];
    raw.copy_from_slice(&src[..HEADER_LEN]);
    let header = Header::parse(&raw);
    header.validate()?;

    let total = HEADER_LEN + header.data_len;
    if src.len() < total {
        return Ok(None);
    }

    let computed = checksum(&raw, &src[HEADER_LEN..total]);
    if computed != header.checksum {
        return Err(PktCommError::BadChecksum {
            expected: header.checksum,
            computed,
        });
    }

    src.advance(HEADER_LEN);
    let data = src.split_to(header.data_len).freeze();
    Ok(Some(Packet::from_wire(header.pkt_type, header.id, data)))
}

/// Configuration for a packet channel.
#[derive(Debug, Clone)]
pub struct PktCommConfig {
    /// Link transfer limits.
    pub params: LinkParams,
    /// Output queue slots. Default: 2000.
    pub output_queue_capacity: usize,
    /// Input queue slots. Default: 2000.
    pub input_queue_capacity: usize,
}

impl PktCommConfig {
    pub fn new(params: LinkParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn with_output_queue_capacity(mut self, capacity: usize) -> Self {
        self.output_queue_capacity = capacity;
        self
    }

    pub fn with_input_queue_capacity(mut self, capacity: usize) -> Self {
        self.input_queue_capacity = capacity;
        self
    }

    /// Reject link parameters or queue sizes that cannot make progress.
    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;
        if self.output_queue_capacity == 0 || self.input_queue_capacity == 0 {
            return Err(PktCommError::InvalidConfig(
                "queue capacity must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PktCommConfig {
    fn default() -> Self {
        Self {
            params: LinkParams::default(),
            output_queue_capacity: PKT_QUEUE_MAX,
            input_queue_capacity: PKT_QUEUE_MAX,
        }
    }
}

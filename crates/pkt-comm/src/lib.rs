//! Packet communication with a remote FPGA over an arbitrary link layer.
//!
//! Communication is a sequence of packets. Every packet on the wire carries a
//! 10-byte header:
//! - version (1), type (> 0), checksum, reserved byte
//! - 24-bit little-endian payload length, reserved byte
//! - 16-bit little-endian packet id
//!
//! A [`PktComm`] owns one output and one input pipeline. The link layer sees
//! only byte chunks; packets may be split or merged across any number of
//! transfers in either direction.

pub mod channel;
pub mod codec;
pub mod error;
pub mod packet;
pub mod queue;
pub mod reader;
pub mod writer;

pub use channel::{PktComm, PktCommStats};
pub use codec::{
    checksum, decode_packet, encode_packet, Header, PktCommConfig, HEADER_LEN, PKT_COMM_VERSION,
    PKT_MAX_LEN,
};
pub use error::{PktCommError, QueueFull, Result};
pub use packet::Packet;
pub use queue::{PacketQueue, PKT_QUEUE_MAX};
pub use reader::InputPipeline;
pub use writer::OutputPipeline;
pub use ztex_link::{Link, LinkError, LinkParams};

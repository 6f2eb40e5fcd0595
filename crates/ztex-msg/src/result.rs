use bytes::{Buf, BufMut, BytesMut};
use pkt_comm::Packet;
use serde::Serialize;

use crate::error::{MsgError, Result};
use crate::types::{PKT_TYPE_CMP_EQUAL, PKT_TYPE_PROCESSING_DONE};

/// The comparator found a generated candidate equal to one of its hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CmpEqual {
    /// Id of the word list packet the candidate came from.
    pub pkt_id: u16,
    /// Index of the word within that word list.
    pub word_id: u16,
    /// Index of the candidate in the generated sequence.
    pub gen_id: u32,
    /// Index of the matching hash in the comparator configuration.
    pub hash_num_eq: u16,
}

impl CmpEqual {
    pub const DATA_LEN: usize = 8;

    fn decode(pkt_id: u16, mut data: &[u8]) -> Self {
        Self {
            pkt_id,
            word_id: data.get_u16_le(),
            gen_id: data.get_u32_le(),
            hash_num_eq: data.get_u16_le(),
        }
    }

    /// Build the packet the FPGA sends for this result.
    pub fn to_packet(&self) -> Result<Packet> {
        let mut buf = BytesMut::with_capacity(Self::DATA_LEN);
        buf.put_u16_le(self.word_id);
        buf.put_u32_le(self.gen_id);
        buf.put_u16_le(self.hash_num_eq);
        Ok(Packet::new(PKT_TYPE_CMP_EQUAL, buf.freeze())?.with_id(self.pkt_id))
    }
}

/// The FPGA finished a word generator packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProcessingDone {
    pub pkt_id: u16,
    /// Candidates generated and compared.
    pub num_processed: u32,
}

impl ProcessingDone {
    pub const DATA_LEN: usize = 4;

    fn decode(pkt_id: u16, mut data: &[u8]) -> Self {
        Self {
            pkt_id,
            num_processed: data.get_u32_le(),
        }
    }

    pub fn to_packet(&self) -> Result<Packet> {
        Ok(Packet::new(PKT_TYPE_PROCESSING_DONE, self.num_processed.to_le_bytes().to_vec())?
            .with_id(self.pkt_id))
    }
}

/// A packet received from the FPGA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InPacket {
    CmpEqual(CmpEqual),
    ProcessingDone(ProcessingDone),
}

impl InPacket {
    /// Interpret a received packet.
    pub fn parse(packet: &Packet) -> Result<Self> {
        let data = packet.data().as_ref();
        let need = match packet.pkt_type() {
            PKT_TYPE_CMP_EQUAL => CmpEqual::DATA_LEN,
            PKT_TYPE_PROCESSING_DONE => ProcessingDone::DATA_LEN,
            other => return Err(MsgError::UnknownType(other)),
        };
        if data.len() < need {
            return Err(MsgError::Truncated {
                pkt_type: packet.pkt_type(),
                len: data.len(),
                need,
            });
        }

        Ok(match packet.pkt_type() {
            PKT_TYPE_CMP_EQUAL => InPacket::CmpEqual(CmpEqual::decode(packet.id(), data)),
            _ => InPacket::ProcessingDone(ProcessingDone::decode(packet.id(), data)),
        })
    }

    pub fn pkt_id(&self) -> u16 {
        match self {
            InPacket::CmpEqual(result) => result.pkt_id,
            InPacket::ProcessingDone(result) => result.pkt_id,
        }
    }
}

impl TryFrom<&Packet> for InPacket {
    type Error = MsgError;

    fn try_from(packet: &Packet) -> Result<Self> {
        InPacket::parse(packet)
    }
}

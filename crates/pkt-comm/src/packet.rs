use bytes::Bytes;

use crate::codec::{self, Header, HEADER_LEN, PKT_COMM_VERSION, PKT_MAX_LEN};
use crate::error::{PktCommError, Result};

/// One protocol message: type, correlation id and owned payload.
///
/// A constructed packet always has a non-zero type and a payload within
/// [`PKT_MAX_LEN`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pkt_type: u8,
    id: u16,
    data: Bytes,
}

impl Packet {
    /// Create a packet, taking ownership of the payload.
    pub fn new(pkt_type: u8, data: impl Into<Bytes>) -> Result<Self> {
        if pkt_type == 0 {
            return Err(PktCommError::InvalidType);
        }
        let data = data.into();
        if data.len() > PKT_MAX_LEN {
            return Err(PktCommError::PacketTooLarge {
                size: data.len(),
                max: PKT_MAX_LEN,
            });
        }
        Ok(Self {
            pkt_type,
            id: 0,
            data,
        })
    }

    /// Packet from an already validated header.
    pub(crate) fn from_wire(pkt_type: u8, id: u16, data: Bytes) -> Self {
        Self { pkt_type, id, data }
    }

    /// Set the correlation id.
    pub fn with_id(mut self, id: u16) -> Self {
        self.id = id;
        self
    }

    pub fn set_id(&mut self, id: u16) {
        self.id = id;
    }

    pub fn version(&self) -> u8 {
        PKT_COMM_VERSION
    }

    pub fn pkt_type(&self) -> u8 {
        self.pkt_type
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// Give up the packet and keep its payload.
    pub fn into_data(self) -> Bytes {
        self.data
    }

    /// The checksum this packet carries on the wire.
    pub fn checksum(&self) -> u8 {
        codec::checksum(&Header::for_packet(self).to_bytes(), &self.data)
    }

    /// The total wire size of this packet (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_LEN + self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_type_zero() {
        let err = Packet::new(0, &b"x"[..]).unwrap_err();
        assert!(matches!(err, PktCommError::InvalidType));
    }

    #[test]
    fn new_rejects_oversized_payload() {
        let err = Packet::new(2, vec![0u8; PKT_MAX_LEN + 1]).unwrap_err();
        assert!(matches!(
            err,
            PktCommError::PacketTooLarge { size, max }
                if size == PKT_MAX_LEN + 1 && max == PKT_MAX_LEN
        ));
    }

    #[test]
    fn new_accepts_maximum_payload() {
        let packet = Packet::new(2, vec![0u8; PKT_MAX_LEN]).unwrap();
        assert_eq!(packet.data_len(), PKT_MAX_LEN);
    }

    #[test]
    fn empty_payload_is_valid() {
        let packet = Packet::new(1, Bytes::new()).unwrap();
        assert_eq!(packet.data_len(), 0);
        assert_eq!(packet.wire_size(), HEADER_LEN);
    }

    #[test]
    fn payload_is_not_copied() {
        let payload = Bytes::from_static(b"owned");
        let ptr = payload.as_ptr();
        let packet = Packet::new(2, payload).unwrap();
        assert_eq!(packet.into_data().as_ptr(), ptr);
    }

    #[test]
    fn id_accessors() {
        let mut packet = Packet::new(2, &b"id"[..]).unwrap().with_id(7);
        assert_eq!(packet.id(), 7);
        packet.set_id(0xffff);
        assert_eq!(packet.id(), 0xffff);
        assert_eq!(packet.version(), 1);
    }

    #[test]
    fn checksum_depends_on_id() {
        let a = Packet::new(2, &b"same"[..]).unwrap().with_id(1);
        let b = a.clone().with_id(2);
        assert_ne!(a.checksum(), b.checksum());
    }
}

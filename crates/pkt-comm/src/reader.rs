use bytes::BytesMut;
use tracing::{debug, trace};
use ztex_link::LinkError;

use crate::codec::{checksum, Header, HEADER_LEN};
use crate::error::{PktCommError, Result};
use crate::packet::Packet;
use crate::queue::PacketQueue;

/// Rebuilds packets from an arbitrarily chunked byte stream.
///
/// Handles partial headers and payloads internally; only complete, verified
/// packets reach the input queue. When the queue is full, parsing pauses and
/// the remaining received bytes are held until the caller drains the queue.
#[derive(Debug)]
pub struct InputPipeline {
    queue: PacketQueue,
    buf: Box<[u8]>,
    len: usize,
    offset: usize,
    pending: Option<InputPacket>,
    packets: u64,
    bytes: u64,
}

impl InputPipeline {
    pub fn new(input_max_len: usize, queue_capacity: usize) -> Self {
        Self {
            queue: PacketQueue::with_capacity(queue_capacity),
            buf: vec![0u8; input_max_len].into_boxed_slice(),
            len: 0,
            offset: 0,
            pending: None,
            packets: 0,
            bytes: 0,
        }
    }

    pub fn queue(&self) -> &PacketQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut PacketQueue {
        &mut self.queue
    }

    /// Buffer for the next link receive, or `None` while received bytes are
    /// still held back by a full input queue.
    pub fn buf(&mut self) -> Result<Option<&mut [u8]>> {
        if self.held_bytes() > 0 {
            self.parse()?;
            if self.held_bytes() > 0 {
                return Ok(None);
            }
        }
        self.len = 0;
        self.offset = 0;
        Ok(Some(&mut self.buf[..]))
    }

    /// Record that `len` bytes arrived in the buffer from [`buf`](Self::buf)
    /// and parse them. Returns the number of packets completed.
    ///
    /// Fails with [`PktCommError::InputHeld`], keeping the held bytes, while
    /// a full queue is still holding back earlier input.
    pub fn completed(&mut self, len: usize) -> Result<usize> {
        let held = self.held_bytes();
        if held > 0 {
            return Err(PktCommError::InputHeld { held });
        }
        if len > self.buf.len() {
            return Err(LinkError::Overrun {
                reported: len,
                offered: self.buf.len(),
            }
            .into());
        }
        self.len = len;
        self.offset = 0;
        self.bytes += len as u64;
        self.parse()
    }

    /// Received bytes not yet consumed by the parser.
    pub fn held_bytes(&self) -> usize {
        self.len - self.offset
    }

    /// True while a packet is partially received.
    pub fn in_packet(&self) -> bool {
        self.pending.is_some()
    }

    /// Packets completed so far.
    pub fn packets(&self) -> u64 {
        self.packets
    }

    /// Bytes received so far.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    fn parse(&mut self) -> Result<usize> {
        let mut delivered = 0;
        while self.offset < self.len {
            // One iteration completes at most one packet, so a free slot
            // checked here is still free when it completes.
            if self.queue.full(1) {
                debug!(held = self.held_bytes(), "input queue full, holding bytes");
                break;
            }

            let pending = self.pending.get_or_insert_with(InputPacket::default);
            let (used, done) = pending.feed(&self.buf[self.offset..self.len])?;
            self.offset += used;

            if let Some(packet) = done {
                self.pending = None;
                trace!(
                    pkt_type = packet.pkt_type(),
                    id = packet.id(),
                    len = packet.data_len(),
                    "received packet"
                );
                self.queue.push(packet)?;
                self.packets += 1;
                delivered += 1;
            }
        }
        Ok(delivered)
    }
}

/// A packet under construction.
#[derive(Debug, Default)]
struct InputPacket {
    raw: [u8; HEADER_LEN],
    header_len: usize,
    header: Option<Header>,
    data: BytesMut,
}

impl InputPacket {
    // Consume bytes from the front of `src`. Returns how many were used and
    // the packet, once complete and verified.
    fn feed(&mut self, src: &[u8]) -> Result<(usize, Option<Packet>)> {
        let mut used = 0;

        let header = match self.header {
            Some(header) => header,
            None => {
                let take = (HEADER_LEN - self.header_len).min(src.len());
                self.raw[self.header_len..self.header_len + take].copy_from_slice(&src[..take]);
                self.header_len += take;
                used += take;
                if self.header_len < HEADER_LEN {
                    return Ok((used, None));
                }

                let header = Header::parse(&self.raw);
                header.validate()?;
                self.data.reserve(header.data_len);
                self.header = Some(header);
                header
            }
        };

        let take = (header.data_len - self.data.len()).min(src.len() - used);
        self.data.extend_from_slice(&src[used..used + take]);
        used += take;
        if self.data.len() < header.data_len {
            return Ok((used, None));
        }

        let computed = checksum(&self.raw, &self.data);
        if computed != header.checksum {
            return Err(PktCommError::BadChecksum {
                expected: header.checksum,
                computed,
            });
        }

        let data = std::mem::take(&mut self.data).freeze();
        Ok((
            used,
            Some(Packet::from_wire(header.pkt_type, header.id, data)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use bytes::{Bytes, BytesMut};

    use super::*;
    use crate::codec::encode_packet;

    fn wire(packets: &[Packet]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for packet in packets {
            encode_packet(packet, &mut buf);
        }
        buf.to_vec()
    }

    fn feed(input: &mut InputPipeline, bytes: &[u8]) -> Result<usize> {
        let buf = input.buf()?.expect("buffer should be available");
        buf[..bytes.len()].copy_from_slice(bytes);
        input.completed(bytes.len())
    }

    fn drain(input: &mut InputPipeline) -> Vec<Packet> {
        std::iter::from_fn(|| input.queue_mut().fetch()).collect()
    }

    #[test]
    fn read_single_packet() {
        let mut input = InputPipeline::new(64, 4);
        let packet = Packet::new(2, &b"hello"[..]).unwrap().with_id(3);

        assert_eq!(feed(&mut input, &wire(&[packet.clone()])).unwrap(), 1);
        assert_eq!(drain(&mut input), vec![packet]);
        assert!(!input.in_packet());
    }

    #[test]
    fn read_multiple_packets_from_one_chunk() {
        let mut input = InputPipeline::new(256, 8);
        let packets = vec![
            Packet::new(1, &b"one"[..]).unwrap(),
            Packet::new(2, &b"two"[..]).unwrap().with_id(1),
            Packet::new(3, &b"three"[..]).unwrap().with_id(2),
        ];

        assert_eq!(feed(&mut input, &wire(&packets)).unwrap(), 3);
        assert_eq!(drain(&mut input), packets);
    }

    #[test]
    fn byte_by_byte_delivery() {
        let mut input = InputPipeline::new(1, 4);
        let packet = Packet::new(2, &b"slow"[..]).unwrap().with_id(0xbeef);

        let bytes = wire(&[packet.clone()]);
        let mut completed = 0;
        for (i, byte) in bytes.iter().enumerate() {
            completed += feed(&mut input, &[*byte]).unwrap();
            if i + 1 < bytes.len() {
                assert!(input.in_packet());
            }
        }
        assert_eq!(completed, 1);
        assert_eq!(drain(&mut input), vec![packet]);
    }

    #[test]
    fn header_split_across_chunks() {
        let mut input = InputPipeline::new(64, 4);
        let packet = Packet::new(2, &b"split"[..]).unwrap();
        let bytes = wire(&[packet.clone()]);

        assert_eq!(feed(&mut input, &bytes[..4]).unwrap(), 0);
        assert_eq!(feed(&mut input, &bytes[4..12]).unwrap(), 0);
        assert_eq!(feed(&mut input, &bytes[12..]).unwrap(), 1);
        assert_eq!(drain(&mut input), vec![packet]);
    }

    #[test]
    fn zero_length_payload_completes_with_header() {
        let mut input = InputPipeline::new(64, 4);
        let packet = Packet::new(0xd2, Bytes::new()).unwrap();
        assert_eq!(feed(&mut input, &wire(&[packet.clone()])).unwrap(), 1);
        assert_eq!(drain(&mut input), vec![packet]);
    }

    #[test]
    fn bad_version_rejected() {
        let mut input = InputPipeline::new(64, 4);
        let mut bytes = wire(&[Packet::new(2, &b"x"[..]).unwrap()]);
        bytes[0] = 0;
        let err = feed(&mut input, &bytes).unwrap_err();
        assert!(matches!(err, PktCommError::BadVersion(0)));
    }

    #[test]
    fn bad_checksum_rejected() {
        let mut input = InputPipeline::new(64, 4);
        let mut bytes = wire(&[Packet::new(2, &b"xyz"[..]).unwrap()]);
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let err = feed(&mut input, &bytes).unwrap_err();
        assert!(matches!(err, PktCommError::BadChecksum { .. }));
        assert_eq!(input.queue().len(), 0);
    }

    #[test]
    fn full_queue_holds_bytes_until_drained() {
        let mut input = InputPipeline::new(256, 2);
        let packets: Vec<Packet> = (0..5)
            .map(|id| Packet::new(2, vec![id as u8; 3]).unwrap().with_id(id))
            .collect();

        assert_eq!(feed(&mut input, &wire(&packets)).unwrap(), 2);
        assert!(input.held_bytes() > 0);
        assert!(input.buf().unwrap().is_none());

        let mut received = drain(&mut input);
        // Draining lets the held bytes through before a new buffer is given.
        assert!(input.buf().unwrap().is_none());
        received.extend(drain(&mut input));
        assert!(input.buf().unwrap().is_some());
        received.extend(drain(&mut input));

        assert_eq!(received, packets);
    }

    #[test]
    fn completion_larger_than_buffer_is_rejected() {
        let mut input = InputPipeline::new(8, 2);
        let _ = input.buf().unwrap();
        let err = input.completed(9).unwrap_err();
        assert!(matches!(err, PktCommError::Link(LinkError::Overrun { .. })));
    }

    #[test]
    fn completion_while_bytes_held_keeps_them() {
        let mut input = InputPipeline::new(64, 1);
        let packets = vec![
            Packet::new(2, &b"first"[..]).unwrap(),
            Packet::new(2, &b"second"[..]).unwrap().with_id(1),
        ];

        assert_eq!(feed(&mut input, &wire(&packets)).unwrap(), 1);
        assert_eq!(input.queue_mut().fetch(), Some(packets[0].clone()));

        let err = input.completed(0).unwrap_err();
        assert!(matches!(err, PktCommError::InputHeld { held } if held == HEADER_LEN + 6));

        assert!(input.buf().unwrap().is_some());
        assert_eq!(drain(&mut input), vec![packets[1].clone()]);
    }
}

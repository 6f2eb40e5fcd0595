use bytes::BytesMut;
use tracing::trace;
use ztex_link::{LinkError, LinkParams};

use crate::codec::encode_packet;
use crate::error::Result;
use crate::queue::PacketQueue;

/// Serializes queued packets into link-sized chunks.
///
/// Packets leave the queue as soon as they are copied into the wire buffer.
/// The buffer is refilled only after every byte of it has been confirmed
/// sent by the link.
#[derive(Debug)]
pub struct OutputPipeline {
    queue: PacketQueue,
    buf: BytesMut,
    offset: usize,
    offered: usize,
    params: LinkParams,
    packets: u64,
    bytes: u64,
}

impl OutputPipeline {
    pub fn new(params: LinkParams, queue_capacity: usize) -> Self {
        Self {
            queue: PacketQueue::with_capacity(queue_capacity),
            buf: BytesMut::with_capacity(params.output_max_len),
            offset: 0,
            offered: 0,
            params,
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

    /// Next chunk to hand to the link, or `None` if there is nothing to send.
    ///
    /// Calling this again before [`completed`](Self::completed) offers the
    /// same chunk.
    pub fn data(&mut self) -> Option<&[u8]> {
        self.refill();

        let remaining = self.buf.len() - self.offset;
        if remaining == 0 {
            return None;
        }

        let max = self.params.output_max_len;
        let len = if remaining > max {
            self.params.align_down(max)
        } else {
            remaining
        };
        self.offered = len;
        Some(&self.buf[self.offset..self.offset + len])
    }

    /// Record that the link took `sent` bytes of the last offered chunk.
    pub fn completed(&mut self, sent: usize) -> Result<()> {
        if sent > self.offered {
            return Err(LinkError::Overrun {
                reported: sent,
                offered: self.offered,
            }
            .into());
        }

        self.offset += sent;
        self.offered = 0;
        self.bytes += sent as u64;

        if self.offset == self.buf.len() {
            self.buf.clear();
            self.offset = 0;
        }
        Ok(())
    }

    /// Serialized bytes not yet confirmed sent.
    pub fn pending_bytes(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// True when the queue is drained and every byte has been sent.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.pending_bytes() == 0
    }

    /// Packets serialized so far.
    pub fn packets(&self) -> u64 {
        self.packets
    }

    /// Bytes confirmed sent so far.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    // Start a new buffer with at least one packet, then keep adding packets
    // while the buffer fits in one transfer.
    fn refill(&mut self) {
        if self.pending_bytes() > 0 || self.queue.is_empty() {
            return;
        }
        self.buf.clear();
        self.offset = 0;

        let max = self.params.output_max_len;
        while let Some(next) = self.queue.peek() {
            if !self.buf.is_empty() && self.buf.len() + next.wire_size() > max {
                break;
            }
            let Some(packet) = self.queue.fetch() else {
                break;
            };
            encode_packet(&packet, &mut self.buf);
            self.packets += 1;
        }

        trace!(
            len = self.buf.len(),
            queued = self.queue.len(),
            "serialized output buffer"
        );
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;
    use crate::codec::{decode_packet, HEADER_LEN};
    use crate::error::PktCommError;
    use crate::packet::Packet;

    fn params(alignment: usize, output_max_len: usize) -> LinkParams {
        LinkParams::new(alignment, output_max_len, 64).unwrap()
    }

    fn drain(out: &mut OutputPipeline, per_call: usize) -> Vec<u8> {
        let mut wire = Vec::new();
        while let Some(chunk) = out.data() {
            let n = chunk.len().min(per_call);
            wire.extend_from_slice(&chunk[..n]);
            out.completed(n).unwrap();
        }
        wire
    }

    fn decode_all(wire: &[u8]) -> Vec<Packet> {
        let mut buf = BytesMut::from(wire);
        std::iter::from_fn(|| decode_packet(&mut buf).unwrap()).collect()
    }

    #[test]
    fn idle_pipeline_offers_nothing() {
        let mut out = OutputPipeline::new(LinkParams::default(), 4);
        assert!(out.data().is_none());
        assert!(out.is_idle());
    }

    #[test]
    fn single_packet_in_one_chunk() {
        let mut out = OutputPipeline::new(LinkParams::default(), 4);
        out.queue_mut()
            .push(Packet::new(2, &b"hello"[..]).unwrap())
            .unwrap();

        let chunk = out.data().unwrap().to_vec();
        assert_eq!(chunk.len(), HEADER_LEN + 5);
        assert!(out.queue().is_empty());

        out.completed(chunk.len()).unwrap();
        assert!(out.is_idle());
        assert_eq!(out.packets(), 1);
        assert_eq!(out.bytes(), chunk.len() as u64);
    }

    #[test]
    fn small_packets_share_a_buffer() {
        let mut out = OutputPipeline::new(params(1, 64), 8);
        for id in 0..3 {
            out.queue_mut()
                .push(Packet::new(2, &b"abc"[..]).unwrap().with_id(id))
                .unwrap();
        }

        let chunk = out.data().unwrap();
        assert_eq!(chunk.len(), 3 * (HEADER_LEN + 3));
        let ids: Vec<u16> = decode_all(chunk).iter().map(Packet::id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn buffer_stops_at_transfer_limit() {
        let mut out = OutputPipeline::new(params(1, 30), 8);
        for id in 0..3 {
            out.queue_mut()
                .push(Packet::new(2, &b"abcd"[..]).unwrap().with_id(id))
                .unwrap();
        }

        // Two 14-byte packets fit in 30 bytes, the third waits.
        let len = out.data().unwrap().len();
        assert_eq!(len, 28);
        assert_eq!(out.queue().len(), 1);
    }

    #[test]
    fn large_packet_is_split_into_aligned_chunks() {
        let mut out = OutputPipeline::new(params(4, 10), 2);
        out.queue_mut()
            .push(Packet::new(2, vec![0x5au8; 21]).unwrap())
            .unwrap();

        let mut sizes = Vec::new();
        while let Some(chunk) = out.data() {
            let n = chunk.len();
            sizes.push(n);
            out.completed(n).unwrap();
        }

        // 31 bytes: full chunks are rounded down to 8, the tail goes whole.
        assert_eq!(sizes, vec![8, 8, 8, 7]);
    }

    #[test]
    fn short_transfers_resume_without_loss() {
        let mut out = OutputPipeline::new(params(2, 16), 16);
        let sent: Vec<Packet> = (0..5)
            .map(|id| Packet::new(3, vec![id as u8; 7 + id as usize]).unwrap().with_id(id))
            .collect();
        for packet in &sent {
            out.queue_mut().push(packet.clone()).unwrap();
        }

        let wire = drain(&mut out, 3);
        assert_eq!(decode_all(&wire), sent);
        assert!(out.is_idle());
    }

    #[test]
    fn zero_byte_completion_reoffers_same_chunk() {
        let mut out = OutputPipeline::new(LinkParams::default(), 2);
        out.queue_mut()
            .push(Packet::new(2, &b"retry"[..]).unwrap())
            .unwrap();

        let first = out.data().unwrap().to_vec();
        out.completed(0).unwrap();
        let second = out.data().unwrap().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn overrun_completion_is_rejected() {
        let mut out = OutputPipeline::new(LinkParams::default(), 2);
        out.queue_mut()
            .push(Packet::new(2, &b"x"[..]).unwrap())
            .unwrap();

        let len = out.data().unwrap().len();
        let err = out.completed(len + 1).unwrap_err();
        assert!(matches!(
            err,
            PktCommError::Link(LinkError::Overrun { .. })
        ));
    }

    #[test]
    fn queue_frees_before_transmission() {
        let mut out = OutputPipeline::new(params(1, 16), 1);
        out.queue_mut()
            .push(Packet::new(2, vec![1u8; 40]).unwrap())
            .unwrap();

        let _ = out.data();
        assert!(!out.queue().full(1));
        assert!(out.pending_bytes() > 0);
    }
}

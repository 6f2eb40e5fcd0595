use std::collections::VecDeque;

use crate::error::QueueFull;
use crate::packet::Packet;

/// Default queue capacity. A tuning bound, not a protocol limit.
pub const PKT_QUEUE_MAX: usize = 2000;

/// Bounded FIFO of packets.
///
/// Used for both directions. Pushing onto a full queue hands the packet
/// back; fetching from an empty queue yields `None`.
#[derive(Debug)]
pub struct PacketQueue {
    slots: VecDeque<Packet>,
    capacity: usize,
}

impl PacketQueue {
    /// Create a queue with [`PKT_QUEUE_MAX`] slots.
    pub fn new() -> Self {
        Self::with_capacity(PKT_QUEUE_MAX)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// True if fewer than `num` free slots remain.
    ///
    /// Producers check this before building a batch so that no push of the
    /// batch fails halfway.
    pub fn full(&self, num: usize) -> bool {
        self.free_slots() < num
    }

    /// Append a packet at the tail.
    pub fn push(&mut self, packet: Packet) -> Result<(), QueueFull> {
        if self.slots.len() >= self.capacity {
            return Err(QueueFull {
                packet,
                capacity: self.capacity,
            });
        }
        self.slots.push_back(packet);
        Ok(())
    }

    /// Remove the packet at the head.
    pub fn fetch(&mut self) -> Option<Packet> {
        self.slots.pop_front()
    }

    /// Packet at the head, if any.
    pub fn peek(&self) -> Option<&Packet> {
        self.slots.front()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn free_slots(&self) -> usize {
        self.capacity - self.slots.len()
    }
}

impl Default for PacketQueue {
    fn default() -> Self {
        Self::new()
    }
}

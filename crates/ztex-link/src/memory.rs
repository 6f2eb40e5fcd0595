use bytes::{Buf, BytesMut};
use tracing::trace;

use crate::error::{LinkError, Result};
use crate::traits::Link;

/// In-memory loopback link.
///
/// Bytes accepted by [`Link::send`] become available to [`Link::recv`] in
/// order. Per-transfer caps emulate a link that takes or delivers fewer
/// bytes than asked for.
#[derive(Debug, Default)]
pub struct MemoryLink {
    buf: BytesMut,
    max_send: Option<usize>,
    max_recv: Option<usize>,
    fail_next: Option<i32>,
    sent_total: usize,
    received_total: usize,
}

impl MemoryLink {
    /// Create a loopback link without transfer caps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the bytes taken per send call.
    pub fn with_max_send(mut self, max: usize) -> Self {
        self.max_send = Some(max);
        self
    }

    /// Cap the bytes delivered per receive call.
    pub fn with_max_recv(mut self, max: usize) -> Self {
        self.max_recv = Some(max);
        self
    }

    /// Make the next transfer (send or receive) fail with `code`.
    pub fn fail_next(&mut self, code: i32) {
        self.fail_next = Some(code);
    }

    /// Append bytes as if the far end had transmitted them.
    pub fn inject(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Bytes waiting to be received.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Total bytes taken by send calls.
    pub fn sent_total(&self) -> usize {
        self.sent_total
    }

    /// Total bytes handed out by receive calls.
    pub fn received_total(&self) -> usize {
        self.received_total
    }

    fn check_failure(&mut self) -> Result<()> {
        match self.fail_next.take() {
            Some(code) => Err(LinkError::Transfer { code }),
            None => Ok(()),
        }
    }
}

impl Link for MemoryLink {
    fn send(&mut self, buf: &[u8]) -> Result<usize> {
        self.check_failure()?;
        let n = self.max_send.map_or(buf.len(), |max| max.min(buf.len()));
        self.buf.extend_from_slice(&buf[..n]);
        self.sent_total += n;
        trace!(offered = buf.len(), taken = n, "memory link send");
        Ok(n)
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.check_failure()?;
        let mut n = buf.len().min(self.buf.len());
        if let Some(max) = self.max_recv {
            n = n.min(max);
        }
        buf[..n].copy_from_slice(&self.buf[..n]);
        self.buf.advance(n);
        self.received_total += n;
        trace!(capacity = buf.len(), delivered = n, "memory link recv");
        Ok(n)
    }
}

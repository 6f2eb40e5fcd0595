use tracing::trace;
use ztex_link::{Link, LinkError, MemoryLink};

use crate::io::{DeviceIo, IoState};

/// In-memory device: every FPGA echoes back what it is sent.
///
/// Each FPGA has its own [`MemoryLink`], so transfer caps and injected
/// failures apply per FPGA.
#[derive(Debug)]
pub struct LoopbackIo {
    links: Vec<MemoryLink>,
    states: Vec<IoState>,
    selected: usize,
    fail_select: Option<i32>,
}

impl LoopbackIo {
    pub fn new(num_fpgas: usize) -> Self {
        Self::with_links((0..num_fpgas).map(|_| MemoryLink::new()).collect())
    }

    /// One FPGA per link.
    pub fn with_links(links: Vec<MemoryLink>) -> Self {
        Self {
            states: vec![IoState::default(); links.len()],
            links,
            selected: 0,
            fail_select: None,
        }
    }

    pub fn num_fpgas(&self) -> usize {
        self.links.len()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn link(&self, num: usize) -> Option<&MemoryLink> {
        self.links.get(num)
    }

    pub fn link_mut(&mut self, num: usize) -> Option<&mut MemoryLink> {
        self.links.get_mut(num)
    }

    /// State FPGA `num` reports on its next select.
    pub fn set_io_state(&mut self, num: usize, state: IoState) {
        if let Some(slot) = self.states.get_mut(num) {
            *slot = state;
        }
    }

    /// Make the next select fail with `code`.
    pub fn fail_next_select(&mut self, code: i32) {
        self.fail_select = Some(code);
    }

    fn current(&mut self) -> Result<&mut MemoryLink, LinkError> {
        let selected = self.selected;
        self.links
            .get_mut(selected)
            .ok_or_else(|| LinkError::InvalidParams(format!("no FPGA #{selected}")))
    }
}

impl Link for LoopbackIo {
    fn send(&mut self, buf: &[u8]) -> ztex_link::Result<usize> {
        self.current()?.send(buf)
    }

    fn recv(&mut self, buf: &mut [u8]) -> ztex_link::Result<usize> {
        self.current()?.recv(buf)
    }
}

impl DeviceIo for LoopbackIo {
    fn select_fpga(&mut self, num: usize) -> Result<IoState, LinkError> {
        if let Some(code) = self.fail_select.take() {
            return Err(LinkError::Transfer { code });
        }
        let state = *self
            .states
            .get(num)
            .ok_or_else(|| LinkError::InvalidParams(format!("no FPGA #{num}")))?;
        self.selected = num;
        trace!(fpga = num, "selected FPGA");
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfers_reach_selected_fpga() {
        let mut io = LoopbackIo::new(2);
        io.select_fpga(1).unwrap();
        assert_eq!(io.send(b"abc").unwrap(), 3);
        assert_eq!(io.link(0).unwrap().pending(), 0);
        assert_eq!(io.link(1).unwrap().pending(), 3);

        io.select_fpga(0).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(io.recv(&mut buf).unwrap(), 0);
    }

    #[test]
    fn select_out_of_range_fails() {
        let mut io = LoopbackIo::new(1);
        assert!(matches!(
            io.select_fpga(3),
            Err(LinkError::InvalidParams(_))
        ));
        assert_eq!(io.selected(), 0);
    }

    #[test]
    fn reports_configured_state() {
        let mut io = LoopbackIo::new(1);
        let state = IoState {
            pkt_comm_status: 0x04,
            app_status: 0,
        };
        io.set_io_state(0, state);
        assert_eq!(io.select_fpga(0).unwrap(), state);

        io.fail_next_select(-7);
        assert!(matches!(
            io.select_fpga(0),
            Err(LinkError::Transfer { code: -7 })
        ));
        assert!(io.select_fpga(0).is_ok());
    }
}

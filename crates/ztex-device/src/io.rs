use ztex_link::{Link, LinkError};

/// I/O state an FPGA reports when selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoState {
    /// Non-zero when the FPGA's packet communication detected an error.
    pub pkt_comm_status: u8,
    /// Non-zero when the application on the FPGA detected an error.
    pub app_status: u8,
}

impl IoState {
    pub fn is_ok(&self) -> bool {
        self.pkt_comm_status == 0 && self.app_status == 0
    }
}

/// Hardware adapter for one device.
///
/// Data transfers go through the [`Link`] half and reach whichever FPGA was
/// last selected.
pub trait DeviceIo: Link {
    /// Select FPGA `num` for the following transfers and fetch its I/O state.
    fn select_fpga(&mut self, num: usize) -> Result<IoState, LinkError>;
}

impl<D: DeviceIo + ?Sized> DeviceIo for &mut D {
    fn select_fpga(&mut self, num: usize) -> Result<IoState, LinkError> {
        (**self).select_fpga(num)
    }
}

impl<D: DeviceIo + ?Sized> DeviceIo for Box<D> {
    fn select_fpga(&mut self, num: usize) -> Result<IoState, LinkError> {
        (**self).select_fpga(num)
    }
}

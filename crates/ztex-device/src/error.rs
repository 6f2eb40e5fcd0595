use ztex_link::LinkError;

/// Errors that can occur driving a device.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Selecting an FPGA or reading its I/O state failed.
    #[error("FPGA #{fpga} select failed: {source}")]
    Select { fpga: usize, source: LinkError },

    /// The FPGA reports a packet communication error.
    #[error("FPGA #{fpga} error: pkt_comm_status=0x{status:02x}")]
    PktCommStatus { fpga: usize, status: u8 },

    /// The FPGA application reports an error.
    #[error("FPGA #{fpga} error: app_status=0x{status:02x}")]
    AppStatus { fpga: usize, status: u8 },

    /// Packet communication with an FPGA failed.
    #[error("FPGA #{fpga} packet communication: {source}")]
    Comm {
        fpga: usize,
        source: pkt_comm::PktCommError,
    },

    /// Channel construction failed.
    #[error("channel setup: {0}")]
    Setup(#[from] pkt_comm::PktCommError),

    /// The device was invalidated by an earlier error.
    #[error("device {0} is invalid")]
    Invalidated(String),

    /// No FPGA with that number on the device.
    #[error("no FPGA #{0}")]
    NoSuchFpga(usize),

    /// Device discovery failed.
    #[error("scan failed: {0}")]
    Scan(String),
}

impl DeviceError {
    /// FPGA the error occurred on, if any.
    pub fn fpga(&self) -> Option<usize> {
        match self {
            DeviceError::Select { fpga, .. }
            | DeviceError::PktCommStatus { fpga, .. }
            | DeviceError::AppStatus { fpga, .. }
            | DeviceError::Comm { fpga, .. } => Some(*fpga),
            DeviceError::NoSuchFpga(fpga) => Some(*fpga),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;

use std::fmt;
use std::io;

use pkt_comm::PktCommError;
use ztex_device::DeviceError;
use ztex_link::LinkError;
use ztex_msg::MsgError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound | io::ErrorKind::InvalidData => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn link_error(context: &str, err: LinkError) -> CliError {
    match err {
        LinkError::Io(source) => io_error(context, source),
        LinkError::InvalidParams(_) => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn comm_error(context: &str, err: PktCommError) -> CliError {
    match err {
        PktCommError::Link(err) => link_error(context, err),
        PktCommError::InvalidConfig(_) => CliError::new(USAGE, format!("{context}: {err}")),
        PktCommError::ChannelFailed(_) => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
        PktCommError::QueueFull(_) | PktCommError::InputHeld { .. } => {
            CliError::new(INTERNAL, format!("{context}: {err}"))
        }
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn msg_error(context: &str, err: MsgError) -> CliError {
    match err {
        MsgError::Packet(err) => comm_error(context, err),
        MsgError::Io { source, path } => {
            io_error(&format!("{context} {}", path.display()), source)
        }
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn device_error(context: &str, err: DeviceError) -> CliError {
    match err {
        DeviceError::Comm { source, fpga } => {
            comm_error(&format!("{context} (FPGA #{fpga})"), source)
        }
        DeviceError::Setup(err) => comm_error(context, err),
        DeviceError::Select { .. }
        | DeviceError::PktCommStatus { .. }
        | DeviceError::AppStatus { .. }
        | DeviceError::Invalidated(_) => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

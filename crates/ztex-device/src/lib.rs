//! Devices, their FPGAs, and the polling loop that drives them.
//!
//! A [`Device`] owns one [`pkt_comm::PktComm`] channel per FPGA and talks to
//! the hardware through a [`DeviceIo`] adapter. USB enumeration, firmware
//! and bitstream upload stay outside this crate: a [`DeviceScanner`] hands
//! over devices that are ready for packet communication.
//!
//! Scan timing and traffic counters live in an explicit [`Session`].

pub mod device;
pub mod error;
pub mod io;
pub mod list;
pub mod loopback;
pub mod session;

pub use device::{Device, Fpga, RwCounts};
pub use error::{DeviceError, Result};
pub use io::{DeviceIo, IoState};
pub use list::{DeviceList, PollSummary};
pub use loopback::LoopbackIo;
pub use session::{DeviceScanner, ScanOutcome, Session, SessionConfig};

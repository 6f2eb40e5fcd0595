//! Host-side packet communication with ZTEX FPGA boards.
//!
//! # Crate Structure
//!
//! - [`link`] — Link-layer seam and in-memory link
//! - [`comm`] — Packets, queues, wire codec and the `PktComm` channel
//! - [`msg`] — Message builders and result packet parsers
//! - [`device`] — Devices, FPGAs, polling and scan scheduling (behind `device` feature)

/// Re-export link types.
pub mod link {
    pub use ztex_link::*;
}

/// Re-export packet communication types.
pub mod comm {
    pub use pkt_comm::*;
}

/// Re-export message types.
pub mod msg {
    pub use ztex_msg::*;
}

/// Re-export device types (requires `device` feature).
#[cfg(feature = "device")]
pub mod device {
    pub use ztex_device::*;
}

//! Link-layer abstraction for packet communication with FPGA boards.
//!
//! The packet layer never talks to USB directly. It only needs:
//! - a way to hand up to N bytes to the link and learn how many were taken
//! - a way to receive up to N bytes and learn how many arrived
//! - the link's transfer limits ([`LinkParams`])
//!
//! This is the lowest layer of the workspace. [`MemoryLink`] is an in-memory
//! link used for loopback runs and tests.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{LinkError, Result};
pub use memory::MemoryLink;
pub use traits::{
    Link, LinkParams, DEFAULT_ALIGNMENT, DEFAULT_INPUT_MAX_LEN, DEFAULT_OUTPUT_MAX_LEN,
};

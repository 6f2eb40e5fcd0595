//! Typed messages carried by [`pkt_comm`] packets.
//!
//! Host to FPGA:
//! - [`WordGen`] — word generator configuration (type 2)
//! - [`CmpConfig`] — comparator salt and hash list (type 3)
//! - [`WordList`] — NUL-terminated words (type 1)
//!
//! FPGA to host:
//! - [`CmpEqual`] — a generated candidate matched a hash (type 0xd1)
//! - [`ProcessingDone`] — a word generator packet has been processed (type 0xd2)
//!
//! Builders are pure: they validate a configuration and encode it, never
//! clamping or truncating out-of-range values.

pub mod cmp_config;
pub mod config;
pub mod error;
pub mod result;
pub mod types;
pub mod word_gen;
pub mod word_list;

pub use cmp_config::{CmpConfig, CmpHash};
pub use config::{load_cmp_config, load_word_gen, load_word_list, MAX_CONFIG_FILE_SIZE};
pub use error::{MsgError, Result};
pub use result::{CmpEqual, InPacket, ProcessingDone};
pub use types::{
    is_result, pkt_type_name, PKT_TYPE_CMP_CONFIG, PKT_TYPE_CMP_EQUAL, PKT_TYPE_PROCESSING_DONE,
    PKT_TYPE_WORD_GEN, PKT_TYPE_WORD_LIST,
};
pub use word_gen::{CharRange, WordGen};
pub use word_list::WordList;

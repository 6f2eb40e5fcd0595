//! Packet type numbers.
//!
//! Types below 0xd0 travel host to FPGA. Types from 0xd0 up are results and
//! status sent back by the FPGA.

/// NUL-terminated word list.
pub const PKT_TYPE_WORD_LIST: u8 = 1;

/// Word generator configuration.
pub const PKT_TYPE_WORD_GEN: u8 = 2;

/// Comparator configuration.
pub const PKT_TYPE_CMP_CONFIG: u8 = 3;

/// Comparator found an equal hash.
pub const PKT_TYPE_CMP_EQUAL: u8 = 0xd1;

/// Processing of a word generator packet is done.
pub const PKT_TYPE_PROCESSING_DONE: u8 = 0xd2;

/// Returns a human-readable name for a packet type.
pub fn pkt_type_name(pkt_type: u8) -> &'static str {
    match pkt_type {
        PKT_TYPE_WORD_LIST => "WORD_LIST",
        PKT_TYPE_WORD_GEN => "WORD_GEN",
        PKT_TYPE_CMP_CONFIG => "CMP_CONFIG",
        PKT_TYPE_CMP_EQUAL => "CMP_EQUAL",
        PKT_TYPE_PROCESSING_DONE => "PROCESSING_DONE",
        0 => "INVALID",
        0xd0..=0xff => "RESULT",
        _ => "UNKNOWN",
    }
}

/// Returns true for types the FPGA sends to the host.
pub fn is_result(pkt_type: u8) -> bool {
    pkt_type >= 0xd0
}

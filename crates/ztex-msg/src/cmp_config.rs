use std::fmt;

use bytes::{BufMut, BytesMut};
use pkt_comm::Packet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{MsgError, Result};
use crate::types::PKT_TYPE_CMP_CONFIG;

/// Maximum number of hashes in one comparator configuration.
pub const CMP_HASHES_MAX: usize = 1023;

/// Length of one comparator hash.
pub const CMP_HASH_LEN: usize = 8;

/// Mask of the salt bits the comparator ignores; they must be zero.
pub const SALT_RESERVED_MASK: u16 = 0xf000;

/// Trailer byte that closes every comparator configuration payload.
pub const CMP_CONFIG_MAGIC: u8 = 0xCC;

/// Upper bound of an encoded comparator configuration payload.
pub const CMP_CONFIG_MAX_SIZE: usize = 5 + CMP_HASHES_MAX * CMP_HASH_LEN;

/// An 8-byte hash the comparator matches generated candidates against.
///
/// Written as 16 hex digits in config files.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CmpHash(pub [u8; CMP_HASH_LEN]);

impl CmpHash {
    /// Sort key: the hash bytes read as a little-endian integer.
    pub fn key(&self) -> u64 {
        u64::from_le_bytes(self.0)
    }
}

impl From<[u8; CMP_HASH_LEN]> for CmpHash {
    fn from(bytes: [u8; CMP_HASH_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for CmpHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CmpHash({})", hex::encode(self.0))
    }
}

impl fmt::Display for CmpHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Serialize for CmpHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for CmpHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let mut bytes = [0u8; CMP_HASH_LEN];
        hex::decode_to_slice(text.trim(), &mut bytes).map_err(serde::de::Error::custom)?;
        Ok(Self(bytes))
    }
}

/// Comparator configuration: the salt and the hashes to look for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmpConfig {
    /// 12-bit salt.
    pub salt: u16,
    /// Hashes in ascending [`CmpHash::key`] order.
    pub hashes: Vec<CmpHash>,
}

impl CmpConfig {
    pub fn new(salt: u16, hashes: Vec<CmpHash>) -> Self {
        Self { salt, hashes }
    }

    /// Put the hashes in the order the comparator requires.
    pub fn sort_hashes(&mut self) {
        self.hashes.sort_by_key(CmpHash::key);
    }

    pub fn validate(&self) -> Result<()> {
        if self.salt & SALT_RESERVED_MASK != 0 {
            return Err(MsgError::BadSalt(self.salt));
        }
        if self.hashes.is_empty() || self.hashes.len() > CMP_HASHES_MAX {
            return Err(MsgError::BadHashCount {
                count: self.hashes.len(),
                max: CMP_HASHES_MAX,
            });
        }
        if let Some(pos) = self
            .hashes
            .windows(2)
            .position(|pair| pair[0].key() > pair[1].key())
        {
            return Err(MsgError::UnsortedHashes { index: pos + 1 });
        }
        Ok(())
    }

    /// Encode the payload of a comparator configuration packet.
    pub fn encode(&self) -> Result<BytesMut> {
        self.validate()?;

        let mut buf = BytesMut::with_capacity(5 + self.hashes.len() * CMP_HASH_LEN);
        buf.put_u16_le(self.salt);
        buf.put_u16_le(self.hashes.len() as u16);
        for hash in &self.hashes {
            buf.put_slice(&hash.0);
        }
        buf.put_u8(CMP_CONFIG_MAGIC);
        Ok(buf)
    }

    /// Build a comparator configuration packet.
    pub fn to_packet(&self) -> Result<Packet> {
        Ok(Packet::new(PKT_TYPE_CMP_CONFIG, self.encode()?.freeze())?)
    }
}

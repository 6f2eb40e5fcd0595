use bytes::{BufMut, BytesMut};
use pkt_comm::Packet;
use serde::{Deserialize, Serialize};

use crate::error::{MsgError, Result};
use crate::types::PKT_TYPE_WORD_GEN;

/// Maximum number of character ranges; also the longest generated word.
pub const RANGES_MAX: usize = 8;

/// Maximum number of characters in one range (7-bit characters).
pub const RANGE_CHARS_MAX: usize = 96;

/// Maximum number of words spliced into the generated stream.
pub const WORDS_INSERT_MAX: usize = 1;

/// Trailer byte that closes every word generator payload.
pub const WORD_GEN_MAGIC: u8 = 0xBB;

/// Upper bound of an encoded word generator payload.
pub const WORD_GEN_MAX_SIZE: usize = 7 + RANGES_MAX * (2 + RANGE_CHARS_MAX) + WORDS_INSERT_MAX;

/// One position of a generated word: the characters it iterates over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharRange {
    /// Index of the character iteration starts from.
    #[serde(default)]
    pub start_idx: u8,
    /// Characters of the range, each below 0x80.
    #[serde(with = "chars_serde")]
    pub chars: Vec<u8>,
}

impl CharRange {
    pub fn new(chars: impl Into<Vec<u8>>) -> Self {
        Self {
            start_idx: 0,
            chars: chars.into(),
        }
    }

    pub fn with_start_idx(mut self, start_idx: u8) -> Self {
        self.start_idx = start_idx;
        self
    }

    fn validate(&self, index: usize) -> Result<()> {
        let bad = |reason: String| MsgError::BadRange { index, reason };
        if self.chars.is_empty() {
            return Err(bad("no characters".into()));
        }
        if self.chars.len() > RANGE_CHARS_MAX {
            return Err(bad(format!(
                "{} characters, max {RANGE_CHARS_MAX}",
                self.chars.len()
            )));
        }
        if usize::from(self.start_idx) >= self.chars.len() {
            return Err(bad(format!(
                "start index {} beyond {} characters",
                self.start_idx,
                self.chars.len()
            )));
        }
        if let Some(c) = self.chars.iter().find(|c| **c >= 0x80) {
            return Err(bad(format!("character 0x{c:02x} is not 7-bit")));
        }
        Ok(())
    }
}

/// Word generator configuration.
///
/// Ranges produce every combination of their characters, one range per word
/// position. Words received in word list packets are spliced in at the
/// given insert positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordGen {
    #[serde(default)]
    pub ranges: Vec<CharRange>,
    /// Positions (0..=ranges.len()) where a word from the word list goes.
    #[serde(default)]
    pub insert_words: Vec<u8>,
    /// Number of words to generate, 0 for no limit.
    #[serde(default)]
    pub num_generate: u32,
}

impl WordGen {
    /// Passes words from the word list through unchanged.
    pub fn words_pass_by() -> Self {
        Self {
            ranges: Vec::new(),
            insert_words: vec![0],
            num_generate: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ranges.len() > RANGES_MAX {
            return Err(MsgError::TooManyRanges {
                count: self.ranges.len(),
                max: RANGES_MAX,
            });
        }
        for (index, range) in self.ranges.iter().enumerate() {
            range.validate(index)?;
        }
        if self.insert_words.len() > WORDS_INSERT_MAX {
            return Err(MsgError::TooManyWords {
                count: self.insert_words.len(),
                max: WORDS_INSERT_MAX,
            });
        }
        if let Some(pos) = self
            .insert_words
            .iter()
            .find(|pos| usize::from(**pos) > self.ranges.len())
        {
            return Err(MsgError::BadInsertPos {
                pos: *pos,
                num_ranges: self.ranges.len(),
            });
        }
        Ok(())
    }

    /// Encode the payload of a word generator packet.
    pub fn encode(&self) -> Result<BytesMut> {
        self.validate()?;

        let mut buf = BytesMut::with_capacity(WORD_GEN_MAX_SIZE);
        buf.put_u8(self.ranges.len() as u8);
        for range in &self.ranges {
            buf.put_u8(range.chars.len() as u8);
            buf.put_u8(range.start_idx);
            buf.put_slice(&range.chars);
        }
        buf.put_u8(self.insert_words.len() as u8);
        buf.put_slice(&self.insert_words);
        buf.put_u32_le(self.num_generate);
        buf.put_u8(WORD_GEN_MAGIC);
        Ok(buf)
    }

    /// Build a word generator packet.
    pub fn to_packet(&self) -> Result<Packet> {
        Ok(Packet::new(PKT_TYPE_WORD_GEN, self.encode()?.freeze())?)
    }
}

// Characters are written as a string in config files; a byte array is also
// accepted for characters that do not print.
mod chars_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Chars {
        Text(String),
        Bytes(Vec<u8>),
    }

    pub fn serialize<S: Serializer>(chars: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if chars.iter().all(|c| c.is_ascii_graphic() || *c == b' ') {
            String::from_utf8_lossy(chars).serialize(serializer)
        } else {
            chars.serialize(serializer)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        Ok(match Chars::deserialize(deserializer)? {
            Chars::Text(text) => text.into_bytes(),
            Chars::Bytes(bytes) => bytes,
        })
    }
}

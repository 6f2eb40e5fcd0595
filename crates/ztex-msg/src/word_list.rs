use bytes::{BufMut, BytesMut};
use pkt_comm::{Packet, PKT_MAX_LEN};
use serde::{Deserialize, Serialize};

use crate::error::{MsgError, Result};
use crate::types::PKT_TYPE_WORD_LIST;

/// Words for the generator to splice in, sent NUL-terminated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordList {
    pub words: Vec<String>,
}

impl WordList {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Bytes the encoded payload takes.
    pub fn encoded_len(&self) -> usize {
        self.words.iter().map(|word| word.len() + 1).sum()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(index) = self.words.iter().position(|word| word.contains('\0')) {
            return Err(MsgError::WordContainsNul { index });
        }
        Ok(())
    }

    /// Encode the payload of a word list packet.
    pub fn encode(&self) -> Result<BytesMut> {
        self.validate()?;

        let len = self.encoded_len();
        if len > PKT_MAX_LEN {
            return Err(pkt_comm::PktCommError::PacketTooLarge {
                size: len,
                max: PKT_MAX_LEN,
            }
            .into());
        }

        let mut buf = BytesMut::with_capacity(len);
        for word in &self.words {
            buf.put_slice(word.as_bytes());
            buf.put_u8(0);
        }
        Ok(buf)
    }

    /// Build a word list packet.
    pub fn to_packet(&self) -> Result<Packet> {
        Ok(Packet::new(PKT_TYPE_WORD_LIST, self.encode()?.freeze())?)
    }
}

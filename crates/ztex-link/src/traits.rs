use crate::error::{LinkError, Result};

/// Reference board transfer alignment in bytes.
pub const DEFAULT_ALIGNMENT: usize = 2;

/// Reference board maximum single transmit length.
pub const DEFAULT_OUTPUT_MAX_LEN: usize = 16384;

/// Reference board maximum single receive length.
pub const DEFAULT_INPUT_MAX_LEN: usize = 32766;

/// A bounded, non-blocking byte link to one FPGA.
///
/// Each call is one transfer turn: it completes immediately with a byte count
/// or reports an error. A count smaller than the buffer is a short transfer,
/// not an error.
pub trait Link {
    /// Transmit up to `buf.len()` bytes, returning how many were taken.
    fn send(&mut self, buf: &[u8]) -> Result<usize>;

    /// Receive up to `buf.len()` bytes, returning how many arrived.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize>;
}

impl<L: Link + ?Sized> Link for &mut L {
    fn send(&mut self, buf: &[u8]) -> Result<usize> {
        (**self).send(buf)
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).recv(buf)
    }
}

impl<L: Link + ?Sized> Link for Box<L> {
    fn send(&mut self, buf: &[u8]) -> Result<usize> {
        (**self).send(buf)
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).recv(buf)
    }
}

/// Transfer limits of a link.
///
/// These bound a single transfer, never the size of a packet: packets span
/// as many transfers as needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkParams {
    /// Output chunks longer than the final one are a multiple of this.
    pub alignment: usize,
    /// Maximum bytes offered to the link per transmit.
    pub output_max_len: usize,
    /// Maximum bytes accepted from the link per receive.
    pub input_max_len: usize,
}

impl LinkParams {
    /// Create link parameters, rejecting zero values and a transmit limit
    /// smaller than the alignment.
    pub fn new(alignment: usize, output_max_len: usize, input_max_len: usize) -> Result<Self> {
        let params = Self {
            alignment,
            output_max_len,
            input_max_len,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check that the parameters describe a usable link.
    pub fn validate(&self) -> Result<()> {
        if self.alignment == 0 {
            return Err(LinkError::InvalidParams("alignment must be > 0".into()));
        }
        if self.output_max_len < self.alignment {
            return Err(LinkError::InvalidParams(format!(
                "output_max_len {} is below alignment {}",
                self.output_max_len, self.alignment
            )));
        }
        if self.input_max_len == 0 {
            return Err(LinkError::InvalidParams("input_max_len must be > 0".into()));
        }
        Ok(())
    }

    /// Round `len` down to the alignment boundary.
    pub fn align_down(&self, len: usize) -> usize {
        len - len % self.alignment
    }
}

impl Default for LinkParams {
    fn default() -> Self {
        Self {
            alignment: DEFAULT_ALIGNMENT,
            output_max_len: DEFAULT_OUTPUT_MAX_LEN,
            input_max_len: DEFAULT_INPUT_MAX_LEN,
        }
    }
}

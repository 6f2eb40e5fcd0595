use tracing::{debug, warn};
use ztex_link::{Link, LinkError, LinkParams};

use crate::codec::PktCommConfig;
use crate::error::{PktCommError, QueueFull, Result};
use crate::packet::Packet;
use crate::queue::PacketQueue;
use crate::reader::InputPipeline;
use crate::writer::OutputPipeline;

/// Communication with one independently communicating device (or part of a
/// device, such as one FPGA of a multi-FPGA board).
///
/// Once any framing or link error occurs the channel is failed: it offers no
/// more output and accepts no more input, and every further I/O call returns
/// [`PktCommError::ChannelFailed`].
#[derive(Debug)]
pub struct PktComm {
    config: PktCommConfig,
    output: OutputPipeline,
    input: InputPipeline,
    failure: Option<String>,
}

/// Traffic counters of a channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PktCommStats {
    pub packets_out: u64,
    pub bytes_out: u64,
    pub packets_in: u64,
    pub bytes_in: u64,
}

impl PktComm {
    /// Create a channel with default queue sizes.
    pub fn new(params: LinkParams) -> Result<Self> {
        Self::with_config(PktCommConfig::new(params))
    }

    /// Create a channel with explicit configuration.
    pub fn with_config(config: PktCommConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            output: OutputPipeline::new(config.params, config.output_queue_capacity),
            input: InputPipeline::new(config.params.input_max_len, config.input_queue_capacity),
            config,
            failure: None,
        })
    }

    pub fn config(&self) -> &PktCommConfig {
        &self.config
    }

    pub fn params(&self) -> &LinkParams {
        &self.config.params
    }

    pub fn output_queue(&self) -> &PacketQueue {
        self.output.queue()
    }

    pub fn output_queue_mut(&mut self) -> &mut PacketQueue {
        self.output.queue_mut()
    }

    pub fn input_queue(&self) -> &PacketQueue {
        self.input.queue()
    }

    pub fn input_queue_mut(&mut self) -> &mut PacketQueue {
        self.input.queue_mut()
    }

    /// Queue a packet for output.
    pub fn push(&mut self, packet: Packet) -> std::result::Result<(), QueueFull> {
        self.output.queue_mut().push(packet)
    }

    /// Take the next received packet.
    pub fn fetch(&mut self) -> Option<Packet> {
        self.input.queue_mut().fetch()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Description of the error that failed the channel.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// True when nothing is queued or buffered for output.
    pub fn output_idle(&self) -> bool {
        self.output.is_idle()
    }

    /// True while a received packet is only partially in.
    pub fn input_partial(&self) -> bool {
        self.input.in_packet()
    }

    pub fn stats(&self) -> PktCommStats {
        PktCommStats {
            packets_out: self.output.packets(),
            bytes_out: self.output.bytes(),
            packets_in: self.input.packets(),
            bytes_in: self.input.bytes(),
        }
    }

    /// Data for output over the link layer, or `None` if there is none.
    pub fn output_data(&mut self) -> Result<Option<&[u8]>> {
        self.ensure_ok()?;
        Ok(self.output.data())
    }

    /// The chunk from [`output_data`](Self::output_data) was transmitted;
    /// `sent` is how many bytes the link actually took.
    pub fn output_completed(&mut self, sent: usize) -> Result<()> {
        self.ensure_ok()?;
        let result = self.output.completed(sent);
        self.check(result)
    }

    /// The transmit failed. Fails the channel and returns the error to
    /// propagate.
    pub fn output_failed(&mut self, err: LinkError) -> PktCommError {
        let err = PktCommError::Link(err);
        self.fail(&err);
        err
    }

    /// Buffer for link layer input, or `None` while the input queue is full.
    pub fn input_buf(&mut self) -> Result<Option<&mut [u8]>> {
        self.ensure_ok()?;
        match self.input.buf() {
            Ok(buf) => Ok(buf),
            Err(err) => {
                record_failure(&mut self.failure, &err);
                Err(err)
            }
        }
    }

    /// `len` bytes were received into the buffer from
    /// [`input_buf`](Self::input_buf). Returns the number of packets
    /// completed.
    ///
    /// Reporting a completion while `input_buf` is withholding the buffer
    /// returns [`PktCommError::InputHeld`] and leaves the channel usable.
    pub fn input_completed(&mut self, len: usize) -> Result<usize> {
        self.ensure_ok()?;
        let result = self.input.completed(len);
        if let Err(PktCommError::InputHeld { .. }) = result {
            return result;
        }
        self.check(result)
    }

    /// The receive failed. Fails the channel and returns the error to
    /// propagate.
    pub fn input_failed(&mut self, err: LinkError) -> PktCommError {
        let err = PktCommError::Link(err);
        self.fail(&err);
        err
    }

    /// One transmit turn over `link`. Returns the bytes sent, 0 when idle.
    pub fn write_to<L: Link + ?Sized>(&mut self, link: &mut L) -> Result<usize> {
        let Some(chunk) = self.output_data()? else {
            return Ok(0);
        };
        match link.send(chunk) {
            Ok(sent) => {
                self.output_completed(sent)?;
                Ok(sent)
            }
            Err(err) => Err(self.output_failed(err)),
        }
    }

    /// One receive turn over `link`. Returns the bytes received, 0 when the
    /// input queue is full or nothing arrived.
    pub fn read_from<L: Link + ?Sized>(&mut self, link: &mut L) -> Result<usize> {
        let Some(buf) = self.input_buf()? else {
            return Ok(0);
        };
        match link.recv(buf) {
            Ok(received) => {
                let completed = self.input_completed(received)?;
                if completed > 0 {
                    debug!(received, completed, "input packets completed");
                }
                Ok(received)
            }
            Err(err) => Err(self.input_failed(err)),
        }
    }

    fn ensure_ok(&self) -> Result<()> {
        match &self.failure {
            Some(reason) => Err(PktCommError::ChannelFailed(reason.clone())),
            None => Ok(()),
        }
    }

    fn check<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            self.fail(err);
        }
        result
    }

    fn fail(&mut self, err: &PktCommError) {
        record_failure(&mut self.failure, err);
    }
}

fn record_failure(failure: &mut Option<String>, err: &PktCommError) {
    if failure.is_none() {
        warn!(error = %err, "packet channel failed");
        *failure = Some(err.to_string());
    }
}

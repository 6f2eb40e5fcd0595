use pkt_comm::{PktComm, PktCommConfig};
use tracing::{debug, error};

use crate::error::{DeviceError, Result};
use crate::io::DeviceIo;

/// One FPGA of a device and its packet channel.
#[derive(Debug)]
pub struct Fpga {
    num: usize,
    comm: PktComm,
}

impl Fpga {
    pub fn num(&self) -> usize {
        self.num
    }

    pub fn comm(&self) -> &PktComm {
        &self.comm
    }

    pub fn comm_mut(&mut self) -> &mut PktComm {
        &mut self.comm
    }
}

/// Bytes moved by one read/write turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RwCounts {
    pub written: usize,
    pub read: usize,
}

impl std::ops::AddAssign for RwCounts {
    fn add_assign(&mut self, other: Self) {
        self.written += other.written;
        self.read += other.read;
    }
}

/// A board with one or more FPGAs.
///
/// An error on any FPGA invalidates the whole device; it is then skipped
/// until replaced by a fresh scan.
#[derive(Debug)]
pub struct Device<D> {
    serial: String,
    io: D,
    fpgas: Vec<Fpga>,
    valid: bool,
}

impl<D: DeviceIo> Device<D> {
    /// Create a device with `num_fpgas` channels sharing `config`.
    pub fn new(
        serial: impl Into<String>,
        io: D,
        num_fpgas: usize,
        config: PktCommConfig,
    ) -> Result<Self> {
        let fpgas = (0..num_fpgas)
            .map(|num| -> Result<Fpga> {
                Ok(Fpga {
                    num,
                    comm: PktComm::with_config(config.clone())?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            serial: serial.into(),
            io,
            fpgas,
            valid: true,
        })
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Stop using the device.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    pub fn io(&self) -> &D {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut D {
        &mut self.io
    }

    pub fn num_fpgas(&self) -> usize {
        self.fpgas.len()
    }

    pub fn fpgas(&self) -> &[Fpga] {
        &self.fpgas
    }

    pub fn fpga(&self, num: usize) -> Result<&Fpga> {
        self.fpgas.get(num).ok_or(DeviceError::NoSuchFpga(num))
    }

    pub fn fpga_mut(&mut self, num: usize) -> Result<&mut Fpga> {
        self.fpgas.get_mut(num).ok_or(DeviceError::NoSuchFpga(num))
    }

    /// One write and one read turn on every FPGA, in order.
    ///
    /// The first error invalidates the device and is returned; FPGAs after
    /// the failing one are not serviced in that turn.
    pub fn pkt_rw(&mut self) -> Result<RwCounts> {
        if !self.valid {
            return Err(DeviceError::Invalidated(self.serial.clone()));
        }

        let mut counts = RwCounts::default();
        for idx in 0..self.fpgas.len() {
            match self.fpga_rw(idx) {
                Ok(fpga_counts) => counts += fpga_counts,
                Err(err) => {
                    error!(serial = %self.serial, fpga = idx, error = %err, "device invalidated");
                    self.invalidate();
                    return Err(err);
                }
            }
        }

        if counts != RwCounts::default() {
            debug!(
                serial = %self.serial,
                written = counts.written,
                read = counts.read,
                "device r/w turn"
            );
        }
        Ok(counts)
    }

    fn fpga_rw(&mut self, idx: usize) -> Result<RwCounts> {
        let fpga = &mut self.fpgas[idx];
        let num = fpga.num;

        let state = self
            .io
            .select_fpga(num)
            .map_err(|source| DeviceError::Select { fpga: num, source })?;
        if state.pkt_comm_status != 0 {
            return Err(DeviceError::PktCommStatus {
                fpga: num,
                status: state.pkt_comm_status,
            });
        }
        if state.app_status != 0 {
            return Err(DeviceError::AppStatus {
                fpga: num,
                status: state.app_status,
            });
        }

        let comm_err = |source| DeviceError::Comm { fpga: num, source };
        let written = fpga.comm.write_to(&mut self.io).map_err(comm_err)?;
        let read = fpga.comm.read_from(&mut self.io).map_err(comm_err)?;
        Ok(RwCounts { written, read })
    }
}

use std::sync::atomic::{AtomicBool, Ordering};

use crate::device::{Device, RwCounts};
use crate::io::DeviceIo;
use crate::session::Session;

/// What one polling round did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    /// Devices that completed their read/write turn.
    pub serviced: usize,
    /// Devices invalidated during this round.
    pub failed: usize,
    pub counts: RwCounts,
    /// The round stopped early on shutdown.
    pub interrupted: bool,
}

/// Devices in use, serviced round-robin in insertion order.
#[derive(Debug)]
pub struct DeviceList<D> {
    devices: Vec<Device<D>>,
}

impl<D> Default for DeviceList<D> {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
        }
    }
}

impl<D> From<Vec<Device<D>>> for DeviceList<D> {
    fn from(devices: Vec<Device<D>>) -> Self {
        Self { devices }
    }
}

impl<D> DeviceList<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Device<D>> {
        self.devices.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Device<D>> {
        self.devices.iter_mut()
    }

    pub fn push(&mut self, device: Device<D>) {
        self.devices.push(device);
    }

    /// Append newly found devices. Returns how many were added.
    pub fn merge(&mut self, other: DeviceList<D>) -> usize {
        let added = other.devices.len();
        self.devices.extend(other.devices);
        added
    }
}

impl<D: DeviceIo> DeviceList<D> {
    /// Devices not invalidated.
    pub fn valid_count(&self) -> usize {
        self.devices.iter().filter(|dev| dev.is_valid()).count()
    }

    /// A valid device with this serial number.
    pub fn find(&self, serial: &str) -> Option<&Device<D>> {
        self.devices
            .iter()
            .find(|dev| dev.is_valid() && dev.serial() == serial)
    }

    pub fn find_mut(&mut self, serial: &str) -> Option<&mut Device<D>> {
        self.devices
            .iter_mut()
            .find(|dev| dev.is_valid() && dev.serial() == serial)
    }

    /// One read/write turn on every valid device.
    ///
    /// Invalid devices are skipped. A device failing its turn is invalidated
    /// and the round moves on. `shutdown` is checked before each device.
    pub fn poll(&mut self, session: &mut Session, shutdown: &AtomicBool) -> PollSummary {
        let mut summary = PollSummary::default();
        for dev in self.devices.iter_mut().filter(|dev| dev.is_valid()) {
            if shutdown.load(Ordering::Relaxed) {
                summary.interrupted = true;
                break;
            }
            match dev.pkt_rw() {
                Ok(counts) => {
                    session.record_rw(counts);
                    summary.counts += counts;
                    summary.serviced += 1;
                }
                Err(_) => summary.failed += 1,
            }
        }
        summary
    }
}

impl<'a, D> IntoIterator for &'a DeviceList<D> {
    type Item = &'a Device<D>;
    type IntoIter = std::slice::Iter<'a, Device<D>>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.iter()
    }
}

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::device::RwCounts;
use crate::error::Result;
use crate::list::DeviceList;

/// Default time between scans for new devices.
pub const SCAN_INTERVAL_DEFAULT: Duration = Duration::from_secs(15);

/// Rescan delay after a firmware upload; the board resets and re-enumerates.
pub const FW_UPLOAD_DELAY: Duration = Duration::from_secs(2);

/// Scan timing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Minimum time between two scans.
    pub scan_interval: Duration,
    /// Time to wait for boards to come back after a firmware upload.
    pub fw_upload_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scan_interval: SCAN_INTERVAL_DEFAULT,
            fw_upload_delay: FW_UPLOAD_DELAY,
        }
    }
}

/// Result of one discovery pass.
#[derive(Debug)]
pub struct ScanOutcome<D> {
    /// Devices ready for packet communication.
    pub devices: DeviceList<D>,
    /// Devices that got firmware uploaded and are resetting.
    pub fw_uploads: usize,
}

impl<D> ScanOutcome<D> {
    pub fn new(devices: DeviceList<D>, fw_uploads: usize) -> Self {
        Self {
            devices,
            fw_uploads,
        }
    }
}

/// Finds devices and prepares them for packet communication.
pub trait DeviceScanner<D> {
    /// Scan for devices, skipping any valid device already in `known`.
    fn scan(&mut self, known: &DeviceList<D>) -> Result<ScanOutcome<D>>;
}

/// State of a running host session: scan bookkeeping and traffic totals.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    started: Instant,
    last_scan: Option<Instant>,
    pending_fw_uploads: usize,
    bytes_written: u64,
    bytes_read: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            started: Instant::now(),
            last_scan: None,
            pending_fw_uploads: 0,
            bytes_written: 0,
            bytes_read: 0,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn last_scan(&self) -> Option<Instant> {
        self.last_scan
    }

    /// Devices still resetting after a firmware upload in the last scan.
    pub fn pending_fw_uploads(&self) -> usize {
        self.pending_fw_uploads
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Add the bytes of one read/write turn to the totals.
    pub fn record_rw(&mut self, counts: RwCounts) {
        self.bytes_written += counts.written as u64;
        self.bytes_read += counts.read as u64;
    }

    /// Combined read and write rate since the session started, in bytes per
    /// second.
    pub fn rate(&self, now: Instant) -> f64 {
        let secs = now.saturating_duration_since(self.started).as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        (self.bytes_written + self.bytes_read) as f64 / secs
    }

    /// True when a scan is due: never scanned, the scan interval has passed,
    /// or a firmware upload is pending and the upload delay has passed.
    pub fn should_scan(&self, now: Instant) -> bool {
        let Some(last) = self.last_scan else {
            return true;
        };
        let elapsed = now.saturating_duration_since(last);
        (self.pending_fw_uploads > 0 && elapsed >= self.config.fw_upload_delay)
            || elapsed >= self.config.scan_interval
    }

    /// Update bookkeeping after a scan found `ready` devices and uploaded
    /// firmware to `fw_uploads` others. Returns how many devices from the
    /// previous firmware upload did not come back.
    pub fn record_scan(&mut self, now: Instant, ready: usize, fw_uploads: usize) -> usize {
        // Counts only; a device plugged in meanwhile masks a lost one.
        let lost = self.pending_fw_uploads.saturating_sub(ready);
        if lost > 0 {
            warn!(lost, "device(s) lost after firmware upload");
        }
        self.pending_fw_uploads = fw_uploads;
        self.last_scan = Some(now);
        lost
    }

    /// Scan if one is due and merge new devices into `list`. Returns the
    /// number of devices added.
    pub fn timely_scan<D, S>(
        &mut self,
        scanner: &mut S,
        list: &mut DeviceList<D>,
        now: Instant,
    ) -> Result<usize>
    where
        S: DeviceScanner<D> + ?Sized,
    {
        if !self.should_scan(now) {
            return Ok(0);
        }
        let outcome = match scanner.scan(list) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "device scan failed");
                self.record_scan(now, 0, 0);
                return Err(err);
            }
        };
        Ok(self.accept(outcome, list, now))
    }

    /// First scan at startup. When no device is ready yet but some got
    /// firmware uploaded, waits for the upload delay and scans once more.
    pub fn initial_scan<D, S>(&mut self, scanner: &mut S, list: &mut DeviceList<D>) -> Result<usize>
    where
        S: DeviceScanner<D> + ?Sized,
    {
        let outcome = scanner.scan(list)?;
        self.pending_fw_uploads = outcome.fw_uploads;
        self.last_scan = Some(Instant::now());

        let found = outcome.devices.len();
        list.merge(outcome.devices);
        if found > 0 || self.pending_fw_uploads == 0 {
            return Ok(found);
        }

        info!(
            fw_uploads = self.pending_fw_uploads,
            delay_ms = self.config.fw_upload_delay.as_millis() as u64,
            "waiting for devices to reset after firmware upload"
        );
        std::thread::sleep(self.config.fw_upload_delay);
        let outcome = scanner.scan(list)?;
        Ok(self.accept(outcome, list, Instant::now()))
    }

    fn accept<D>(
        &mut self,
        outcome: ScanOutcome<D>,
        list: &mut DeviceList<D>,
        now: Instant,
    ) -> usize {
        let found = outcome.devices.len();
        self.record_scan(now, found, outcome.fw_uploads);
        if found > 0 {
            info!(found, "found new device(s)");
        }
        list.merge(outcome.devices);
        found
    }
}

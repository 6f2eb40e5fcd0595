//! Scanning, merging and polling devices the way a host main loop does.

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use pkt_comm::PktCommConfig;
use ztex_device::{
    Device, DeviceError, DeviceList, DeviceScanner, IoState, LoopbackIo, ScanOutcome, Session,
    SessionConfig,
};
use ztex_msg::{CmpConfig, CmpHash, InPacket, ProcessingDone, WordList};

/// Returns scripted scan results: (serials ready, firmware uploads).
struct ScriptedScanner {
    script: VecDeque<(Vec<&'static str>, usize)>,
    scans: usize,
}

impl ScriptedScanner {
    fn new(script: Vec<(Vec<&'static str>, usize)>) -> Self {
        Self {
            script: script.into(),
            scans: 0,
        }
    }
}

impl DeviceScanner<LoopbackIo> for ScriptedScanner {
    fn scan(
        &mut self,
        known: &DeviceList<LoopbackIo>,
    ) -> ztex_device::Result<ScanOutcome<LoopbackIo>> {
        self.scans += 1;
        let Some((serials, fw_uploads)) = self.script.pop_front() else {
            return Err(DeviceError::Scan("no devices".into()));
        };
        let mut found = DeviceList::new();
        for serial in serials.into_iter().filter(|s| known.find(s).is_none()) {
            found.push(
                Device::new(serial, LoopbackIo::new(2), 2, PktCommConfig::default())
                    .expect("device should build"),
            );
        }
        Ok(ScanOutcome::new(found, fw_uploads))
    }
}

fn quick_session() -> Session {
    Session::new(SessionConfig {
        scan_interval: Duration::from_secs(15),
        fw_upload_delay: Duration::from_millis(1),
    })
}

#[test]
fn initial_scan_waits_for_uploaded_devices() {
    let mut scanner = ScriptedScanner::new(vec![(vec![], 2), (vec!["SN-A", "SN-B"], 0)]);
    let mut session = quick_session();
    let mut list = DeviceList::new();

    let found = session
        .initial_scan(&mut scanner, &mut list)
        .expect("initial scan should succeed");
    assert_eq!(found, 2);
    assert_eq!(scanner.scans, 2);
    assert_eq!(list.len(), 2);
    assert_eq!(session.pending_fw_uploads(), 0);
}

#[test]
fn initial_scan_returns_immediately_when_devices_ready() {
    let mut scanner = ScriptedScanner::new(vec![(vec!["SN-A"], 1)]);
    let mut session = quick_session();
    let mut list = DeviceList::new();

    assert_eq!(session.initial_scan(&mut scanner, &mut list).unwrap(), 1);
    assert_eq!(scanner.scans, 1);
    assert_eq!(session.pending_fw_uploads(), 1);
}

#[test]
fn timely_scan_follows_schedule_and_skips_known_devices() {
    let mut scanner = ScriptedScanner::new(vec![
        (vec!["SN-A"], 1),
        (vec!["SN-A", "SN-B"], 0),
        (vec!["SN-A", "SN-B", "SN-C"], 0),
    ]);
    let mut session = Session::new(SessionConfig::default());
    let mut list = DeviceList::new();
    let t0 = Instant::now();

    assert_eq!(session.timely_scan(&mut scanner, &mut list, t0).unwrap(), 1);
    // Not due yet.
    assert_eq!(
        session
            .timely_scan(&mut scanner, &mut list, t0 + Duration::from_secs(1))
            .unwrap(),
        0
    );
    // The pending upload makes the rescan due after the upload delay.
    let t1 = t0 + Duration::from_secs(2);
    assert_eq!(session.timely_scan(&mut scanner, &mut list, t1).unwrap(), 1);
    assert_eq!(scanner.scans, 2);

    // Without pending uploads the full interval applies.
    assert_eq!(
        session
            .timely_scan(&mut scanner, &mut list, t1 + Duration::from_secs(5))
            .unwrap(),
        0
    );
    let t2 = t1 + Duration::from_secs(15);
    assert_eq!(session.timely_scan(&mut scanner, &mut list, t2).unwrap(), 1);

    let serials: Vec<&str> = list.iter().map(Device::serial).collect();
    assert_eq!(serials, vec!["SN-A", "SN-B", "SN-C"]);
}

#[test]
fn failed_scan_is_reported_and_rescheduled() {
    let mut scanner = ScriptedScanner::new(vec![]);
    let mut session = Session::default();
    let mut list = DeviceList::new();
    let t0 = Instant::now();

    assert!(matches!(
        session.timely_scan(&mut scanner, &mut list, t0),
        Err(DeviceError::Scan(_))
    ));
    assert!(!session.should_scan(t0 + Duration::from_secs(1)));
}

#[test]
fn main_loop_moves_packets_and_drops_bad_devices() {
    let mut scanner = ScriptedScanner::new(vec![(vec!["SN-A", "SN-B"], 0)]);
    let mut session = quick_session();
    let mut list = DeviceList::new();
    session.initial_scan(&mut scanner, &mut list).unwrap();

    let mut config = CmpConfig::new(0x01c7, vec![CmpHash([9; 8]), CmpHash([1; 8])]);
    config.sort_hashes();
    for dev in list.iter_mut() {
        let comm = dev.fpga_mut(0).unwrap().comm_mut();
        comm.push(config.to_packet().unwrap()).unwrap();
        comm.push(WordList::new(["my", "abc"]).to_packet().unwrap())
            .unwrap();
        let done = ProcessingDone {
            pkt_id: 5,
            num_processed: 1000,
        };
        comm.push(done.to_packet().unwrap()).unwrap();
    }
    if let Some(dev) = list.find_mut("SN-B") {
        dev.io_mut().set_io_state(
            1,
            IoState {
                pkt_comm_status: 0x10,
                app_status: 0,
            },
        );
    }

    let shutdown = AtomicBool::new(false);
    let summary = list.poll(&mut session, &shutdown);
    assert_eq!(summary.serviced, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(list.valid_count(), 1);
    assert!(session.bytes_written() > 0);

    let dev = list.find_mut("SN-A").expect("SN-A should stay valid");
    let comm = dev.fpga_mut(0).unwrap().comm_mut();
    let received: Vec<_> = std::iter::from_fn(|| comm.fetch()).collect();
    assert_eq!(received.len(), 3);
    assert_eq!(
        InPacket::parse(&received[2]).unwrap(),
        InPacket::ProcessingDone(ProcessingDone {
            pkt_id: 5,
            num_processed: 1000,
        })
    );
}

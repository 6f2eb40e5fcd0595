use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use pkt_comm::{LinkParams, Packet, PktCommConfig};
use tracing::{info, warn};
use ztex_device::{Device, DeviceList, LoopbackIo, Session};
use ztex_link::MemoryLink;
use ztex_msg::{CharRange, CmpConfig, CmpEqual, CmpHash, WordGen, WordList};

use crate::cmd::SimulateArgs;
use crate::exit::{
    device_error, link_error, msg_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS,
    TRANSPORT_ERROR, USAGE,
};
use crate::output::{print_simulation, OutputFormat, SimulationReport};

const SERIAL: &str = "SIM-0001";

pub fn run(args: SimulateArgs, format: OutputFormat) -> CliResult<i32> {
    if args.fpgas == 0 {
        return Err(CliError::new(USAGE, "--fpgas must be at least 1"));
    }
    if args.max_transfer == Some(0) {
        return Err(CliError::new(USAGE, "--max-transfer must be at least 1"));
    }

    let params = LinkParams::new(args.alignment, args.output_max_len, args.input_max_len)
        .map_err(|err| link_error("bad link parameters", err))?;
    let links = (0..args.fpgas)
        .map(|_| match args.max_transfer {
            Some(max) => MemoryLink::new().with_max_send(max).with_max_recv(max),
            None => MemoryLink::new(),
        })
        .collect();
    let sim_device = Device::new(
        SERIAL,
        LoopbackIo::with_links(links),
        args.fpgas,
        PktCommConfig::new(params),
    )
    .map_err(|err| device_error("device setup failed", err))?;
    let mut devices = DeviceList::from(vec![sim_device]);

    let mut pending = (0..args.packets)
        .map(sample_packet)
        .collect::<CliResult<VecDeque<_>>>()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    install_ctrlc_handler(shutdown.clone())?;

    info!(
        packets = args.packets,
        fpgas = args.fpgas,
        alignment = params.alignment,
        output_max_len = params.output_max_len,
        input_max_len = params.input_max_len,
        max_transfer = ?args.max_transfer,
        "starting simulation"
    );

    let started = Instant::now();
    let mut session = Session::default();
    let mut expected: Vec<VecDeque<Packet>> = vec![VecDeque::new(); args.fpgas];
    let mut next_fpga = 0usize;
    let mut report = SimulationReport {
        packets_sent: args.packets,
        ..SimulationReport::default()
    };

    while report.packets_received < args.packets {
        if shutdown.load(Ordering::SeqCst) {
            report.interrupted = true;
            break;
        }

        let dev = device(&mut devices)?;
        let queued_before = pending.len();
        queue_packets(dev, &mut pending, &mut expected, &mut next_fpga)?;

        let summary = devices.poll(&mut session, &shutdown);
        report.turns += 1;
        if summary.failed > 0 {
            return Err(CliError::new(
                TRANSPORT_ERROR,
                format!("device {SERIAL} invalidated during simulation"),
            ));
        }

        let received_before = report.packets_received;
        let dev = device(&mut devices)?;
        for (num, expected) in expected.iter_mut().enumerate() {
            let comm = dev
                .fpga_mut(num)
                .map_err(|err| device_error("simulate", err))?
                .comm_mut();
            while let Some(packet) = comm.fetch() {
                report.packets_received += 1;
                if expected.pop_front().as_ref() != Some(&packet) {
                    warn!(fpga = num, id = packet.id(), "packet mismatch");
                    report.mismatches += 1;
                }
            }
        }

        let idle = summary.counts.written == 0 && summary.counts.read == 0;
        if idle && report.packets_received == received_before && pending.len() == queued_before {
            return Err(CliError::new(INTERNAL, "simulation stalled"));
        }
    }

    report.bytes_written = session.bytes_written();
    report.bytes_read = session.bytes_read();
    report.elapsed_ms = started.elapsed().as_millis() as u64;
    report.rate_bytes_per_sec = session.rate(Instant::now());
    info!(
        received = report.packets_received,
        mismatches = report.mismatches,
        turns = report.turns,
        "simulation finished"
    );

    print_simulation(&report, format);
    if report.mismatches > 0 {
        return Ok(FAILURE);
    }
    Ok(SUCCESS)
}

fn device(devices: &mut DeviceList<LoopbackIo>) -> CliResult<&mut Device<LoopbackIo>> {
    devices
        .find_mut(SERIAL)
        .ok_or_else(|| CliError::new(TRANSPORT_ERROR, format!("device {SERIAL} lost")))
}

// Hand out pending packets round-robin across FPGAs until a queue is full.
fn queue_packets(
    dev: &mut Device<LoopbackIo>,
    pending: &mut VecDeque<Packet>,
    expected: &mut [VecDeque<Packet>],
    next_fpga: &mut usize,
) -> CliResult<()> {
    while let Some(packet) = pending.pop_front() {
        let num = *next_fpga % expected.len();
        let comm = dev
            .fpga_mut(num)
            .map_err(|err| device_error("simulate", err))?
            .comm_mut();
        match comm.push(packet.clone()) {
            Ok(()) => {
                expected[num].push_back(packet);
                *next_fpga += 1;
            }
            Err(full) => {
                pending.push_front(full.into_packet());
                break;
            }
        }
    }
    Ok(())
}

/// The `n`th packet of the simulated workload.
fn sample_packet(n: usize) -> CliResult<Packet> {
    let id = n as u16;
    let built = match n % 4 {
        0 => {
            let mut config = CmpConfig::new(
                (n & 0x0fff) as u16,
                (0..1 + n % 16)
                    .map(|k| CmpHash(((n * 31 + k * 977) as u64).to_le_bytes()))
                    .collect(),
            );
            config.sort_hashes();
            config.to_packet()
        }
        1 => WordGen {
            ranges: vec![
                CharRange::new(*b"abcdefghijklmnopqrstuvwxyz"),
                CharRange::new(*b"0123456789").with_start_idx((n % 10) as u8),
            ],
            insert_words: vec![0],
            num_generate: n as u32,
        }
        .to_packet(),
        2 => WordList::new((0..1 + n % 8).map(|k| format!("word{n}-{k}"))).to_packet(),
        _ => CmpEqual {
            pkt_id: id,
            word_id: (n % 8) as u16,
            gen_id: n as u32,
            hash_num_eq: (n % 16) as u16,
        }
        .to_packet(),
    };
    built
        .map(|packet| packet.with_id(id))
        .map_err(|err| msg_error("building sample packet", err))
}

fn install_ctrlc_handler(shutdown: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        shutdown.store(true, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

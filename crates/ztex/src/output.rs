use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pkt_comm::Packet;
use serde::Serialize;
use ztex_msg::{is_result, pkt_type_name, InPacket};

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One packet as printed by `encode` and `decode`.
#[derive(Debug, Serialize)]
pub struct PacketRecord {
    pub pkt_type: u8,
    pub type_name: &'static str,
    pub id: u16,
    pub data_len: usize,
    pub checksum: String,
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<InPacket>,
}

impl PacketRecord {
    pub fn new(packet: &Packet) -> Self {
        let result = if is_result(packet.pkt_type()) {
            InPacket::parse(packet).ok()
        } else {
            None
        };
        Self {
            pkt_type: packet.pkt_type(),
            type_name: pkt_type_name(packet.pkt_type()),
            id: packet.id(),
            data_len: packet.data_len(),
            checksum: format!("0x{:02x}", packet.checksum()),
            data: hex::encode(packet.data()),
            result,
        }
    }
}

/// Output of `encode`: the packet plus its wire bytes.
#[derive(Debug, Serialize)]
pub struct EncodeRecord {
    #[serde(flatten)]
    pub packet: PacketRecord,
    pub wire_len: usize,
    pub wire: String,
}

/// Output of `simulate`.
#[derive(Debug, Default, Serialize)]
pub struct SimulationReport {
    pub packets_sent: usize,
    pub packets_received: usize,
    pub mismatches: usize,
    pub bytes_written: u64,
    pub bytes_read: u64,
    pub turns: u64,
    pub elapsed_ms: u64,
    pub rate_bytes_per_sec: f64,
    pub interrupted: bool,
}

pub fn print_encoded(record: &EncodeRecord, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(record),
        OutputFormat::Table => {
            let mut table = new_table(vec!["TYPE", "ID", "DATA LEN", "WIRE LEN", "WIRE"]);
            table.add_row(vec![
                type_label(&record.packet),
                record.packet.id.to_string(),
                record.packet.data_len.to_string(),
                record.wire_len.to_string(),
                record.wire.clone(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", record.wire),
    }
}

pub fn print_packets(records: &[PacketRecord], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for record in records {
                print_json(record);
            }
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["TYPE", "ID", "LEN", "CHECKSUM", "DATA"]);
            for record in records {
                table.add_row(vec![
                    type_label(record),
                    record.id.to_string(),
                    record.data_len.to_string(),
                    record.checksum.clone(),
                    data_preview(record),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for record in records {
                println!(
                    "type={} id={} len={} checksum={} data={}",
                    type_label(record),
                    record.id,
                    record.data_len,
                    record.checksum,
                    data_preview(record)
                );
            }
        }
    }
}

pub fn print_simulation(report: &SimulationReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            let mut table = new_table(vec!["METRIC", "VALUE"]);
            for (metric, value) in simulation_rows(report) {
                table.add_row(vec![metric.to_string(), value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (metric, value) in simulation_rows(report) {
                println!("{metric}={value}");
            }
        }
    }
}

fn simulation_rows(report: &SimulationReport) -> Vec<(&'static str, String)> {
    vec![
        ("packets_sent", report.packets_sent.to_string()),
        ("packets_received", report.packets_received.to_string()),
        ("mismatches", report.mismatches.to_string()),
        ("bytes_written", report.bytes_written.to_string()),
        ("bytes_read", report.bytes_read.to_string()),
        ("turns", report.turns.to_string()),
        ("elapsed_ms", report.elapsed_ms.to_string()),
        (
            "rate_mib_per_sec",
            format!("{:.2}", report.rate_bytes_per_sec / (1024.0 * 1024.0)),
        ),
        ("interrupted", report.interrupted.to_string()),
    ]
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn type_label(record: &PacketRecord) -> String {
    format!("{} ({})", record.pkt_type, record.type_name)
}

fn data_preview(record: &PacketRecord) -> String {
    if let Some(result) = &record.result {
        return match result {
            InPacket::CmpEqual(eq) => format!(
                "word_id={} gen_id={} hash_num_eq={}",
                eq.word_id, eq.gen_id, eq.hash_num_eq
            ),
            InPacket::ProcessingDone(done) => format!("num_processed={}", done.num_processed),
        };
    }
    const MAX_HEX: usize = 64;
    if record.data.len() > MAX_HEX {
        format!("{}... ({} bytes)", &record.data[..MAX_HEX], record.data_len)
    } else {
        record.data.clone()
    }
}

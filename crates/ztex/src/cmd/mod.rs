use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod simulate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a packet from a config file and print its wire bytes.
    Encode(EncodeArgs),
    /// Parse wire bytes into packets.
    Decode(DecodeArgs),
    /// Run packets through an in-memory device and check they come back.
    Simulate(SimulateArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Simulate(args) => simulate::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum MessageKind {
    /// Word generator configuration (JSON).
    WordGen,
    /// Comparator configuration (JSON).
    CmpConfig,
    /// Word list (JSON array, or one word per line).
    WordList,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Message kind.
    pub kind: MessageKind,
    /// Config file.
    pub file: PathBuf,
    /// Packet id.
    #[arg(long, default_value_t = 0)]
    pub id: u16,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Wire bytes as hex (whitespace ignored).
    #[arg(conflicts_with = "file", required_unless_present = "file")]
    pub hex: Option<String>,
    /// Read raw wire bytes from a file.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Feed the parser this many bytes at a time (0 = all at once).
    #[arg(long, default_value_t = 0)]
    pub chunk: usize,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Packets to send.
    #[arg(long, default_value_t = 1000)]
    pub packets: usize,
    /// FPGAs on the simulated device.
    #[arg(long, default_value_t = 1)]
    pub fpgas: usize,
    /// Transfer alignment in bytes.
    #[arg(long, default_value_t = ztex_link::DEFAULT_ALIGNMENT)]
    pub alignment: usize,
    /// Maximum bytes per transmit.
    #[arg(long, default_value_t = ztex_link::DEFAULT_OUTPUT_MAX_LEN)]
    pub output_max_len: usize,
    /// Maximum bytes per receive.
    #[arg(long, default_value_t = ztex_link::DEFAULT_INPUT_MAX_LEN)]
    pub input_max_len: usize,
    /// Cap each link transfer to this many bytes to force short transfers.
    #[arg(long)]
    pub max_transfer: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

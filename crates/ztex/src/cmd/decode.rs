use pkt_comm::{LinkParams, PktComm};
use tracing::debug;
use ztex_link::MemoryLink;

use crate::cmd::DecodeArgs;
use crate::exit::{
    comm_error, io_error, link_error, CliError, CliResult, DATA_INVALID, SUCCESS,
};
use crate::output::{print_packets, OutputFormat, PacketRecord};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let wire = read_input(&args)?;
    let whole = wire.len().max(1);
    let chunk = match args.chunk {
        0 => whole,
        chunk => chunk.min(whole),
    };

    let params = LinkParams::new(1, chunk, chunk).map_err(|err| link_error("bad --chunk", err))?;
    let mut comm = PktComm::new(params).map_err(|err| comm_error("decode setup failed", err))?;
    let mut link = MemoryLink::new();
    link.inject(&wire);

    let mut records = Vec::new();
    let outcome = loop {
        let received = match comm.read_from(&mut link) {
            Ok(received) => received,
            Err(err) => break Err(comm_error("decode failed", err)),
        };
        let before = records.len();
        records.extend(
            std::iter::from_fn(|| comm.fetch()).map(|packet| PacketRecord::new(&packet)),
        );
        if received == 0 && records.len() == before && link.pending() == 0 {
            break Ok(());
        }
    };
    debug!(bytes = wire.len(), chunk, packets = records.len(), "decoded input");

    print_packets(&records, format);
    outcome?;
    if comm.input_partial() {
        return Err(CliError::new(
            DATA_INVALID,
            "decode failed: input ends inside a packet",
        ));
    }
    Ok(SUCCESS)
}

fn read_input(args: &DecodeArgs) -> CliResult<Vec<u8>> {
    if let Some(path) = &args.file {
        return std::fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }

    let text: String = args
        .hex
        .as_deref()
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let text = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(&text);
    hex::decode(text)
        .map_err(|err| CliError::new(DATA_INVALID, format!("invalid hex input: {err}")))
}

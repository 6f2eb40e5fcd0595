use bytes::BytesMut;
use pkt_comm::{encode_packet, Packet};
use tracing::debug;
use ztex_msg::{load_cmp_config, load_word_gen, load_word_list};

use crate::cmd::{EncodeArgs, MessageKind};
use crate::exit::{msg_error, CliResult, SUCCESS};
use crate::output::{print_encoded, EncodeRecord, OutputFormat, PacketRecord};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let packet = build_packet(&args)?.with_id(args.id);

    let mut wire = BytesMut::with_capacity(packet.wire_size());
    encode_packet(&packet, &mut wire);
    debug!(
        kind = ?args.kind,
        data_len = packet.data_len(),
        wire_len = wire.len(),
        "encoded packet"
    );

    let record = EncodeRecord {
        packet: PacketRecord::new(&packet),
        wire_len: wire.len(),
        wire: hex::encode(&wire),
    };
    print_encoded(&record, format);
    Ok(SUCCESS)
}

fn build_packet(args: &EncodeArgs) -> CliResult<Packet> {
    let context = "encode failed";
    let built = match args.kind {
        MessageKind::WordGen => load_word_gen(&args.file).and_then(|cfg| cfg.to_packet()),
        MessageKind::CmpConfig => load_cmp_config(&args.file).and_then(|cfg| cfg.to_packet()),
        MessageKind::WordList => load_word_list(&args.file).and_then(|list| list.to_packet()),
    };
    built.map_err(|err| msg_error(context, err))
}

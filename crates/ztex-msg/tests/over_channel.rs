//! Builder packets survive a channel loopback with short transfers, and
//! result packets parse on the far side.

use pkt_comm::{LinkParams, Packet, PktComm};
use ztex_link::MemoryLink;
use ztex_msg::{
    CharRange, CmpConfig, CmpEqual, CmpHash, InPacket, ProcessingDone, WordGen, WordList,
};

fn loopback(packets: &[Packet], link: &mut MemoryLink) -> Vec<Packet> {
    let mut comm = PktComm::new(LinkParams::new(2, 64, 48).unwrap()).unwrap();
    for packet in packets {
        comm.push(packet.clone()).unwrap();
    }
    while comm.write_to(link).unwrap() > 0 {}
    while comm.read_from(link).unwrap() > 0 {}
    std::iter::from_fn(|| comm.fetch()).collect()
}

#[test]
fn host_packets_arrive_intact() {
    let word_gen = WordGen {
        ranges: vec![
            CharRange::new(*b"abcdefghijklmnopqrstuvwxyz"),
            CharRange::new(*b"0123456789").with_start_idx(9),
        ],
        insert_words: vec![0],
        num_generate: 1_000_000,
    };
    let mut cmp = CmpConfig::new(
        0x0abc,
        (0..40u64).rev().map(|n| CmpHash((n * 0x0101).to_le_bytes())).collect(),
    );
    cmp.sort_hashes();

    let sent = vec![
        cmp.to_packet().unwrap().with_id(1),
        word_gen.to_packet().unwrap().with_id(2),
        WordList::new(["my", "abc", "password"]).to_packet().unwrap().with_id(3),
    ];

    let mut link = MemoryLink::new().with_max_send(31).with_max_recv(11);
    assert_eq!(loopback(&sent, &mut link), sent);
}

#[test]
fn results_parse_after_transfer() {
    let results = [
        InPacket::CmpEqual(CmpEqual {
            pkt_id: 3,
            word_id: 1,
            gen_id: 123_456,
            hash_num_eq: 17,
        }),
        InPacket::ProcessingDone(ProcessingDone {
            pkt_id: 2,
            num_processed: 1_000_000,
        }),
    ];
    let packets: Vec<Packet> = results
        .iter()
        .map(|result| match result {
            InPacket::CmpEqual(r) => r.to_packet().unwrap(),
            InPacket::ProcessingDone(r) => r.to_packet().unwrap(),
        })
        .collect();

    let mut link = MemoryLink::new().with_max_recv(3);
    let parsed: Vec<InPacket> = loopback(&packets, &mut link)
        .iter()
        .map(|packet| InPacket::parse(packet).unwrap())
        .collect();
    assert_eq!(parsed, results);
}

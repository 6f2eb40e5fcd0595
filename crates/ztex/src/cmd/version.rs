use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("ztex-pkt {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: ztex-pkt");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("ZTEX_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("ZTEX_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("pkt_comm_version: {}", pkt_comm::PKT_COMM_VERSION);
    println!("pkt_max_len: {}", pkt_comm::PKT_MAX_LEN);
    println!("pkt_queue_max: {}", pkt_comm::PKT_QUEUE_MAX);
    println!("features: device={}, cli=true", cfg!(feature = "device"));

    Ok(SUCCESS)
}

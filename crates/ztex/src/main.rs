mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "ztex-pkt", version, about = "ZTEX FPGA packet communication tool")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "text",
        env = "ZTEX_PKT_LOG_FORMAT",
        global = true
    )]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        env = "ZTEX_PKT_LOG_LEVEL",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::MessageKind;

    #[test]
    fn parses_encode_subcommand() {
        let cli = Cli::try_parse_from([
            "ztex-pkt",
            "encode",
            "cmp-config",
            "/tmp/cmp.json",
            "--id",
            "7",
        ])
        .expect("encode args should parse");

        match cli.command {
            Command::Encode(args) => {
                assert_eq!(args.kind, MessageKind::CmpConfig);
                assert_eq!(args.id, 7);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_hex_and_file_together() {
        let err = Cli::try_parse_from(["ztex-pkt", "decode", "0100", "--file", "/tmp/wire.bin"])
            .expect_err("conflicting args should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn decode_requires_input() {
        let err = Cli::try_parse_from(["ztex-pkt", "decode"])
            .expect_err("missing input should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn simulate_defaults_match_reference_board() {
        let cli = Cli::try_parse_from(["ztex-pkt", "simulate", "--max-transfer", "333"])
            .expect("simulate args should parse");
        match cli.command {
            Command::Simulate(args) => {
                assert_eq!(args.alignment, 2);
                assert_eq!(args.output_max_len, 16384);
                assert_eq!(args.input_max_len, 32766);
                assert_eq!(args.max_transfer, Some(333));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ztex-pkt",
            "version",
            "--format",
            "pretty",
            "--log-level",
            "debug",
        ])
        .expect("global flags should parse");
        assert_eq!(cli.format, Some(OutputFormat::Pretty));
        assert_eq!(cli.log_level, LogLevel::Debug);
    }
}

mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "nullvfw", version, about = "Null pass-through video codec harness")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        env = "NULLVFW_LOG_LEVEL",
        default_value = "info",
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

    #[test]
    fn parses_encode_subcommand() {
        let cli = Cli::try_parse_from([
            "nullvfw", "encode", "in.raw", "out.enc", "4", "2", "24", "--framed",
        ])
        .expect("encode args should parse");

        match cli.command {
            Command::Encode(args) => {
                assert_eq!((args.width, args.height, args.bit_depth), (4, 2, 24));
                assert!(args.framed);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn accepts_negative_height() {
        let cli = Cli::try_parse_from(["nullvfw", "decode", "in.enc", "out.raw", "4", "-2", "32"])
            .expect("top-down height should parse");
        assert!(matches!(cli.command, Command::Decode(ref args) if args.height == -2));
    }

    #[test]
    fn rejects_missing_geometry() {
        let err = Cli::try_parse_from(["nullvfw", "encode", "in.raw", "out.enc", "4"])
            .expect_err("missing height should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_info_subcommand() {
        let cli = Cli::try_parse_from(["nullvfw", "--format", "json", "info"])
            .expect("info args should parse");
        assert!(matches!(cli.command, Command::Info(_)));
    }
}

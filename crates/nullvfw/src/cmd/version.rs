use nullvfw_driver::info::ICVERSION;
use nullvfw_driver::message::CODEC_MESSAGES;
use nullvfw_driver::DriverConfig;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("nullvfw {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    let config = DriverConfig::default();
    println!("name: nullvfw");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("handler: {}", config.handler);
    println!("interface_version: {ICVERSION:#06x}");
    println!("codec_messages: {}", CODEC_MESSAGES.len());
    println!("host_bindings: {}", cfg!(windows));

    Ok(SUCCESS)
}

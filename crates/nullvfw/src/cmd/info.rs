use nullvfw_driver::message::CodecMessage;
use nullvfw_driver::mode::{mode_name, ICMODE_QUERY};
use nullvfw_driver::{
    CodecInfo, Driver, DriverId, FourCc, Message, OpenParams, Reply, INFO_SIZE, VIDEO,
};
use serde::Serialize;
use tracing::debug;

use crate::cmd::InfoArgs;
use crate::exit::{CliError, CliResult, CODEC_REJECTED, SUCCESS};
use crate::output::{print_report, OutputFormat, Report};

#[derive(Debug, Serialize)]
struct InfoOutput {
    schema_id: &'static str,
    fcc_type: FourCc,
    fcc_handler: FourCc,
    flags: u32,
    version: u32,
    version_icm: u32,
    name: String,
    description: String,
    mode: &'static str,
}

impl Report for InfoOutput {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("type", self.fcc_type.to_string()),
            ("handler", self.fcc_handler.to_string()),
            ("flags", format!("{:#06x}", self.flags)),
            ("version", self.version.to_string()),
            ("version_icm", format!("{:#06x}", self.version_icm)),
            ("name", self.name.clone()),
            ("description", self.description.clone()),
            ("mode", self.mode.to_string()),
        ]
    }
}

pub fn run(_args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let driver = Driver::new();
    let info = query(&driver)?;
    print_report(&info, format);
    Ok(SUCCESS)
}

/// Open a query instance, fetch its info record and close it again.
fn query(driver: &Driver) -> CliResult<InfoOutput> {
    let mut params = OpenParams::new(VIDEO, driver.config().handler, ICMODE_QUERY);
    let token = match driver.dispatch(DriverId::NULL, Message::Open(Some(&mut params))) {
        Reply::Opened(token) => token,
        reply => {
            return Err(CliError::new(
                CODEC_REJECTED,
                format!("open failed (raw {})", reply.into_raw()),
            ))
        }
    };
    debug!(%token, "query instance opened");

    let mut record = CodecInfo::zeroed();
    let reply = driver.dispatch(
        token,
        Message::Codec(CodecMessage::GetInfo {
            info: Some(&mut record),
            size: INFO_SIZE,
        }),
    );
    driver.dispatch(token, Message::Close);

    if !reply.is_ok() {
        return Err(CliError::new(
            CODEC_REJECTED,
            format!("capability query failed (raw {})", reply.into_raw()),
        ));
    }

    Ok(InfoOutput {
        schema_id: "nullvfw/cli/v1/codec-info",
        fcc_type: record.fcc_type,
        fcc_handler: record.fcc_handler,
        flags: record.flags,
        version: record.version,
        version_icm: record.version_icm,
        name: record.name(),
        description: record.description(),
        mode: mode_name(params.flags),
    })
}

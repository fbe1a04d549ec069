use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
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

/// A report that renders as JSON, a two-column table or `key=value` pairs.
pub trait Report: Serialize {
    fn rows(&self) -> Vec<(&'static str, String)>;
}

pub fn print_report<T: Report>(report: &T, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (field, value) in report.rows() {
                table.add_row(vec![field.to_string(), value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let line = report
                .rows()
                .into_iter()
                .map(|(field, value)| format!("{field}={value}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!("{line}");
        }
    }
}

/// Summary of one encode or decode run.
#[derive(Debug, Serialize)]
pub struct TransformReport {
    pub schema_id: &'static str,
    pub direction: &'static str,
    pub frames: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub width: i32,
    pub height: i32,
    pub bit_depth: u16,
    pub framed: bool,
}

impl Report for TransformReport {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("direction", self.direction.to_string()),
            ("frames", self.frames.to_string()),
            ("bytes_in", self.bytes_in.to_string()),
            ("bytes_out", self.bytes_out.to_string()),
            ("geometry", format!("{}x{}x{}", self.width, self.height, self.bit_depth)),
            ("framed", self.framed.to_string()),
        ]
    }
}

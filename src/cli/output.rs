use crate::cli::args::OutputFormat;
use crate::domain::config::EchoConfig;
use crate::infrastructure::tcp::{ServerReport, SessionRecord};
use serde_json;
use std::io;
use tabled::{Table, Tabled};

/// Output writer trait for different formats
pub trait OutputWriter {
    fn write_config(&self, config: &EchoConfig) -> Result<(), OutputError>;
    fn write_server_report(&self, report: &ServerReport) -> Result<(), OutputError>;
    fn write_message(&self, message: &str) -> Result<(), OutputError>;
    fn write_error(&self, error: &str) -> Result<(), OutputError>;
}

/// Output formatting errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl From<OutputError> for crate::domain::error::EchoError {
    fn from(err: OutputError) -> Self {
        Self::Output(err.to_string())
    }
}

/// Console output writer
pub struct ConsoleWriter {
    format: OutputFormat,
}

impl ConsoleWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl OutputWriter for ConsoleWriter {
    fn write_config(&self, config: &EchoConfig) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                println!("echoline Configuration:");
                println!("  Log level: {}", config.global.log_level);
                match config.server.max_sessions {
                    0 => println!("  Max sessions: unlimited"),
                    n => println!("  Max sessions: {}", n),
                }
            }
            OutputFormat::Json => {
                let output = serde_json::to_string_pretty(config)?;
                println!("{}", output);
            }
            OutputFormat::Table => {
                let table = Table::new(config_rows(config));
                println!("{}", table);
            }
        }
        Ok(())
    }

    fn write_server_report(&self, report: &ServerReport) -> Result<(), OutputError> {
        match self.format {
            // Session notices were already printed as the server ran
            OutputFormat::Text => {}
            OutputFormat::Json => {
                let output = serde_json::to_string_pretty(report)?;
                println!("{}", output);
            }
            OutputFormat::Table => {
                if !report.sessions.is_empty() {
                    let table_data: Vec<SessionTableRow> =
                        report.sessions.iter().map(SessionTableRow::from).collect();
                    let table = Table::new(table_data);
                    println!("{}", table);
                }
            }
        }
        Ok(())
    }

    fn write_message(&self, message: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "message": message,
                    "level": "info"
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            _ => {
                println!("{}", message);
            }
        }
        Ok(())
    }

    fn write_error(&self, error: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "error": error,
                    "level": "error"
                });
                eprintln!("{}", serde_json::to_string_pretty(&output)?);
            }
            _ => {
                eprintln!("Error: {}", error);
            }
        }
        Ok(())
    }
}

/// Table row for a served session
#[derive(Tabled)]
struct SessionTableRow {
    id: String,
    host: String,
    peer: String,
    outcome: String,
    lines: u64,
    sent: u64,
    received: u64,
}

impl From<&SessionRecord> for SessionTableRow {
    fn from(record: &SessionRecord) -> Self {
        let (outcome, lines, sent, received) = match (&record.report, &record.error) {
            (Some(report), _) => (
                report.outcome.to_string(),
                report.lines_exchanged,
                report.bytes_sent,
                report.bytes_received,
            ),
            (None, Some(error)) => (format!("error: {}", error), 0, 0, 0),
            (None, None) => ("unknown".to_string(), 0, 0, 0),
        };

        Self {
            id: record.session_id.clone(),
            host: record.host.clone(),
            peer: record.peer_addr.to_string(),
            outcome,
            lines,
            sent,
            received,
        }
    }
}

/// Table row for a configuration value
#[derive(Tabled)]
struct ConfigTableRow {
    section: &'static str,
    key: &'static str,
    value: String,
}

fn config_rows(config: &EchoConfig) -> Vec<ConfigTableRow> {
    vec![
        ConfigTableRow {
            section: "global",
            key: "log_level",
            value: config.global.log_level.clone(),
        },
        ConfigTableRow {
            section: "server",
            key: "max_sessions",
            value: config.server.max_sessions.to_string(),
        },
    ]
}

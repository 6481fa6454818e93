//! Platform logging initialization for harvest_gate.
//!
//! Writes logs to `./harvest_gate.log` in the current working directory
//! unless `HARVEST_GATE_LOG_TARGET` asks for the terminal.

use std::fs::File;
use std::path::PathBuf;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

pub const ENV_LOG_LEVEL: &str = "HARVEST_GATE_LOG";
pub const ENV_LOG_TARGET: &str = "HARVEST_GATE_LOG_TARGET";
const LOG_FILE: &str = "./harvest_gate.log";

/// Destination for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDestination {
    /// Write to ./harvest_gate.log in current directory.
    File,
    /// Write to the terminal, interleaved with the console output.
    Terminal,
    /// Write to both file and terminal.
    Both,
}

impl LogDestination {
    /// Unknown names fall back to [`LogDestination::File`].
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(|n| n.trim().to_ascii_lowercase()).as_deref() {
            Some("terminal") | Some("term") => LogDestination::Terminal,
            Some("both") => LogDestination::Both,
            _ => LogDestination::File,
        }
    }
}

/// Initialize the logger from `HARVEST_GATE_LOG` and `HARVEST_GATE_LOG_TARGET`.
pub fn initialize_from_env() {
    let level = gate_logging::parse_level(
        std::env::var(ENV_LOG_LEVEL).ok().as_deref(),
        LevelFilter::Info,
    );
    let destination = LogDestination::from_name(std::env::var(ENV_LOG_TARGET).ok().as_deref());
    initialize(destination, level);
}

pub fn initialize(destination: LogDestination, level: LevelFilter) {
    let config = build_config();

    let loggers: Vec<Box<dyn SharedLogger>> = match destination {
        LogDestination::File => match create_file_logger(level, config) {
            Some(file_logger) => vec![file_logger],
            None => return,
        },
        LogDestination::Terminal => {
            vec![TermLogger::new(
                level,
                config,
                TerminalMode::Stderr,
                ColorChoice::Auto,
            )]
        }
        LogDestination::Both => {
            let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
                level,
                config.clone(),
                TerminalMode::Stderr,
                ColorChoice::Auto,
            )];
            if let Some(file_logger) = create_file_logger(level, config) {
                loggers.push(file_logger);
            }
            loggers
        }
    };

    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(level: LevelFilter, config: Config) -> Option<Box<WriteLogger<File>>> {
    let log_path = PathBuf::from(LOG_FILE);
    match File::create(&log_path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", log_path, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_names() {
        assert_eq!(LogDestination::from_name(Some(" Terminal")), LogDestination::Terminal);
        assert_eq!(LogDestination::from_name(Some("both")), LogDestination::Both);
        assert_eq!(LogDestination::from_name(Some("syslog")), LogDestination::File);
        assert_eq!(LogDestination::from_name(None), LogDestination::File);
    }
}

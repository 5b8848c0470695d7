use std::fmt::Write;
use std::sync::OnceLock;

use log::{LevelFilter, Log, set_logger, set_max_level};
use time::format_description::well_known::Rfc3339;

use crate::{LogConfigError, LogMode};

static LOGGER: OnceLock<HostLog> = OnceLock::new();

pub struct HostLog {
    mode: LogMode,
}

impl HostLog {
    pub fn init(log_level: LevelFilter, mode: LogMode) -> Result<(), LogConfigError> {
        let logger = LOGGER.get_or_init(|| HostLog { mode });
        if logger.mode != mode {
            return Err(LogConfigError::ModeConflict {
                current: logger.mode,
            });
        }
        // Another logger may have won `set_logger`, in which case this one never runs.
        if !logger.is_installed() {
            if let Err(cause) = set_logger(logger) {
                if !logger.is_installed() {
                    return Err(LogConfigError::Install { cause });
                }
            }
        }
        set_max_level(log_level);
        Ok(())
    }

    fn is_installed(&self) -> bool {
        std::ptr::addr_eq(log::logger() as *const dyn Log, self as *const HostLog)
    }

    fn format(&self, record: &log::Record) -> String {
        let mut buffer = String::with_capacity(128);
        let level = record.level().as_str();
        let module = record.module_path().unwrap_or("<unknown>");
        let file = record.file().unwrap_or("<unknown>");
        let line = record.line().unwrap_or(0);
        let log_message = record.args();

        // The host stamps invocation logs itself.
        let _ = match self.mode {
            LogMode::Invocation => write!(
                &mut buffer,
                "{level} {module} {file}:{line} {log_message}"
            ),
            LogMode::Console => {
                let utc_now = time::OffsetDateTime::now_utc();
                let timestamp = utc_now.format(&Rfc3339).unwrap_or("<unknown>".to_string());
                write!(
                    &mut buffer,
                    "{level} {timestamp} {module} {file}:{line} {log_message}"
                )
            }
        };
        buffer
    }
}

impl Log for HostLog {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let buffer = self.format(record);
            match self.mode {
                LogMode::Invocation => {
                    cosmosdb_functions_host::logging::log(buffer.as_str(), record.level())
                }
                LogMode::Console => {
                    cosmosdb_functions_host::logging::console(buffer.as_str(), record.level())
                }
            }
        }
    }

    fn flush(&self) {}
}

//! Runs in its own process: a different logger owns the `log` facade here.

use cosmosdb_functions_log::{LogConfigError, LogMode, configure_logging};
use log::{LevelFilter, Log, Metadata, Record};

struct Elsewhere;

impl Log for Elsewhere {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, _record: &Record) {}

    fn flush(&self) {}
}

static ELSEWHERE: Elsewhere = Elsewhere;

#[test]
fn installing_over_another_logger_keeps_failing() {
    log::set_logger(&ELSEWHERE).unwrap();

    for _ in 0..2 {
        let error = configure_logging(LevelFilter::Info, LogMode::Invocation).unwrap_err();
        assert!(matches!(error, LogConfigError::Install { .. }), "{error}");
    }
}

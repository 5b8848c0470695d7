//! The logger is process global, so every test here installs the same mode.

use cosmosdb_functions_host::logging;
use cosmosdb_functions_log::{LogConfigError, LogMode, configure_logging};
use log::LevelFilter;

fn install() {
    configure_logging(LevelFilter::Info, LogMode::Invocation).expect("logger installs");
}

#[test]
fn records_are_attached_to_the_invocation() {
    install();

    let ((), lines) = logging::capture(|| {
        log::info!("first");
        log::debug!("filtered out");
        log::warn!("second");
    });

    assert_eq!(lines.len(), 2, "{lines:?}");
    assert!(lines[0].starts_with("INFO invocation_logging "), "{}", lines[0]);
    assert!(lines[0].ends_with(" first"), "{}", lines[0]);
    assert!(lines[1].starts_with("WARN "), "{}", lines[1]);
    assert!(lines[1].contains("invocation_logging.rs:"), "{}", lines[1]);
}

#[test]
fn reconfiguring_the_same_mode_is_allowed() {
    install();
    install();
}

#[test]
fn switching_modes_is_rejected() {
    install();

    let error = configure_logging(LevelFilter::Info, LogMode::Console).unwrap_err();
    assert!(matches!(
        error,
        LogConfigError::ModeConflict {
            current: LogMode::Invocation
        }
    ));
}

use amber_monitor::config::LoggingConfig;
use amber_monitor::logging::{
    LogContext, get_logger, get_logger_with_context, init_logging, min_level,
    parse_log_level,
};
use tracing::Level;

#[test]
fn parse_levels_case_insensitively() {
    assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
    assert_eq!(parse_log_level("WARNING").unwrap(), Level::WARN);
    assert!(parse_log_level("loud").is_err());
}

#[test]
fn min_level_picks_the_more_verbose() {
    assert_eq!(min_level(Level::INFO, Level::DEBUG), Level::DEBUG);
    assert_eq!(min_level(Level::ERROR, Level::TRACE), Level::TRACE);
}

#[test]
fn init_is_idempotent() {
    // SAFETY: single-threaded test setup before any logging init
    unsafe {
        std::env::set_var(amber_monitor::logging::DISABLE_FILE_LOG_ENV, "1");
    }
    let config = LoggingConfig::default();
    init_logging(&config).unwrap();
    init_logging(&config).unwrap();

    let logger = get_logger("report");
    assert_eq!(logger.component(), "report");
    logger.info("logging initialised");

    let scoped = get_logger_with_context(LogContext::new("dashboard").with_site_id("site-1"));
    scoped.for_generation(3).debug("generation scoped");
}

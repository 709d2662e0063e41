use redox_log::{OutputBuilder, RedoxLogger};

/// Reads a log level such as `debug` from the environment variable `var`.
///
/// Unset or unparseable values fall back to `default`.
pub fn level_from_env(var: &str, default: log::LevelFilter) -> log::LevelFilter {
    std::env::var(var)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// Configures logging for a single driver.
///
/// Records go to stderr, and on Redox also to `<logfile_base>.log` in the logging scheme under
/// `category/subcategory`.
#[cfg_attr(not(target_os = "redox"), allow(unused_variables, unused_mut))]
pub fn setup_logging(category: &str, subcategory: &str, logfile_base: &str, level: log::LevelFilter) {
    let mut logger = RedoxLogger::new().with_output(
        OutputBuilder::stderr()
            .with_filter(level)
            .with_ansi_escape_codes()
            .flush_on_newline(true)
            .build(),
    );

    #[cfg(target_os = "redox")]
    match OutputBuilder::in_redox_logging_scheme(
        category,
        subcategory,
        format!("{logfile_base}.log"),
    ) {
        Ok(b) => logger = logger.with_output(b.with_filter(level).flush_on_newline(true).build()),
        Err(error) => eprintln!("Failed to create {logfile_base}.log: {}", error),
    }

    logger.enable().expect("failed to set default logger");
}

use tracing_subscriber::EnvFilter;

/// Map a config log level onto a tracing filter directive.
///
/// Returns `None` for "DISABLED", meaning no subscriber should be installed.
#[must_use]
pub fn tracing_directive(log_level: &str) -> Option<&'static str> {
    match log_level.to_uppercase().as_str() {
        "DISABLED" => None,
        "DEBUG" => Some("DEBUG"),
        "WARNING" => Some("WARN"),
        "ERROR" | "CRITICAL" => Some("ERROR"),
        _ => Some("INFO"),
    }
}

/// Initialize the tracing subscriber with the configured log level.
///
/// Output goes to stderr so the `extract` command can keep stdout for JSON.
pub fn init_tracing(log_level: &str) {
    let Some(directive) = tracing_directive(log_level) else {
        return;
    };

    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("INFO"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

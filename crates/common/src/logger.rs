use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` overrides the default `info`
/// level. Output goes to stderr so stdout stays free for the terminal UI.
pub fn setup_logger() {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Ok(directive) = "sqlx=warn".parse() {
        filter = filter.add_directive(directive);
    }

    let _ = tracing_subscriber::fmt()
        // .with_file(true)
        // .with_line_number(true)
        .with_target(true)
        .with_level(true)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .compact()
        .with_env_filter(filter)
        .try_init();
}

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `BZRSYNC_LOG` (then `RUST_LOG`) wins when set; otherwise `verbosity`
/// picks the level: 0 → warn, 1 → info, 2+ → debug. Output goes to stderr
/// so it stays out of the way of progress bars.
pub fn init(verbosity: u8) {
    let fallback = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("BZRSYNC_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

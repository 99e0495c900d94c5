use tracing_subscriber::EnvFilter;

/// Overrides the verbosity flags when set, e.g. `SEV_LOG=sev_fetch=debug`.
pub const LOG_ENV: &str = "SEV_LOG";

pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 1)
        .init();
}

fn level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

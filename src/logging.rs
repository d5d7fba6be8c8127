use env_logger::Env;

/// Honors `RUST_LOG`, defaulting to `info`.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_target(true)
        .try_init();
}

/// Install an `env_logger` backend. Safe to call more than once; later calls are ignored.
pub fn setup_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init()
        .ok();
}

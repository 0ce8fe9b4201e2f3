/// Configures env_logger for the process.
///
/// Verbose runs log every debug message; otherwise only warnings and errors
/// reach stderr. `RUST_LOG` still refines the filter when set.
pub fn init_logger(verbose: bool) {
    env_logger::Builder::new()
        .filter_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .init();
}

//! Logging utilities

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// Installs `env_logger` reading `RUST_LOG`. Calling it more than once is
/// harmless; later calls leave the first logger in place.
pub fn init() {
    if env_logger::try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_init_twice() {
        super::init();
        super::init();
        log::info!("logger still usable");
    }
}

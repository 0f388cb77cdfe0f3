//! Utilities: logging setup (tracing subscriber with a CLI-derived level).
//!
//! Key items:
//!   derive_level / init_logging

/// Logging helpers.
pub mod logging {
    use tracing::Level;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::filter::LevelFilter;

    /// `-q` -> ERROR, none -> INFO, `-v` -> DEBUG, `-vv` and up -> TRACE.
    pub fn derive_level(verbose: u8, quiet: bool) -> Level {
        if quiet {
            return Level::ERROR;
        }
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    /// Install the stderr fmt subscriber. `RUST_LOG` wins over `level` when set.
    pub fn init_logging(level: Level) {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(level).into())
            .from_env_lossy();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

pub use logging::{derive_level, init_logging};

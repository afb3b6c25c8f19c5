//! Process-wide log sink.

use std::io::Write;
use std::sync::Once;

use log::LevelFilter;

static INIT_LOGGER: Once = Once::new();

/// Install the `env_logger` sink. Only the first call has any effect.
///
/// `RUST_LOG` overrides the level picked from `verbosity`.
pub fn init_logging(verbosity: u8) {
    INIT_LOGGER.call_once(|| {
        let level = match verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        };
        let mut builder = env_logger::Builder::new();
        builder.filter_level(level);
        builder.parse_env(env_logger::Env::default());
        builder.format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()));

        // Another logger may already be installed by the host program
        let _ = builder.try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging(2);
        init_logging(0);
        log::debug!("logger initialised");
    }
}

use std::env;

use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Initialize the terminal logger. The level is taken from the
/// `LAUNCHTIMES_LOG` environment variable and defaults to `info`.
pub fn init_logger() -> anyhow::Result<()> {
    let log_level = env::var("LAUNCHTIMES_LOG")
        .ok()
        .and_then(|log_level| log_level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);

    let config = ConfigBuilder::new()
        .set_time_level(log::LevelFilter::Debug)
        .build();

    TermLogger::init(log_level, config, TerminalMode::Mixed, ColorChoice::Auto)?;
    Ok(())
}

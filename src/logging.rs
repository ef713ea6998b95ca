use log::LevelFilter;

const GLOBAL_LOG_FILTER: LevelFilter = LevelFilter::Info;

/// Level this crate logs at.
pub fn crate_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        GLOBAL_LOG_FILTER
    }
}

/// Installs the global logger. Fails if one is already set.
pub fn init(verbose: bool) -> Result<(), log::SetLoggerError> {
    use fern::colors::{Color, ColoredLevelConfig};

    let colors = ColoredLevelConfig::new()
        .info(Color::Blue)
        .debug(Color::Green);

    fern::Dispatch::new()
        .level(GLOBAL_LOG_FILTER)
        .level_for(env!("CARGO_CRATE_NAME"), crate_level(verbose))
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}:{}] {}",
                chrono::Local::now().format("[%H:%M:%S]"),
                colors.color(record.level()),
                record.target(),
                record.line().unwrap_or_default(),
                message
            ));
        })
        .chain(std::io::stdout())
        .apply()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_only_raises_this_crate() {
        assert_eq!(crate_level(false), LevelFilter::Info);
        assert_eq!(crate_level(true), LevelFilter::Debug);
    }
}

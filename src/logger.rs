use log::{Level, LevelFilter, Metadata, Record};

pub struct Logger;

static LOGGER: Logger = Logger;

/// Installs the logger; `verbosity` counts `-v` flags.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match log::max_level() {
            LevelFilter::Debug | LevelFilter::Trace => eprintln!(
                "{} {} {}",
                label(record.level()),
                record.target(),
                record.args()
            ),
            _ => eprintln!("{} {}", label(record.level()), record.args()),
        }
    }

    fn flush(&self) {}
}

fn label(level: Level) -> &'static str {
    match level {
        Level::Error => "[ERROR]",
        Level::Warn => "[WARN]",
        Level::Info => "[INFO]",
        Level::Debug => "[DEBUG]",
        Level::Trace => "[TRACE]",
    }
}

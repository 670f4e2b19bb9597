//! `log4rs` setup. Store mutations are logged on the `students_marks::audit` target and routed
//! to their own file; everything else goes to `app.log` (or stderr for the console setup).
use log::LevelFilter;
use log4rs::Handle;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};

pub const AUDIT_TARGET: &str = "students_marks::audit";

const ENCODER_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_RETENTION: usize = 7;

type LogResult<T> = Result<T, Box<dyn std::error::Error>>;

#[must_use]
pub fn parse_level(level: Option<&str>) -> LevelFilter {
    match level.unwrap_or("info").to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn rolling(base: &Path, stem: &str, keep: u32) -> LogResult<RollingFileAppender> {
    let pattern = base.join(format!("{stem}.{{}}.log"));
    let roller = FixedWindowRoller::builder().build(&pattern.display().to_string(), keep)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE_BYTES)), Box::new(roller));
    Ok(RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(ENCODER_PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))?)
}

/// Builds the file configuration: `app.log` for the root logger and `audit.log` for audit
/// records, both rolled at 10 MiB keeping `retention` files.
///
/// # Errors
/// Returns an error if the directory or appenders cannot be created.
pub fn file_config(dir: Option<&Path>, level: Option<&str>, retention: Option<usize>) -> LogResult<Config> {
    let base = dir.map_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")), Path::to_path_buf);
    std::fs::create_dir_all(&base)?;
    let keep = u32::try_from(retention.unwrap_or(DEFAULT_RETENTION)).unwrap_or(u32::MAX);
    let lvl = parse_level(level);
    Ok(Config::builder()
        .appender(Appender::builder().build("app", Box::new(rolling(&base, "app", keep)?)))
        .appender(Appender::builder().build("audit", Box::new(rolling(&base, "audit", keep)?)))
        .logger(Logger::builder().appender("audit").additive(false).build(AUDIT_TARGET, lvl))
        .build(Root::builder().appender("app").build(lvl))?)
}

/// Installs the file configuration process-wide.
///
/// # Errors
/// Returns an error if the configuration cannot be built or a logger is already installed.
pub fn configure_logging(dir: Option<&Path>, level: Option<&str>, retention: Option<usize>) -> LogResult<Handle> {
    Ok(log4rs::init_config(file_config(dir, level, retention)?)?)
}

/// Installs a stderr-only configuration, audit records included.
///
/// # Errors
/// Returns an error if a logger is already installed.
pub fn configure_console(level: Option<&str>) -> LogResult<Handle> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(ENCODER_PATTERN)))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(parse_level(level)))?;
    Ok(log4rs::init_config(config)?)
}

/// Configures file logging from `STUDENTS_MARKS_LOG_DIR`, `STUDENTS_MARKS_LOG_LEVEL` and
/// `STUDENTS_MARKS_LOG_RETENTION`.
///
/// # Errors
/// Returns an error if the configuration cannot be installed.
pub fn configure_from_env() -> LogResult<Handle> {
    let dir = std::env::var("STUDENTS_MARKS_LOG_DIR").ok().map(PathBuf::from);
    let level = std::env::var("STUDENTS_MARKS_LOG_LEVEL").ok();
    let retention = std::env::var("STUDENTS_MARKS_LOG_RETENTION").ok().and_then(|s| s.parse::<usize>().ok());
    configure_logging(dir.as_deref(), level.as_deref(), retention)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_level_falls_back_to_info() {
        assert_eq!(parse_level(Some("DEBUG")), LevelFilter::Debug);
        assert_eq!(parse_level(Some("loud")), LevelFilter::Info);
        assert_eq!(parse_level(None), LevelFilter::Info);
    }

    #[test]
    fn file_config_creates_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let cfg = file_config(Some(&logs), Some("debug"), Some(3)).unwrap();
        assert!(logs.is_dir());
        assert_eq!(cfg.root().level(), LevelFilter::Debug);
        assert!(cfg.loggers().iter().any(|l| l.name() == AUDIT_TARGET));
    }
}

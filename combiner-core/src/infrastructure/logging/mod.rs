//! Logging infrastructure using `log` + `log4rs`.

mod consts;

pub use consts::*;

use crate::foundation::CombinerError;
use log::LevelFilter;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        rolling_file::{
            policy::compound::{roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger, CompoundPolicy},
            RollingFileAppender,
        },
    },
    config::{Appender, Logger, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::io::IsTerminal;
use std::path::Path;

const CONSOLE_APPENDER: &str = "stderr";
const LOG_FILE_APPENDER: &str = "log_file";
const ERR_LOG_FILE_APPENDER: &str = "err_log_file";

/// Parsed filter expression such as `"info,combiner_core=debug,reqwest=warn,root=error"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilters {
    /// Level for whitelisted crates (bare level entry, default INFO).
    pub app_level: LevelFilter,
    /// Level for everything not listed (`root=<level>`, default OFF).
    pub root_level: LevelFilter,
    pub modules: Vec<(String, LevelFilter)>,
}

impl LogFilters {
    pub fn parse(filters: &str) -> Self {
        let mut app_level = None;
        let mut root_level = None;
        let mut modules = Vec::new();
        for part in filters.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('=') {
                None => {
                    if app_level.is_none() {
                        app_level = part.parse().ok();
                    }
                }
                Some((module, level)) => {
                    let (module, level) = (module.trim(), level.trim());
                    let Ok(level) = level.parse::<LevelFilter>() else {
                        continue;
                    };
                    if module.is_empty() {
                        continue;
                    }
                    if module == "root" {
                        root_level.get_or_insert(level);
                    } else {
                        modules.push((module.to_string(), level));
                    }
                }
            }
        }
        Self { app_level: app_level.unwrap_or(LevelFilter::Info), root_level: root_level.unwrap_or(LevelFilter::Off), modules }
    }
}

/// Initialize the global logger. Console output goes to stderr; with `log_dir`
/// set, `combiner.log` and `combiner_err.log` are written there too.
///
/// The logger is global; repeated calls leave the first configuration in place.
pub fn init_logger(log_dir: Option<&str>, filters: &str) -> Result<(), CombinerError> {
    let filters = LogFilters::parse(filters);
    let pattern = if std::io::stderr().is_terminal() { LOG_LINE_PATTERN_COLORED } else { LOG_LINE_PATTERN };
    let console = ConsoleAppender::builder().target(Target::Stderr).encoder(Box::new(PatternEncoder::new(pattern))).build();

    let mut builder = Config::builder().appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(console)));
    let mut appenders = vec![CONSOLE_APPENDER.to_string()];

    if let Some(dir) = log_dir.map(str::trim).filter(|d| !d.is_empty()) {
        let dir = Path::new(dir);
        builder = builder.appender(Appender::builder().build(LOG_FILE_APPENDER, Box::new(rolling_appender(dir, LOG_FILE_NAME)?)));
        builder = builder.appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Warn)))
                .build(ERR_LOG_FILE_APPENDER, Box::new(rolling_appender(dir, ERR_LOG_FILE_NAME)?)),
        );
        appenders.push(LOG_FILE_APPENDER.to_string());
        appenders.push(ERR_LOG_FILE_APPENDER.to_string());
    }

    // Explicit module entries override the whitelist.
    for crate_name in WHITELISTED_CRATES.iter().filter(|c| !filters.modules.iter().any(|(m, _)| m == *c)) {
        builder = builder.logger(Logger::builder().appenders(appenders.clone()).additive(false).build(*crate_name, filters.app_level));
    }
    for (module, level) in &filters.modules {
        builder = builder.logger(Logger::builder().appenders(appenders.clone()).additive(false).build(module, *level));
    }

    let config = builder
        .build(Root::builder().appenders(appenders).build(filters.root_level))
        .map_err(|err| CombinerError::ConfigError(format!("invalid logging configuration: {err}")))?;
    let _ = log4rs::init_config(config);
    Ok(())
}

fn rolling_appender(dir: &Path, file_name: &str) -> Result<RollingFileAppender, CombinerError> {
    let archive = dir.join(format!("{file_name}.{{}}.gz"));
    let archive = archive
        .to_str()
        .ok_or_else(|| CombinerError::ConfigError(format!("log dir is not valid utf-8: {}", dir.display())))?;
    let roller = FixedWindowRoller::builder()
        .base(1)
        .build(archive, LOG_FILE_MAX_ROLLS)
        .map_err(|err| CombinerError::ConfigError(format!("log roller for {file_name}: {err}")))?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(LOG_FILE_MAX_SIZE)), Box::new(roller));
    let appender = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN)))
        .build(dir.join(file_name), Box::new(policy))?;
    Ok(appender)
}

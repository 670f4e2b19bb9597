//! Application configuration. Precedence: CLI flags (applied by the caller) > environment >
//! config files > defaults.
use crate::errors::DbError;
use crate::students::{DEFAULT_BEST_SCORE_CUTOFF, DEFAULT_COLLECTION};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "students-marks.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Operation log file; `None` keeps everything in memory.
    pub db_path: Option<PathBuf>,
    pub collection: String,
    pub best_score_cutoff: i32,
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_retention: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            collection: DEFAULT_COLLECTION.to_string(),
            best_score_cutoff: DEFAULT_BEST_SCORE_CUTOFF,
            log_dir: None,
            log_level: None,
            log_retention: None,
        }
    }
}

/// Same fields as `AppConfig`, all optional, so a file only overrides what it names.
#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    db_path: Option<PathBuf>,
    collection: Option<String>,
    best_score_cutoff: Option<i32>,
    log_dir: Option<PathBuf>,
    log_level: Option<String>,
    log_retention: Option<usize>,
}

impl AppConfig {
    /// Parses a complete config from TOML; unnamed keys take their defaults.
    ///
    /// # Errors
    /// Returns `DbError::Config` on malformed TOML.
    pub fn from_toml_str(s: &str) -> Result<Self, DbError> {
        Ok(toml::from_str(s)?)
    }

    fn merge_file(&mut self, file: PartialConfig) {
        if let Some(v) = file.db_path {
            self.db_path = Some(v);
        }
        if let Some(v) = file.collection {
            self.collection = v;
        }
        if let Some(v) = file.best_score_cutoff {
            self.best_score_cutoff = v;
        }
        if let Some(v) = file.log_dir {
            self.log_dir = Some(v);
        }
        if let Some(v) = file.log_level {
            self.log_level = Some(v);
        }
        if let Some(v) = file.log_retention {
            self.log_retention = Some(v);
        }
    }

    /// Applies `STUDENTS_MARKS_*` variables looked up through `var`.
    ///
    /// # Errors
    /// Returns `DbError::Config` when a numeric variable does not parse.
    pub fn apply_env<F>(&mut self, var: F) -> Result<(), DbError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = var("STUDENTS_MARKS_DB") {
            self.db_path = Some(PathBuf::from(v));
        }
        if let Some(v) = var("STUDENTS_MARKS_COLLECTION") {
            self.collection = v;
        }
        if let Some(v) = var("STUDENTS_MARKS_BEST_CUTOFF") {
            self.best_score_cutoff = v
                .parse()
                .map_err(|_| DbError::Config(format!("STUDENTS_MARKS_BEST_CUTOFF: not an integer: {v}")))?;
        }
        if let Some(v) = var("STUDENTS_MARKS_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = var("STUDENTS_MARKS_LOG_LEVEL") {
            self.log_level = Some(v);
        }
        if let Some(v) = var("STUDENTS_MARKS_LOG_RETENTION") {
            self.log_retention = Some(
                v.parse().map_err(|_| DbError::Config(format!("STUDENTS_MARKS_LOG_RETENTION: not a count: {v}")))?,
            );
        }
        Ok(())
    }
}

/// Candidate config files, lowest precedence first.
#[must_use]
pub fn find_config_paths(cli_cfg: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(cur) = std::env::current_dir() {
        paths.push(cur.join(CONFIG_FILE_NAME));
    }
    if let Some(dir) = dirs_next::config_dir() {
        paths.push(dir.join(CONFIG_FILE_NAME));
    }
    if let Ok(p) = std::env::var("STUDENTS_MARKS_CONFIG") {
        paths.push(PathBuf::from(p));
    }
    if let Some(p) = cli_cfg {
        paths.push(p.to_path_buf());
    }
    paths
}

/// Loads defaults, then each existing file in `paths` (later wins), then the environment.
///
/// # Errors
/// Returns `DbError::Config` for an unreadable or malformed file or a bad variable.
pub fn load_from<F>(paths: &[PathBuf], var: F) -> Result<AppConfig, DbError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = AppConfig::default();
    for p in paths.iter().filter(|p| p.exists()) {
        let s = std::fs::read_to_string(p).map_err(|e| DbError::Config(format!("{}: {e}", p.display())))?;
        let file: PartialConfig = toml::from_str(&s).map_err(|e| DbError::Config(format!("{}: {e}", p.display())))?;
        log::debug!("loaded config file {}", p.display());
        cfg.merge_file(file);
    }
    cfg.apply_env(var)?;
    Ok(cfg)
}

/// Loads configuration from the standard locations and the process environment.
///
/// # Errors
/// Returns `DbError::Config` for an unreadable or malformed file or a bad variable.
pub fn load_config(cli_cfg: Option<&Path>) -> Result<AppConfig, DbError> {
    load_from(&find_config_paths(cli_cfg), |k| std::env::var(k).ok())
}

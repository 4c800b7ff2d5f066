//! Connector configuration: parameter names, defaults and validated producer/consumer settings.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::ConfigError;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
    worker_thread_name: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!("{pkg}.toml"),
                worker_thread_name: format!("{pkg}-producer"),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Config file looked up in the working directory when `--config` is not given.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    pub fn worker_thread_name(&self) -> &str {
        &self.worker_thread_name
    }
}

// ---- Parameter names ----

/// Keys of the string parameter table (same names in the toml file).
pub struct ParamKeys;

impl ParamKeys {
    pub const PATH: &'static str = "path";
    pub const FILENAME_RGX: &'static str = "filename_rgx";
    pub const PUBLISH_RATE: &'static str = "publishrate";
    pub const REPEAT_COUNT: &'static str = "repeatcount";
    pub const BLOCK_SIZE: &'static str = "blocksize";
    pub const TRANSACTIONAL: &'static str = "transactional";
    pub const PUBLISH_WITH_UPSERT: &'static str = "publishwithupsert";
    pub const RESCAN_DELAY: &'static str = "rescandelay";
    pub const FILENAME: &'static str = "filename";
    pub const DATA_FIELD_NAME: &'static str = "datafieldname";
}

// ---- Defaults ----

pub struct Defaults;

impl Defaults {
    /// ≤ 0 means unlimited.
    pub const PUBLISH_RATE: f64 = 0.0;
    /// 0 = one cycle, < 0 = forever.
    pub const REPEAT_COUNT: i64 = 0;
    pub const BLOCK_SIZE: usize = 1;
    pub const TRANSACTIONAL: bool = false;
    pub const PUBLISH_WITH_UPSERT: bool = false;
    /// Keeps `repeatcount < 0` from rescanning in a tight loop.
    pub const RESCAN_DELAY_MS: u64 = 100;
    /// Field names used by the CLI when it synthesizes a schema.
    pub const ID_FIELD: &'static str = "id";
    pub const DATA_FIELD: &'static str = "data";
    pub const PATH_FIELD: &'static str = "path";
    /// Capacity of the in-process channel boundary.
    pub const CHANNEL_CAP: usize = 64;
}

// ---- Producer ----

/// Settings for the directory → pipeline direction.
#[derive(Clone, Debug, PartialEq)]
pub struct ProducerConfig {
    /// Directory to scan.
    pub path: String,
    /// Full-match pattern for bare file names.
    pub filename_rgx: String,
    /// Files per second; ≤ 0 disables pacing.
    pub publish_rate: f64,
    /// < 0 forever, 0 once, N > 0 means N extra cycles.
    pub repeat_count: i64,
    /// Records per emitted group (≥ 1).
    pub block_size: usize,
    pub transactional: bool,
    pub publish_with_upsert: bool,
    /// Pause between cycles in milliseconds.
    pub rescan_delay_ms: u64,
}

impl ProducerConfig {
    pub fn new(path: impl Into<String>, filename_rgx: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            filename_rgx: filename_rgx.into(),
            publish_rate: Defaults::PUBLISH_RATE,
            repeat_count: Defaults::REPEAT_COUNT,
            block_size: Defaults::BLOCK_SIZE,
            transactional: Defaults::TRANSACTIONAL,
            publish_with_upsert: Defaults::PUBLISH_WITH_UPSERT,
            rescan_delay_ms: Defaults::RESCAN_DELAY_MS,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.is_empty() {
            return Err(ConfigError::missing(ParamKeys::PATH));
        }
        if self.filename_rgx.is_empty() {
            return Err(ConfigError::missing(ParamKeys::FILENAME_RGX));
        }
        if !self.publish_rate.is_finite() {
            return Err(ConfigError::invalid(
                ParamKeys::PUBLISH_RATE,
                self.publish_rate.to_string(),
            ));
        }
        if self.block_size < 1 {
            return Err(ConfigError::invalid(
                ParamKeys::BLOCK_SIZE,
                self.block_size.to_string(),
            ));
        }
        Ok(())
    }

    /// Build from a string parameter table, applying defaults for absent optional keys.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = Self::new(
            required(params, ParamKeys::PATH)?,
            required(params, ParamKeys::FILENAME_RGX)?,
        );
        if let Some(v) = parse_opt::<f64>(params, ParamKeys::PUBLISH_RATE)? {
            config.publish_rate = v;
        }
        if let Some(v) = parse_opt::<i64>(params, ParamKeys::REPEAT_COUNT)? {
            config.repeat_count = v;
        }
        if let Some(v) = parse_opt::<usize>(params, ParamKeys::BLOCK_SIZE)? {
            config.block_size = v;
        }
        if let Some(v) = parse_opt::<bool>(params, ParamKeys::TRANSACTIONAL)? {
            config.transactional = v;
        }
        if let Some(v) = parse_opt::<bool>(params, ParamKeys::PUBLISH_WITH_UPSERT)? {
            config.publish_with_upsert = v;
        }
        if let Some(v) = parse_opt::<u64>(params, ParamKeys::RESCAN_DELAY)? {
            config.rescan_delay_ms = v;
        }
        config.validate()?;
        Ok(config)
    }
}

// ---- Consumer ----

/// Settings for the pipeline → directory direction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsumerConfig {
    /// Output template; `out/frame.jpg` writes `out/frame1.jpg`, `out/frame2.jpg`, ...
    pub filename: String,
    /// Schema field holding the payload.
    pub data_field_name: String,
}

impl ConsumerConfig {
    pub fn new(filename: impl Into<String>, data_field_name: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            data_field_name: data_field_name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.filename.is_empty() {
            return Err(ConfigError::missing(ParamKeys::FILENAME));
        }
        if self.data_field_name.is_empty() {
            return Err(ConfigError::missing(ParamKeys::DATA_FIELD_NAME));
        }
        Ok(())
    }

    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let config = Self::new(
            required(params, ParamKeys::FILENAME)?,
            required(params, ParamKeys::DATA_FIELD_NAME)?,
        );
        config.validate()?;
        Ok(config)
    }
}

fn required(params: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    match params.get(key).map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ConfigError::missing(key)),
    }
}

fn parse_opt<T: FromStr>(
    params: &HashMap<String, String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match params.get(key).map(|v| v.trim()) {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::invalid(key, v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn producer_defaults_validate() {
        let c = ProducerConfig::new("/in", ".*");
        assert!(c.validate().is_ok());
        assert_eq!(c.block_size, 1);
        assert_eq!(c.repeat_count, 0);
        assert_eq!(c.publish_rate, 0.0);
        assert!(!c.transactional);
        assert_eq!(c.rescan_delay_ms, 100);
    }

    #[test]
    fn package_names() {
        let p = PackagePaths::get();
        assert_eq!(p.pkg_name(), "filebridge");
        assert_eq!(p.config_filename(), "filebridge.toml");
    }
}

//! Load `filebridge.toml` (CLI only). Library callers build [`ProducerConfig`] /
//! [`ConsumerConfig`] directly.

use serde::Deserialize;
use std::path::Path;

use crate::utils::config::{ConsumerConfig, ProducerConfig};

#[derive(Debug, Default, Deserialize)]
pub struct BridgeToml {
    #[serde(default)]
    producer: ProducerSection,
    #[serde(default)]
    consumer: ConsumerSection,
}

/// `[producer]`: same keys as the parameter table.
#[derive(Debug, Default, Deserialize)]
struct ProducerSection {
    path: Option<String>,
    filename_rgx: Option<String>,
    publishrate: Option<f64>,
    repeatcount: Option<i64>,
    blocksize: Option<usize>,
    transactional: Option<bool>,
    publishwithupsert: Option<bool>,
    rescandelay: Option<u64>,
}

/// `[consumer]`
#[derive(Debug, Default, Deserialize)]
struct ConsumerSection {
    filename: Option<String>,
    datafieldname: Option<String>,
}

/// Load `path` if present. Returns None if missing or unreadable; parse errors are warned.
pub fn load_bridge_toml(path: &Path) -> Option<BridgeToml> {
    let s = std::fs::read_to_string(path).ok()?;
    parse_bridge_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub fn parse_bridge_toml(s: &str) -> Result<BridgeToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite config field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $config:expr, $file_field:ident => $config_field:ident) => {
        if let Some(v) = $section.$file_field.clone() {
            $config.$config_field = v;
        }
    };
}

/// Apply file values to `config` (only keys present in the file). Call before applying CLI flags.
pub fn apply_file_to_producer(file: &BridgeToml, config: &mut ProducerConfig) {
    let p = &file.producer;
    apply_file_opt!(p, config, path => path);
    apply_file_opt!(p, config, filename_rgx => filename_rgx);
    apply_file_opt!(p, config, publishrate => publish_rate);
    apply_file_opt!(p, config, repeatcount => repeat_count);
    apply_file_opt!(p, config, blocksize => block_size);
    apply_file_opt!(p, config, transactional => transactional);
    apply_file_opt!(p, config, publishwithupsert => publish_with_upsert);
    apply_file_opt!(p, config, rescandelay => rescan_delay_ms);
}

pub fn apply_file_to_consumer(file: &BridgeToml, config: &mut ConsumerConfig) {
    let c = &file.consumer;
    apply_file_opt!(c, config, filename => filename);
    apply_file_opt!(c, config, datafieldname => data_field_name);
}

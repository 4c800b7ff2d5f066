//! Filebridge: publish the files of a directory as numbered records, and write received records
//! back out as numbered files.

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use error::{BridgeError, BridgeResult, ConfigError, FailureKind, PatternErrorKind};
pub use pipeline::{
    ConsumeStats, ConsumerConnector, GroupSink, ProducerConnector, ProducerReport, ProducerState,
    StopSignal,
};
pub use types::*;
pub use utils::config::{ConsumerConfig, ProducerConfig};

use log::debug;

/// Result alias used by the application layer
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Validate `config`, negotiate `schema` and start a producer writing into `sink`.
///
/// The returned connector owns the worker; call [`ProducerConnector::wait`] or
/// [`ProducerConnector::stop`] to join it. Dropping the connector stops it.
pub fn start_producer<S>(
    config: ProducerConfig,
    schema: &Schema,
    sink: S,
) -> BridgeResult<ProducerConnector>
where
    S: GroupSink + 'static,
{
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        config
    );
    let mut connector = ProducerConnector::new(config)?;
    connector.on_schema_ready(schema)?;
    connector.start(sink)?;
    Ok(connector)
}

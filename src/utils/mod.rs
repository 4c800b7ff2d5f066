pub mod bridge_toml;
pub mod config;
pub mod logger;

pub use bridge_toml::{
    BridgeToml, apply_file_to_consumer, apply_file_to_producer, load_bridge_toml,
    parse_bridge_toml,
};
pub use config::*;
pub use logger::setup_logging;

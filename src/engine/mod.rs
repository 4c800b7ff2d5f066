//! Engine module: file selection, file I/O, record building and the CLI front end.

pub mod arg_parser;
pub mod cli;
pub mod file_io;
pub mod ledger;
pub mod matcher;
pub mod record_builder;
pub mod scanner;

// Re-export commonly used items
pub use arg_parser::{Cli, Commands, PubArgs, SubArgs};
pub use cli::{handle_run, publish_schema};
pub use file_io::{read_payload, write_payload};
pub use ledger::ProcessedLedger;
pub use matcher::PathMatcher;
pub use record_builder::{BatchOpts, RecordBuilder, RecordLayout};
pub use scanner::{candidate_path, scan};

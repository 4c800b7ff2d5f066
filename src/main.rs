//! Filebridge CLI: `pub` publishes a directory as JSON lines, `sub` writes JSON lines to files.

use anyhow::Result;
use clap::Parser;
use filebridge::engine::arg_parser::Cli;
use filebridge::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}

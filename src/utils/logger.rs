use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::Write;

/// Crate at debug (verbose) or info; dependencies at warn. `RUST_LOG` still applies on top.
pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_PKG_NAME"), level)
        .format(|buf, record| {
            let name = env!("CARGO_PKG_NAME");
            let thread = std::thread::current();
            // Producer worker lines are tagged so they can be told apart from the main thread.
            let tag = match thread.name() {
                Some(t) if t != "main" => format!("{} {}", name.cyan(), t.dimmed()),
                _ => name.cyan().to_string(),
            };
            let line = match record.level() {
                Level::Error | Level::Warn => {
                    let level_str = match record.level() {
                        Level::Warn => "WARN".yellow(),
                        _ => "ERROR".red(),
                    };
                    let path = record.target().to_string().white();
                    format!("[{} {} {}] {}", tag, level_str, path, record.args())
                }
                Level::Debug | Level::Trace => {
                    format!("[{} {}] {}", tag, "DEBUG".blue(), record.args())
                }
                Level::Info => format!("[{}] {}", tag, record.args()),
            };
            writeln!(buf, "{}", line)
        })
        .init();
}

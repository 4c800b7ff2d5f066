//! Producer loop: scan the directory, pace, read each new file, build and batch records, then
//! repeat or finish according to `repeatcount`.
//!
//! ```text
//! Scanning ──► Draining ──► Repeating ──► Scanning ...
//!    │            │
//!    ▼            ▼
//!  Failed    Finished / Failed
//! ```
//!
//! The loop runs on one worker thread and is the only writer of the ledger, the working list and
//! the frame counter. Files are handled strictly one at a time, in sorted order.

use log::{debug, error, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::Duration;

use crate::engine::file_io::read_payload;
use crate::engine::ledger::ProcessedLedger;
use crate::engine::matcher::PathMatcher;
use crate::engine::record_builder::{BatchOpts, RecordBuilder, RecordLayout};
use crate::engine::scanner::scan;
use crate::error::BridgeResult;
use crate::types::{GroupKind, Opcode};
use crate::utils::config::ProducerConfig;

use super::boundary::GroupSink;
use super::pacing::PacingGate;
use super::stop::StopSignal;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ProducerState {
    Idle = 0,
    Scanning = 1,
    Draining = 2,
    Repeating = 3,
    Finished = 4,
    Failed = 5,
}

impl ProducerState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => ProducerState::Scanning,
            2 => ProducerState::Draining,
            3 => ProducerState::Repeating,
            4 => ProducerState::Finished,
            5 => ProducerState::Failed,
            _ => ProducerState::Idle,
        }
    }

    /// Finished or Failed: the worker has exited or is about to.
    pub fn is_terminal(self) -> bool {
        matches!(self, ProducerState::Finished | ProducerState::Failed)
    }
}

/// Live counters, readable from other threads while the loop runs.
#[derive(Debug, Default)]
pub struct ProducerProgress {
    state: AtomicU8,
    cycles: AtomicU64,
    records: AtomicU64,
    groups: AtomicU64,
    skipped: AtomicU64,
}

impl ProducerProgress {
    pub fn state(&self) -> ProducerState {
        ProducerState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ProducerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Scan cycles started.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Records built (equals the last frame number handed out).
    pub fn records(&self) -> u64 {
        self.records.load(Ordering::Relaxed)
    }

    pub fn groups(&self) -> u64 {
        self.groups.load(Ordering::Relaxed)
    }

    /// Candidates skipped because they could not be opened or read.
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }
}

/// Summary returned when the loop ends without a fatal error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProducerReport {
    pub cycles: u64,
    pub records: u64,
    pub groups: u64,
    pub skipped: u64,
    /// Records left in a partial batch at the end. These were never emitted.
    pub unflushed: usize,
    /// Ended by the stop signal rather than by running out of repeats.
    pub stopped: bool,
}

enum Drain {
    Completed,
    Stopped,
}

pub struct ProducerLoop<S: GroupSink> {
    config: ProducerConfig,
    builder: RecordBuilder,
    ledger: ProcessedLedger,
    pacing: PacingGate,
    sink: S,
    stop: StopSignal,
    progress: Arc<ProducerProgress>,
}

impl<S: GroupSink> ProducerLoop<S> {
    pub fn new(config: ProducerConfig, layout: RecordLayout, sink: S, stop: StopSignal) -> Self {
        let opts = BatchOpts {
            block_size: config.block_size,
            group_kind: GroupKind::from_transactional(config.transactional),
            opcode: if config.publish_with_upsert {
                Opcode::Upsert
            } else {
                Opcode::Insert
            },
        };
        Self {
            pacing: PacingGate::from_rate(config.publish_rate),
            builder: RecordBuilder::new(layout, opts),
            ledger: ProcessedLedger::new(),
            config,
            sink,
            stop,
            progress: Arc::new(ProducerProgress::default()),
        }
    }

    pub fn progress(&self) -> Arc<ProducerProgress> {
        Arc::clone(&self.progress)
    }

    pub fn ledger(&self) -> &ProcessedLedger {
        &self.ledger
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Run cycles until the repeat count is used up, the stop signal fires, or a fatal error.
    pub fn run(&mut self) -> BridgeResult<ProducerReport> {
        match self.run_cycles() {
            Ok(stopped) => {
                self.progress.set_state(ProducerState::Finished);
                let report = self.report(stopped);
                if report.unflushed > 0 {
                    warn!(
                        "{} records in a partial block of {} were not published",
                        report.unflushed, self.config.block_size
                    );
                }
                info!(
                    "producer finished: {} cycles, {} records, {} groups{}",
                    report.cycles,
                    report.records,
                    report.groups,
                    if stopped { " (stopped)" } else { "" }
                );
                Ok(report)
            }
            Err(err) => {
                self.progress.set_state(ProducerState::Failed);
                error!("producer failed: {}", err);
                Err(err)
            }
        }
    }

    /// Returns whether the loop ended because of the stop signal.
    fn run_cycles(&mut self) -> BridgeResult<bool> {
        self.progress.set_state(ProducerState::Scanning);
        let matcher = PathMatcher::compile(&self.config.filename_rgx)?;
        let rescan_delay = Duration::from_millis(self.config.rescan_delay_ms);
        let mut remaining = self.config.repeat_count;
        self.pacing.arm();

        loop {
            self.progress.set_state(ProducerState::Scanning);
            self.progress.cycles.fetch_add(1, Ordering::Relaxed);
            let files = scan(&self.config.path, &matcher, &self.ledger)?;
            info!(
                "publishing {} files as {} fields",
                files.len(),
                self.builder.layout().payload.label()
            );

            self.progress.set_state(ProducerState::Draining);
            if let Drain::Stopped = self.drain(&files)? {
                return Ok(true);
            }

            if self.stop.is_stopped() {
                return Ok(true);
            }
            if remaining == 0 {
                return Ok(false);
            }
            if remaining > 0 {
                remaining -= 1;
            }
            self.progress.set_state(ProducerState::Repeating);
            if self.stop.wait_timeout(rescan_delay) {
                return Ok(true);
            }
        }
    }

    fn drain(&mut self, files: &[String]) -> BridgeResult<Drain> {
        let payload_kind = self.builder.layout().payload;
        for path in files {
            if self.stop.is_stopped() || !self.pacing.admit(&self.stop) {
                debug!("stop requested; leaving cycle before {}", path);
                return Ok(Drain::Stopped);
            }
            let payload = match read_payload(path, payload_kind) {
                Ok(payload) => payload,
                Err(err) if err.is_recoverable() => {
                    warn!("{}; skipping", err);
                    self.progress.skipped.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
                Err(err) => return Err(err),
            };
            let emitted = self
                .builder
                .publish(payload, Some(path.as_str()), &mut self.sink)?;
            self.ledger.insert(path);
            self.progress
                .records
                .store(self.builder.records_built(), Ordering::Relaxed);
            if emitted.is_some() {
                self.progress.groups.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(Drain::Completed)
    }

    fn report(&self, stopped: bool) -> ProducerReport {
        ProducerReport {
            cycles: self.progress.cycles(),
            records: self.builder.records_built(),
            groups: self.builder.groups_emitted(),
            skipped: self.progress.skipped(),
            unflushed: self.builder.pending(),
            stopped,
        }
    }
}

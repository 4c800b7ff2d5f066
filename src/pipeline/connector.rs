//! Connector lifecycle: validate config, negotiate the layout when the schema arrives, spawn and
//! join the producer worker, and expose the boundary calls.

use log::{debug, error, info};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::engine::record_builder::RecordLayout;
use crate::error::{BridgeError, BridgeResult, FailureKind};
use crate::types::{RecordGroup, Schema};
use crate::utils::config::{ConsumerConfig, PackagePaths, ProducerConfig};

use super::boundary::GroupSink;
use super::consumer::{ConsumeStats, ConsumerLayout, ConsumerSink, OutputTemplate};
use super::producer::{ProducerLoop, ProducerProgress, ProducerReport, ProducerState};
use super::stop::StopSignal;

/// Receives `(kind, code)` for every terminal failure a connector reports.
pub type ErrorObserver = Arc<dyn Fn(FailureKind, u32) + Send + Sync>;

/// Last failure plus the optional observer; shared with the producer worker.
#[derive(Clone, Default)]
struct FailureReporter {
    last: Arc<Mutex<Option<FailureKind>>>,
    observer: Option<ErrorObserver>,
}

impl FailureReporter {
    fn report(&self, kind: FailureKind, code: u32) {
        if let Ok(mut last) = self.last.lock() {
            *last = Some(kind);
        }
        if let Some(observer) = &self.observer {
            observer(kind, code);
        }
    }

    fn report_error(&self, err: &BridgeError) {
        self.report(err.failure_kind(), err.code());
    }

    fn last(&self) -> Option<FailureKind> {
        self.last.lock().ok().and_then(|last| *last)
    }
}

type Worker = JoinHandle<BridgeResult<ProducerReport>>;

/// Directory → pipeline connector. Owns one producer worker for its whole life.
pub struct ProducerConnector {
    config: ProducerConfig,
    layout: Option<RecordLayout>,
    stop: StopSignal,
    progress: Option<Arc<ProducerProgress>>,
    worker: Option<Worker>,
    started: bool,
    failures: FailureReporter,
}

impl ProducerConnector {
    pub fn new(config: ProducerConfig) -> BridgeResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            layout: None,
            stop: StopSignal::new(),
            progress: None,
            worker: None,
            started: false,
            failures: FailureReporter::default(),
        })
    }

    /// Install the observer for terminal failures. Takes effect for workers started afterwards.
    pub fn set_error_observer(&mut self, observer: ErrorObserver) {
        self.failures.observer = Some(observer);
    }

    pub fn config(&self) -> &ProducerConfig {
        &self.config
    }

    /// Negotiate the record layout. Must happen before [`Self::start`].
    pub fn on_schema_ready(&mut self, schema: &Schema) -> BridgeResult<()> {
        if self.started {
            return self.fail(BridgeError::State(
                "schema changed after producer start".to_string(),
            ));
        }
        match RecordLayout::negotiate(schema) {
            Ok(layout) => {
                debug!("producer layout: {:?}", layout);
                self.layout = Some(layout);
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn layout(&self) -> Option<RecordLayout> {
        self.layout
    }

    /// Spawn the worker thread. Fails if the schema is not negotiated or the connector already ran.
    pub fn start<S: GroupSink + 'static>(&mut self, sink: S) -> BridgeResult<()> {
        if self.started {
            return self.fail(BridgeError::State("producer already started".to_string()));
        }
        let Some(layout) = self.layout else {
            return self.fail(BridgeError::State("schema not ready".to_string()));
        };

        let mut producer = ProducerLoop::new(self.config.clone(), layout, sink, self.stop.clone());
        self.progress = Some(producer.progress());
        let failures = self.failures.clone();
        let spawned = thread::Builder::new()
            .name(PackagePaths::get().worker_thread_name().to_string())
            .spawn(move || {
                let result = producer.run();
                if let Err(err) = &result {
                    failures.report_error(err);
                }
                result
            });
        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                self.started = true;
                info!(
                    "producer started on {} ({})",
                    self.config.path, self.config.filename_rgx
                );
                Ok(())
            }
            Err(e) => self.fail(BridgeError::State(format!(
                "failed to spawn producer worker: {e}"
            ))),
        }
    }

    /// Clone of the stop signal, e.g. for a Ctrl+C handler.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn progress(&self) -> Option<Arc<ProducerProgress>> {
        self.progress.clone()
    }

    pub fn state(&self) -> ProducerState {
        self.progress
            .as_ref()
            .map_or(ProducerState::Idle, |p| p.state())
    }

    /// Stop requested, or the worker reached Finished / Failed.
    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped() || self.state().is_terminal()
    }

    /// Block until the worker exits on its own. `Ok(None)` when no worker is running.
    pub fn wait(&mut self) -> BridgeResult<Option<ProducerReport>> {
        let Some(handle) = self.worker.take() else {
            return Ok(None);
        };
        match handle.join() {
            Ok(result) => result.map(Some),
            Err(_) => self.fail(BridgeError::State("producer worker panicked".to_string())),
        }
    }

    /// Set the stop signal and join the worker. No I/O or emission happens after this returns.
    pub fn stop(&mut self) -> BridgeResult<Option<ProducerReport>> {
        self.stop.stop();
        self.wait()
    }

    /// Failure reported by the pipeline side: logged and forwarded to the observer.
    pub fn on_error(&self, kind: FailureKind, code: u32) {
        error!("pipeline reported {:?} failure (code {})", kind, code);
        self.failures.report(kind, code);
    }

    pub fn last_failure(&self) -> Option<FailureKind> {
        self.failures.last()
    }

    fn fail<T>(&self, err: BridgeError) -> BridgeResult<T> {
        error!("{}", err);
        self.failures.report_error(&err);
        Err(err)
    }
}

impl Drop for ProducerConnector {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.stop();
        }
    }
}

/// Pipeline → directory connector. Groups are delivered sequentially through `&mut self`.
pub struct ConsumerConnector {
    config: ConsumerConfig,
    sink: Option<ConsumerSink>,
    totals: ConsumeStats,
    failures: FailureReporter,
}

impl ConsumerConnector {
    pub fn new(config: ConsumerConfig) -> BridgeResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            sink: None,
            totals: ConsumeStats::default(),
            failures: FailureReporter::default(),
        })
    }

    pub fn set_error_observer(&mut self, observer: ErrorObserver) {
        self.failures.observer = Some(observer);
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    /// Locate the payload field and split the output template. The frame counter starts at 1.
    pub fn on_schema_ready(&mut self, schema: &Schema) -> BridgeResult<()> {
        if self.sink.is_some() {
            return self.fail(BridgeError::State(
                "schema already negotiated for this consumer".to_string(),
            ));
        }
        let layout = match ConsumerLayout::negotiate(schema, &self.config.data_field_name) {
            Ok(layout) => layout,
            Err(err) => return self.fail(err),
        };
        let template = OutputTemplate::parse(&self.config.filename);
        debug!(
            "consumer writes {}<n>{} from field {} ({})",
            template.stem(),
            template.extension(),
            layout.field_index,
            layout.payload.label()
        );
        self.sink = Some(ConsumerSink::new(template, layout));
        Ok(())
    }

    pub fn on_record_group(&mut self, group: &RecordGroup) -> BridgeResult<ConsumeStats> {
        let Some(sink) = self.sink.as_mut() else {
            return self.fail(BridgeError::State("schema not ready".to_string()));
        };
        let stats = sink.consume(group);
        self.totals += stats;
        Ok(stats)
    }

    /// Counts across every group consumed so far.
    pub fn totals(&self) -> ConsumeStats {
        self.totals
    }

    /// Frame number of the next file, or None before the schema is negotiated.
    pub fn next_frame(&self) -> Option<i64> {
        self.sink.as_ref().map(ConsumerSink::next_frame)
    }

    pub fn on_error(&self, kind: FailureKind, code: u32) {
        error!("pipeline reported {:?} failure (code {})", kind, code);
        self.failures.report(kind, code);
    }

    pub fn last_failure(&self) -> Option<FailureKind> {
        self.failures.last()
    }

    fn fail<T>(&self, err: BridgeError) -> BridgeResult<T> {
        error!("{}", err);
        self.failures.report_error(&err);
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, FieldKind};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn binary_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", FieldKind::Int64),
            Field::new("data", FieldKind::Binary),
        ])
    }

    #[test]
    fn start_before_schema_is_state_error() {
        let mut conn = ProducerConnector::new(ProducerConfig::new("/nowhere", ".*")).unwrap();
        let seen = Arc::new(AtomicU32::new(0));
        let seen2 = Arc::clone(&seen);
        conn.set_error_observer(Arc::new(move |_, code| seen2.store(code, Ordering::SeqCst)));

        let err = conn.start(|_g: RecordGroup| -> anyhow::Result<()> { Ok(()) }).unwrap_err();
        assert!(matches!(err, BridgeError::State(_)));
        assert_eq!(conn.last_failure(), Some(FailureKind::State));
        assert_eq!(seen.load(Ordering::SeqCst), FailureKind::State.code());
        assert_eq!(conn.state(), ProducerState::Idle);
    }

    #[test]
    fn consumer_group_before_schema_is_state_error() {
        let mut conn = ConsumerConnector::new(ConsumerConfig::new("/tmp/out.bin", "data")).unwrap();
        let err = conn.on_record_group(&RecordGroup::default()).unwrap_err();
        assert!(matches!(err, BridgeError::State(_)));
        assert!(conn.next_frame().is_none());
        conn.on_schema_ready(&binary_schema()).unwrap();
        assert_eq!(conn.next_frame(), Some(1));
    }

    #[test]
    fn on_error_forwards_to_observer() {
        let conn_cfg = ConsumerConfig::new("/tmp/out.bin", "data");
        let mut conn = ConsumerConnector::new(conn_cfg).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = Arc::clone(&seen);
        conn.set_error_observer(Arc::new(move |kind, code| {
            seen2.lock().unwrap().push((kind, code));
        }));
        conn.on_error(FailureKind::Emission, 42);
        assert_eq!(*seen.lock().unwrap(), vec![(FailureKind::Emission, 42)]);
        assert_eq!(conn.last_failure(), Some(FailureKind::Emission));
    }
}

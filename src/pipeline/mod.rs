//! Pipeline components: boundary seam, stop signal, pacing, producer loop, consumer sink and the
//! connector lifecycle around them.

pub mod boundary;
pub mod connector;
pub mod consumer;
pub mod pacing;
pub mod producer;
pub mod stop;

pub use boundary::{
    ChannelSink, GroupSink, JsonLinesSink, WireMessage, channel_boundary, read_wire_messages,
};
pub use connector::{ConsumerConnector, ErrorObserver, ProducerConnector};
pub use consumer::{ConsumeStats, ConsumerLayout, ConsumerSink, OutputTemplate};
pub use pacing::PacingGate;
pub use producer::{ProducerLoop, ProducerProgress, ProducerReport, ProducerState};
pub use stop::StopSignal;

//! Pipeline boundary: where record groups leave the producer and enter the consumer.
//!
//! [`GroupSink`] is the outbound seam. Two in-process implementations ship with the crate: a
//! crossbeam channel (library use, tests) and a JSON-lines writer (the CLI). The JSON-lines
//! stream is a schema message followed by group messages; [`read_wire_messages`] decodes it.

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender, bounded};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

use crate::types::{RecordGroup, Schema};

/// Receives groups from the producer. An `Err` is fatal for the producer; it is never retried.
pub trait GroupSink: Send {
    fn inject_group(&mut self, group: RecordGroup) -> Result<()>;
}

impl<F> GroupSink for F
where
    F: FnMut(RecordGroup) -> Result<()> + Send,
{
    fn inject_group(&mut self, group: RecordGroup) -> Result<()> {
        self(group)
    }
}

/// Sends each group over a crossbeam channel.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: Sender<RecordGroup>,
}

impl GroupSink for ChannelSink {
    fn inject_group(&mut self, group: RecordGroup) -> Result<()> {
        self.tx
            .send(group)
            .map_err(|_| anyhow::anyhow!("group receiver disconnected"))
    }
}

/// Bounded channel boundary. Dropping the receiver makes further injections fail.
pub fn channel_boundary(cap: usize) -> (ChannelSink, Receiver<RecordGroup>) {
    let (tx, rx) = bounded(cap);
    (ChannelSink { tx }, rx)
}

/// One line of the JSON-lines wire format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WireMessage {
    Schema { schema: Schema },
    Group { group: RecordGroup },
}

/// Writes groups as JSON lines, flushing after each so a downstream reader sees them promptly.
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Create the sink and write the schema message that opens the stream.
    pub fn new(writer: W, schema: &Schema) -> Result<Self> {
        let mut sink = Self { writer };
        sink.write_message(&WireMessage::Schema {
            schema: schema.clone(),
        })?;
        Ok(sink)
    }

    fn write_message(&mut self, msg: &WireMessage) -> Result<()> {
        serde_json::to_writer(&mut self.writer, msg).context("encode wire message")?;
        self.writer.write_all(b"\n").context("write wire message")?;
        self.writer.flush().context("flush wire message")
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> GroupSink for JsonLinesSink<W> {
    fn inject_group(&mut self, group: RecordGroup) -> Result<()> {
        self.write_message(&WireMessage::Group { group })
    }
}

/// Decode a JSON-lines stream. Blank lines are ignored.
pub fn read_wire_messages<R: BufRead>(reader: R) -> impl Iterator<Item = Result<WireMessage>> {
    reader
        .lines()
        .enumerate()
        .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
        .map(|(i, line)| {
            let line = line.with_context(|| format!("read line {}", i + 1))?;
            serde_json::from_str(&line).with_context(|| format!("decode line {}", i + 1))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, FieldKind, GroupKind, Opcode, Record, Value};

    #[test]
    fn json_lines_stream_decodes_in_order() {
        let schema = Schema::new(vec![
            Field::new("id", FieldKind::Int64),
            Field::new("data", FieldKind::Binary),
        ]);
        let group = RecordGroup::new(
            GroupKind::Transactional,
            vec![Record::new(
                Opcode::Insert,
                vec![Value::Int64(1), Value::Binary(vec![0, 159, 255])],
            )],
        );
        let mut sink = JsonLinesSink::new(Vec::new(), &schema).unwrap();
        sink.inject_group(group.clone()).unwrap();
        let bytes = sink.into_inner();

        let msgs: Vec<WireMessage> = read_wire_messages(bytes.as_slice())
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(
            msgs,
            vec![WireMessage::Schema { schema }, WireMessage::Group { group }]
        );
    }

    #[test]
    fn closed_channel_rejects_group() {
        let (mut sink, rx) = channel_boundary(1);
        drop(rx);
        assert!(sink.inject_group(RecordGroup::default()).is_err());
    }
}

//! Record construction and block batching for the producer.

use log::debug;

use crate::error::{BridgeError, BridgeResult};
use crate::pipeline::boundary::GroupSink;
use crate::types::{
    FieldKind, GroupKind, Opcode, Payload, PayloadKind, Record, RecordGroup, Schema, Value,
};

/// Producer-side record layout accepted from the pipeline schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordLayout {
    pub payload: PayloadKind,
    /// Third field present: records carry the source file path.
    pub with_source_path: bool,
}

impl RecordLayout {
    /// Accept 2 or 3 fields: int64 id, binary-or-text payload, optional utf8 path.
    pub fn negotiate(schema: &Schema) -> BridgeResult<Self> {
        let reject = || {
            BridgeError::Schema(
                "source schema must have 2 or 3 fields of type int64/blob, int64/string, \
                 int64/rstring, int64/blob/string, int64/string/string or int64/rstring/string"
                    .to_string(),
            )
        };
        if !(2..=3).contains(&schema.len()) || schema.kind_at(0) != Some(FieldKind::Int64) {
            return Err(reject());
        }
        let payload = schema
            .kind_at(1)
            .and_then(FieldKind::payload_kind)
            .ok_or_else(reject)?;
        let with_source_path = schema.len() == 3;
        if with_source_path && schema.kind_at(2) != Some(FieldKind::Utf8Str) {
            return Err(reject());
        }
        Ok(Self {
            payload,
            with_source_path,
        })
    }
}

/// Batching options fixed for the life of a producer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchOpts {
    pub block_size: usize,
    pub group_kind: GroupKind,
    pub opcode: Opcode,
}

impl Default for BatchOpts {
    fn default() -> Self {
        Self {
            block_size: 1,
            group_kind: GroupKind::Normal,
            opcode: Opcode::Insert,
        }
    }
}

/// Builds numbered records and emits them in groups of `block_size`.
///
/// Frame numbers start at 1 and advance once per built record; they are never reset. A batch
/// that never fills is not flushed; [`RecordBuilder::pending`] reports its size.
#[derive(Debug)]
pub struct RecordBuilder {
    layout: RecordLayout,
    opts: BatchOpts,
    batch: Vec<Record>,
    next_frame: i64,
    groups_emitted: u64,
}

impl RecordBuilder {
    pub fn new(layout: RecordLayout, opts: BatchOpts) -> Self {
        let block_size = opts.block_size.max(1);
        Self {
            layout,
            opts: BatchOpts { block_size, ..opts },
            batch: Vec::with_capacity(block_size),
            next_frame: 1,
            groups_emitted: 0,
        }
    }

    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    /// Frame number the next built record will carry.
    pub fn next_frame(&self) -> i64 {
        self.next_frame
    }

    pub fn records_built(&self) -> u64 {
        (self.next_frame - 1) as u64
    }

    pub fn groups_emitted(&self) -> u64 {
        self.groups_emitted
    }

    /// Records waiting for the batch to fill.
    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    /// Build the record for one file. `source` is ignored unless the layout has a path field.
    pub fn build(&mut self, payload: Payload, source: Option<&str>) -> Record {
        let mut values = Vec::with_capacity(3);
        values.push(Value::Int64(self.next_frame));
        values.push(payload.into());
        if self.layout.with_source_path {
            values.push(source.map_or(Value::Null, |s| Value::Text(s.to_string())));
        }
        self.next_frame += 1;
        Record::new(self.opts.opcode, values)
    }

    /// Append to the batch; when it reaches `block_size`, inject it as one group.
    /// Returns the emitted group size, if any.
    pub fn append(
        &mut self,
        record: Record,
        sink: &mut dyn GroupSink,
    ) -> BridgeResult<Option<usize>> {
        self.batch.push(record);
        if self.batch.len() < self.opts.block_size {
            return Ok(None);
        }
        let records = std::mem::replace(&mut self.batch, Vec::with_capacity(self.opts.block_size));
        let size = records.len();
        sink.inject_group(RecordGroup::new(self.opts.group_kind, records))
            .map_err(|err| BridgeError::Emission {
                records: size,
                reason: format!("{err:#}"),
            })?;
        self.groups_emitted += 1;
        debug!("injected group of {} records ({:?})", size, self.opts.group_kind);
        Ok(Some(size))
    }

    /// [`Self::build`] then [`Self::append`].
    pub fn publish(
        &mut self,
        payload: Payload,
        source: Option<&str>,
        sink: &mut dyn GroupSink,
    ) -> BridgeResult<Option<usize>> {
        let record = self.build(payload, source);
        self.append(record, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;

    fn schema(kinds: &[FieldKind]) -> Schema {
        Schema::new(
            kinds
                .iter()
                .enumerate()
                .map(|(i, k)| Field::new(format!("f{i}"), *k))
                .collect(),
        )
    }

    #[test]
    fn negotiate_accepts_supported_layouts() {
        let l = RecordLayout::negotiate(&schema(&[FieldKind::Int64, FieldKind::Binary])).unwrap();
        assert_eq!(l.payload, PayloadKind::Binary);
        assert!(!l.with_source_path);

        let l = RecordLayout::negotiate(&schema(&[
            FieldKind::Int64,
            FieldKind::RUtf8Str,
            FieldKind::Utf8Str,
        ]))
        .unwrap();
        assert_eq!(l.payload, PayloadKind::Text);
        assert!(l.with_source_path);
    }

    #[test]
    fn negotiate_rejects_bad_layouts() {
        for kinds in [
            vec![FieldKind::Int64],
            vec![FieldKind::Int32, FieldKind::Binary],
            vec![FieldKind::Int64, FieldKind::Double],
            vec![FieldKind::Int64, FieldKind::Binary, FieldKind::Binary],
            vec![
                FieldKind::Int64,
                FieldKind::Binary,
                FieldKind::Utf8Str,
                FieldKind::Utf8Str,
            ],
        ] {
            let err = RecordLayout::negotiate(&schema(&kinds)).unwrap_err();
            assert!(matches!(err, BridgeError::Schema(_)), "{kinds:?}");
        }
    }

    #[test]
    fn groups_emitted_every_block_size_records() {
        let layout = RecordLayout {
            payload: PayloadKind::Text,
            with_source_path: true,
        };
        let opts = BatchOpts {
            block_size: 3,
            group_kind: GroupKind::Transactional,
            opcode: Opcode::Upsert,
        };
        let mut builder = RecordBuilder::new(layout, opts);
        let mut groups: Vec<RecordGroup> = Vec::new();
        let mut sink = |g: RecordGroup| -> anyhow::Result<()> {
            groups.push(g);
            Ok(())
        };
        let mut emitted = Vec::new();
        for i in 0..7 {
            emitted.push(
                builder
                    .publish(Payload::Text(format!("p{i}")), Some("/in/x"), &mut sink)
                    .unwrap(),
            );
        }
        assert_eq!(
            emitted,
            vec![None, None, Some(3), None, None, Some(3), None]
        );
        assert_eq!(builder.pending(), 1);
        assert_eq!(builder.records_built(), 7);
        assert_eq!(builder.groups_emitted(), 2);
        drop(sink);

        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.kind == GroupKind::Transactional));
        let frames: Vec<i64> = groups
            .iter()
            .flat_map(|g| g.records.iter().filter_map(Record::frame_number))
            .collect();
        assert_eq!(frames, vec![1, 2, 3, 4, 5, 6]);
        let first = &groups[0].records[0];
        assert_eq!(first.opcode, Opcode::Upsert);
        assert_eq!(first.get(2), Some(&Value::Text("/in/x".into())));
    }

    #[test]
    fn rejected_group_is_emission_error_and_batch_cleared() {
        let layout = RecordLayout {
            payload: PayloadKind::Binary,
            with_source_path: false,
        };
        let mut builder = RecordBuilder::new(layout, BatchOpts::default());
        let mut sink = |_g: RecordGroup| -> anyhow::Result<()> { anyhow::bail!("window closed") };
        let err = builder
            .publish(Payload::Binary(vec![1]), None, &mut sink)
            .unwrap_err();
        match err {
            BridgeError::Emission { records, reason } => {
                assert_eq!(records, 1);
                assert!(reason.contains("window closed"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(builder.pending(), 0);
    }
}

//! Record, group and schema types exchanged with the pipeline boundary.

use serde::{Deserialize, Serialize};

/// Field types a pipeline schema can declare. Only a few are meaningful to the bridge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Int32,
    Int64,
    Double,
    Binary,
    Utf8Str,
    /// Reference-counted string; carries text like [`FieldKind::Utf8Str`].
    RUtf8Str,
    Date,
    Timestamp,
}

impl FieldKind {
    pub fn is_text(self) -> bool {
        matches!(self, FieldKind::Utf8Str | FieldKind::RUtf8Str)
    }

    /// Payload kind carried by a field of this type, or `None` if it cannot hold file content.
    pub fn payload_kind(self) -> Option<PayloadKind> {
        match self {
            FieldKind::Binary => Some(PayloadKind::Binary),
            k if k.is_text() => Some(PayloadKind::Text),
            _ => None,
        }
    }
}

/// One named, typed column of a [`Schema`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Ordered field layout negotiated with the pipeline.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn kind_at(&self, index: usize) -> Option<FieldKind> {
        self.fields.get(index).map(|f| f.kind)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// Whether file content travels as raw bytes or as a string. Fixed once per connector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadKind {
    Binary,
    Text,
}

impl PayloadKind {
    pub fn label(self) -> &'static str {
        match self {
            PayloadKind::Binary => "binary",
            PayloadKind::Text => "string",
        }
    }
}

/// Content read from one file, ready to become field 1 of a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Binary(Vec<u8>),
    Text(String),
}

impl Payload {
    pub fn len(&self) -> usize {
        match self {
            Payload::Binary(b) => b.len(),
            Payload::Text(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Payload> for Value {
    fn from(p: Payload) -> Self {
        match p {
            Payload::Binary(b) => Value::Binary(b),
            Payload::Text(s) => Value::Text(s),
        }
    }
}

/// A single field value. The bridge only builds and reads these variants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    Null,
    Int64(i64),
    Binary(Vec<u8>),
    Text(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int64(_) => "int64",
            Value::Binary(_) => "binary",
            Value::Text(_) => "string",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Opcode {
    #[default]
    Insert,
    Upsert,
}

/// One positional record: field 0 frame number, field 1 payload, optional field 2 source path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub opcode: Opcode,
    pub values: Vec<Value>,
}

impl Record {
    pub fn new(opcode: Opcode, values: Vec<Value>) -> Self {
        Self { opcode, values }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Field 0 when it holds an int64.
    pub fn frame_number(&self) -> Option<i64> {
        match self.values.first() {
            Some(Value::Int64(n)) => Some(*n),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    #[default]
    Normal,
    Transactional,
}

impl GroupKind {
    pub fn from_transactional(transactional: bool) -> Self {
        if transactional {
            GroupKind::Transactional
        } else {
            GroupKind::Normal
        }
    }
}

/// Envelope of records handed to (or received from) the pipeline in one call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordGroup {
    #[serde(default)]
    pub kind: GroupKind,
    pub records: Vec<Record>,
}

impl RecordGroup {
    pub fn new(kind: GroupKind, records: Vec<Record>) -> Self {
        Self { kind, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

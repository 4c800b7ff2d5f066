//! Consumer sink: write each received payload to a freshly numbered file.

use log::{debug, error, warn};
use std::path::PathBuf;

use crate::engine::file_io::write_payload;
use crate::error::{BridgeError, BridgeResult};
use crate::types::{PayloadKind, RecordGroup, Schema, Value};

/// Output filename split once into stem and extension; files are `stem + frame + extension`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputTemplate {
    stem: String,
    extension: String,
}

impl OutputTemplate {
    /// Split at the last `.` of the final path component. `out/frame.jpg` gives
    /// `out/frame` + `.jpg`; `./out/frame` has no extension.
    pub fn parse(filename: &str) -> Self {
        let name_start = filename.rfind(['/', '\\']).map_or(0, |i| i + 1);
        match filename[name_start..].rfind('.') {
            Some(dot) => {
                let (stem, extension) = filename.split_at(name_start + dot);
                Self {
                    stem: stem.to_string(),
                    extension: extension.to_string(),
                }
            }
            None => Self {
                stem: filename.to_string(),
                extension: String::new(),
            },
        }
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn path_for(&self, frame: i64) -> PathBuf {
        PathBuf::from(format!("{}{}{}", self.stem, frame, self.extension))
    }
}

/// Consumer-side layout: which field holds the payload and what kind it is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsumerLayout {
    pub field_index: usize,
    pub payload: PayloadKind,
}

impl ConsumerLayout {
    pub fn negotiate(schema: &Schema, field_name: &str) -> BridgeResult<Self> {
        let field_index = schema.index_of(field_name).ok_or_else(|| {
            BridgeError::Schema(format!("datafieldname '{field_name}' not found in schema"))
        })?;
        let payload = schema
            .kind_at(field_index)
            .and_then(|k| k.payload_kind())
            .ok_or_else(|| {
                BridgeError::Schema(format!(
                    "datafieldname '{field_name}' must be a binary or string field"
                ))
            })?;
        Ok(Self {
            field_index,
            payload,
        })
    }
}

/// Per-call (or cumulative) consumer counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConsumeStats {
    pub written: usize,
    /// Records with a null or wrongly typed payload; the frame counter did not move.
    pub skipped: usize,
    /// Records whose destination could not be created or written; the frame counter moved.
    pub failed: usize,
}

impl std::ops::AddAssign for ConsumeStats {
    fn add_assign(&mut self, rhs: Self) {
        self.written += rhs.written;
        self.skipped += rhs.skipped;
        self.failed += rhs.failed;
    }
}

#[derive(Debug)]
pub struct ConsumerSink {
    template: OutputTemplate,
    layout: ConsumerLayout,
    next_frame: i64,
}

impl ConsumerSink {
    pub fn new(template: OutputTemplate, layout: ConsumerLayout) -> Self {
        Self {
            template,
            layout,
            next_frame: 1,
        }
    }

    /// Frame number the next written file will carry.
    pub fn next_frame(&self) -> i64 {
        self.next_frame
    }

    pub fn template(&self) -> &OutputTemplate {
        &self.template
    }

    /// Write every non-null payload in `group`. File errors are logged, never returned.
    pub fn consume(&mut self, group: &RecordGroup) -> ConsumeStats {
        let mut stats = ConsumeStats::default();
        for record in &group.records {
            let bytes = match (record.get(self.layout.field_index), self.layout.payload) {
                (None | Some(Value::Null), _) => {
                    debug!("null payload; record skipped");
                    stats.skipped += 1;
                    continue;
                }
                (Some(Value::Binary(b)), PayloadKind::Binary) => b.as_slice(),
                (Some(Value::Text(s)), PayloadKind::Text) => s.as_bytes(),
                (Some(other), kind) => {
                    warn!(
                        "payload field holds {}, expected {}; record skipped",
                        other.type_name(),
                        kind.label()
                    );
                    stats.skipped += 1;
                    continue;
                }
            };
            let path = self.template.path_for(self.next_frame);
            match write_payload(&path, bytes) {
                Ok(()) => stats.written += 1,
                Err(err) => {
                    error!("Unable to create file {}: {}", path.display(), err);
                    stats.failed += 1;
                }
            }
            self.next_frame += 1;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_split_at_last_dot_of_name() {
        let t = OutputTemplate::parse("/out/frame.v2.jpg");
        assert_eq!(t.stem(), "/out/frame.v2");
        assert_eq!(t.extension(), ".jpg");
        assert_eq!(t.path_for(7), PathBuf::from("/out/frame.v27.jpg"));

        let t = OutputTemplate::parse("./out.d/frame");
        assert_eq!(t.stem(), "./out.d/frame");
        assert_eq!(t.extension(), "");
        assert_eq!(t.path_for(1), PathBuf::from("./out.d/frame1"));
    }
}

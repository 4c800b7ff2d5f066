//! Whole-file reads for the producer and whole-payload writes for the consumer.

use log::{debug, warn};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::error::{BridgeError, BridgeResult};
use crate::types::{Payload, PayloadKind};

/// Read the whole file at `path` as `kind`.
///
/// Open and read failures are [`BridgeError::FileOpen`] (the caller skips the file). Failing to
/// reserve a buffer for the file size is [`BridgeError::Allocation`].
pub fn read_payload(path: &str, kind: PayloadKind) -> BridgeResult<Payload> {
    let open_error = |source: io::Error| BridgeError::FileOpen {
        path: path.to_string(),
        source,
    };
    let mut file = File::open(path).map_err(open_error)?;
    let size = file.metadata().map_err(open_error)?.len();

    let alloc_error = || BridgeError::Allocation {
        path: path.to_string(),
        size,
    };
    let capacity = usize::try_from(size).map_err(|_| alloc_error())?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(capacity).map_err(|_| alloc_error())?;
    file.read_to_end(&mut buf).map_err(open_error)?;
    debug!("read {} bytes from {}", buf.len(), path);

    Ok(match kind {
        PayloadKind::Binary => Payload::Binary(buf),
        PayloadKind::Text => match String::from_utf8(buf) {
            Ok(s) => Payload::Text(s),
            Err(err) => {
                warn!("{} is not valid UTF-8; replacing invalid sequences", path);
                Payload::Text(String::from_utf8_lossy(err.as_bytes()).into_owned())
            }
        },
    })
}

/// Create (or truncate) `path` and write `bytes` to it.
pub fn write_payload(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.flush()
}

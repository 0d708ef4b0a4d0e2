//! Replaying adapters: answer port calls from a recorded cassette.

pub mod catalog;
pub mod filesystem;

pub use catalog::ReplayingCatalog;
pub use filesystem::ReplayingFileSystem;

use std::io;
use std::sync::{Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cassette::replayer::CassetteReplayer;

/// Takes the output of the next recorded `port`/`method` call.
///
/// # Panics
///
/// Panics when the cassette has no further interaction for the call.
pub(crate) fn next_output(replayer: &Mutex<CassetteReplayer>, port: &str, method: &str) -> Value {
    let mut guard = replayer.lock().unwrap_or_else(PoisonError::into_inner);
    guard.next_interaction(port, method).output.clone()
}

/// Deserializes a plain recorded value.
///
/// # Panics
///
/// Panics when the recording does not have the expected shape.
pub(crate) fn decode<T: DeserializeOwned>(output: Value, context: &str) -> T {
    serde_json::from_value(output)
        .unwrap_or_else(|e| panic!("{context}: cassette output has the wrong shape: {e}"))
}

/// Rebuilds an I/O error from its recorded kind and message.
pub(crate) fn decode_io_error(recorded: &Value) -> io::Error {
    let message = recorded.get("message").and_then(Value::as_str).unwrap_or("replayed error");
    let kind = match recorded.get("kind").and_then(Value::as_str).unwrap_or_default() {
        "NotFound" => io::ErrorKind::NotFound,
        "PermissionDenied" => io::ErrorKind::PermissionDenied,
        "AlreadyExists" => io::ErrorKind::AlreadyExists,
        "CrossesDevices" => io::ErrorKind::CrossesDevices,
        "NotADirectory" => io::ErrorKind::NotADirectory,
        "IsADirectory" => io::ErrorKind::IsADirectory,
        "DirectoryNotEmpty" => io::ErrorKind::DirectoryNotEmpty,
        "InvalidInput" => io::ErrorKind::InvalidInput,
        "Unsupported" => io::ErrorKind::Unsupported,
        _ => io::ErrorKind::Other,
    };
    io::Error::new(kind, message.to_string())
}

/// Reads a recorded `{"ok": value}` or `{"err": {...}}` back into a result.
pub(crate) fn decode_io_result<T: DeserializeOwned>(output: Value, context: &str) -> io::Result<T> {
    if let Some(err) = output.get("err") {
        return Err(decode_io_error(err));
    }
    let value = output.get("ok").cloned().unwrap_or(output);
    serde_json::from_value(value).map_err(|e| {
        io::Error::new(io::ErrorKind::InvalidData, format!("{context}: failed to deserialize: {e}"))
    })
}

//! Recording adapters: delegate to a real port and capture every call.
//!
//! Plain return values are recorded as-is. `io::Result` values use the
//! `{"ok": value}` / `{"err": {"kind": ..., "message": ...}}` convention
//! that [`crate::adapters::replaying`] reads back.

pub mod catalog;
pub mod filesystem;

pub use catalog::RecordingCatalog;
pub use filesystem::RecordingFileSystem;

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde_json::{json, Value};

use crate::cassette::recorder::CassetteRecorder;

fn to_json<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Encodes an I/O error so its kind survives the round trip.
pub(crate) fn encode_io_error(err: &io::Error) -> Value {
    json!({ "kind": format!("{:?}", err.kind()), "message": err.to_string() })
}

pub(crate) fn encode_io_result<T: Serialize>(result: &io::Result<T>) -> Value {
    match result {
        Ok(v) => json!({ "ok": to_json(v) }),
        Err(e) => json!({ "err": encode_io_error(e) }),
    }
}

/// Records a call whose return value is not a `Result`.
pub(crate) fn record_interaction<I, O>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    output: &O,
) where
    I: Serialize,
    O: Serialize + ?Sized,
{
    record_raw(recorder, port, method, to_json(input), to_json(output));
}

/// Records a call returning an `io::Result`.
pub(crate) fn record_result<T, I>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    result: &io::Result<T>,
) where
    T: Serialize,
    I: Serialize,
{
    record_raw(recorder, port, method, to_json(input), encode_io_result(result));
}

pub(crate) fn record_raw(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: Value,
    output: Value,
) {
    let mut guard = recorder.lock().unwrap_or_else(PoisonError::into_inner);
    guard.record(port, method, input, output);
}

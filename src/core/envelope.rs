//! Purpose: Describe the per-call result envelope returned by the native engine.
//! Exports: `RawEnvelope`, `RawError`, `Outcome`, `Failure`, `read_outcome`, `decode_text`.
//! Role: Turn the nullable-field C struct into a sum type right after the call returns.
//! Invariants: Layouts match `{ data, len, error }` and `{ message, code }` in C order.
//! Invariants: An envelope with an error is a failure even if a payload pointer is set.
//! Notes: Text crossing the boundary is UTF-8; error messages are NUL-terminated,
//! payload text ends at the first NUL within `len` bytes or at `len`.
use std::ffi::CStr;

use libc::{c_char, c_int};

use crate::core::error::{Error, ErrorKind};

#[repr(C)]
#[derive(Debug)]
pub struct RawError {
    pub message: *mut c_char,
    pub code: c_int,
}

#[repr(C)]
#[derive(Debug)]
pub struct RawEnvelope {
    pub data: *mut u8,
    pub len: usize,
    pub error: *mut RawError,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Failure {
    pub code: i32,
    /// `None` when the foreign message was null or not valid UTF-8.
    pub message: Option<String>,
}

impl From<Failure> for Error {
    fn from(failure: Failure) -> Self {
        Error::codec(failure.code, failure.message)
    }
}

#[derive(Debug, Eq, PartialEq)]
pub enum Outcome<'a> {
    Payload(&'a [u8]),
    Empty,
    Failed(Failure),
}

/// Reads an envelope into an [`Outcome`] borrowing the foreign payload.
///
/// # Safety
///
/// `raw` must be a live envelope produced by the engine: `data` valid for
/// `len` bytes when non-null, `error` pointing at a live `RawError` when
/// non-null, and that error's `message` NUL-terminated when non-null.
pub unsafe fn read_outcome(raw: &RawEnvelope) -> Outcome<'_> {
    if !raw.error.is_null() {
        let error = unsafe { &*raw.error };
        let message = if error.message.is_null() {
            None
        } else {
            unsafe { CStr::from_ptr(error.message) }
                .to_str()
                .ok()
                .map(str::to_owned)
        };
        return Outcome::Failed(Failure {
            code: error.code,
            message,
        });
    }
    if raw.data.is_null() {
        return Outcome::Empty;
    }
    if raw.len == 0 {
        return Outcome::Payload(&[]);
    }
    Outcome::Payload(unsafe { std::slice::from_raw_parts(raw.data, raw.len) })
}

pub fn decode_text(payload: &[u8]) -> Result<String, Error> {
    let end = payload
        .iter()
        .position(|&byte| byte == 0)
        .unwrap_or(payload.len());
    std::str::from_utf8(&payload[..end])
        .map(str::to_owned)
        .map_err(|err| {
            Error::new(ErrorKind::DecodeFailed)
                .with_message("Failed to decode data")
                .with_source(err)
        })
}

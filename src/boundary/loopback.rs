//! Purpose: In-process stand-in for the QuickCodes engine speaking the same C ABI.
//! Exports: `LoopbackBoundary`, `Fault`.
//! Role: Test double for facade and boundary tests; no dynamic loading involved.
//! Invariants: Envelopes are heap-allocated exactly like the engine does and freed by `engine_free_result`.
//! Invariants: Every handle is tracked; releasing an unknown or already released handle panics.
//! Notes: Payloads are a plain tagged container, not rendered images; the read paths decode only that container.
use std::collections::HashSet;
use std::ffi::{CStr, CString};
use std::path::Path;
use std::ptr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use libc::c_char;

use super::Boundary;
use crate::core::envelope::{RawEnvelope, RawError};
use crate::core::error::{Error, ErrorKind};

const MAGIC: &[u8] = b"QCLOOP1\0";
const ERROR_CODE: i32 = 1;
const PANIC_CODE: i32 = 2;

/// Misbehavior injected in place of a normal engine response.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Fault {
    /// Engine returns a null handle.
    NullHandle,
    /// Envelope with neither payload nor error.
    EmptyEnvelope,
    /// Error whose message is not valid UTF-8.
    UndecodableMessage,
    /// Error with a null message pointer.
    NullMessage,
    /// Successful envelope whose payload is not valid UTF-8 text.
    InvalidTextPayload,
    /// Engine library cannot be resolved.
    Unavailable,
}

#[derive(Debug, Default)]
pub struct LoopbackBoundary {
    fault: Option<Fault>,
    live: Mutex<HashSet<usize>>,
    calls: AtomicUsize,
    issued: AtomicUsize,
    released: AtomicUsize,
}

impl LoopbackBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fault(fault: Fault) -> Self {
        Self {
            fault: Some(fault),
            ..Self::default()
        }
    }

    /// Foreign calls attempted, including ones that produced no handle.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Handles issued and not yet released.
    pub fn live(&self) -> usize {
        self.live
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    fn call(&self, engine: impl FnOnce() -> *mut RawEnvelope) -> Result<*mut RawEnvelope, Error> {
        if self.fault == Some(Fault::Unavailable) {
            return Err(Error::new(ErrorKind::LibraryUnavailable)
                .with_message("loopback engine marked unavailable"));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        let handle = match self.fault {
            None | Some(Fault::Unavailable) => engine(),
            Some(Fault::NullHandle) => ptr::null_mut(),
            Some(Fault::EmptyEnvelope) => into_handle(RawEnvelope {
                data: ptr::null_mut(),
                len: 0,
                error: ptr::null_mut(),
            }),
            Some(Fault::UndecodableMessage) => {
                error_envelope(CString::new(vec![0xffu8, 0xfe]).ok(), 5)
            }
            Some(Fault::NullMessage) => error_envelope(None, 6),
            Some(Fault::InvalidTextPayload) => data_envelope(vec![0xff, 0xfe, 0x00]),
        };
        if !handle.is_null() {
            self.issued.fetch_add(1, Ordering::SeqCst);
            self.live
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .insert(handle as usize);
        }
        Ok(handle)
    }
}

impl Boundary for LoopbackBoundary {
    fn generate(&self, symbology: &CStr, data: &CStr) -> Result<*mut RawEnvelope, Error> {
        self.call(|| unsafe { engine_generate(symbology.as_ptr(), data.as_ptr()) })
    }

    fn generate_to_file(
        &self,
        symbology: &CStr,
        data: &CStr,
        output_path: &CStr,
    ) -> Result<*mut RawEnvelope, Error> {
        self.call(|| unsafe {
            engine_generate_to_file(symbology.as_ptr(), data.as_ptr(), output_path.as_ptr())
        })
    }

    fn read_from_file(&self, path: &CStr) -> Result<*mut RawEnvelope, Error> {
        self.call(|| unsafe { engine_read_from_file(path.as_ptr()) })
    }

    fn read_from_bytes(&self, data: &[u8]) -> Result<*mut RawEnvelope, Error> {
        self.call(|| unsafe { engine_read_from_bytes(data.as_ptr(), data.len()) })
    }

    unsafe fn free_result(&self, envelope: *mut RawEnvelope) {
        let known = self
            .live
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&(envelope as usize));
        assert!(known, "envelope {envelope:p} released twice or never issued");
        self.released.fetch_add(1, Ordering::SeqCst);
        unsafe { engine_free_result(envelope) };
    }
}

unsafe extern "C" fn engine_generate(
    barcode_type: *const c_char,
    data: *const c_char,
) -> *mut RawEnvelope {
    respond(|| {
        let barcode_type = unsafe { read_arg(barcode_type, "barcode type") }?;
        let data = unsafe { read_arg(data, "data") }?;
        render(barcode_type, data)
    })
}

unsafe extern "C" fn engine_generate_to_file(
    barcode_type: *const c_char,
    data: *const c_char,
    output_path: *const c_char,
) -> *mut RawEnvelope {
    respond(|| {
        let barcode_type = unsafe { read_arg(barcode_type, "barcode type") }?;
        let data = unsafe { read_arg(data, "data") }?;
        let output_path = unsafe { read_arg(output_path, "output path") }?;
        check_extension(output_path)?;
        let rendered = render(barcode_type, data)?;
        std::fs::write(output_path, rendered).map_err(|err| format!("IO error: {err}"))?;
        Ok(Vec::new())
    })
}

unsafe extern "C" fn engine_read_from_file(file_path: *const c_char) -> *mut RawEnvelope {
    respond(|| {
        let file_path = unsafe { read_arg(file_path, "file path") }?;
        let bytes = std::fs::read(file_path).map_err(|err| format!("IO error: {err}"))?;
        decode(&bytes)
    })
}

unsafe extern "C" fn engine_read_from_bytes(data: *const u8, len: usize) -> *mut RawEnvelope {
    respond(|| {
        if data.is_null() {
            return Err("data is null".to_string());
        }
        let bytes = unsafe { std::slice::from_raw_parts(data, len) };
        decode(bytes)
    })
}

unsafe extern "C" fn engine_free_result(result: *mut RawEnvelope) {
    if result.is_null() {
        return;
    }
    unsafe {
        let envelope = Box::from_raw(result);
        if !envelope.data.is_null() {
            drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
                envelope.data,
                envelope.len,
            )));
        }
        if !envelope.error.is_null() {
            let error = Box::from_raw(envelope.error);
            if !error.message.is_null() {
                drop(CString::from_raw(error.message));
            }
        }
    }
}

fn respond(f: impl FnOnce() -> Result<Vec<u8>, String>) -> *mut RawEnvelope {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(Ok(data)) => data_envelope(data),
        Ok(Err(message)) => error_envelope(CString::new(message).ok(), ERROR_CODE),
        Err(_) => error_envelope(CString::new("Panic in engine").ok(), PANIC_CODE),
    }
}

fn into_handle(envelope: RawEnvelope) -> *mut RawEnvelope {
    Box::into_raw(Box::new(envelope))
}

fn data_envelope(data: Vec<u8>) -> *mut RawEnvelope {
    let data = data.into_boxed_slice();
    let len = data.len();
    into_handle(RawEnvelope {
        data: Box::into_raw(data) as *mut u8,
        len,
        error: ptr::null_mut(),
    })
}

fn error_envelope(message: Option<CString>, code: i32) -> *mut RawEnvelope {
    let error = Box::new(RawError {
        message: message.map(CString::into_raw).unwrap_or(ptr::null_mut()),
        code,
    });
    into_handle(RawEnvelope {
        data: ptr::null_mut(),
        len: 0,
        error: Box::into_raw(error),
    })
}

unsafe fn read_arg<'a>(value: *const c_char, name: &str) -> Result<&'a str, String> {
    if value.is_null() {
        return Err(format!("{name} is null"));
    }
    unsafe { CStr::from_ptr(value) }
        .to_str()
        .map_err(|_| format!("{name} is not valid UTF-8"))
}

fn render(barcode_type: &str, data: &str) -> Result<Vec<u8>, String> {
    if data.is_empty() {
        return Err("Data cannot be empty".to_string());
    }
    match barcode_type {
        "EAN13" => check_digits(data, 12, "EAN-13")?,
        "UPCA" => check_digits(data, 11, "UPC-A")?,
        "ITF14" => check_digits(data, 13, "ITF-14")?,
        "QRCode" | "Code128" | "DataMatrix" | "PDF417" | "Aztec" | "Code39" | "Codabar" => {}
        other => return Err(format!("Unsupported barcode type: {other}")),
    }
    let mut out = Vec::with_capacity(MAGIC.len() + barcode_type.len() + data.len() + 1);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(barcode_type.as_bytes());
    out.push(0);
    out.extend_from_slice(data.as_bytes());
    Ok(out)
}

fn decode(bytes: &[u8]) -> Result<Vec<u8>, String> {
    let body = bytes
        .strip_prefix(MAGIC)
        .ok_or_else(|| "No barcode found".to_string())?;
    let split = body
        .iter()
        .position(|&byte| byte == 0)
        .ok_or_else(|| "Corrupt barcode container".to_string())?;
    let text = CString::new(&body[split + 1..]).map_err(|_| "Decoded data contains NUL".to_string())?;
    Ok(text.into_bytes_with_nul())
}

/// GS1 mod-10 check over `body_len` digits, with the check digit optional.
fn check_digits(data: &str, body_len: usize, label: &str) -> Result<(), String> {
    if !data.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(format!("{label} data must contain only digits"));
    }
    if data.len() != body_len && data.len() != body_len + 1 {
        return Err(format!(
            "{label} requires {body_len} or {} digits",
            body_len + 1
        ));
    }
    let digits: Vec<u32> = data.bytes().map(|byte| u32::from(byte - b'0')).collect();
    let sum: u32 = digits[..body_len]
        .iter()
        .rev()
        .enumerate()
        .map(|(idx, digit)| if idx % 2 == 0 { digit * 3 } else { *digit })
        .sum();
    let expected = (10 - sum % 10) % 10;
    match digits.get(body_len) {
        Some(&check) if check != expected => Err(format!(
            "{label} check digit mismatch: expected {expected}, got {check}"
        )),
        _ => Ok(()),
    }
}

fn check_extension(path: &str) -> Result<(), String> {
    match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some("png" | "svg" | "pdf") => Ok(()),
        _ => Err("Unsupported file extension. Use .png, .svg, or .pdf".to_string()),
    }
}

// Raw signatures and symbol names of the QuickCodes C ABI.
use libc::c_char;

use crate::core::envelope::RawEnvelope;

pub type GenerateFn =
    unsafe extern "C" fn(barcode_type: *const c_char, data: *const c_char) -> *mut RawEnvelope;

pub type GenerateToFileFn = unsafe extern "C" fn(
    barcode_type: *const c_char,
    data: *const c_char,
    output_path: *const c_char,
) -> *mut RawEnvelope;

pub type ReadFromFileFn = unsafe extern "C" fn(file_path: *const c_char) -> *mut RawEnvelope;

pub type ReadFromBytesFn = unsafe extern "C" fn(data: *const u8, len: usize) -> *mut RawEnvelope;

pub type FreeResultFn = unsafe extern "C" fn(result: *mut RawEnvelope);

pub const GENERATE: &[u8] = b"quickcodes_generate\0";
pub const GENERATE_TO_FILE: &[u8] = b"quickcodes_generate_to_file\0";
pub const READ_FROM_FILE: &[u8] = b"quickcodes_read_from_file\0";
pub const READ_FROM_BYTES: &[u8] = b"quickcodes_read_from_bytes\0";
pub const FREE_RESULT: &[u8] = b"quickcodes_free_result\0";

/// Base name of the engine library, before platform prefix/suffix.
pub const LIBRARY_NAME: &str = "quickcodes";

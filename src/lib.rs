//! Purpose: Safe Rust binding over the QuickCodes barcode engine's C ABI.
//! Exports: `api` (facade, errors, symbologies), `boundary` (foreign-call seam), `core` (envelope model).
//! Role: Validate input, call the engine once, copy results out, release engine memory.
//! Invariants: Each engine envelope is released exactly once, on every return path.
//! Invariants: No engine-owned pointer escapes the operation that produced it.
pub mod api;
pub mod boundary;
pub mod core;

pub use api::{
    ApiResult, Error, ErrorKind, LibraryOptions, NativeBoundary, QuickCodes, Symbology, generate,
    generate_to_file, read_from_bytes, read_from_file,
};

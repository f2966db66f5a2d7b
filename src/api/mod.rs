//! Purpose: Define the public Rust API boundary for the QuickCodes binding.
//! Exports: The facade, its error model, symbology names, and library options.
//! Role: Public surface; raw envelope handling stays in `boundary`.
//! Invariants: Every operation either returns owned data or a typed `Error`.

mod args;
mod facade;

pub use crate::boundary::{Boundary, LibraryOptions, NativeBoundary};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::symbology::Symbology;
pub use facade::{
    ApiResult, QuickCodes, generate, generate_to_file, read_from_bytes, read_from_file,
};

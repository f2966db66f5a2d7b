//! Purpose: Name the barcode kinds the native engine understands.
//! Exports: `Symbology`.
//! Role: Stable textual identifiers passed across the boundary.
//! Invariants: `as_str`, `Display`, `FromStr` and serde all use the same names.
//! Notes: No per-symbology validation happens here; the engine owns those rules.
use std::ffi::CStr;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Symbology {
    QRCode,
    EAN13,
    UPCA,
    Code128,
    DataMatrix,
    PDF417,
    Aztec,
    Code39,
    ITF14,
    Codabar,
}

impl Symbology {
    pub const ALL: [Symbology; 10] = [
        Symbology::QRCode,
        Symbology::EAN13,
        Symbology::UPCA,
        Symbology::Code128,
        Symbology::DataMatrix,
        Symbology::PDF417,
        Symbology::Aztec,
        Symbology::Code39,
        Symbology::ITF14,
        Symbology::Codabar,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Symbology::QRCode => "QRCode",
            Symbology::EAN13 => "EAN13",
            Symbology::UPCA => "UPCA",
            Symbology::Code128 => "Code128",
            Symbology::DataMatrix => "DataMatrix",
            Symbology::PDF417 => "PDF417",
            Symbology::Aztec => "Aztec",
            Symbology::Code39 => "Code39",
            Symbology::ITF14 => "ITF14",
            Symbology::Codabar => "Codabar",
        }
    }

    /// NUL-terminated form of [`Symbology::as_str`] for foreign calls.
    pub fn as_c_str(self) -> &'static CStr {
        match self {
            Symbology::QRCode => c"QRCode",
            Symbology::EAN13 => c"EAN13",
            Symbology::UPCA => c"UPCA",
            Symbology::Code128 => c"Code128",
            Symbology::DataMatrix => c"DataMatrix",
            Symbology::PDF417 => c"PDF417",
            Symbology::Aztec => c"Aztec",
            Symbology::Code39 => c"Code39",
            Symbology::ITF14 => c"ITF14",
            Symbology::Codabar => c"Codabar",
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symbology {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbology::ALL
            .into_iter()
            .find(|symbology| symbology.as_str() == s)
            .ok_or_else(|| {
                Error::invalid_argument("symbology", format!("unknown symbology: {s}"))
            })
    }
}

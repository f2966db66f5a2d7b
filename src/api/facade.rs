//! Purpose: Public barcode operations over the QuickCodes engine.
//! Exports: `QuickCodes` and the process-wide convenience functions.
//! Role: Validate, invoke once, interpret the envelope, release it.
//! Invariants: Invalid input fails before the boundary is touched.
//! Invariants: The envelope guard drops on every return path, after payload data is copied out.
//! Invariants: No state is kept between calls.
use std::path::Path;

use super::args::{required_bytes, required_path, required_text};
use crate::boundary::{Boundary, BoundaryClient, Envelope, LibraryOptions, NativeBoundary};
use crate::core::envelope::{Outcome, decode_text};
use crate::core::error::{Error, NO_DATA_MESSAGE};
use crate::core::symbology::Symbology;

pub type ApiResult<T> = Result<T, Error>;

const GENERATE_FAILED: &str = "Failed to generate barcode";
const READ_FAILED: &str = "Failed to read barcode";

#[derive(Debug)]
pub struct QuickCodes<B: Boundary = NativeBoundary> {
    client: BoundaryClient<B>,
}

impl QuickCodes<&'static NativeBoundary> {
    /// Facade over the process-wide engine configured from the environment.
    pub fn native() -> Self {
        Self::with_boundary(NativeBoundary::global())
    }
}

impl QuickCodes<NativeBoundary> {
    pub fn with_options(options: LibraryOptions) -> Self {
        Self::with_boundary(NativeBoundary::new(options))
    }
}

impl<B: Boundary> QuickCodes<B> {
    pub fn with_boundary(boundary: B) -> Self {
        Self {
            client: BoundaryClient::new(boundary),
        }
    }

    pub fn boundary(&self) -> &B {
        self.client.boundary()
    }

    /// Encodes `data` and returns the rendered barcode bytes.
    pub fn generate(&self, symbology: Symbology, data: &str) -> ApiResult<Vec<u8>> {
        let data = required_text(data, "data")?;
        let envelope = self
            .client
            .invoke_generate(symbology, &data)?
            .ok_or_else(|| Error::operation_failed(GENERATE_FAILED))?;
        let payload = expect_payload(&envelope)?;
        Ok(payload.to_vec())
    }

    /// Encodes `data` and lets the engine write the result to `output_path`.
    pub fn generate_to_file(
        &self,
        symbology: Symbology,
        data: &str,
        output_path: impl AsRef<Path>,
    ) -> ApiResult<()> {
        let data = required_text(data, "data")?;
        let output_path = required_path(output_path.as_ref(), "output_path")?;
        let envelope = self
            .client
            .invoke_generate_to_file(symbology, &data, &output_path)?
            .ok_or_else(|| Error::operation_failed(GENERATE_FAILED))?;
        // Success carries no payload; the file is the engine's side effect.
        if let Outcome::Failed(failure) = envelope.outcome() {
            return Err(failure.into());
        }
        Ok(())
    }

    pub fn read_from_file(&self, file_path: impl AsRef<Path>) -> ApiResult<String> {
        let file_path = required_path(file_path.as_ref(), "file_path")?;
        let envelope = self
            .client
            .invoke_read_from_file(&file_path)?
            .ok_or_else(|| Error::operation_failed(READ_FAILED))?;
        decode_text(expect_payload(&envelope)?)
    }

    pub fn read_from_bytes(&self, data: &[u8]) -> ApiResult<String> {
        let data = required_bytes(data, "data")?;
        let envelope = self
            .client
            .invoke_read_from_bytes(data)?
            .ok_or_else(|| Error::operation_failed(READ_FAILED))?;
        decode_text(expect_payload(&envelope)?)
    }
}

impl Default for QuickCodes<&'static NativeBoundary> {
    fn default() -> Self {
        Self::native()
    }
}

fn expect_payload<'e, B: Boundary + ?Sized>(envelope: &'e Envelope<'_, B>) -> ApiResult<&'e [u8]> {
    match envelope.outcome() {
        Outcome::Payload(payload) => Ok(payload),
        Outcome::Empty => Err(Error::operation_failed(NO_DATA_MESSAGE)),
        Outcome::Failed(failure) => Err(failure.into()),
    }
}

/// [`QuickCodes::generate`] on the process-wide engine.
pub fn generate(symbology: Symbology, data: &str) -> ApiResult<Vec<u8>> {
    QuickCodes::native().generate(symbology, data)
}

pub fn generate_to_file(
    symbology: Symbology,
    data: &str,
    output_path: impl AsRef<Path>,
) -> ApiResult<()> {
    QuickCodes::native().generate_to_file(symbology, data, output_path)
}

pub fn read_from_file(file_path: impl AsRef<Path>) -> ApiResult<String> {
    QuickCodes::native().read_from_file(file_path)
}

pub fn read_from_bytes(data: &[u8]) -> ApiResult<String> {
    QuickCodes::native().read_from_bytes(data)
}

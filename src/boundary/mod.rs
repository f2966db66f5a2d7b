//! Purpose: Issue foreign calls and own each returned envelope until it is released.
//! Exports: `Boundary`, `Envelope`, `BoundaryClient`, `NativeBoundary`, `LibraryOptions`.
//! Role: The only layer that touches raw envelope handles.
//! Invariants: One foreign call per invocation; no retries.
//! Invariants: Every non-null handle is released exactly once, when its `Envelope` drops.
//! Invariants: Handles never outlive the operation that produced them.
use std::ffi::CStr;
use std::ptr::NonNull;

use crate::core::envelope::{Outcome, RawEnvelope, read_outcome};
use crate::core::error::Error;
use crate::core::symbology::Symbology;

#[cfg(any(test, feature = "loopback"))]
pub mod loopback;
mod native;
pub mod sys;

pub use native::{LIB_DIR_ENV, LIB_PATH_ENV, LibraryOptions, NativeBoundary};

/// Raw entry points of the codec engine.
///
/// Calls return the engine's handle untouched, null included. `Err` is
/// reserved for failing to reach the engine at all.
pub trait Boundary {
    fn generate(&self, symbology: &CStr, data: &CStr) -> Result<*mut RawEnvelope, Error>;

    fn generate_to_file(
        &self,
        symbology: &CStr,
        data: &CStr,
        output_path: &CStr,
    ) -> Result<*mut RawEnvelope, Error>;

    fn read_from_file(&self, path: &CStr) -> Result<*mut RawEnvelope, Error>;

    fn read_from_bytes(&self, data: &[u8]) -> Result<*mut RawEnvelope, Error>;

    /// Releases an envelope and everything it owns.
    ///
    /// # Safety
    ///
    /// `envelope` must be a non-null handle returned by this boundary that
    /// has not been released yet.
    unsafe fn free_result(&self, envelope: *mut RawEnvelope);
}

impl<B: Boundary + ?Sized> Boundary for &B {
    fn generate(&self, symbology: &CStr, data: &CStr) -> Result<*mut RawEnvelope, Error> {
        (**self).generate(symbology, data)
    }

    fn generate_to_file(
        &self,
        symbology: &CStr,
        data: &CStr,
        output_path: &CStr,
    ) -> Result<*mut RawEnvelope, Error> {
        (**self).generate_to_file(symbology, data, output_path)
    }

    fn read_from_file(&self, path: &CStr) -> Result<*mut RawEnvelope, Error> {
        (**self).read_from_file(path)
    }

    fn read_from_bytes(&self, data: &[u8]) -> Result<*mut RawEnvelope, Error> {
        (**self).read_from_bytes(data)
    }

    unsafe fn free_result(&self, envelope: *mut RawEnvelope) {
        unsafe { (**self).free_result(envelope) }
    }
}

/// Scoped ownership of one engine envelope.
///
/// Payload slices borrowed from [`Envelope::outcome`] cannot outlive the
/// guard, so data must be copied out before the release in `Drop`.
pub struct Envelope<'b, B: Boundary + ?Sized> {
    handle: NonNull<RawEnvelope>,
    boundary: &'b B,
}

impl<'b, B: Boundary + ?Sized> Envelope<'b, B> {
    /// Takes ownership of `handle`; `None` for a null handle.
    ///
    /// # Safety
    ///
    /// A non-null `handle` must come from `boundary` and must not be
    /// released by anyone else.
    pub unsafe fn acquire(boundary: &'b B, handle: *mut RawEnvelope) -> Option<Self> {
        NonNull::new(handle).map(|handle| Self { handle, boundary })
    }

    pub fn outcome(&self) -> Outcome<'_> {
        unsafe { read_outcome(self.handle.as_ref()) }
    }
}

impl<B: Boundary + ?Sized> Drop for Envelope<'_, B> {
    fn drop(&mut self) {
        unsafe { self.boundary.free_result(self.handle.as_ptr()) };
    }
}

/// Issues one foreign call per logical operation and wraps the handle.
///
/// `Ok(None)` means the engine could not even allocate an envelope.
#[derive(Debug)]
pub struct BoundaryClient<B: Boundary> {
    boundary: B,
}

impl<B: Boundary> BoundaryClient<B> {
    pub fn new(boundary: B) -> Self {
        Self { boundary }
    }

    pub fn boundary(&self) -> &B {
        &self.boundary
    }

    pub fn invoke_generate(
        &self,
        symbology: Symbology,
        data: &CStr,
    ) -> Result<Option<Envelope<'_, B>>, Error> {
        tracing::debug!(
            symbology = symbology.as_str(),
            data_len = data.count_bytes(),
            "quickcodes_generate"
        );
        let handle = self.boundary.generate(symbology.as_c_str(), data)?;
        Ok(unsafe { Envelope::acquire(&self.boundary, handle) })
    }

    pub fn invoke_generate_to_file(
        &self,
        symbology: Symbology,
        data: &CStr,
        output_path: &CStr,
    ) -> Result<Option<Envelope<'_, B>>, Error> {
        tracing::debug!(
            symbology = symbology.as_str(),
            data_len = data.count_bytes(),
            output_path = %output_path.to_string_lossy(),
            "quickcodes_generate_to_file"
        );
        let handle = self
            .boundary
            .generate_to_file(symbology.as_c_str(), data, output_path)?;
        Ok(unsafe { Envelope::acquire(&self.boundary, handle) })
    }

    pub fn invoke_read_from_file(&self, path: &CStr) -> Result<Option<Envelope<'_, B>>, Error> {
        tracing::debug!(path = %path.to_string_lossy(), "quickcodes_read_from_file");
        let handle = self.boundary.read_from_file(path)?;
        Ok(unsafe { Envelope::acquire(&self.boundary, handle) })
    }

    pub fn invoke_read_from_bytes(&self, data: &[u8]) -> Result<Option<Envelope<'_, B>>, Error> {
        tracing::debug!(data_len = data.len(), "quickcodes_read_from_bytes");
        let handle = self.boundary.read_from_bytes(data)?;
        Ok(unsafe { Envelope::acquire(&self.boundary, handle) })
    }
}

#[cfg(test)]
mod tests {
    use super::BoundaryClient;
    use super::loopback::{Fault, LoopbackBoundary};
    use crate::core::envelope::{Failure, Outcome};
    use crate::core::symbology::Symbology;

    #[test]
    fn envelope_is_released_once_on_drop() {
        let client = BoundaryClient::new(LoopbackBoundary::new());
        {
            let envelope = client
                .invoke_generate(Symbology::QRCode, c"hello")
                .expect("call")
                .expect("handle");
            assert!(matches!(envelope.outcome(), Outcome::Payload(bytes) if !bytes.is_empty()));
            assert_eq!(client.boundary().live(), 1);
        }
        assert_eq!(client.boundary().issued(), 1);
        assert_eq!(client.boundary().released(), 1);
        assert_eq!(client.boundary().live(), 0);
    }

    #[test]
    fn null_handle_is_not_released() {
        let client = BoundaryClient::new(LoopbackBoundary::with_fault(Fault::NullHandle));
        let envelope = client
            .invoke_read_from_bytes(b"anything")
            .expect("call");
        assert!(envelope.is_none());
        assert_eq!(client.boundary().calls(), 1);
        assert_eq!(client.boundary().released(), 0);
    }

    #[test]
    fn failure_envelope_is_released_too() {
        let client = BoundaryClient::new(LoopbackBoundary::new());
        {
            let envelope = client
                .invoke_generate(Symbology::EAN13, c"invalid")
                .expect("call")
                .expect("handle");
            match envelope.outcome() {
                Outcome::Failed(Failure { code, message }) => {
                    assert_eq!(code, 1);
                    assert!(message.expect("message").contains("EAN-13"));
                }
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
        assert_eq!(client.boundary().released(), 1);
    }

    #[test]
    fn unavailable_library_makes_no_handle() {
        let client = BoundaryClient::new(LoopbackBoundary::with_fault(Fault::Unavailable));
        let err = client
            .invoke_read_from_file(c"/tmp/code.png")
            .err()
            .expect("unavailable");
        assert_eq!(err.kind(), crate::core::error::ErrorKind::LibraryUnavailable);
        assert_eq!(client.boundary().issued(), 0);
    }
}

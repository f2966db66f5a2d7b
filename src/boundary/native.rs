//! Purpose: Resolve the QuickCodes engine library and call its C entry points.
//! Exports: `NativeBoundary`, `LibraryOptions`, `LIB_PATH_ENV`, `LIB_DIR_ENV`.
//! Role: Production `Boundary` backed by `libloading`.
//! Invariants: Resolution is lazy; a missing library surfaces on the first call, not at construction.
//! Invariants: Successful resolution is cached and reused; failures are retried on the next call.
//! Notes: Racing first calls may each load the library; the first stored wins and the others drop.
use std::ffi::{CStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, OnceLock};

use libloading::Library;

use super::{Boundary, sys};
use crate::core::envelope::RawEnvelope;
use crate::core::error::{Error, ErrorKind};

/// Exact library file to load; disables every other candidate.
pub const LIB_PATH_ENV: &str = "QUICKCODES_LIB_PATH";
/// Extra directory searched after the executable's own directory.
pub const LIB_DIR_ENV: &str = "QUICKCODES_LIB_DIR";

static GLOBAL: LazyLock<NativeBoundary> =
    LazyLock::new(|| NativeBoundary::new(LibraryOptions::from_env()));

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LibraryOptions {
    library_name: String,
    library_path: Option<PathBuf>,
    search_dirs: Vec<PathBuf>,
}

impl LibraryOptions {
    pub fn new() -> Self {
        Self {
            library_name: sys::LIBRARY_NAME.to_string(),
            library_path: None,
            search_dirs: Vec::new(),
        }
    }

    pub fn from_env() -> Self {
        let mut options = Self::new();
        if let Some(path) = std::env::var_os(LIB_PATH_ENV).filter(|value| !value.is_empty()) {
            options = options.with_library_path(path);
        }
        if let Some(dir) = std::env::var_os(LIB_DIR_ENV).filter(|value| !value.is_empty()) {
            options = options.with_search_dir(dir);
        }
        options
    }

    pub fn with_library_name(mut self, name: impl Into<String>) -> Self {
        self.library_name = name.into();
        self
    }

    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    pub fn library_name(&self) -> &str {
        &self.library_name
    }

    pub fn library_path(&self) -> Option<&Path> {
        self.library_path.as_deref()
    }

    /// Platform file name, e.g. `libquickcodes.so`.
    pub fn file_name(&self) -> OsString {
        libloading::library_filename(&self.library_name)
    }

    /// Load attempts in order: explicit path alone, else the executable's
    /// directory, configured search dirs, then the OS search path.
    pub fn candidates(&self) -> Vec<PathBuf> {
        if let Some(path) = &self.library_path {
            return vec![path.clone()];
        }
        let file_name = self.file_name();
        let mut candidates = Vec::with_capacity(self.search_dirs.len() + 2);
        if let Some(dir) = executable_dir() {
            candidates.push(dir.join(&file_name));
        }
        for dir in &self.search_dirs {
            candidates.push(dir.join(&file_name));
        }
        candidates.push(PathBuf::from(file_name));
        candidates
    }
}

impl Default for LibraryOptions {
    fn default() -> Self {
        Self::new()
    }
}

struct Entrypoints {
    generate: sys::GenerateFn,
    generate_to_file: sys::GenerateToFileFn,
    read_from_file: sys::ReadFromFileFn,
    read_from_bytes: sys::ReadFromBytesFn,
    free_result: sys::FreeResultFn,
    path: PathBuf,
    // Keeps the function pointers above valid.
    _library: Library,
}

impl Entrypoints {
    fn load(path: &Path) -> Result<Self, libloading::Error> {
        let library = unsafe { Library::new(path) }?;
        unsafe {
            let generate = *library.get::<sys::GenerateFn>(sys::GENERATE)?;
            let generate_to_file = *library.get::<sys::GenerateToFileFn>(sys::GENERATE_TO_FILE)?;
            let read_from_file = *library.get::<sys::ReadFromFileFn>(sys::READ_FROM_FILE)?;
            let read_from_bytes = *library.get::<sys::ReadFromBytesFn>(sys::READ_FROM_BYTES)?;
            let free_result = *library.get::<sys::FreeResultFn>(sys::FREE_RESULT)?;
            Ok(Self {
                generate,
                generate_to_file,
                read_from_file,
                read_from_bytes,
                free_result,
                path: path.to_path_buf(),
                _library: library,
            })
        }
    }
}

pub struct NativeBoundary {
    options: LibraryOptions,
    entrypoints: OnceLock<Entrypoints>,
}

impl NativeBoundary {
    pub fn new(options: LibraryOptions) -> Self {
        Self {
            options,
            entrypoints: OnceLock::new(),
        }
    }

    /// Process-wide instance configured from the environment.
    pub fn global() -> &'static NativeBoundary {
        &GLOBAL
    }

    pub fn options(&self) -> &LibraryOptions {
        &self.options
    }

    pub fn is_loaded(&self) -> bool {
        self.entrypoints.get().is_some()
    }

    /// Path the engine was loaded from, once resolved.
    pub fn loaded_path(&self) -> Option<&Path> {
        self.entrypoints.get().map(|entry| entry.path.as_path())
    }

    /// Resolves the library now instead of on the first call.
    pub fn preload(&self) -> Result<(), Error> {
        self.entrypoints().map(|_| ())
    }

    fn entrypoints(&self) -> Result<&Entrypoints, Error> {
        if let Some(entry) = self.entrypoints.get() {
            return Ok(entry);
        }
        let loaded = self.resolve()?;
        Ok(self.entrypoints.get_or_init(|| loaded))
    }

    fn resolve(&self) -> Result<Entrypoints, Error> {
        let mut last_err = None;
        for candidate in self.options.candidates() {
            match Entrypoints::load(&candidate) {
                Ok(entry) => {
                    tracing::debug!(path = %candidate.display(), "loaded quickcodes engine");
                    return Ok(entry);
                }
                Err(err) => {
                    if candidate.is_absolute() && candidate.exists() {
                        tracing::warn!(path = %candidate.display(), error = %err, "failed to load quickcodes engine");
                    } else {
                        tracing::debug!(path = %candidate.display(), error = %err, "quickcodes engine candidate skipped");
                    }
                    last_err = Some(err);
                }
            }
        }
        let err = Error::new(ErrorKind::LibraryUnavailable).with_message(format!(
            "unable to load {} (set {LIB_PATH_ENV} or {LIB_DIR_ENV})",
            self.options.file_name().to_string_lossy()
        ));
        Err(match last_err {
            Some(source) => err.with_source(source),
            None => err,
        })
    }
}

impl std::fmt::Debug for NativeBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeBoundary")
            .field("options", &self.options)
            .field("loaded_path", &self.loaded_path())
            .finish()
    }
}

impl Boundary for NativeBoundary {
    fn generate(&self, symbology: &CStr, data: &CStr) -> Result<*mut RawEnvelope, Error> {
        let entry = self.entrypoints()?;
        Ok(unsafe { (entry.generate)(symbology.as_ptr(), data.as_ptr()) })
    }

    fn generate_to_file(
        &self,
        symbology: &CStr,
        data: &CStr,
        output_path: &CStr,
    ) -> Result<*mut RawEnvelope, Error> {
        let entry = self.entrypoints()?;
        Ok(unsafe {
            (entry.generate_to_file)(symbology.as_ptr(), data.as_ptr(), output_path.as_ptr())
        })
    }

    fn read_from_file(&self, path: &CStr) -> Result<*mut RawEnvelope, Error> {
        let entry = self.entrypoints()?;
        Ok(unsafe { (entry.read_from_file)(path.as_ptr()) })
    }

    fn read_from_bytes(&self, data: &[u8]) -> Result<*mut RawEnvelope, Error> {
        let entry = self.entrypoints()?;
        Ok(unsafe { (entry.read_from_bytes)(data.as_ptr(), data.len()) })
    }

    unsafe fn free_result(&self, envelope: *mut RawEnvelope) {
        // Handles only exist after a successful resolution.
        if let Some(entry) = self.entrypoints.get() {
            unsafe { (entry.free_result)(envelope) };
        }
    }
}

fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

#[cfg(test)]
mod tests {
    use super::{Boundary, LibraryOptions, NativeBoundary};
    use crate::core::error::ErrorKind;
    use std::path::PathBuf;

    #[test]
    fn explicit_path_is_the_only_candidate() {
        let options = LibraryOptions::new()
            .with_search_dir("/opt/quickcodes/lib")
            .with_library_path("/srv/libquickcodes-custom.so");
        assert_eq!(
            options.candidates(),
            vec![PathBuf::from("/srv/libquickcodes-custom.so")]
        );
    }

    #[test]
    fn executable_dir_comes_before_search_path() {
        let options = LibraryOptions::new().with_search_dir("/opt/quickcodes/lib");
        let file_name = options.file_name();
        let candidates = options.candidates();
        let exe_dir = std::env::current_exe()
            .expect("exe")
            .parent()
            .expect("parent")
            .to_path_buf();
        assert_eq!(candidates.first(), Some(&exe_dir.join(&file_name)));
        assert_eq!(
            candidates.get(1),
            Some(&PathBuf::from("/opt/quickcodes/lib").join(&file_name))
        );
        assert_eq!(candidates.last(), Some(&PathBuf::from(&file_name)));
    }

    #[test]
    fn file_name_follows_platform_convention() {
        let name = LibraryOptions::new().file_name();
        let name = name.to_string_lossy();
        assert!(name.contains("quickcodes"));
        if cfg!(target_os = "linux") {
            assert_eq!(name, "libquickcodes.so");
        }
    }

    #[test]
    fn missing_library_fails_on_first_call_and_is_retried() {
        let temp = tempfile::tempdir().expect("tempdir");
        let boundary = NativeBoundary::new(
            LibraryOptions::new().with_library_path(temp.path().join("libmissing.so")),
        );
        assert!(!boundary.is_loaded());

        for _ in 0..2 {
            let err = boundary.read_from_bytes(b"data").expect_err("missing");
            assert_eq!(err.kind(), ErrorKind::LibraryUnavailable);
            assert!(std::error::Error::source(&err).is_some());
        }
        assert!(!boundary.is_loaded());
        assert_eq!(boundary.loaded_path(), None);
    }
}

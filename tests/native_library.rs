//! Purpose: Exercise the public facade against the dynamically loaded engine.
//! Exports: Integration tests only.
//! Role: Verify argument checks, deferred library resolution, and live engine scenarios.
//! Invariants: Argument checks pass without any engine installed.
//! Notes: Live scenarios run only when `QUICKCODES_LIB_PATH` points at a loadable engine.
use quickcodes_binding::{ErrorKind, LibraryOptions, NativeBoundary, QuickCodes, Symbology};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}

fn live_engine() -> Option<QuickCodes<NativeBoundary>> {
    init_tracing();
    let path = std::env::var_os(quickcodes_binding::boundary::LIB_PATH_ENV)?;
    let codes = QuickCodes::with_options(LibraryOptions::new().with_library_path(path));
    match codes.boundary().preload() {
        Ok(()) => Some(codes),
        Err(err) => {
            eprintln!("skipping live engine test: {err}");
            None
        }
    }
}

#[test]
fn empty_arguments_fail_without_an_engine() {
    init_tracing();
    let cases = [
        quickcodes_binding::generate(Symbology::QRCode, "").map(|_| ()),
        quickcodes_binding::generate_to_file(Symbology::QRCode, "", "out.png"),
        quickcodes_binding::generate_to_file(Symbology::QRCode, "test", ""),
        quickcodes_binding::read_from_file("").map(|_| ()),
        quickcodes_binding::read_from_bytes(&[]).map(|_| ()),
    ];
    for result in cases {
        let err = result.expect_err("empty argument");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.code(), 0);
    }
}

#[test]
fn missing_engine_is_reported_on_first_call() {
    init_tracing();
    let temp = tempfile::tempdir().expect("tempdir");
    let codes = QuickCodes::with_options(
        LibraryOptions::new().with_library_path(temp.path().join("libquickcodes.so")),
    );
    assert!(!codes.boundary().is_loaded());

    let err = codes
        .generate(Symbology::QRCode, "Hello, QuickCodes!")
        .expect_err("no engine");
    assert_eq!(err.kind(), ErrorKind::LibraryUnavailable);
    assert!(err.to_string().contains("QUICKCODES_LIB_PATH"));
    assert!(!codes.boundary().is_loaded());
}

#[test]
fn live_generate_scenarios() {
    let Some(codes) = live_engine() else {
        return;
    };
    for data in ["Hello, QuickCodes!", "https://example.com"] {
        let bytes = codes.generate(Symbology::QRCode, data).expect("generate");
        assert!(!bytes.is_empty());
    }
    let err = codes
        .generate(Symbology::EAN13, "invalid")
        .expect_err("invalid ean13");
    assert_eq!(err.kind(), ErrorKind::Codec);
    assert!(codes.boundary().loaded_path().is_some());
}

#[test]
fn live_generate_to_file_creates_file() {
    let Some(codes) = live_engine() else {
        return;
    };
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("test_rust_ean13.png");
    codes
        .generate_to_file(Symbology::EAN13, "1234567890128", &path)
        .expect("generate_to_file");
    assert!(path.exists());
}

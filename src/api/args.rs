// Argument checks run before any foreign call is attempted.
use std::ffi::CString;
use std::path::Path;

use crate::core::error::Error;

pub(crate) fn required_text(value: &str, argument: &'static str) -> Result<CString, Error> {
    if value.is_empty() {
        return Err(Error::invalid_argument(
            argument,
            format!("{argument} cannot be empty"),
        ));
    }
    CString::new(value).map_err(|err| {
        Error::invalid_argument(argument, format!("{argument} contains NUL")).with_source(err)
    })
}

pub(crate) fn required_path(path: &Path, argument: &'static str) -> Result<CString, Error> {
    if path.as_os_str().is_empty() {
        return Err(Error::invalid_argument(
            argument,
            format!("{argument} cannot be empty"),
        ));
    }
    let text = path.to_str().ok_or_else(|| {
        Error::invalid_argument(argument, format!("{argument} is not valid UTF-8"))
    })?;
    required_text(text, argument)
}

pub(crate) fn required_bytes<'a>(
    value: &'a [u8],
    argument: &'static str,
) -> Result<&'a [u8], Error> {
    if value.is_empty() {
        return Err(Error::invalid_argument(
            argument,
            format!("{argument} cannot be empty"),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::{required_bytes, required_path, required_text};
    use crate::core::error::ErrorKind;
    use std::path::Path;

    #[test]
    fn text_must_be_non_empty_without_nul() {
        assert_eq!(required_text("abc", "data").expect("ok").as_bytes(), b"abc");

        let err = required_text("", "data").expect_err("empty");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.message(), Some("data cannot be empty"));

        let err = required_text("a\0b", "data").expect_err("nul");
        assert_eq!(err.message(), Some("data contains NUL"));
    }

    #[test]
    fn path_must_be_non_empty() {
        let err = required_path(Path::new(""), "output_path").expect_err("empty");
        assert_eq!(err.argument(), Some("output_path"));
        assert!(required_path(Path::new("/tmp/out.png"), "output_path").is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_path_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;
        let path = Path::new(OsStr::from_bytes(b"/tmp/\xff.png"));
        let err = required_path(path, "file_path").expect_err("utf8");
        assert_eq!(err.message(), Some("file_path is not valid UTF-8"));
    }

    #[test]
    fn bytes_must_be_non_empty() {
        assert!(required_bytes(&[], "data").is_err());
        assert_eq!(required_bytes(&[1, 2], "data").expect("ok"), &[1u8, 2][..]);
    }
}

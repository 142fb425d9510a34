use crate::error::TranslateError;
use std::fs;
use std::path::PathBuf;

/// Write generated code to `{path}{filename}.js` and return the path written.
///
/// `path` is a plain prefix, so it needs its own trailing separator
/// (`"web/"`, not `"web"`).
pub fn export_js(code: &str, filename: &str, path: &str) -> Result<PathBuf, TranslateError> {
    let target = PathBuf::from(format!("{}{}.js", path, filename));
    fs::write(&target, code).map_err(|source| TranslateError::Io {
        path: target.clone(),
        source,
    })?;
    tracing::debug!(path = %target.display(), bytes = code.len(), "exported javascript");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_writes_prefixed_file() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = format!("{}/", dir.path().display());

        let written = export_js("let x = 1;\n", "script", &prefix).unwrap();

        assert_eq!(written, dir.path().join("script.js"));
        assert_eq!(fs::read_to_string(written).unwrap(), "let x = 1;\n");
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = format!("{}/missing/", dir.path().display());

        let err = export_js("", "script", &prefix).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}

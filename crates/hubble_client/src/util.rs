//! URL and file helpers.

use std::io;
use std::path::Path;

const SEPARATOR: &str = "/";

/// Append a query string built from `params`, in order, to `base`.
/// Values are form-encoded. Without params `base` is returned unchanged.
pub fn build_url(base: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return base.to_string();
    }
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!("{}?{}", base, query)
}

/// Join `url` and `path` with a single separator when neither provides one.
pub fn append_path(url: &str, path: &str) -> String {
    if !url.ends_with(SEPARATOR) && !path.starts_with(SEPARATOR) {
        format!("{}{}{}", url, SEPARATOR, path)
    } else {
        format!("{}{}", url, path)
    }
}

/// Whether `path` exists. A missing file is `Ok(false)`; other stat
/// failures (e.g. permission denied) are returned.
pub fn file_exists(path: impl AsRef<Path>) -> io::Result<bool> {
    match std::fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Remove `path` if it exists.
pub fn delete_file(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    if file_exists(path)? {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

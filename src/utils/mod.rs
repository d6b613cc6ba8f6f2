mod error;

pub use error::{
    AdmissionError, PackagerError, PackagerResult, SessionError, SettingsError,
};

/// Extracts the filename component from a path-like string, falling back to
/// the whole string when there is no separator.
pub fn extract_filename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Extracts the lowercase extension (without the dot) from a filename.
pub fn extension_of(name: &str) -> Option<String> {
    let file = extract_filename(name);
    let (stem, ext) = file.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Returns the filename with its extension removed.
pub fn file_stem(name: &str) -> &str {
    let file = extract_filename(name);
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_filename() {
        assert_eq!(extract_filename("a/b/c.jpg"), "c.jpg");
        assert_eq!(extract_filename("c.jpg"), "c.jpg");
        assert_eq!(extract_filename("a\\b\\c.jpg"), "c.jpg");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_of("noext"), None);
        assert_eq!(extension_of(".hidden"), None);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("shoot/photo.jpg"), "photo");
        assert_eq!(file_stem("noext"), "noext");
    }
}

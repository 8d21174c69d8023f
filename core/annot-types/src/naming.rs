//! File-name splitting shared by deduplication and blob lookup.

/// Splits `name` into `(stem, extension)` at its last `.`.
///
/// The extension keeps its leading dot. A name without a dot, or whose
/// only dot is the first character (`.env`), is all stem.
#[must_use]
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Returns the extension of `name` including the leading dot, or `""`.
#[must_use]
pub fn file_extension(name: &str) -> &str {
    split_extension(name).1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_at_last_dot() {
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
    }

    #[test]
    fn leading_dot_is_stem() {
        assert_eq!(split_extension(".env"), (".env", ""));
    }

    #[test]
    fn trailing_dot_is_extension() {
        assert_eq!(split_extension("notes."), ("notes", "."));
    }
}

use std::fmt;

/// Maximum stored length of file names, extensions and directories.
pub const MAX_PATH_LEN: usize = 511;
/// Maximum stored length of an address field.
pub const MAX_HOST_LEN: usize = 127;
/// Maximum stored length of the user field.
pub const MAX_USER_LEN: usize = 63;
/// Maximum stored length of the annotation.
pub const MAX_ANNOTATION_LEN: usize = 127;

/// Character substituted for anything that would break `key='value'` parsing.
pub const PLACEHOLDER: char = '-';

/// A string that is safe to place between single quotes in a log line.
///
/// `LogField` values never contain quote characters or control characters
/// and never exceed the bound they were sanitized with. They can only be
/// produced by a [`FieldSanitizer`], so every string that reaches a sink has
/// gone through the same cleaning path regardless of its anonymization mode.
///
/// # Examples
///
/// ```
/// use dlog::FieldSanitizer;
///
/// let field = FieldSanitizer::new(64).clean("it's \"quoted\"");
/// assert_eq!(field.as_str(), "it-s -quoted-");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LogField {
    inner: String,
}

impl LogField {
    /// The empty field, used for suppressed values.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the cleaned value.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Returns `true` if the field holds no characters.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Consumes the field and returns the cleaned string.
    pub fn into_inner(self) -> String {
        self.inner
    }
}

impl AsRef<str> for LogField {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for LogField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

/// Bounds and cleans raw strings into [`LogField`]s.
///
/// Cleaning never fails. Input is truncated to `max_len` characters (on a
/// character boundary) and every single quote, double quote or control
/// character is replaced by [`PLACEHOLDER`].
#[derive(Debug, Clone, Copy)]
pub struct FieldSanitizer {
    max_len: usize,
}

impl FieldSanitizer {
    /// Creates a sanitizer that keeps at most `max_len` characters.
    pub const fn new(max_len: usize) -> Self {
        Self { max_len }
    }

    /// Sanitizer for file names, extensions and directories.
    pub const fn path() -> Self {
        Self::new(MAX_PATH_LEN)
    }

    /// Sanitizer for address fields.
    pub const fn host() -> Self {
        Self::new(MAX_HOST_LEN)
    }

    /// Sanitizer for the user field.
    pub const fn user() -> Self {
        Self::new(MAX_USER_LEN)
    }

    /// Sanitizer for annotations.
    pub const fn annotation() -> Self {
        Self::new(MAX_ANNOTATION_LEN)
    }

    /// Returns the maximum number of characters kept.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Cleans `raw` into a [`LogField`].
    pub fn clean(&self, raw: &str) -> LogField {
        let inner = raw
            .chars()
            .take(self.max_len)
            .map(|c| if Self::is_forbidden(c) { PLACEHOLDER } else { c })
            .collect();
        LogField { inner }
    }

    fn is_forbidden(c: char) -> bool {
        c == '\'' || c == '"' || c.is_control()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_are_replaced() {
        let field = FieldSanitizer::new(32).clean(r#"a'b"c"#);
        assert_eq!(field.as_str(), "a-b-c");
    }

    #[test]
    fn control_characters_are_replaced() {
        let field = FieldSanitizer::new(32).clean("line1\nline2\r\t\0");
        assert_eq!(field.as_str(), "line1-line2---");
    }

    #[test]
    fn clean_input_is_unchanged() {
        let field = FieldSanitizer::path().clean("/srv/data/report.csv");
        assert_eq!(field.as_str(), "/srv/data/report.csv");
    }

    #[test]
    fn long_input_is_truncated_on_char_boundary() {
        let field = FieldSanitizer::new(3).clean("äöüß");
        assert_eq!(field.as_str(), "äöü");
        assert_eq!(field.as_str().chars().count(), 3);
    }

    #[test]
    fn empty_field() {
        let field = LogField::empty();
        assert!(field.is_empty());
        assert_eq!(field.to_string(), "");
    }

    #[test]
    fn preset_bounds() {
        assert_eq!(FieldSanitizer::path().max_len(), MAX_PATH_LEN);
        assert_eq!(FieldSanitizer::host().max_len(), MAX_HOST_LEN);
        assert_eq!(FieldSanitizer::user().max_len(), MAX_USER_LEN);
        assert_eq!(FieldSanitizer::annotation().max_len(), MAX_ANNOTATION_LEN);
    }

    #[test]
    fn into_inner_returns_cleaned_string() {
        let field = FieldSanitizer::new(8).clean("x'y");
        assert_eq!(field.into_inner(), "x-y");
    }
}

/// Directory, base name and extension of a transferred file's path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathParts<'a> {
    /// Everything up to and including the last `/`; empty if there is none.
    pub dir: &'a str,
    /// File name without directory or extension.
    pub name: &'a str,
    /// Text after the last `.` of the file name, without the dot.
    pub ext: &'a str,
}

/// Splits `path` into directory, name and extension.
///
/// A leading dot does not start an extension, so `.profile` has the name
/// `.profile` and no extension.
///
/// # Examples
///
/// ```
/// use dlog::split_path;
///
/// let parts = split_path("/a/b/file.txt");
/// assert_eq!(parts.dir, "/a/b/");
/// assert_eq!(parts.name, "file");
/// assert_eq!(parts.ext, "txt");
/// ```
pub fn split_path(path: &str) -> PathParts<'_> {
    let (dir, base) = match path.rfind('/') {
        Some(slash) => path.split_at(slash + 1),
        None => ("", path),
    };
    let (name, ext) = match base.rfind('.') {
        Some(dot) if dot > 0 => (&base[..dot], &base[dot + 1..]),
        _ => (base, ""),
    };
    PathParts { dir, name, ext }
}

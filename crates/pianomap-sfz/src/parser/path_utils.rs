use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Normalize a path string based on the current operating system
///
/// SFZ files authored on Windows often use backslashes in `#include` and
/// `sample` paths.
/// - On Windows: Keeps backslashes
/// - On other platforms: Converts backslashes to forward slashes
///
/// # Example
///
/// ```
/// use pianomap_sfz::parser::normalize_path;
///
/// let path = "Data\\vel_01.txt";
/// let normalized = normalize_path(path);
///
/// #[cfg(windows)]
/// assert_eq!(normalized, "Data\\vel_01.txt");
///
/// #[cfg(not(windows))]
/// assert_eq!(normalized, "Data/vel_01.txt");
/// ```
pub fn normalize_path(path: &str) -> String {
    if cfg!(windows) {
        path.to_string()
    } else {
        path.replace('\\', "/")
    }
}

/// Resolve an `#include` path against the instrument's base directory
///
/// Include paths in SFZ are relative to the directory of the root `.sfz` file,
/// no matter which file the directive appears in. Absolute include paths are
/// used as-is.
///
/// # Example
///
/// ```
/// use pianomap_sfz::parser::resolve_include_path;
/// use std::path::{Path, PathBuf};
///
/// let resolved = resolve_include_path(Path::new("/pianos/salamander"), "Data/notes.txt");
/// assert_eq!(resolved, PathBuf::from("/pianos/salamander/Data/notes.txt"));
/// ```
pub fn resolve_include_path(base_dir: &Path, include: &str) -> PathBuf {
    let normalized = normalize_path(include);
    let path = Path::new(&normalized);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    base_dir.join(path)
}

/// Absolute, canonical form of a path, used as the identity of a visited file
///
/// Falls back to joining with the current directory when the path cannot be
/// canonicalized (for example because it does not exist).
pub fn absolute_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Directory against which a root SFZ file's includes are resolved
pub fn base_dir_of(sfz_path: &Path) -> PathBuf {
    sfz_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

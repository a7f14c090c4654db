//! File path helpers.

use std::path::{Component, Path, PathBuf};

/// Lowercased extension without the dot, or `""` when there is none.
pub fn extension(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// True when any component of the path starts with a dot.
///
/// `.` and `..` components do not count as hidden.
pub fn is_hidden(path: impl AsRef<Path>) -> bool {
    path.as_ref().components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

/// Move `path` from under `from` to the same place under `to`.
///
/// Returns `None` when `path` is not inside `from`.
pub fn rebase(path: &Path, from: &Path, to: &Path) -> Option<PathBuf> {
    path.strip_prefix(from).ok().map(|rel| to.join(rel))
}

/// Sort paths by their raw string form and drop duplicates.
///
/// `a.html` sorts before `a/z.md`, unlike component-wise `Path` ordering.
pub fn unique_sorted(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    paths.dedup();
    paths
}

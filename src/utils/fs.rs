//! Filesystem helpers used by the build.

use super::path::{is_hidden, unique_sorted};
use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Recursively copy `src` into `dest`, skipping hidden entries.
///
/// `keep` is asked about every file (never directories); files it rejects
/// are not copied. Directories are created as they are walked. A missing
/// `src` copies nothing. Returns the number of files copied.
pub fn copy_dir(src: &Path, dest: &Path, keep: impl Fn(&Path) -> bool) -> Result<usize> {
    if !src.exists() {
        return Ok(0);
    }

    let mut copied = 0;
    let walker = WalkDir::new(src)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", src.display()))?;
        let rel = entry.path().strip_prefix(src)?;
        let target = dest.join(rel);

        if entry.file_type().is_dir() {
            mkdir(&target)?;
        } else if keep(entry.path()) {
            fs::copy(entry.path(), &target).with_context(|| {
                format!("Failed to copy {} to {}", entry.path().display(), target.display())
            })?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Remove a file or directory tree. Missing paths are fine.
pub fn remove(path: &Path) -> Result<()> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Err(err) if err.kind() != io::ErrorKind::NotFound => {
            Err(err).with_context(|| format!("Failed to remove {}", path.display()))
        }
        _ => Ok(()),
    }
}

/// Create a directory and all of its parents if missing.
pub fn mkdir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("Failed to create {}", path.display()))
}

/// Write a new file, creating parent directories as needed.
///
/// Fails with [`io::ErrorKind::AlreadyExists`] if the file is already there.
pub fn write_new(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(contents)
}

/// Files under `base` matching any of `patterns`, in sorted order.
///
/// Patterns are relative to `base` and `*` never crosses a `/`. Hidden
/// entries are never descended into. Entries that cannot be read are
/// skipped.
pub fn glob(base: &Path, patterns: &[&str]) -> Result<Vec<PathBuf>> {
    let set = glob_set(patterns)?;

    let paths = WalkDir::new(base)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().strip_prefix(base).is_ok_and(|rel| set.is_match(rel)))
        .map(walkdir::DirEntry::into_path)
        .collect();

    Ok(unique_sorted(paths))
}

fn glob_set(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .with_context(|| format!("Invalid glob pattern `{pattern}`"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_copy_dir_skips_hidden() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("assets");
        let dest = dir.path().join("public");
        touch(&src.join("style.css"), "body{}");
        touch(&src.join(".DS_Store"), "");
        touch(&src.join(".git/config"), "");
        touch(&src.join("img/logo.png"), "png");

        let copied = copy_dir(&src, &dest, |_| true).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(dest.join("style.css")).unwrap(), "body{}");
        assert!(dest.join("img/logo.png").is_file());
        assert!(!dest.join(".DS_Store").exists());
        assert!(!dest.join(".git").exists());
    }

    #[test]
    fn test_copy_dir_filter() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("content");
        let dest = dir.path().join("public");
        touch(&src.join("post/index.md"), "---\n---");
        touch(&src.join("post/photo.jpg"), "jpg");

        let copied = copy_dir(&src, &dest, |p| p.extension().is_none_or(|e| e != "md")).unwrap();

        assert_eq!(copied, 1);
        assert!(dest.join("post/photo.jpg").is_file());
        assert!(!dest.join("post/index.md").exists());
    }

    #[test]
    fn test_copy_dir_missing_source() {
        let dir = TempDir::new().unwrap();
        let copied = copy_dir(&dir.path().join("nope"), &dir.path().join("out"), |_| true).unwrap();
        assert_eq!(copied, 0);
    }

    #[test]
    fn test_remove() {
        let dir = TempDir::new().unwrap();
        let tree = dir.path().join("public");
        touch(&tree.join("a/b.html"), "x");

        remove(&tree).unwrap();
        assert!(!tree.exists());
        // removing again is not an error
        remove(&tree).unwrap();
    }

    #[test]
    fn test_write_new_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deep/page/index.html");

        write_new(&path, b"first").unwrap();
        let err = write_new(&path, b"second").unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");
    }

    #[test]
    fn test_glob_multiple_patterns() {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        touch(&base.join("b.md"), "");
        touch(&base.join("a.html"), "");
        touch(&base.join("nested/deeper/c.md"), "");
        touch(&base.join(".hidden/d.md"), "");
        touch(&base.join("e.txt"), "");

        let found = glob(base, &["**/*.md", "**/*.html", "*.md"]).unwrap();
        let rel: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(base).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            rel,
            vec![
                PathBuf::from("a.html"),
                PathBuf::from("b.md"),
                PathBuf::from("nested/deeper/c.md"),
            ]
        );
    }
}

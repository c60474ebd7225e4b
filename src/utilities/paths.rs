// Path Utilities
// Helper functions for path manipulation

use std::io;
use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving . and .. components
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                components.pop();
            }
            Component::CurDir => {}
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Make a path absolute without requiring it to exist
///
/// The longest existing ancestor is canonicalized so symlinked roots compare
/// correctly; the missing tail is appended as is.
pub fn absolute_path(path: &Path) -> io::Result<PathBuf> {
    let path = if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&std::env::current_dir()?.join(path))
    };

    for ancestor in path.ancestors() {
        if ancestor.exists() {
            let tail = path.strip_prefix(ancestor).unwrap_or(Path::new(""));
            let base = ancestor.canonicalize()?;
            return Ok(if tail.as_os_str().is_empty() { base } else { base.join(tail) });
        }
    }

    Ok(path)
}

/// Resolve a path relative to a base directory
pub fn resolve_path(base: &Path, relative: &Path) -> PathBuf {
    if relative.is_absolute() {
        relative.to_path_buf()
    } else {
        normalize_path(&base.join(relative))
    }
}

/// Check if a path is inside (or equal to) a directory
pub fn is_inside(path: &Path, directory: &Path) -> bool {
    let path = normalize_path(path);
    let directory = normalize_path(directory);

    path.starts_with(&directory)
}

/// Compute the counterpart of `path` under `dest_root`
///
/// The part of `path` below `source_root` is re-joined onto `dest_root`
/// component by component, so repeated root names deeper in the tree are kept.
pub fn mirror_path(source_root: &Path, dest_root: &Path, path: &Path) -> Option<PathBuf> {
    let relative = path.strip_prefix(source_root).ok()?;
    Some(dest_root.join(relative))
}

/// Path of the versioned copy of `path`: `<stem>_<stamp><.ext>` in the same directory
pub fn versioned_path(path: &Path, stamp: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, stamp, ext.to_string_lossy()),
        None => format!("{}_{}", stem, stamp),
    };

    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        let path = Path::new("a/b/../c/./d");
        assert_eq!(normalize_path(path), PathBuf::from("a/c/d"));
    }

    #[test]
    fn test_resolve_path() {
        let base = Path::new("/home/user");
        assert_eq!(resolve_path(base, Path::new("documents")), PathBuf::from("/home/user/documents"));
        assert_eq!(resolve_path(base, Path::new("../shared")), PathBuf::from("/home/shared"));
        assert_eq!(resolve_path(base, Path::new("/etc/config")), PathBuf::from("/etc/config"));
    }

    #[test]
    fn test_absolute_path_keeps_missing_tail() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("a/b");

        let resolved = absolute_path(&missing).unwrap();
        assert_eq!(resolved, temp.path().canonicalize().unwrap().join("a/b"));
    }

    #[test]
    fn test_is_inside() {
        assert!(is_inside(Path::new("/data/src/out"), Path::new("/data/src")));
        assert!(is_inside(Path::new("/data/src"), Path::new("/data/src")));
        assert!(is_inside(Path::new("/data/src/a/../out"), Path::new("/data/src")));
        assert!(!is_inside(Path::new("/data/src-backup"), Path::new("/data/src")));
        assert!(!is_inside(Path::new("/data"), Path::new("/data/src")));
    }

    #[test]
    fn test_mirror_path_with_repeated_root_name() {
        let source = Path::new("/data/src");
        let dest = Path::new("/backup/dst");
        let nested = Path::new("/data/src/data/src/file.txt");

        assert_eq!(
            mirror_path(source, dest, nested),
            Some(PathBuf::from("/backup/dst/data/src/file.txt"))
        );
    }

    #[test]
    fn test_mirror_path_outside_root() {
        assert_eq!(
            mirror_path(Path::new("/data/src"), Path::new("/backup"), Path::new("/other/file")),
            None
        );
    }

    #[test]
    fn test_versioned_path() {
        assert_eq!(
            versioned_path(Path::new("/dst/b.txt"), "20240101120000"),
            PathBuf::from("/dst/b_20240101120000.txt")
        );
        assert_eq!(
            versioned_path(Path::new("/dst/archive.tar.gz"), "1"),
            PathBuf::from("/dst/archive.tar_1.gz")
        );
        assert_eq!(
            versioned_path(Path::new("/dst/Makefile"), "1"),
            PathBuf::from("/dst/Makefile_1")
        );
    }
}

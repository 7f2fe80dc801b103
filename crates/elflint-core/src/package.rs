//! The package abstraction: a name plus the files it installs.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFile {
    /// Where the bytes can be read now.
    pub content_path: PathBuf,
    /// Where the file lands once installed.
    pub logical_path: String,
    /// Only regular files are handed to the analyzer.
    pub is_regular: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub files: Vec<PackageFile>,
}

impl Package {
    /// Walk an extracted package tree. Every entry below `root` becomes a
    /// file whose logical path is `/` plus its path relative to `root`.
    pub fn from_dir(root: &Path, name: impl Into<String>) -> Result<Self> {
        let mut files = Vec::new();
        for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            let entry = entry?;
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let logical = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            files.push(PackageFile {
                content_path: entry.path().to_path_buf(),
                logical_path: format!("/{logical}"),
                is_regular: entry.file_type().is_file(),
            });
        }

        let package = Self {
            name: name.into(),
            files,
        };
        debug!(
            package = %package.name,
            entries = package.files.len(),
            "package tree walked"
        );
        Ok(package)
    }

    /// A package holding a single file. The file need not exist.
    pub fn single(
        name: impl Into<String>,
        content_path: impl Into<PathBuf>,
        logical_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            files: vec![PackageFile {
                content_path: content_path.into(),
                logical_path: logical_path.into(),
                is_regular: true,
            }],
        }
    }

    /// Logical paths of every entry, symlinks and directories included.
    pub fn siblings(&self) -> BTreeSet<String> {
        self.files.iter().map(|f| f.logical_path.clone()).collect()
    }

    pub fn regular_files(&self) -> impl Iterator<Item = &PackageFile> {
        self.files.iter().filter(|f| f.is_regular)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn walks_tree_into_logical_paths() {
        let root = tempdir().unwrap();
        fs::create_dir_all(root.path().join("usr/lib64")).unwrap();
        fs::write(root.path().join("usr/lib64/libfoo.so.1.0"), b"x").unwrap();
        fs::write(root.path().join("usr/lib64/README"), b"x").unwrap();

        let package = Package::from_dir(root.path(), "libfoo1").unwrap();
        let siblings = package.siblings();

        assert!(siblings.contains("/usr"));
        assert!(siblings.contains("/usr/lib64"));
        assert!(siblings.contains("/usr/lib64/libfoo.so.1.0"));

        let regular: Vec<_> = package
            .regular_files()
            .map(|f| f.logical_path.as_str())
            .collect();
        assert_eq!(regular, vec!["/usr/lib64/README", "/usr/lib64/libfoo.so.1.0"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_siblings_but_not_analyzed() {
        let root = tempdir().unwrap();
        fs::create_dir_all(root.path().join("lib64")).unwrap();
        fs::write(root.path().join("lib64/libutil-2.29.so"), b"x").unwrap();
        std::os::unix::fs::symlink("libutil-2.29.so", root.path().join("lib64/libutil.so.1"))
            .unwrap();

        let package = Package::from_dir(root.path(), "libutil1").unwrap();

        assert!(package.siblings().contains("/lib64/libutil.so.1"));
        assert_eq!(package.regular_files().count(), 1);
    }

    #[test]
    fn missing_root_is_an_error() {
        let root = tempdir().unwrap();
        assert!(Package::from_dir(&root.path().join("nope"), "x").is_err());
    }

    #[test]
    fn single_file_package() {
        let package = Package::single("libfake", "/tmp/x", "/lib64/libutil-2.29.so");
        assert_eq!(
            package.siblings(),
            BTreeSet::from(["/lib64/libutil-2.29.so".to_string()])
        );
    }
}

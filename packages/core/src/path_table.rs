//! Identifier → path mapping.
//!
//! Every operation in pathkeys takes a string that is either a literal path or
//! an identifier. A string naming an existing file or directory always wins;
//! only otherwise is it looked up in the table.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::RootPolicy;
use crate::error::{Error, Result};

/// The reserved identifier for the session root directory.
pub const ROOT_IDENTIFIER: &str = "root";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    File,
    Directory,
}

impl std::fmt::Display for PathKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathKind::File => write!(f, "regular file"),
            PathKind::Directory => write!(f, "directory"),
        }
    }
}

/// Stat `path` (following symlinks). `None` if it does not exist or is
/// neither a regular file nor a directory.
pub fn path_kind(path: &Path) -> Option<PathKind> {
    let metadata = fs::metadata(path).ok()?;
    if metadata.is_file() {
        Some(PathKind::File)
    } else if metadata.is_dir() {
        Some(PathKind::Directory)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct PathTable {
    entries: HashMap<String, PathBuf>,
    /// Last root set; restored by `clear`.
    root: PathBuf,
    policy: RootPolicy,
}

impl PathTable {
    /// Create a table rooted at the process working directory.
    pub fn new(policy: RootPolicy) -> Result<Self> {
        let cwd = std::env::current_dir().map_err(|source| Error::Io {
            path: PathBuf::from("."),
            source,
        })?;
        Self::with_root(cwd, policy)
    }

    pub fn with_root(root: impl Into<PathBuf>, policy: RootPolicy) -> Result<Self> {
        let root = root.into();
        check_kind(&root, PathKind::Directory)?;

        let mut table = Self {
            entries: HashMap::new(),
            root: root.clone(),
            policy,
        };
        table.entries.insert(ROOT_IDENTIFIER.to_string(), root);
        Ok(table)
    }

    pub fn policy(&self) -> RootPolicy {
        self.policy
    }

    /// The current root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a literal path or an identifier.
    pub fn resolve(&self, id_or_path: &str) -> Result<PathBuf> {
        let literal = Path::new(id_or_path);
        if path_kind(literal).is_some() {
            return Ok(literal.to_path_buf());
        }

        self.entries
            .get(id_or_path)
            .cloned()
            .ok_or_else(|| Error::UnknownIdentifier {
                id: id_or_path.to_string(),
            })
    }

    pub fn get(&self, id: &str) -> Option<&Path> {
        self.entries.get(id).map(PathBuf::as_path)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn store_file(&mut self, id: &str, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        if id == ROOT_IDENTIFIER {
            self.check_root_writable(id)?;
            return Err(Error::InvalidPathKind {
                path,
                expected: PathKind::Directory,
            });
        }
        check_kind(&path, PathKind::File)?;
        self.insert(id, path);
        Ok(())
    }

    pub fn store_directory(&mut self, id: &str, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        if id == ROOT_IDENTIFIER {
            self.check_root_writable(id)?;
        }
        check_kind(&path, PathKind::Directory)?;
        if id == ROOT_IDENTIFIER {
            self.root = path.clone();
        }
        self.insert(id, path);
        Ok(())
    }

    /// Point the root at `id_or_path`, which must resolve to a directory.
    pub fn set_root(&mut self, id_or_path: &str) -> Result<()> {
        let path = self.resolve(id_or_path)?;
        check_kind(&path, PathKind::Directory)?;
        log::debug!("root set to {}", path.display());
        self.root = path.clone();
        self.entries.insert(ROOT_IDENTIFIER.to_string(), path);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<PathBuf> {
        if id == ROOT_IDENTIFIER {
            self.check_root_writable(id)?;
        }
        let removed = self
            .entries
            .remove(id)
            .ok_or_else(|| Error::UnknownIdentifier { id: id.to_string() })?;
        log::debug!("removed identifier {:?}", id);
        Ok(removed)
    }

    /// Drop every identifier, keeping the root.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.entries
            .insert(ROOT_IDENTIFIER.to_string(), self.root.clone());
    }

    /// All identifiers, sorted.
    pub fn identifiers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// `(identifier, path)` pairs sorted by identifier.
    pub fn entries(&self) -> Vec<(&str, &Path)> {
        let mut entries: Vec<(&str, &Path)> = self
            .entries
            .iter()
            .map(|(id, path)| (id.as_str(), path.as_path()))
            .collect();
        entries.sort();
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, id: &str, path: PathBuf) {
        log::debug!("stored {:?} -> {}", id, path.display());
        self.entries.insert(id.to_string(), path);
    }

    fn check_root_writable(&self, id: &str) -> Result<()> {
        match self.policy {
            RootPolicy::Protected => Err(Error::ReservedIdentifier { id: id.to_string() }),
            RootPolicy::Unprotected => Ok(()),
        }
    }
}

fn check_kind(path: &Path, expected: PathKind) -> Result<()> {
    if !path.exists() {
        return Err(Error::PathNotFound {
            path: path.to_path_buf(),
        });
    }
    match path_kind(path) {
        Some(kind) if kind == expected => Ok(()),
        _ => Err(Error::InvalidPathKind {
            path: path.to_path_buf(),
            expected,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, PathTable) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let table = PathTable::with_root(dir.path(), RootPolicy::Protected).unwrap();
        (dir, table)
    }

    #[test]
    fn root_present_after_construction() {
        let (dir, table) = fixture();
        assert_eq!(table.resolve(ROOT_IDENTIFIER).unwrap(), dir.path());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn new_uses_working_directory() {
        let table = PathTable::new(RootPolicy::Protected).unwrap();
        assert_eq!(table.root(), std::env::current_dir().unwrap());
    }

    #[test]
    fn stored_identifier_resolves() {
        let (dir, mut table) = fixture();
        let file = dir.path().join("a.txt");
        table.store_file("data", &file).unwrap();
        assert_eq!(table.resolve("data").unwrap(), file);
    }

    #[test]
    fn literal_path_wins_over_identifier() {
        let (dir, mut table) = fixture();
        let file = dir.path().join("a.txt");
        let sub = dir.path().join("sub");
        let literal = file.to_str().unwrap();
        table.store_directory(literal, &sub).unwrap();
        assert_eq!(table.resolve(literal).unwrap(), file);
    }

    #[test]
    fn unknown_identifier() {
        let (_dir, table) = fixture();
        let err = table.resolve("nope").unwrap_err();
        assert!(matches!(err, Error::UnknownIdentifier { id } if id == "nope"));
    }

    #[test]
    fn store_checks_kind() {
        let (dir, mut table) = fixture();
        let err = table.store_file("f", dir.path().join("sub")).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPathKind {
                expected: PathKind::File,
                ..
            }
        ));
        let err = table
            .store_directory("d", dir.path().join("a.txt"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPathKind {
                expected: PathKind::Directory,
                ..
            }
        ));
        assert!(!table.contains("f"));
        assert!(!table.contains("d"));
    }

    #[test]
    fn store_missing_path() {
        let (dir, mut table) = fixture();
        let err = table
            .store_file("ghost", dir.path().join("ghost.txt"))
            .unwrap_err();
        assert!(matches!(err, Error::PathNotFound { .. }));
    }

    #[test]
    fn store_overwrites() {
        let (dir, mut table) = fixture();
        table.store_directory("d", dir.path()).unwrap();
        table.store_directory("d", dir.path().join("sub")).unwrap();
        assert_eq!(table.get("d"), Some(dir.path().join("sub").as_path()));
    }

    #[test]
    fn remove_then_unknown() {
        let (dir, mut table) = fixture();
        table.store_directory("d", dir.path()).unwrap();
        table.remove("d").unwrap();
        assert!(matches!(
            table.remove("d").unwrap_err(),
            Error::UnknownIdentifier { .. }
        ));
    }

    #[test]
    fn protected_root_rejects_generic_writes() {
        let (dir, mut table) = fixture();
        let sub = dir.path().join("sub");
        assert!(matches!(
            table.store_directory(ROOT_IDENTIFIER, &sub).unwrap_err(),
            Error::ReservedIdentifier { .. }
        ));
        assert!(matches!(
            table
                .store_file(ROOT_IDENTIFIER, dir.path().join("a.txt"))
                .unwrap_err(),
            Error::ReservedIdentifier { .. }
        ));
        assert!(matches!(
            table.remove(ROOT_IDENTIFIER).unwrap_err(),
            Error::ReservedIdentifier { .. }
        ));
        assert_eq!(table.root(), dir.path());
        assert_eq!(table.resolve(ROOT_IDENTIFIER).unwrap(), dir.path());
    }

    #[test]
    fn unprotected_root_must_stay_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "a").unwrap();
        let mut table = PathTable::with_root(dir.path(), RootPolicy::Unprotected).unwrap();

        let err = table.store_file(ROOT_IDENTIFIER, &file).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPathKind {
                expected: PathKind::Directory,
                ..
            }
        ));
        assert_eq!(table.resolve(ROOT_IDENTIFIER).unwrap(), dir.path());
    }

    #[test]
    fn unprotected_root_store_acts_like_set_root() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let mut table = PathTable::with_root(dir.path(), RootPolicy::Unprotected).unwrap();

        table.store_directory(ROOT_IDENTIFIER, &sub).unwrap();
        assert_eq!(table.root(), sub);

        table.remove(ROOT_IDENTIFIER).unwrap();
        assert!(!table.contains(ROOT_IDENTIFIER));
        table.clear();
        assert_eq!(table.resolve(ROOT_IDENTIFIER).unwrap(), sub);
    }

    #[test]
    fn set_root_requires_directory() {
        let (dir, mut table) = fixture();
        let err = table
            .set_root(dir.path().join("a.txt").to_str().unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPathKind { .. }));
        assert_eq!(table.root(), dir.path());
    }

    #[test]
    fn clear_keeps_last_root() {
        let (dir, mut table) = fixture();
        let sub = dir.path().join("sub");
        table.store_directory("data", &sub).unwrap();
        table.set_root("data").unwrap();
        table.clear();
        assert_eq!(table.identifiers(), vec![ROOT_IDENTIFIER.to_string()]);
        assert_eq!(table.resolve(ROOT_IDENTIFIER).unwrap(), sub);
    }

    #[test]
    fn identifiers_sorted() {
        let (dir, mut table) = fixture();
        table.store_directory("zeta", dir.path()).unwrap();
        table.store_directory("alpha", dir.path()).unwrap();
        assert_eq!(table.identifiers(), vec!["alpha", "root", "zeta"]);
    }
}

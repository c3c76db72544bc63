//! Recursive file discovery.

use std::cmp::Ordering;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::WalkErrorPolicy;
use crate::error::{Error, Result};

/// File name filter. A literal suffix, not a glob: callers pass the leading
/// dot themselves (".txt").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extension {
    Any,
    Suffix(String),
}

impl Extension {
    /// `"*"`, `".*"` and `""` match everything; anything else is a suffix.
    pub fn parse(extension: &str) -> Self {
        match extension {
            "" | "*" | ".*" => Extension::Any,
            suffix => Extension::Suffix(suffix.to_string()),
        }
    }

    pub fn matches(&self, file_name: &OsStr) -> bool {
        match self {
            Extension::Any => true,
            Extension::Suffix(suffix) => file_name.to_string_lossy().ends_with(suffix.as_str()),
        }
    }
}

impl From<&str> for Extension {
    fn from(extension: &str) -> Self {
        Extension::parse(extension)
    }
}

impl From<String> for Extension {
    fn from(extension: String) -> Self {
        Extension::parse(&extension)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryWalker {
    policy: WalkErrorPolicy,
}

impl DirectoryWalker {
    pub fn new(policy: WalkErrorPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> WalkErrorPolicy {
        self.policy
    }

    /// Regular files under `start` whose names end with `extension`.
    ///
    /// Results come depth-first. The files directly inside a directory come
    /// before anything found in its subdirectories, and both files and
    /// subdirectories keep the order the filesystem lists them in. A `start`
    /// that cannot be read as a directory gives an empty result.
    pub fn find_files(
        &self,
        extension: impl Into<Extension>,
        start: &Path,
        recursive: bool,
    ) -> Result<Vec<PathBuf>> {
        let extension = extension.into();

        if let Err(e) = fs::read_dir(start) {
            log::debug!("cannot list {}: {}", start.display(), e);
            return Ok(Vec::new());
        }

        let walker = WalkDir::new(start)
            .min_depth(1)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .follow_links(true)
            .sort_by(files_before_directories);

        let mut found = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    self.on_error(start, e)?;
                    continue;
                }
            };

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    self.on_error(start, e)?;
                    continue;
                }
            };

            if metadata.is_dir() {
                log::trace!("descending into {}", entry.path().display());
            } else if metadata.is_file() && extension.matches(entry.file_name()) {
                found.push(entry.into_path());
            }
        }

        log::debug!(
            "found {} file(s) under {} matching {:?}",
            found.len(),
            start.display(),
            extension
        );
        Ok(found)
    }

    fn on_error(&self, start: &Path, error: walkdir::Error) -> Result<()> {
        let path = error.path().unwrap_or(start).to_path_buf();
        match self.policy {
            WalkErrorPolicy::SkipAndWarn => {
                log::warn!("skipping {}: {}", path.display(), error);
                Ok(())
            }
            WalkErrorPolicy::FailFast => Err(Error::Walk {
                path,
                source: error,
            }),
        }
    }
}

/// Stable, so each group keeps its enumeration order.
fn files_before_directories(a: &DirEntry, b: &DirEntry) -> Ordering {
    is_directory(a).cmp(&is_directory(b))
}

// Entries are not stat'ed yet while siblings are sorted.
fn is_directory(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_dir() || (file_type.is_symlink() && entry.path().is_dir())
}

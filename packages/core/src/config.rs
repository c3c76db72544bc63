//! Session configuration.
//!
//! A `Config` can be built in code, loaded from JSON, and adjusted from the
//! environment:
//!
//! ```json
//! {
//!     "root": "/srv/data",
//!     "root_policy": "protected",
//!     "walk_errors": "skip_and_warn",
//!     "encoding": "utf8",
//!     "identifiers": { "input": "/srv/data/input.txt" }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pathkeys_text::Encoding;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Overrides the discovered root directory.
pub const ROOT_ENV_VAR: &str = "PATHKEYS_ROOT";
/// Overrides the stream encoding.
pub const ENCODING_ENV_VAR: &str = "PATHKEYS_ENCODING";

/// Whether generic identifier storage may touch the reserved root entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootPolicy {
    /// Only `set_root` changes the root; storing or removing "root" fails.
    #[default]
    Protected,
    /// `store_directory("root", ..)` behaves like `set_root` and `remove("root")`
    /// drops the entry until the next `clear`.
    Unprotected,
}

/// What a directory walk does with an entry it cannot stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkErrorPolicy {
    #[default]
    SkipAndWarn,
    FailFast,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory; the working directory when unset.
    pub root: Option<PathBuf>,
    pub root_policy: RootPolicy,
    pub walk_errors: WalkErrorPolicy,
    pub encoding: Encoding,
    /// Identifiers registered when the session is created.
    pub identifiers: BTreeMap<String, PathBuf>,
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config {
            message: e.to_string(),
        })
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|e| Error::Config {
            message: format!("{}: {}", path.display(), e),
        })
    }

    /// Apply `PATHKEYS_ROOT` and `PATHKEYS_ENCODING` from the process environment.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ROOT_ENV_VAR) {
            if !root.is_empty() {
                self.root = Some(PathBuf::from(root));
            }
        }
        if let Some(encoding) = lookup(ENCODING_ENV_VAR) {
            self.encoding = encoding
                .parse()
                .map_err(|message| Error::Config { message })?;
        }
        Ok(self)
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_root_policy(mut self, policy: RootPolicy) -> Self {
        self.root_policy = policy;
        self
    }

    pub fn with_walk_errors(mut self, policy: WalkErrorPolicy) -> Self {
        self.walk_errors = policy;
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_identifier(mut self, id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.identifiers.insert(id.into(), path.into());
        self
    }
}

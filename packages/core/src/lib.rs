//! # pathkeys-core
//!
//! Refer to files and directories by short identifiers, keep at most one
//! input and one output stream per file, and discover files by extension.
//!
//! - `PathTable`: identifier → path, with a reserved `"root"` entry
//! - `StreamRegistry`: open input/output text streams keyed by resolved path
//! - `DirectoryWalker`: recursive, extension-filtered file search
//! - `Session`: owns all three and is what callers normally use
//!
//! ## Example
//!
//! ```rust,no_run
//! use pathkeys_core::Session;
//!
//! let mut session = Session::new()?;
//! session.store_directory("data", "/srv/data")?;
//! for path in session.find_files(".csv", "data", true)? {
//!     let rows = session.read_matrix(path.to_str().unwrap(), "\r\n", ",")?;
//!     println!("{}: {} rows", path.display(), rows.len());
//! }
//! # Ok::<(), pathkeys_core::Error>(())
//! ```

pub mod config;
mod error;
pub mod path_table;
pub mod registry;
pub mod session;
pub mod stream;
pub mod walker;

pub use config::{Config, RootPolicy, WalkErrorPolicy};
pub use error::{Direction, Error, Result};
pub use path_table::{path_kind, PathKind, PathTable, ROOT_IDENTIFIER};
pub use registry::StreamRegistry;
pub use session::Session;
pub use stream::{InputHandle, OutputHandle, StreamState};
pub use walker::{DirectoryWalker, Extension};

pub use pathkeys_text::Encoding;

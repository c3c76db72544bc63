//! Live input and output streams, keyed by resolved path.
//!
//! Each file has at most one input and at most one output stream. Paths are
//! made absolute before lookup, so `a.txt`, `./a.txt` and `/work/a.txt` name
//! the same stream.
//! Opening a second is `AlreadyOpen`; closing a missing one is `NotOpen`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pathkeys_text::Encoding;

use crate::error::{Direction, Error, Result};
use crate::path_table::{path_kind, PathKind, PathTable};
use crate::stream::{InputHandle, OutputHandle};

#[derive(Debug, Default)]
pub struct StreamRegistry {
    inputs: BTreeMap<PathBuf, InputHandle>,
    outputs: BTreeMap<PathBuf, OutputHandle>,
    encoding: Encoding,
}

impl StreamRegistry {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            encoding,
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn open_input(&mut self, paths: &PathTable, id_or_path: &str) -> Result<&mut InputHandle> {
        let path = paths.resolve(id_or_path)?;
        let key = stream_key(&path)?;
        if self.inputs.contains_key(&key) {
            return Err(Error::AlreadyOpen {
                path,
                direction: Direction::Input,
            });
        }
        if path_kind(&path) == Some(PathKind::Directory) {
            return Err(Error::InvalidPathKind {
                path,
                expected: PathKind::File,
            });
        }

        let handle = InputHandle::open(id_or_path, &path)?;
        log::debug!("opened input {:?} at {}", id_or_path, path.display());
        Ok(self.inputs.entry(key).or_insert(handle))
    }

    pub fn open_output(
        &mut self,
        paths: &PathTable,
        id_or_path: &str,
        append: bool,
    ) -> Result<&mut OutputHandle> {
        let path = resolve_output_target(paths, id_or_path)?;
        let key = stream_key(&path)?;
        if self.outputs.contains_key(&key) {
            return Err(Error::AlreadyOpen {
                path,
                direction: Direction::Output,
            });
        }
        if path_kind(&path) == Some(PathKind::Directory) {
            return Err(Error::InvalidPathKind {
                path,
                expected: PathKind::File,
            });
        }

        let handle = OutputHandle::open(id_or_path, &path, append)?;
        log::debug!(
            "opened output {:?} at {} ({})",
            id_or_path,
            path.display(),
            if append { "append" } else { "truncate" }
        );
        Ok(self.outputs.entry(key).or_insert(handle))
    }

    pub fn close_input(&mut self, paths: &PathTable, id_or_path: &str) -> Result<()> {
        let path = paths.resolve(id_or_path)?;
        self.inputs.remove(&stream_key(&path)?).ok_or(Error::NotOpen {
            path: path.clone(),
            direction: Direction::Input,
        })?;
        log::debug!("closed input {}", path.display());
        Ok(())
    }

    /// Flush and close. The handle is deregistered even if the flush fails.
    pub fn close_output(&mut self, paths: &PathTable, id_or_path: &str) -> Result<()> {
        let path = paths.resolve(id_or_path)?;
        let mut handle = self.outputs.remove(&stream_key(&path)?).ok_or(Error::NotOpen {
            path: path.clone(),
            direction: Direction::Output,
        })?;
        log::debug!("closed output {}", path.display());
        handle.flush()
    }

    pub fn input(&mut self, paths: &PathTable, id_or_path: &str) -> Result<&mut InputHandle> {
        let path = paths.resolve(id_or_path)?;
        match self.inputs.get_mut(&stream_key(&path)?) {
            Some(handle) => Ok(handle),
            None => Err(Error::NotOpen {
                path,
                direction: Direction::Input,
            }),
        }
    }

    pub fn output(&mut self, paths: &PathTable, id_or_path: &str) -> Result<&mut OutputHandle> {
        let path = paths.resolve(id_or_path)?;
        match self.outputs.get_mut(&stream_key(&path)?) {
            Some(handle) => Ok(handle),
            None => Err(Error::NotOpen {
                path,
                direction: Direction::Output,
            }),
        }
    }

    pub fn rewind_input(&mut self, paths: &PathTable, id_or_path: &str) -> Result<()> {
        self.input(paths, id_or_path)?.rewind()
    }

    pub fn read_line(&mut self, paths: &PathTable, id_or_path: &str) -> Result<String> {
        let encoding = self.encoding;
        self.input(paths, id_or_path)?.read_line(encoding)
    }

    pub fn write_line(&mut self, paths: &PathTable, id_or_path: &str, text: &str) -> Result<()> {
        let encoding = self.encoding;
        self.output(paths, id_or_path)?.write_line(text, encoding)
    }

    pub fn flush_output(&mut self, paths: &PathTable, id_or_path: &str) -> Result<()> {
        self.output(paths, id_or_path)?.flush()
    }

    /// Read a whole file. An open input stream is rewound and read to the
    /// end; otherwise the file is opened for this call only and the registry
    /// is left as it was.
    pub fn read_whole_file(&mut self, paths: &PathTable, id_or_path: &str) -> Result<String> {
        let path = paths.resolve(id_or_path)?;
        let encoding = self.encoding;

        if let Some(handle) = self.inputs.get_mut(&stream_key(&path)?) {
            return handle.read_all(encoding);
        }
        if path_kind(&path) == Some(PathKind::Directory) {
            return Err(Error::InvalidPathKind {
                path,
                expected: PathKind::File,
            });
        }

        let mut handle = InputHandle::open(id_or_path, &path)?;
        handle.read_all(encoding)
    }

    pub fn is_input_open(&self, path: &Path) -> bool {
        stream_key(path).is_ok_and(|key| self.inputs.contains_key(&key))
    }

    pub fn is_output_open(&self, path: &Path) -> bool {
        stream_key(path).is_ok_and(|key| self.outputs.contains_key(&key))
    }

    /// `"identifier | path"` for every open input, sorted.
    pub fn list_open_inputs(&self) -> Vec<String> {
        describe(self.inputs.values().map(|h| (h.id(), h.path())))
    }

    /// `"identifier | path"` for every open output, sorted.
    pub fn list_open_outputs(&self) -> Vec<String> {
        describe(self.outputs.values().map(|h| (h.id(), h.path())))
    }

    pub fn open_count(&self) -> usize {
        self.inputs.len() + self.outputs.len()
    }

    /// Close every stream. All handles are dropped; the first flush failure
    /// is returned.
    pub fn close_all(&mut self) -> Result<()> {
        self.inputs.clear();

        let mut first_error = None;
        for (path, mut handle) in std::mem::take(&mut self.outputs) {
            if let Err(e) = handle.flush() {
                log::warn!("failed to flush {} on close: {}", path.display(), e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Outputs may name a file that does not exist yet: a string that is neither
/// an existing path nor a known identifier is taken literally when its parent
/// directory exists.
fn resolve_output_target(paths: &PathTable, id_or_path: &str) -> Result<PathBuf> {
    match paths.resolve(id_or_path) {
        Ok(path) => Ok(path),
        Err(Error::UnknownIdentifier { id }) => {
            let literal = Path::new(id_or_path);
            let parent = match literal.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            let has_file_name = literal.file_name().is_some();
            if has_file_name && path_kind(parent) == Some(PathKind::Directory) {
                Ok(literal.to_path_buf())
            } else {
                Err(Error::UnknownIdentifier { id })
            }
        }
        Err(e) => Err(e),
    }
}

/// Absolute form of a resolved path with `.` components dropped. Symlinks
/// and `..` are left alone.
fn stream_key(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn describe<'a>(handles: impl Iterator<Item = (&'a str, &'a Path)>) -> Vec<String> {
    let mut listing: Vec<String> = handles
        .map(|(id, path)| format!("{} | {}", id, path.display()))
        .collect();
    listing.sort();
    listing
}

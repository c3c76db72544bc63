//! One logical session: a path table, its streams, and the walker.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use pathkeys_text::{split, split_matrix};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::path_table::{path_kind, PathKind, PathTable};
use crate::registry::StreamRegistry;
use crate::stream::{InputHandle, OutputHandle};
use crate::walker::{DirectoryWalker, Extension};

/// Owns every piece of mutable state. Create one per logical session and
/// pass it by reference.
#[derive(Debug)]
pub struct Session {
    paths: PathTable,
    streams: StreamRegistry,
    walker: DirectoryWalker,
    config: Config,
}

impl Session {
    /// A session rooted at the working directory, default policies.
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let mut paths = match &config.root {
            Some(root) => PathTable::with_root(root, config.root_policy)?,
            None => PathTable::new(config.root_policy)?,
        };

        for (id, path) in &config.identifiers {
            match path_kind(path) {
                Some(PathKind::Directory) => paths.store_directory(id, path)?,
                _ => paths.store_file(id, path)?,
            }
        }

        log::debug!("session rooted at {}", paths.root().display());
        Ok(Self {
            paths,
            streams: StreamRegistry::new(config.encoding),
            walker: DirectoryWalker::new(config.walk_errors),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn paths(&self) -> &PathTable {
        &self.paths
    }

    pub fn streams(&self) -> &StreamRegistry {
        &self.streams
    }

    pub fn resolve(&self, id_or_path: &str) -> Result<PathBuf> {
        self.paths.resolve(id_or_path)
    }

    pub fn store_file(&mut self, id: &str, path: impl Into<PathBuf>) -> Result<()> {
        self.paths.store_file(id, path)
    }

    pub fn store_directory(&mut self, id: &str, path: impl Into<PathBuf>) -> Result<()> {
        self.paths.store_directory(id, path)
    }

    pub fn set_root(&mut self, id_or_path: &str) -> Result<()> {
        self.paths.set_root(id_or_path)
    }

    pub fn root(&self) -> &Path {
        self.paths.root()
    }

    pub fn remove(&mut self, id: &str) -> Result<PathBuf> {
        self.paths.remove(id)
    }

    /// Forget every identifier except the root. Open streams are untouched.
    pub fn clear(&mut self) {
        self.paths.clear()
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.paths.identifiers()
    }

    pub fn exists(&self, id_or_path: &str) -> bool {
        self.kind(id_or_path).is_some()
    }

    pub fn kind(&self, id_or_path: &str) -> Option<PathKind> {
        let path = self.paths.resolve(id_or_path).ok()?;
        path_kind(&path)
    }

    pub fn open_input(&mut self, id_or_path: &str) -> Result<&mut InputHandle> {
        self.streams.open_input(&self.paths, id_or_path)
    }

    pub fn open_output(&mut self, id_or_path: &str, append: bool) -> Result<&mut OutputHandle> {
        self.streams.open_output(&self.paths, id_or_path, append)
    }

    pub fn close_input(&mut self, id_or_path: &str) -> Result<()> {
        self.streams.close_input(&self.paths, id_or_path)
    }

    pub fn close_output(&mut self, id_or_path: &str) -> Result<()> {
        self.streams.close_output(&self.paths, id_or_path)
    }

    pub fn rewind_input(&mut self, id_or_path: &str) -> Result<()> {
        self.streams.rewind_input(&self.paths, id_or_path)
    }

    pub fn read_line(&mut self, id_or_path: &str) -> Result<String> {
        self.streams.read_line(&self.paths, id_or_path)
    }

    pub fn write_line(&mut self, id_or_path: &str, text: &str) -> Result<()> {
        self.streams.write_line(&self.paths, id_or_path, text)
    }

    pub fn flush_output(&mut self, id_or_path: &str) -> Result<()> {
        self.streams.flush_output(&self.paths, id_or_path)
    }

    pub fn read_whole_file(&mut self, id_or_path: &str) -> Result<String> {
        self.streams.read_whole_file(&self.paths, id_or_path)
    }

    pub fn is_input_open(&self, id_or_path: &str) -> bool {
        self.paths
            .resolve(id_or_path)
            .is_ok_and(|path| self.streams.is_input_open(&path))
    }

    pub fn is_output_open(&self, id_or_path: &str) -> bool {
        self.paths
            .resolve(id_or_path)
            .is_ok_and(|path| self.streams.is_output_open(&path))
    }

    pub fn list_open_inputs(&self) -> Vec<String> {
        self.streams.list_open_inputs()
    }

    pub fn list_open_outputs(&self) -> Vec<String> {
        self.streams.list_open_outputs()
    }

    pub fn close_all(&mut self) -> Result<()> {
        self.streams.close_all()
    }

    /// Close every stream and clear the table back to the root entry.
    pub fn reset(&mut self) -> Result<()> {
        let closed = self.streams.close_all();
        self.paths.clear();
        closed
    }

    /// The whole file split on any character in `delimiters`.
    pub fn read_vector(&mut self, id_or_path: &str, delimiters: &str) -> Result<Vec<String>> {
        let text = self.read_whole_file(id_or_path)?;
        Ok(split(&text, delimiters))
    }

    pub fn read_vector_as<T>(&mut self, id_or_path: &str, delimiters: &str) -> Result<Vec<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.read_vector(id_or_path, delimiters)?
            .iter()
            .map(|field| parse_field(field))
            .collect()
    }

    /// Rows split on `row_delimiters`, each row split on `column_delimiters`.
    pub fn read_matrix(
        &mut self,
        id_or_path: &str,
        row_delimiters: &str,
        column_delimiters: &str,
    ) -> Result<Vec<Vec<String>>> {
        let text = self.read_whole_file(id_or_path)?;
        Ok(split_matrix(&text, row_delimiters, column_delimiters))
    }

    pub fn read_matrix_as<T>(
        &mut self,
        id_or_path: &str,
        row_delimiters: &str,
        column_delimiters: &str,
    ) -> Result<Vec<Vec<T>>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.read_matrix(id_or_path, row_delimiters, column_delimiters)?
            .iter()
            .map(|row| {
                row.iter()
                    .map(|field| parse_field(field))
                    .collect::<Result<Vec<T>>>()
            })
            .collect()
    }

    /// Find files under `start`, an identifier or a path. A start that is
    /// neither is walked literally, which yields nothing.
    pub fn find_files(
        &self,
        extension: impl Into<Extension>,
        start: &str,
        recursive: bool,
    ) -> Result<Vec<PathBuf>> {
        let start = match self.paths.resolve(start) {
            Ok(path) => path,
            Err(Error::UnknownIdentifier { .. }) => PathBuf::from(start),
            Err(e) => return Err(e),
        };
        self.walker.find_files(extension, &start, recursive)
    }
}

fn parse_field<T>(field: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    field.parse::<T>().map_err(|e| Error::Parse {
        field: field.to_string(),
        message: e.to_string(),
    })
}

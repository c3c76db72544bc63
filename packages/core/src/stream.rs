//! Open text streams bound to one resolved path.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use pathkeys_text::Encoding;

use crate::error::{Error, Result};

/// Condition flags of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    #[default]
    Good,
    /// The last read reached the end of the file.
    Eof,
    /// An I/O operation failed; the stream must be rewound (input) or
    /// reopened (output) before further use.
    Failed,
}

/// An open input stream.
#[derive(Debug)]
pub struct InputHandle {
    id: String,
    path: PathBuf,
    reader: BufReader<File>,
    state: StreamState,
}

impl InputHandle {
    pub(crate) fn open(id: &str, path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            id: id.to_string(),
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            state: StreamState::Good,
        })
    }

    /// The identifier (or literal path) the stream was opened with.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Read one line with the trailing `\n` removed. A `\r` from CRLF files
    /// is left in place. A line that fails to decode is not consumed.
    pub fn read_line(&mut self, encoding: Encoding) -> Result<String> {
        match self.state {
            StreamState::Good => {}
            StreamState::Eof => return Err(self.not_readable("end of stream")),
            StreamState::Failed => return Err(self.not_readable("stream in error state")),
        }

        let mut buffer = Vec::new();
        let read = match self.reader.read_until(b'\n', &mut buffer) {
            Ok(read) => read,
            Err(source) => {
                self.state = StreamState::Failed;
                return Err(self.io_error(source));
            }
        };

        if read == 0 {
            self.state = StreamState::Eof;
            return Err(self.not_readable("end of stream"));
        }

        let terminated = buffer.last() == Some(&b'\n');
        if terminated {
            buffer.pop();
        }

        match encoding.decode_owned(buffer) {
            Ok(line) => {
                if !terminated {
                    // Final line without a terminator.
                    self.state = StreamState::Eof;
                }
                Ok(line)
            }
            Err(source) => {
                if let Err(e) = self.reader.seek_relative(-(read as i64)) {
                    self.state = StreamState::Failed;
                    return Err(self.io_error(e));
                }
                Err(self.decode_error(source))
            }
        }
    }

    /// Clear the state flags and seek to the first byte.
    pub fn rewind(&mut self) -> Result<()> {
        if let Err(source) = self.reader.seek(SeekFrom::Start(0)) {
            return Err(self.io_error(source));
        }
        self.state = StreamState::Good;
        Ok(())
    }

    /// Rewind, then read the whole file. If the contents fail to decode, the
    /// position and state from before the call are restored.
    pub fn read_all(&mut self, encoding: Encoding) -> Result<String> {
        let position = match self.reader.stream_position() {
            Ok(position) => position,
            Err(source) => return Err(self.io_error(source)),
        };
        let state = self.state;
        self.rewind()?;

        let mut buffer = Vec::new();
        if let Err(source) = self.reader.read_to_end(&mut buffer) {
            self.state = StreamState::Failed;
            return Err(self.io_error(source));
        }

        match encoding.decode_owned(buffer) {
            Ok(text) => {
                self.state = StreamState::Eof;
                Ok(text)
            }
            Err(source) => {
                if let Err(e) = self.reader.seek(SeekFrom::Start(position)) {
                    self.state = StreamState::Failed;
                    return Err(self.io_error(e));
                }
                self.state = state;
                Err(self.decode_error(source))
            }
        }
    }

    fn io_error(&self, source: std::io::Error) -> Error {
        Error::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn decode_error(&self, source: pathkeys_text::DecodeError) -> Error {
        Error::Decode {
            path: self.path.clone(),
            source,
        }
    }

    fn not_readable(&self, reason: &str) -> Error {
        Error::NotReadable {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

/// An open output stream. Buffered; flushed on close and on drop.
#[derive(Debug)]
pub struct OutputHandle {
    id: String,
    path: PathBuf,
    writer: BufWriter<File>,
    append: bool,
    state: StreamState,
}

impl OutputHandle {
    pub(crate) fn open(id: &str, path: &Path, append: bool) -> Result<Self> {
        let file = if append {
            OpenOptions::new().append(true).create(true).open(path)
        } else {
            File::create(path)
        }
        .map_err(|source| Error::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            id: id.to_string(),
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            append,
            state: StreamState::Good,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_append(&self) -> bool {
        self.append
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Write `text` as-is; no newline is added.
    ///
    /// Writes are buffered, so an I/O failure usually shows up on the next
    /// `flush` or on close. Once a write or flush has failed the handle is
    /// `Failed` and further writes give `NotWritable`.
    pub fn write_line(&mut self, text: &str, encoding: Encoding) -> Result<()> {
        if self.state == StreamState::Failed {
            return Err(Error::NotWritable {
                path: self.path.clone(),
                reason: "stream in error state".to_string(),
            });
        }

        let bytes = encoding.encode(text);
        self.writer.write_all(&bytes).map_err(|source| {
            self.state = StreamState::Failed;
            Error::Io {
                path: self.path.clone(),
                source,
            }
        })
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|source| {
            self.state = StreamState::Failed;
            Error::Io {
                path: self.path.clone(),
                source,
            }
        })
    }
}

impl Drop for OutputHandle {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            log::warn!("failed to flush {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn read_lines_keeps_carriage_return() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("crlf.txt");
        std::fs::write(&path, "one\r\ntwo\r\n").unwrap();

        let mut handle = InputHandle::open("crlf", &path).unwrap();
        assert_eq!(handle.read_line(Encoding::Utf8).unwrap(), "one\r");
        assert_eq!(handle.read_line(Encoding::Utf8).unwrap(), "two\r");
        assert!(matches!(
            handle.read_line(Encoding::Utf8).unwrap_err(),
            Error::NotReadable { .. }
        ));
        assert_eq!(handle.state(), StreamState::Eof);
    }

    #[test]
    fn unterminated_last_line_then_eof() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tail.txt");
        std::fs::write(&path, "a\nb").unwrap();

        let mut handle = InputHandle::open("tail", &path).unwrap();
        assert_eq!(handle.read_line(Encoding::Utf8).unwrap(), "a");
        assert_eq!(handle.read_line(Encoding::Utf8).unwrap(), "b");
        assert_eq!(handle.state(), StreamState::Eof);
        assert!(handle.read_line(Encoding::Utf8).is_err());

        handle.rewind().unwrap();
        assert_eq!(handle.state(), StreamState::Good);
        assert_eq!(handle.read_line(Encoding::Utf8).unwrap(), "a");
    }

    #[test]
    fn read_all_rewinds_first() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("all.txt");
        std::fs::write(&path, "x\ny\n").unwrap();

        let mut handle = InputHandle::open("all", &path).unwrap();
        handle.read_line(Encoding::Utf8).unwrap();
        assert_eq!(handle.read_all(Encoding::Utf8).unwrap(), "x\ny\n");
    }

    #[test]
    fn undecodable_line_is_not_consumed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bytes.txt");
        std::fs::write(&path, b"ok\n\xff\xfe\nnext\n").unwrap();

        let mut handle = InputHandle::open("bytes", &path).unwrap();
        assert_eq!(handle.read_line(Encoding::Utf8).unwrap(), "ok");
        for _ in 0..2 {
            assert!(matches!(
                handle.read_line(Encoding::Utf8).unwrap_err(),
                Error::Decode { .. }
            ));
            assert_eq!(handle.state(), StreamState::Good);
        }
        assert_eq!(handle.read_line(Encoding::Latin1).unwrap(), "\u{ff}\u{fe}");
        assert_eq!(handle.read_line(Encoding::Utf8).unwrap(), "next");
    }

    #[test]
    fn undecodable_unterminated_line_keeps_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tail.txt");
        std::fs::write(&path, b"a\n\xff").unwrap();

        let mut handle = InputHandle::open("tail", &path).unwrap();
        handle.read_line(Encoding::Utf8).unwrap();
        assert!(handle.read_line(Encoding::Utf8).is_err());
        assert_eq!(handle.state(), StreamState::Good);
        assert_eq!(handle.read_line(Encoding::Latin1).unwrap(), "\u{ff}");
        assert_eq!(handle.state(), StreamState::Eof);
    }

    #[test]
    fn failed_read_all_restores_position() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mixed.txt");
        std::fs::write(&path, b"ok\n\xff\n").unwrap();

        let mut handle = InputHandle::open("mixed", &path).unwrap();
        assert_eq!(handle.read_line(Encoding::Utf8).unwrap(), "ok");
        assert!(matches!(
            handle.read_all(Encoding::Utf8).unwrap_err(),
            Error::Decode { .. }
        ));
        assert_eq!(handle.state(), StreamState::Good);
        assert_eq!(handle.read_line(Encoding::Latin1).unwrap(), "\u{ff}");
    }

    #[test]
    fn open_missing_input() {
        let dir = TempDir::new().unwrap();
        let err = InputHandle::open("m", &dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, Error::OpenFailed { .. }));
    }

    #[test]
    fn output_truncates_or_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "old").unwrap();

        {
            let mut handle = OutputHandle::open("out", &path, true).unwrap();
            handle.write_line("+new", Encoding::Utf8).unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old+new");

        {
            let mut handle = OutputHandle::open("out", &path, false).unwrap();
            handle.write_line("fresh", Encoding::Utf8).unwrap();
            handle.flush().unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_flush_blocks_further_writes() {
        let mut handle = OutputHandle::open("full", Path::new("/dev/full"), false).unwrap();
        handle.write_line("buffered", Encoding::Utf8).unwrap();
        assert!(matches!(handle.flush().unwrap_err(), Error::Io { .. }));
        assert_eq!(handle.state(), StreamState::Failed);
        assert!(matches!(
            handle.write_line("more", Encoding::Utf8).unwrap_err(),
            Error::NotWritable { .. }
        ));
    }

    #[test]
    fn output_encodes_latin1() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latin.txt");
        {
            let mut handle = OutputHandle::open("latin", &path, false).unwrap();
            handle.write_line("é", Encoding::Latin1).unwrap();
        }
        assert_eq!(std::fs::read(&path).unwrap(), vec![0xe9]);
    }
}

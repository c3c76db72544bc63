//! # pathkeys-cli
//!
//! Command-line access to a pathkeys session.
//!
//! ```bash
//! # Text files anywhere under ./docs
//! pathkeys --id docs=./docs find .txt docs --recursive
//!
//! # First ten lines, CR left in place for CRLF files
//! pathkeys lines notes.txt -n 10
//!
//! # Whitespace/comma separated table, one row per line
//! pathkeys matrix table.csv --cols ,
//! ```

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pathkeys::text::{DEFAULT_COLUMN_DELIMITERS, DEFAULT_ROW_DELIMITERS};
use pathkeys::{Config, Encoding, Error as CoreError, Session, WalkErrorPolicy, ROOT_IDENTIFIER};

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// pathkeys - identifier-based file access
#[derive(Parser, Debug)]
#[command(name = "pathkeys")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Root directory (defaults to the working directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Register an identifier, repeatable
    #[arg(long = "id", value_name = "NAME=PATH", value_parser = parse_identifier)]
    pub identifiers: Vec<(String, PathBuf)>,

    /// Stream encoding: utf8, utf8_lossy or latin1
    #[arg(long)]
    pub encoding: Option<Encoding>,

    /// Abort a search on the first unreadable entry instead of skipping it
    #[arg(long)]
    pub fail_fast: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List files whose names end with EXTENSION ("*" for all)
    Find {
        extension: String,
        /// Identifier or directory to search
        #[arg(default_value = ROOT_IDENTIFIER)]
        start: String,
        #[arg(short, long)]
        recursive: bool,
    },
    /// Print a whole file
    Cat { target: String },
    /// Print lines from the start of a file
    Lines {
        target: String,
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
    /// Print a file's fields, one per line
    Vector {
        target: String,
        #[arg(short, long, default_value = " \t\r\n,;")]
        delimiters: String,
    },
    /// Print a file as rows of tab-separated fields
    Matrix {
        target: String,
        #[arg(long, default_value = DEFAULT_ROW_DELIMITERS)]
        rows: String,
        #[arg(long, default_value = DEFAULT_COLUMN_DELIMITERS)]
        cols: String,
    },
    /// List registered identifiers
    Ids,
}

fn parse_identifier(s: &str) -> Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=PATH, got {:?}", s)),
    }
}

/// Config file, then environment, then command-line flags.
pub fn build_config(args: &Args) -> Result<Config, CliError> {
    let mut config = match &args.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    }
    .apply_env()?;

    if let Some(root) = &args.root {
        config.root = Some(root.clone());
    }
    if let Some(encoding) = args.encoding {
        config.encoding = encoding;
    }
    if args.fail_fast {
        config.walk_errors = WalkErrorPolicy::FailFast;
    }
    for (name, path) in &args.identifiers {
        config.identifiers.insert(name.clone(), path.clone());
    }
    Ok(config)
}

pub fn run(args: &Args, out: &mut impl Write) -> Result<(), CliError> {
    let mut session = Session::with_config(build_config(args)?)?;
    execute(&mut session, &args.command, out)?;
    session.close_all()?;
    Ok(())
}

pub fn execute(
    session: &mut Session,
    command: &Command,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match command {
        Command::Find {
            extension,
            start,
            recursive,
        } => {
            for path in session.find_files(extension.as_str(), start, *recursive)? {
                writeln!(out, "{}", path.display())?;
            }
        }
        Command::Cat { target } => {
            let text = session.read_whole_file(target)?;
            write!(out, "{}", text)?;
        }
        Command::Lines { target, count } => {
            session.open_input(target)?;
            let mut printed = 0;
            while count.map_or(true, |limit| printed < limit) {
                match session.read_line(target) {
                    Ok(line) => writeln!(out, "{}", line)?,
                    Err(CoreError::NotReadable { .. }) => break,
                    Err(e) => return Err(e.into()),
                }
                printed += 1;
            }
            session.close_input(target)?;
        }
        Command::Vector { target, delimiters } => {
            for field in session.read_vector(target, delimiters)? {
                writeln!(out, "{}", field)?;
            }
        }
        Command::Matrix { target, rows, cols } => {
            for row in session.read_matrix(target, rows, cols)? {
                writeln!(out, "{}", row.join("\t"))?;
            }
        }
        Command::Ids => {
            for (id, path) in session.paths().entries() {
                writeln!(out, "{} | {}", id, path.display())?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn run_with(dir: &TempDir, argv: &[&str]) -> String {
        let root = dir.path().to_str().unwrap();
        let mut full = vec!["pathkeys", "--root", root];
        full.extend_from_slice(argv);
        let args = Args::try_parse_from(full).unwrap();
        let mut out = Vec::new();
        run(&args, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("table.txt"), "1 2\r\n3 4\r\n").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/notes.txt"), "a\nb\nc\n").unwrap();
        dir
    }

    #[test]
    fn parse_identifier_pairs() {
        assert_eq!(
            parse_identifier("data=/tmp/data").unwrap(),
            ("data".to_string(), PathBuf::from("/tmp/data"))
        );
        assert!(parse_identifier("data").is_err());
        assert!(parse_identifier("=x").is_err());
    }

    #[test]
    fn find_recursive_from_root() {
        let dir = fixture();
        let output = run_with(&dir, &["find", ".txt", "--recursive"]);
        let mut lines: Vec<&str> = output.lines().collect();
        lines.sort();
        let expected_notes = dir.path().join("sub/notes.txt");
        let expected_table = dir.path().join("table.txt");
        let mut expected = vec![
            expected_notes.to_str().unwrap(),
            expected_table.to_str().unwrap(),
        ];
        expected.sort();
        assert_eq!(lines, expected);
    }

    #[test]
    fn lines_with_identifier_and_count() {
        let dir = fixture();
        let notes = format!("notes={}", dir.path().join("sub/notes.txt").display());
        let output = run_with(&dir, &["--id", &notes, "lines", "notes", "-n", "2"]);
        assert_eq!(output, "a\nb\n");
    }

    #[test]
    fn lines_until_end() {
        let dir = fixture();
        let notes = dir.path().join("sub/notes.txt");
        let output = run_with(&dir, &["lines", notes.to_str().unwrap()]);
        assert_eq!(output, "a\nb\nc\n");
    }

    #[test]
    fn matrix_output() {
        let dir = fixture();
        let table = dir.path().join("table.txt");
        let output = run_with(&dir, &["matrix", table.to_str().unwrap()]);
        assert_eq!(output, "1\t2\n3\t4\n");
    }

    #[test]
    fn ids_lists_root() {
        let dir = fixture();
        let output = run_with(&dir, &["ids"]);
        assert_eq!(output, format!("root | {}\n", dir.path().display()));
    }

    #[test]
    fn unknown_target_is_an_error() {
        let dir = fixture();
        let args = Args::try_parse_from([
            "pathkeys",
            "--root",
            dir.path().to_str().unwrap(),
            "cat",
            "nothing-here",
        ])
        .unwrap();
        let err = run(&args, &mut Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            CliError::Core(CoreError::UnknownIdentifier { .. })
        ));
    }

    #[test]
    fn flags_override_config() {
        let args = Args::try_parse_from([
            "pathkeys",
            "--root",
            "/srv",
            "--encoding",
            "latin1",
            "--fail-fast",
            "ids",
        ])
        .unwrap();
        let config = build_config(&args).unwrap();
        assert_eq!(config.root, Some(PathBuf::from("/srv")));
        assert_eq!(config.encoding, Encoding::Latin1);
        assert_eq!(config.walk_errors, WalkErrorPolicy::FailFast);
    }
}

//! File sources: where logical paths are opened.
//!
//! # Responsibilities
//! - Define the "open by logical path" capability used by the handlers
//! - Serve a real directory without escaping its root
//! - Serve an in-memory file set (tests, embedded assets)
//!
//! # Design Decisions
//! - Logical paths are slash separated and cleaned like URL paths, so
//!   `..` can never climb above the source root
//! - Directories open successfully; callers inspect `FileMeta::is_dir`

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Metadata the content server needs about an opened entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub is_dir: bool,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

/// An opened entry. Dropping it releases the underlying handle.
pub trait SourceFile: Read + Seek + Send {
    fn metadata(&self) -> io::Result<FileMeta>;
}

/// Capability to open files by logical (slash separated) path.
pub trait FileSource: Send + Sync + fmt::Debug {
    fn open(&self, name: &str) -> io::Result<Box<dyn SourceFile>>;
}

/// Split a logical path into its cleaned segments.
///
/// Empty and `.` segments are dropped, `..` removes the previous segment and
/// stops at the root.
pub(crate) fn clean_segments(name: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    for segment in name.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments
}

impl SourceFile for File {
    fn metadata(&self) -> io::Result<FileMeta> {
        let meta = File::metadata(self)?;
        Ok(FileMeta {
            is_dir: meta.is_dir(),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// Handle for a directory entry; it has metadata but no content.
struct DirectoryHandle {
    modified: Option<SystemTime>,
}

impl Read for DirectoryHandle {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::InvalidInput, "is a directory"))
    }
}

impl Seek for DirectoryHandle {
    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(io::ErrorKind::InvalidInput, "is a directory"))
    }
}

impl SourceFile for DirectoryHandle {
    fn metadata(&self) -> io::Result<FileMeta> {
        Ok(FileMeta {
            is_dir: true,
            len: 0,
            modified: self.modified,
        })
    }
}

/// Files below a root directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, name: &str) -> io::Result<PathBuf> {
        if name.contains('\0')
            || (std::path::MAIN_SEPARATOR != '/' && name.contains(std::path::MAIN_SEPARATOR))
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid character in file path",
            ));
        }

        let mut full = self.root.clone();
        full.extend(clean_segments(name));
        Ok(full)
    }
}

impl FileSource for DirSource {
    fn open(&self, name: &str) -> io::Result<Box<dyn SourceFile>> {
        let full = self.full_path(name)?;
        let meta = fs::metadata(&full)?;
        if meta.is_dir() {
            return Ok(Box::new(DirectoryHandle {
                modified: meta.modified().ok(),
            }));
        }
        Ok(Box::new(File::open(&full)?))
    }
}

#[derive(Debug, Clone)]
struct MemoryFile {
    data: Arc<[u8]>,
    modified: Option<SystemTime>,
}

struct MemoryHandle {
    cursor: Cursor<Arc<[u8]>>,
    modified: Option<SystemTime>,
}

impl Read for MemoryHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Seek for MemoryHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl SourceFile for MemoryHandle {
    fn metadata(&self) -> io::Result<FileMeta> {
        Ok(FileMeta {
            is_dir: false,
            len: self.cursor.get_ref().len() as u64,
            modified: self.modified,
        })
    }
}

/// An in-memory file tree. Directories exist implicitly once a file lives below them.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, MemoryFile>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file without a modification time.
    pub fn with_file(mut self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        self.insert(name, data, None);
        self
    }

    pub fn insert(&mut self, name: &str, data: impl Into<Vec<u8>>, modified: Option<SystemTime>) {
        let key = clean_segments(name).join("/");
        self.files.insert(
            key,
            MemoryFile {
                data: Arc::from(data.into()),
                modified,
            },
        );
    }

    fn is_dir(&self, key: &str) -> bool {
        if key.is_empty() {
            return true;
        }
        let prefix = format!("{key}/");
        self.files.keys().any(|name| name.starts_with(&prefix))
    }
}

impl FileSource for MemorySource {
    fn open(&self, name: &str) -> io::Result<Box<dyn SourceFile>> {
        let key = clean_segments(name).join("/");
        if let Some(file) = self.files.get(&key) {
            return Ok(Box::new(MemoryHandle {
                cursor: Cursor::new(Arc::clone(&file.data)),
                modified: file.modified,
            }));
        }
        if self.is_dir(&key) {
            return Ok(Box::new(DirectoryHandle { modified: None }));
        }
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("open {name}: file does not exist"),
        ))
    }
}

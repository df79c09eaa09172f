//! Opening pre-compressed variants of a file.

use std::io;

use crate::file::source::{FileSource, SourceFile};
use crate::file::Encoding;

/// A file source paired with the negotiated encodings of one request.
#[derive(Clone, Copy)]
pub struct CompressionDir<'a> {
    source: &'a dyn FileSource,
    encodings: &'a [Encoding],
}

impl<'a> CompressionDir<'a> {
    pub fn new(source: &'a dyn FileSource, encodings: &'a [Encoding]) -> Self {
        Self { source, encodings }
    }

    /// Open `<path>.<token>` for each encoding in order, then `path` itself.
    ///
    /// Only the error of the final, unsuffixed attempt is returned.
    pub fn open(&self, path: &str) -> io::Result<(Box<dyn SourceFile>, Option<Encoding>)> {
        for encoding in self.encodings {
            let variant = format!("{path}.{encoding}");
            match self.source.open(&variant) {
                Ok(file) => return Ok((file, Some(encoding.clone()))),
                Err(e) => {
                    tracing::trace!(path = %variant, error = %e, "Encoded variant unavailable");
                }
            }
        }

        self.source.open(path).map(|file| (file, None))
    }
}

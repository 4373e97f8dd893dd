//! Template document download
//!
//! Fetches an opaque document body and hands it to a host-provided sink.

use crate::transport::{NormalizedError, RequestContext, Transport};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const TEMPLATE_PATH: &str = "/api/v1/assistant/download-template";

const DEFAULT_UNIT: &str = "1";

/// Host capability that stores a downloaded document
pub trait DocumentSink: Send + Sync {
    /// Store `bytes` under `filename`.
    ///
    /// # Errors
    /// Any I/O failure writing the document.
    fn save(&self, bytes: &[u8], filename: &str) -> io::Result<()>;
}

impl<S: DocumentSink + ?Sized> DocumentSink for Arc<S> {
    fn save(&self, bytes: &[u8], filename: &str) -> io::Result<()> {
        (**self).save(bytes, filename)
    }
}

/// Sink that writes documents into a directory
#[derive(Debug, Clone)]
pub struct FsDocumentSink {
    dir: PathBuf,
}

impl FsDocumentSink {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DocumentSink for FsDocumentSink {
    fn save(&self, bytes: &[u8], filename: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.dir.join(filename), bytes)
    }
}

/// Filename pattern for downloaded templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateNaming {
    pub prefix: String,
    pub extension: String,
}

impl TemplateNaming {
    #[must_use]
    pub fn new(prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            extension: extension.into(),
        }
    }

    /// `<prefix>_<level>_Unit<unit>_Template.<ext>`
    #[must_use]
    pub fn filename(&self, level: &str, unit: &str) -> String {
        format!(
            "{}_{}_Unit{}_Template.{}",
            self.prefix, level, unit, self.extension
        )
    }
}

/// Document that was fetched and saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDocument {
    pub filename: String,
    pub size: usize,
}

/// Downloads unit templates and saves them through a sink
pub struct TemplateDownloader<T, S> {
    transport: T,
    sink: S,
    naming: TemplateNaming,
}

impl<T: Transport, S: DocumentSink> TemplateDownloader<T, S> {
    #[must_use]
    pub fn new(transport: T, sink: S, naming: TemplateNaming) -> Self {
        Self {
            transport,
            sink,
            naming,
        }
    }

    /// Fetch the template for `level`/`unit` and save it.
    ///
    /// An empty `unit` means unit 1.
    ///
    /// # Errors
    /// Validation error for an empty level or a segment containing `/`;
    /// transport errors as normalized; `Host` if the sink fails.
    pub async fn download_document(
        &self,
        level: &str,
        unit: &str,
    ) -> Result<SavedDocument, NormalizedError> {
        let level = path_segment("level", level)?;
        let unit = if unit.trim().is_empty() {
            DEFAULT_UNIT
        } else {
            path_segment("unit", unit)?
        };

        let request = RequestContext::get(format!("{TEMPLATE_PATH}/{level}/{unit}")).binary();
        let bytes = self
            .transport
            .execute(request)
            .await?
            .into_bytes()
            .ok_or_else(|| NormalizedError::decode("Expected a document, got JSON"))?;

        let filename = self.naming.filename(level, unit);
        self.sink.save(&bytes, &filename).map_err(|e| {
            tracing::error!(filename = %filename, error = %e, "Failed to save document");
            NormalizedError::host(format!("Could not save {filename}"))
        })?;

        tracing::info!(filename = %filename, size = bytes.len(), "Template saved");
        Ok(SavedDocument {
            filename,
            size: bytes.len(),
        })
    }
}

fn path_segment<'a>(name: &str, value: &'a str) -> Result<&'a str, NormalizedError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(NormalizedError::validation(format!("{name} is required")));
    }
    if value.contains(['/', '\\', '?', '#']) || value == "." || value == ".." {
        return Err(NormalizedError::validation(format!("Invalid {name}: {value}")));
    }
    Ok(value)
}

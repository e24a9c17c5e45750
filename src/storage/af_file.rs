use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use crate::{document::Document, domain::Config};

/// A file could not be read or written.
#[derive(Debug, thiserror::Error)]
#[error("failed to {action} '{}': {source}", path.display())]
pub struct Error {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: io::Error,
}

impl Error {
    fn new(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    /// The file involved.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Loads an AF file into a clean document.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not UTF-8. Lines that
/// fail to parse do not cause an error.
pub fn read_document(path: &Path, config: &Config) -> Result<Document, Error> {
    let text = fs::read_to_string(path).map_err(|e| Error::new("read", path, e))?;
    let document = Document::load_with_config(&text, config);
    tracing::info!("Loaded {} lines from {}", document.len(), path.display());
    Ok(document)
}

/// Saves `document` to `path` and marks it clean.
///
/// # Errors
///
/// Returns an error if the file cannot be written. The document stays dirty
/// in that case.
pub fn write_document(path: &Path, document: &mut Document) -> Result<(), Error> {
    fs::write(path, document.text()).map_err(|e| Error::new("write", path, e))?;
    document.save();
    tracing::info!("Saved {} lines to {}", document.len(), path.display());
    Ok(())
}

/// Reads a netlist file as text.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_netlist(path: &Path) -> Result<String, Error> {
    let text = fs::read_to_string(path).map_err(|e| Error::new("read", path, e))?;
    tracing::info!("Read netlist {}", path.display());
    Ok(text)
}

use std::fs;
use std::io::{self, BufWriter, Write};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use super::document::IniDocument;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Parse(#[from] super::Error),
}

/// An [`IniDocument`] tied to the path it was loaded from, so a
/// load-mutate-save cycle writes back to the same file.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct IniFile {
    pub(crate) path: PathBuf,
    document: IniDocument,
}

impl Deref for IniFile {
    type Target = IniDocument;

    fn deref(&self) -> &Self::Target {
        &self.document
    }
}

impl DerefMut for IniFile {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.document
    }
}

impl IniFile {
    pub(crate) fn new(path: &Path) -> Self {
        IniFile {
            path: path.into(),
            document: IniDocument::new(),
        }
    }

    pub(crate) fn load_from_path(path: &Path) -> Result<Self, IoError> {
        let buf = fs::read(path)?;

        Ok(IniFile {
            path: path.into(),
            document: IniDocument::load_from_slice(&buf)?,
        })
    }

    pub(crate) fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Serializes the document back to its path, replacing the file.
    pub(crate) fn save(&self) -> Result<(), IoError> {
        let file = fs::File::create(&self.path)?;
        let mut writer = BufWriter::new(file);

        self.document.write_to(&mut writer)?;
        writer.flush()?;

        Ok(())
    }
}

//! CSV attachment loading.

use std::io;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

const CSV_MIME: &str = "text/csv";

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("only .csv files can be attached: {0}")]
    NotCsv(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A file held by the controller and sent with every turn until detached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    file_name: String,
    data_uri: String,
}

impl Attachment {
    /// Read a `.csv` file and encode it as a data URI.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, AttachmentError> {
        let path = path.as_ref();
        if !is_csv(path) {
            return Err(AttachmentError::NotCsv(path.to_path_buf()));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| AttachmentError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::from_bytes(file_name, &bytes))
    }

    pub fn from_bytes(file_name: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            file_name: file_name.into(),
            data_uri: format!("data:{CSV_MIME};base64,{}", STANDARD.encode(bytes)),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

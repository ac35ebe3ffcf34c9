use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploaderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to load config file {path:?}: {reason}")]
    ConfigLoadFailed { path: PathBuf, reason: String },

    #[error("Converter not found at {0:?}. Download libwebp and place cwebp at that path")]
    ConverterMissing(PathBuf),

    #[error("Unsupported file type for {path:?}: {detected}")]
    UnsupportedFileType { path: PathBuf, detected: String },

    #[error("Conversion failed for {path:?}: {reason}")]
    ConversionFailed { path: PathBuf, reason: String },

    #[error("Upload failed for {path:?} after {attempts} attempt(s): {reason}")]
    UploadFailed {
        path: PathBuf,
        attempts: u32,
        reason: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid gateway response (HTTP {status}): {reason}")]
    InvalidResponse { status: u16, reason: String },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("File too large: {0} bytes. Maximum allowed: {1} bytes")]
    FileTooLarge(u64, u64),

    #[error("Failed to start async runtime: {0}")]
    Runtime(String),
}

impl UploaderError {
    pub fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        UploaderError::ConfigLoadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(path: impl Into<PathBuf>, detected: impl Into<String>) -> Self {
        UploaderError::UnsupportedFileType {
            path: path.into(),
            detected: detected.into(),
        }
    }

    pub fn conversion(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        UploaderError::ConversionFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, UploaderError>;

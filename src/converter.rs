//! WebP conversion through the external `cwebp` encoder
//!
//! The encoder is shipped next to the uploader binary. Each conversion is a
//! separate process run under a timeout; its exit status and the presence of
//! the output file are both checked before the result is handed on.

use crate::constants::{
    CONVERTER_RELATIVE_PATH, DEFAULT_CONVERTER_TIMEOUT, DEFAULT_WEBP_METHOD, DEFAULT_WEBP_QUALITY,
    WEBP_EXTENSION,
};
use crate::error::{Result, UploaderError};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Longest stretch of converter stderr kept in an error message
const STDERR_TAIL_LEN: usize = 512;

#[async_trait]
pub trait ImageConverter: Send + Sync {
    /// Extension of the files this converter produces.
    fn target_extension(&self) -> &str;

    /// Convert `source` into a new file at `output`. The source is left alone.
    async fn convert(&self, source: &Path, output: &Path) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterOptions {
    /// `-q`: 0 (smallest) to 100 (best)
    pub quality: u8,
    /// `-m`: compression effort, 0 (fast) to 6 (slowest)
    pub method: u8,
    /// `-mt`
    pub multithread: bool,
    pub timeout: Duration,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_WEBP_QUALITY,
            method: DEFAULT_WEBP_METHOD,
            multithread: true,
            timeout: DEFAULT_CONVERTER_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CwebpConverter {
    binary: PathBuf,
    options: ConverterOptions,
}

impl CwebpConverter {
    /// Use the encoder at `binary`, failing with `ConverterMissing` when no
    /// file is there.
    pub fn locate(binary: impl Into<PathBuf>, options: ConverterOptions) -> Result<Self> {
        let binary = binary.into();
        if !binary.is_file() {
            return Err(UploaderError::ConverterMissing(binary));
        }
        tracing::debug!(binary = %binary.display(), "Using WebP converter");
        Ok(Self { binary, options })
    }

    /// Argument list passed to the encoder, one token per element.
    pub fn command_args(&self, source: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-q".into(),
            self.options.quality.to_string().into(),
            "-m".into(),
            self.options.method.to_string().into(),
        ];
        if self.options.multithread {
            args.push("-mt".into());
        }
        args.push(source.as_os_str().to_os_string());
        args.push("-o".into());
        args.push(output.as_os_str().to_os_string());
        args
    }
}

/// Where the bundled encoder lives relative to the executable's directory.
pub fn default_converter_path(exe_dir: &Path) -> PathBuf {
    exe_dir.join(CONVERTER_RELATIVE_PATH)
}

/// Output location for the converted copy of input number `index` (0-based).
pub fn converted_output_path(staging_dir: &Path, index: usize, extension: &str) -> PathBuf {
    staging_dir.join(format!("{}.{}", index + 1, extension))
}

#[async_trait]
impl ImageConverter for CwebpConverter {
    fn target_extension(&self) -> &str {
        WEBP_EXTENSION
    }

    async fn convert(&self, source: &Path, output: &Path) -> Result<()> {
        tracing::debug!(
            source = %source.display(),
            output = %output.display(),
            "Running cwebp"
        );

        let mut command = Command::new(&self.binary);
        command
            .args(self.command_args(source, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let result = tokio::time::timeout(self.options.timeout, command.output())
            .await
            .map_err(|_| {
                UploaderError::conversion(
                    source,
                    format!("converter timed out after {:?}", self.options.timeout),
                )
            })?
            .map_err(|e| {
                UploaderError::conversion(source, format!("failed to run converter: {}", e))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(UploaderError::conversion(
                source,
                format!(
                    "converter exited with {}: {}",
                    result.status,
                    stderr_tail(stderr.trim())
                ),
            ));
        }

        if !output.is_file() {
            return Err(UploaderError::conversion(
                source,
                format!("converter reported success but {:?} was not created", output),
            ));
        }

        Ok(())
    }
}

fn stderr_tail(stderr: &str) -> &str {
    if stderr.len() <= STDERR_TAIL_LEN {
        return stderr;
    }
    let mut start = stderr.len() - STDERR_TAIL_LEN;
    while !stderr.is_char_boundary(start) {
        start += 1;
    }
    &stderr[start..]
}

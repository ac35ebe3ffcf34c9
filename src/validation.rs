use crate::constants::MAX_FILE_SIZE;
use crate::error::{Result, UploaderError};
use std::fs;
use std::path::Path;

/// Validate an input path before it is sniffed or uploaded.
///
/// Returns the file size on success. Missing paths and directories are
/// reported as `FileNotFound`; oversized files as `FileTooLarge`.
pub fn validate_input_path(path: &Path) -> Result<u64> {
    let metadata =
        fs::metadata(path).map_err(|_| UploaderError::FileNotFound(path.to_path_buf()))?;

    if !metadata.is_file() {
        return Err(UploaderError::FileNotFound(path.to_path_buf()));
    }

    if metadata.len() > MAX_FILE_SIZE {
        return Err(UploaderError::FileTooLarge(metadata.len(), MAX_FILE_SIZE));
    }

    Ok(metadata.len())
}

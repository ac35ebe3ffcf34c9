//! File classification by binary signature
//!
//! The extension of an input file is never trusted. Its leading bytes are
//! matched against known image signatures and the result decides whether
//! the file has to go through the converter before upload.

use crate::constants::SNIFF_HEADER_LEN;
use crate::error::{Result, UploaderError};
use crate::validation::validate_input_path;
use image::ImageFormat;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Image formats accepted as upload input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SniffedFormat {
    Jpeg,
    Png,
    /// Already in the wire format
    WebP,
}

impl SniffedFormat {
    /// Map a detected format onto the accepted set.
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(SniffedFormat::Jpeg),
            ImageFormat::Png => Some(SniffedFormat::Png),
            ImageFormat::WebP => Some(SniffedFormat::WebP),
            _ => None,
        }
    }

    pub fn needs_conversion(&self) -> bool {
        matches!(self, SniffedFormat::Jpeg | SniffedFormat::Png)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SniffedFormat::Jpeg => "jpg",
            SniffedFormat::Png => "png",
            SniffedFormat::WebP => "webp",
        }
    }
}

impl fmt::Display for SniffedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SniffedFormat::Jpeg => "JPEG",
            SniffedFormat::Png => "PNG",
            SniffedFormat::WebP => "WebP",
        };
        write!(f, "{}", name)
    }
}

/// Sniff a format from the head of a file's contents.
///
/// Returns a description of what was found when the bytes are not one of
/// the accepted formats.
pub fn sniff_format(header: &[u8]) -> std::result::Result<SniffedFormat, String> {
    if header.is_empty() {
        return Err("empty file".to_string());
    }

    match image::guess_format(header) {
        Ok(format) => SniffedFormat::from_image_format(format)
            .ok_or_else(|| format!("{:?} is not an accepted format", format)),
        Err(_) => Err("unrecognized signature".to_string()),
    }
}

/// Read the signature bytes of `path` and classify it.
///
/// Missing, unreadable or empty files and anything other than JPEG, PNG or
/// WebP fail with `UnsupportedFileType`.
pub fn classify_file(path: &Path) -> Result<SniffedFormat> {
    match validate_input_path(path) {
        Ok(_) => {}
        Err(UploaderError::FileNotFound(_)) => {
            return Err(UploaderError::unsupported(path, "file does not exist"));
        }
        Err(e) => return Err(e),
    }

    let mut header = Vec::with_capacity(SNIFF_HEADER_LEN as usize);
    File::open(path)
        .and_then(|file| file.take(SNIFF_HEADER_LEN).read_to_end(&mut header))
        .map_err(|e| UploaderError::unsupported(path, format!("unreadable: {}", e)))?;

    let format =
        sniff_format(&header).map_err(|detected| UploaderError::unsupported(path, detected))?;
    tracing::debug!(path = %path.display(), %format, "Classified input file");
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const WEBP_HEADER: &[u8] = b"RIFF\x24\0\0\0WEBPVP8 ";
    const GIF_HEADER: &[u8] = b"GIF89a\x01\0\x01\0";

    #[test]
    fn test_sniff_accepted_formats() {
        assert_eq!(sniff_format(JPEG_HEADER), Ok(SniffedFormat::Jpeg));
        assert_eq!(sniff_format(PNG_HEADER), Ok(SniffedFormat::Png));
        assert_eq!(sniff_format(WEBP_HEADER), Ok(SniffedFormat::WebP));
    }

    #[test]
    fn test_sniff_rejects_other_formats() {
        let err = sniff_format(GIF_HEADER).unwrap_err();
        assert!(err.contains("Gif"), "unexpected message: {}", err);
        assert!(sniff_format(b"just some text").is_err());
        assert_eq!(sniff_format(b"").unwrap_err(), "empty file");
    }

    #[test]
    fn test_needs_conversion() {
        assert!(SniffedFormat::Jpeg.needs_conversion());
        assert!(SniffedFormat::Png.needs_conversion());
        assert!(!SniffedFormat::WebP.needs_conversion());
    }

    #[test]
    fn test_classify_ignores_extension() {
        let temp_dir = TempDir::new().unwrap();
        // PNG bytes behind a .webp name
        let disguised = temp_dir.path().join("photo.webp");
        fs::write(&disguised, PNG_HEADER).unwrap();
        assert_eq!(classify_file(&disguised).unwrap(), SniffedFormat::Png);

        let webp = temp_dir.path().join("photo.jpg");
        fs::write(&webp, WEBP_HEADER).unwrap();
        assert_eq!(classify_file(&webp).unwrap(), SniffedFormat::WebP);
    }

    #[test]
    fn test_classify_missing_and_empty_files() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.png");
        assert!(matches!(
            classify_file(&missing),
            Err(UploaderError::UnsupportedFileType { .. })
        ));

        let empty = temp_dir.path().join("empty.png");
        fs::write(&empty, b"").unwrap();
        assert!(matches!(
            classify_file(&empty),
            Err(UploaderError::UnsupportedFileType { .. })
        ));
    }

    #[test]
    fn test_format_display() {
        assert_eq!(format!("{}", SniffedFormat::Jpeg), "JPEG");
        assert_eq!(format!("{}", SniffedFormat::WebP), "WebP");
        assert_eq!(SniffedFormat::Png.extension(), "png");
    }
}

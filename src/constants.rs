use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "config.ini";
pub const CONFIG_SECTION: &str = "typoraUploader";

pub const KEY_GATEWAY_ADDR: &str = "noaHandlerAddr";
pub const KEY_TOKEN: &str = "token";
pub const KEY_BUCKET: &str = "bucket";
pub const KEY_WORKFLOW: &str = "workflow";
pub const KEY_STORAGE_TYPE: &str = "storageType";
pub const KEY_CONVERTER_PATH: &str = "converterPath";
pub const KEY_MAX_ATTEMPTS: &str = "maxAttempts";
pub const KEY_RETRY_BASE_DELAY_MS: &str = "retryBaseDelayMs";
pub const KEY_RETRY_MAX_DELAY_MS: &str = "retryMaxDelayMs";
pub const KEY_REQUEST_TIMEOUT_SECS: &str = "requestTimeoutSecs";
pub const KEY_CONVERTER_TIMEOUT_SECS: &str = "converterTimeoutSecs";

// Gateway wire protocol
pub const UPLOAD_ENDPOINT: &str = "uploadFile";
pub const STORAGE_TYPE: &str = "s3";
pub const FILE_FIELD: &str = "file";
pub const USER_AGENT: &str = concat!("noa-uploader/", env!("CARGO_PKG_VERSION"));
pub const GATEWAY_SUCCESS_CODE: i64 = 200;

#[cfg(windows)]
pub const CONVERTER_RELATIVE_PATH: &str = "libwebp/bin/cwebp.exe";
#[cfg(not(windows))]
pub const CONVERTER_RELATIVE_PATH: &str = "libwebp/bin/cwebp";

pub const WEBP_EXTENSION: &str = "webp";
pub const DEFAULT_WEBP_QUALITY: u8 = 75;
pub const DEFAULT_WEBP_METHOD: u8 = 6;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_RETRY_MAX_DELAY: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONVERTER_TIMEOUT: Duration = Duration::from_secs(120);

/// Maximum size of a single input file (100MB)
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Bytes read from the head of a file when sniffing its format
pub const SNIFF_HEADER_LEN: u64 = 64;

pub const STAGING_DIR_PREFIX: &str = "noa-uploader-";

pub const PROGRESS_SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";
pub const SPINNER_TICK_MS: u64 = 100;

//! Uploader configuration
//!
//! Loaded once at startup from an INI file and passed by reference into
//! every component afterwards.

use crate::constants::*;
use crate::error::{Result, UploaderError};
use crate::upload::RetryPolicy;
use crate::utils::resolve_relative;
use ini::{Ini, ParseOption, Properties};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Gateway address and the metadata sent with every upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCredentials {
    /// Base URL, always ending with `/`
    pub address: String,
    pub token: String,
    pub bucket: String,
    pub workflow: String,
}

impl GatewayCredentials {
    pub fn new(
        address: impl Into<String>,
        token: impl Into<String>,
        bucket: impl Into<String>,
        workflow: impl Into<String>,
    ) -> Self {
        Self {
            address: normalize_address(&address.into()),
            token: token.into(),
            bucket: bucket.into(),
            workflow: workflow.into(),
        }
    }

    pub fn upload_url(&self) -> String {
        format!("{}{}", self.address, UPLOAD_ENDPOINT)
    }
}

#[derive(Debug, Clone)]
pub struct UploaderConfig {
    pub credentials: GatewayCredentials,
    pub converter_path: Option<PathBuf>,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
    pub converter_timeout: Duration,
}

impl UploaderConfig {
    pub fn new(credentials: GatewayCredentials) -> Self {
        Self {
            credentials,
            converter_path: None,
            retry: RetryPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            converter_timeout: DEFAULT_CONVERTER_TIMEOUT,
        }
    }

    /// Load the config file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let ini = Ini::load_from_file_opt(path, parse_options())
            .map_err(|e| UploaderError::config(path, e.to_string()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let config = Self::from_ini(&ini, path, base_dir)?;
        tracing::debug!(
            path = %path.display(),
            address = %config.credentials.address,
            bucket = %config.credentials.bucket,
            "Loaded config"
        );
        Ok(config)
    }

    /// Build a config from INI text. Relative paths resolve against `base_dir`.
    pub fn parse(text: &str, base_dir: &Path) -> Result<Self> {
        let origin = base_dir.join(CONFIG_FILE_NAME);
        let ini = Ini::load_from_str_opt(text, parse_options())
            .map_err(|e| UploaderError::config(&origin, e.to_string()))?;
        Self::from_ini(&ini, &origin, base_dir)
    }

    fn from_ini(ini: &Ini, origin: &Path, base_dir: &Path) -> Result<Self> {
        let section = ini.section(Some(CONFIG_SECTION)).ok_or_else(|| {
            UploaderError::config(origin, format!("missing section [{}]", CONFIG_SECTION))
        })?;

        let address = required(section, KEY_GATEWAY_ADDR, origin)?;
        if !address.ends_with('/') {
            tracing::warn!(
                address,
                "{} does not end with '/'; appending one",
                KEY_GATEWAY_ADDR
            );
        }

        let credentials = GatewayCredentials::new(
            address,
            required(section, KEY_TOKEN, origin)?,
            optional(section, KEY_BUCKET).unwrap_or_default(),
            optional(section, KEY_WORKFLOW).unwrap_or_default(),
        );

        if let Some(storage_type) = optional(section, KEY_STORAGE_TYPE) {
            if storage_type != STORAGE_TYPE {
                tracing::warn!(
                    configured = storage_type,
                    "Only storage type '{}' is supported; ignoring configured value",
                    STORAGE_TYPE
                );
            }
        }

        let mut config = Self::new(credentials);

        config.converter_path =
            optional(section, KEY_CONVERTER_PATH).map(|p| resolve_relative(base_dir, Path::new(p)));

        if let Some(max_attempts) = parse_positive::<u32>(section, KEY_MAX_ATTEMPTS, origin)? {
            config.retry.max_attempts = max_attempts;
        }
        if let Some(ms) = parse_number::<u64>(section, KEY_RETRY_BASE_DELAY_MS, origin)? {
            config.retry.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_number::<u64>(section, KEY_RETRY_MAX_DELAY_MS, origin)? {
            config.retry.max_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_positive::<u64>(section, KEY_REQUEST_TIMEOUT_SECS, origin)? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_positive::<u64>(section, KEY_CONVERTER_TIMEOUT_SECS, origin)? {
            config.converter_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

// Backslashes stay literal so Windows paths survive.
fn parse_options() -> ParseOption {
    ParseOption {
        enabled_escape: false,
        ..ParseOption::default()
    }
}

/// Append the trailing `/` the endpoint concatenation relies on.
pub fn normalize_address(address: &str) -> String {
    let trimmed = address.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}

fn optional<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|value| !value.is_empty())
}

fn required<'a>(section: &'a Properties, key: &str, origin: &Path) -> Result<&'a str> {
    optional(section, key)
        .ok_or_else(|| UploaderError::config(origin, format!("missing required key '{}'", key)))
}

fn parse_number<T: FromStr>(section: &Properties, key: &str, origin: &Path) -> Result<Option<T>> {
    match optional(section, key) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
            UploaderError::config(origin, format!("'{}' is not a valid value for {}", raw, key))
        }),
    }
}

/// Like `parse_number`, but zero is rejected.
fn parse_positive<T: FromStr + Default + PartialEq>(
    section: &Properties,
    key: &str,
    origin: &Path,
) -> Result<Option<T>> {
    match parse_number::<T>(section, key, origin)? {
        Some(value) if value == T::default() => Err(UploaderError::config(
            origin,
            format!("{} must be at least 1", key),
        )),
        other => Ok(other),
    }
}

use crate::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY, DEFAULT_RETRY_MAX_DELAY};
use crate::error::{Result, UploaderError};
use crate::gateway::{UploadGateway, UploadResult};
use crate::utils::{create_progress_spinner, display_name};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Bounded exponential backoff for gateway uploads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per file, including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_RETRY_BASE_DELAY,
            max_delay: DEFAULT_RETRY_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    ///
    /// `base_delay * 2^(attempt - 1)`, capped at `max_delay`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// Upload one file, retrying failed attempts under `policy`.
///
/// Transport errors, undecodable replies and non-200 status codes all count
/// as failed attempts. Once the attempts are used up the last failure is
/// returned as `UploadFailed`.
pub async fn upload_with_retry<G: UploadGateway + ?Sized>(
    gateway: &G,
    path: &Path,
    policy: &RetryPolicy,
) -> Result<UploadResult> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let reason = match gateway.upload_file(path).await {
            Ok(result) if result.is_success() => {
                if attempt > 1 {
                    tracing::info!(path = %path.display(), attempt, "Upload succeeded after retry");
                }
                return Ok(result);
            }
            Ok(result) => format!(
                "gateway returned status {}: {}",
                result.status_code, result.message
            ),
            Err(e) => e.to_string(),
        };

        if attempt >= max_attempts {
            tracing::error!(path = %path.display(), attempt, %reason, "Upload failed, giving up");
            return Err(UploaderError::UploadFailed {
                path: path.to_path_buf(),
                attempts: attempt,
                reason,
            });
        }

        let delay = policy.delay_after(attempt);
        tracing::warn!(
            path = %path.display(),
            attempt,
            max_attempts,
            backoff_ms = delay.as_millis() as u64,
            %reason,
            "Upload attempt failed, will retry after backoff"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Upload every path in order. Stops at the first file that exhausts its
/// retries; results line up with `paths` index for index.
pub async fn upload_all<G: UploadGateway + ?Sized>(
    gateway: &G,
    paths: &[PathBuf],
    policy: &RetryPolicy,
) -> Result<Vec<UploadResult>> {
    let mut results = Vec::with_capacity(paths.len());

    for (index, path) in paths.iter().enumerate() {
        let spinner = create_progress_spinner(&format!(
            "📤 Uploading {} ({}/{})",
            display_name(path),
            index + 1,
            paths.len()
        ));
        let outcome = upload_with_retry(gateway, path, policy).await;
        spinner.finish_and_clear();

        let result = outcome?;
        tracing::info!(path = %path.display(), url = %result.file_url, "Uploaded");
        results.push(result);
    }

    Ok(results)
}

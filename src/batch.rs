use crate::constants::STAGING_DIR_PREFIX;
use crate::converter::{converted_output_path, ImageConverter};
use crate::error::{Result, UploaderError};
use crate::formats::classify_file;
use crate::gateway::{UploadGateway, UploadResult};
use crate::upload::{upload_all, RetryPolicy};
use crate::utils::{create_progress_spinner, display_name, format_file_size};
use std::fs;
use std::path::{Path, PathBuf};

/// One file queued for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub source_path: PathBuf,
    /// Produced by conversion; deleted once the batch is done
    pub is_temporary: bool,
}

/// Classify every input, then convert the ones that need it.
///
/// Classification covers the whole batch before the converter runs, so an
/// unsupported file aborts the run without any side effects. Converted copies
/// land in `staging_dir` under sequence-numbered names. If a conversion
/// fails, copies already produced are removed before the error is returned.
pub async fn prepare_upload_tasks<C: ImageConverter + ?Sized>(
    paths: &[PathBuf],
    converter: &C,
    staging_dir: &Path,
) -> Result<Vec<UploadTask>> {
    let formats = paths
        .iter()
        .map(|path| classify_file(path))
        .collect::<Result<Vec<_>>>()?;

    let mut tasks = Vec::with_capacity(paths.len());

    for (index, (path, format)) in paths.iter().zip(formats).enumerate() {
        if !format.needs_conversion() {
            tracing::debug!(path = %path.display(), "Already {}, uploading as is", format);
            tasks.push(UploadTask {
                source_path: path.clone(),
                is_temporary: false,
            });
            continue;
        }

        let output = converted_output_path(staging_dir, index, converter.target_extension());
        let spinner = create_progress_spinner(&format!("🔄 Converting {}", display_name(path)));
        let outcome = converter.convert(path, &output).await;
        spinner.finish_and_clear();

        if let Err(e) = outcome {
            // the converter may have left a partial file behind
            let _ = fs::remove_file(&output);
            cleanup_temporary_files(&tasks);
            return Err(e);
        }

        log_conversion(path, &output, format);
        tasks.push(UploadTask {
            source_path: output,
            is_temporary: true,
        });
    }

    Ok(tasks)
}

fn log_conversion(source: &Path, output: &Path, format: impl std::fmt::Display) {
    let before = fs::metadata(source).map(|m| m.len()).unwrap_or(0);
    let after = fs::metadata(output).map(|m| m.len()).unwrap_or(0);
    tracing::info!(
        source = %source.display(),
        output = %output.display(),
        "Converted {} ({}) to {}",
        format,
        format_file_size(before),
        format_file_size(after)
    );
}

/// Delete the files of temporary tasks. Failures are logged and skipped.
///
/// Returns how many files were removed.
pub fn cleanup_temporary_files(tasks: &[UploadTask]) -> usize {
    let mut removed = 0;
    for task in tasks.iter().filter(|task| task.is_temporary) {
        match fs::remove_file(&task.source_path) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(
                path = %task.source_path.display(),
                error = %e,
                "Failed to remove temporary file"
            ),
        }
    }
    removed
}

/// Full run over an explicit staging directory: prepare, upload, clean up.
///
/// Temporary files are removed whether or not the uploads succeed. Results
/// come back in input order.
pub async fn run_upload_batch<C, G>(
    paths: &[PathBuf],
    converter: &C,
    gateway: &G,
    policy: &RetryPolicy,
    staging_dir: &Path,
) -> Result<Vec<UploadResult>>
where
    C: ImageConverter + ?Sized,
    G: UploadGateway + ?Sized,
{
    let tasks = prepare_upload_tasks(paths, converter, staging_dir).await?;
    let upload_paths: Vec<PathBuf> = tasks.iter().map(|task| task.source_path.clone()).collect();

    let outcome = upload_all(gateway, &upload_paths, policy).await;

    let removed = cleanup_temporary_files(&tasks);
    tracing::debug!(removed, "Removed temporary files");

    outcome
}

/// Like [`run_upload_batch`], with a fresh staging directory under the
/// system temp dir that is removed when the run ends.
pub async fn upload_files<C, G>(
    paths: &[PathBuf],
    converter: &C,
    gateway: &G,
    policy: &RetryPolicy,
) -> Result<Vec<UploadResult>>
where
    C: ImageConverter + ?Sized,
    G: UploadGateway + ?Sized,
{
    let staging = tempfile::Builder::new()
        .prefix(STAGING_DIR_PREFIX)
        .tempdir()?;
    run_upload_batch(paths, converter, gateway, policy, staging.path()).await
}

/// Blocking entry point for callers without a runtime.
pub fn upload_files_sync<C, G>(
    paths: &[PathBuf],
    converter: &C,
    gateway: &G,
    policy: &RetryPolicy,
) -> Result<Vec<UploadResult>>
where
    C: ImageConverter + ?Sized,
    G: UploadGateway + ?Sized,
{
    let runtime =
        tokio::runtime::Runtime::new().map_err(|e| UploaderError::Runtime(e.to_string()))?;
    runtime.block_on(upload_files(paths, converter, gateway, policy))
}

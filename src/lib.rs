pub mod batch;
pub mod cli;
pub mod config;
pub mod constants;
pub mod converter;
pub mod error;
pub mod formats;
pub mod gateway;
pub mod http;
pub mod logger;
pub mod upload;
pub mod utils;
pub mod validation;

pub use batch::{
    cleanup_temporary_files, prepare_upload_tasks, run_upload_batch, upload_files,
    upload_files_sync, UploadTask,
};
pub use config::{GatewayCredentials, UploaderConfig};
pub use converter::{ConverterOptions, CwebpConverter, ImageConverter};
pub use error::{Result, UploaderError};
pub use formats::{classify_file, sniff_format, SniffedFormat};
pub use gateway::{NoaGateway, UploadGateway, UploadResult};
pub use http::{HttpClient, HttpResponse, RequestBody, UploadFile};
pub use upload::{upload_all, upload_with_retry, RetryPolicy};

use anyhow::Context;
use clap::Parser;
use noa_uploader::cli::{Args, Commands};
use noa_uploader::constants::CONFIG_FILE_NAME;
use noa_uploader::converter::default_converter_path;
use noa_uploader::utils::executable_dir;
use noa_uploader::{
    logger, upload_files_sync, ConverterOptions, CwebpConverter, NoaGateway, UploaderConfig,
};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(args.verbose, args.quiet);

    match args.command {
        Commands::Upload {
            files,
            max_attempts,
        } => {
            upload(args.config, args.converter, files, max_attempts)?;
        }
    }

    Ok(())
}

fn upload(
    config_path: Option<PathBuf>,
    converter_path: Option<PathBuf>,
    files: Vec<PathBuf>,
    max_attempts: Option<u32>,
) -> anyhow::Result<()> {
    let exe_dir = executable_dir().context("Cannot locate the running executable")?;

    let config_path = config_path.unwrap_or_else(|| exe_dir.join(CONFIG_FILE_NAME));
    let mut config = UploaderConfig::load(&config_path)
        .context("Fill in config.ini before uploading")?;
    if let Some(max_attempts) = max_attempts {
        config.retry.max_attempts = max_attempts;
    }

    // checked before any file is touched
    let converter_path = converter_path
        .or_else(|| config.converter_path.clone())
        .unwrap_or_else(|| default_converter_path(&exe_dir));
    let converter = CwebpConverter::locate(
        converter_path,
        ConverterOptions {
            timeout: config.converter_timeout,
            ..ConverterOptions::default()
        },
    )?;

    let gateway = NoaGateway::new(config.credentials.clone(), config.request_timeout)?;

    let results = upload_files_sync(&files, &converter, &gateway, &config.retry)?;
    for result in results {
        println!("{}", result.file_url);
    }

    Ok(())
}

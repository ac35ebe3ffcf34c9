use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "noa-uploader",
    about = "Image uploader for Typora: converts pictures to WebP and uploads them to \
             NoaHandler",
    long_about = "noa-uploader is an image upload plugin for Typora. JPEG and PNG files are \
                  converted to WebP with the bundled cwebp encoder, every file is uploaded to a \
                  NoaHandler gateway, and the resulting URLs are printed one per line in input \
                  order. \
                  Fill in config.ini next to the executable before first use.",
    version,
    after_help = "EXAMPLES:\n  \
    noa-uploader upload shot.png diagram.jpg\n  \
    noa-uploader u already.webp\n  \
    noa-uploader -c ~/uploader.ini upload photo.jpg"
)]
pub struct Args {
    #[arg(
        short = 'c',
        long,
        global = true,
        value_name = "PATH",
        help = "Config file (default: config.ini next to the executable)"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "cwebp executable (default: libwebp/bin/cwebp next to the executable)",
        long_help = "Path of the cwebp encoder. Takes precedence over converterPath in the \
                     config file."
    )]
    pub converter: Option<PathBuf>,

    #[arg(short = 'v', long, global = true, help = "Print debug logs to stderr")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Only print errors to stderr"
    )]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        visible_alias = "u",
        about = "Upload files to the configured gateway",
        long_about = "Upload one or more image files. JPEG and PNG input is converted to WebP \
                      first; WebP input is uploaded unchanged. Any other file type aborts the run \
                      before anything is uploaded."
    )]
    Upload {
        #[arg(required = true, num_args = 1.., help = "Image files to upload")]
        files: Vec<PathBuf>,

        #[arg(
            long,
            value_name = "N",
            value_parser = clap::value_parser!(u32).range(1..),
            help = "Upload attempts per file (overrides maxAttempts)"
        )]
        max_attempts: Option<u32>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_upload_alias_and_globals() {
        let args = Args::parse_from(["noa-uploader", "u", "a.png", "b.webp", "-c", "my.ini"]);
        assert_eq!(args.config, Some(PathBuf::from("my.ini")));
        match args.command {
            Commands::Upload {
                files,
                max_attempts,
            } => {
                assert_eq!(files, vec![PathBuf::from("a.png"), PathBuf::from("b.webp")]);
                assert_eq!(max_attempts, None);
            }
        }
    }

    #[test]
    fn test_upload_requires_files() {
        assert!(Args::try_parse_from(["noa-uploader", "upload"]).is_err());
        assert!(
            Args::try_parse_from(["noa-uploader", "upload", "--max-attempts", "0", "a.png"])
                .is_err()
        );
    }
}

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::error::{Error, Result};
use crate::locator::{Locator, MessageSelector};
use crate::progress::ProgressMode;
use crate::tdl::{
    DownloadRequest, TdlConfig, APP_HASH_ENV, APP_ID_ENV, DEFAULT_OUTPUT_DIR, DEFAULT_POOL_SIZE,
    DEFAULT_PROGRAM, DEFAULT_THREADS, PREFLIGHT_TIMEOUT,
};
use crate::util::parse_byte_size;

#[derive(Parser, Debug, Clone)]
#[command(name = "tdlfast", author, version, about = "Fast Telegram downloads through tdl", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// tdl executable to run
    #[arg(long = "tdl-bin", value_name = "path", env = "TDL_BIN", default_value = DEFAULT_PROGRAM, global = true)]
    pub tdl_bin: String,

    /// Directory downloads are written to
    #[arg(short = 'd', long = "dir", value_name = "path", default_value = DEFAULT_OUTPUT_DIR, global = true)]
    pub output_dir: PathBuf,

    /// Give up on a tdl run after this many seconds
    #[arg(long = "timeout", value_name = "secs", value_parser = clap::value_parser!(u64).range(1..), global = true)]
    pub timeout: Option<u64>,

    /// Quiet mode
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue, conflicts_with = "verbose", global = true)]
    pub quiet: bool,

    /// Verbose mode
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue, global = true)]
    pub verbose: bool,

    /// Report progress and results as newline-delimited JSON
    #[arg(long = "json", action = ArgAction::SetTrue, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download from a message link or a chat and message ids
    Dl(DlArgs),
    /// Log in to Telegram (tdl prompts for anything not supplied)
    Login {
        #[arg(long = "app-id", value_name = "id", env = APP_ID_ENV)]
        app_id: Option<String>,
        #[arg(long = "app-hash", value_name = "hash", env = APP_HASH_ENV, hide_env_values = true)]
        app_hash: Option<String>,
    },
    /// List your chats with their ids
    Chats,
    /// Interactive menu (default)
    Menu,
}

#[derive(Args, Debug, Clone)]
pub struct DlArgs {
    /// Message link, e.g. https://t.me/c/1234567890/100
    #[arg(value_name = "url", required_unless_present = "chat", conflicts_with_all = ["chat", "msg"])]
    pub url: Option<String>,

    /// Chat id, or @username for public chats
    #[arg(long = "chat", value_name = "id|@name", requires = "msg")]
    pub chat: Option<String>,

    /// Message ids: 123, 100-200 or 1,5,10
    #[arg(long = "msg", value_name = "ids", requires = "chat")]
    pub msg: Option<String>,

    /// Parallel download threads
    #[arg(short = 't', long = "threads", value_name = "int", default_value_t = DEFAULT_THREADS)]
    pub threads: u32,

    /// Chunk size (e.g. 512KiB, 1MiB)
    #[arg(long = "size", value_name = "bytes", default_value = "1MiB", value_parser = parse_byte_size)]
    pub chunk_size: u64,

    /// Connection pool size, ignored with a single thread
    #[arg(long = "pool", value_name = "int", default_value_t = DEFAULT_POOL_SIZE)]
    pub pool: u32,

    /// Continue interrupted downloads
    #[arg(long = "continue", action = ArgAction::SetTrue)]
    pub resume: bool,

    /// Only download files matching these globs
    #[arg(long = "include", value_name = "glob", value_delimiter = ',')]
    pub include: Vec<String>,

    /// Skip files matching these globs
    #[arg(long = "exclude", value_name = "glob", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Only download common video formats
    #[arg(long = "videos-only", action = ArgAction::SetTrue)]
    pub videos_only: bool,

    /// Skip files smaller than this (e.g. 10MiB)
    #[arg(long = "min-size", value_name = "bytes", value_parser = parse_byte_size)]
    pub min_size: Option<u64>,

    /// Skip files larger than this
    #[arg(long = "max-size", value_name = "bytes", value_parser = parse_byte_size)]
    pub max_size: Option<u64>,

    /// Print the tdl command instead of running it
    #[arg(long = "dry-run", action = ArgAction::SetTrue)]
    pub dry_run: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn progress_mode(&self) -> ProgressMode {
        if self.json {
            ProgressMode::Json
        } else if self.quiet {
            ProgressMode::Quiet
        } else {
            ProgressMode::Text
        }
    }
}

impl From<&Cli> for TdlConfig {
    fn from(cli: &Cli) -> Self {
        TdlConfig {
            program: cli.tdl_bin.clone(),
            output_dir: cli.output_dir.clone(),
            timeout: cli.timeout.map(Duration::from_secs),
            preflight_timeout: PREFLIGHT_TIMEOUT,
        }
    }
}

impl DlArgs {
    pub fn locator(&self) -> Result<Locator> {
        match (&self.url, &self.chat, &self.msg) {
            (Some(url), _, _) => Ok(Locator::url(url.clone())),
            (None, Some(chat), Some(msg)) => {
                let selector: MessageSelector = msg.parse()?;
                Ok(Locator::message(chat.clone(), selector))
            }
            _ => Err(Error::invalid("a link or --chat together with --msg is required")),
        }
    }

    /// Builds a validated request writing into the configured directory.
    pub fn request(&self, config: &TdlConfig) -> Result<DownloadRequest> {
        let mut request = DownloadRequest {
            threads: self.threads,
            chunk_size: self.chunk_size,
            pool_size: Some(self.pool),
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            min_size: self.min_size,
            max_size: self.max_size,
            resume: self.resume,
            ..config.request(self.locator()?)
        };
        if self.videos_only {
            request = request.videos_only();
        }
        request.validate()?;
        request.locator.resolve()?;
        Ok(request)
    }
}

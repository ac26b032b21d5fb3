mod client;
mod command;
mod runner;
#[cfg(test)]
pub(crate) mod testing;

pub use client::Tdl;
pub use command::build_download_args;
pub use runner::{Invocation, ProcessOutput, ProcessRunner, StdioMode, SystemRunner};

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::locator::Locator;

pub const DEFAULT_PROGRAM: &str = "tdl";
pub const DEFAULT_OUTPUT_DIR: &str = "downloads";
pub const DEFAULT_THREADS: u32 = 16;
pub const MAX_THREADS: u32 = 64;
pub const DEFAULT_CHUNK_SIZE: u64 = 1 << 20; // 1 MiB
pub const DEFAULT_POOL_SIZE: u32 = 8;
pub const PREFLIGHT_TIMEOUT: Duration = Duration::from_secs(5);

pub const APP_ID_ENV: &str = "TDL_APP_ID";
pub const APP_HASH_ENV: &str = "TDL_APP_HASH";

pub const VIDEO_PATTERNS: [&str; 5] = ["*.mp4", "*.mkv", "*.avi", "*.mov", "*.webm"];

/// One download intent. Validated when the command is assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub locator: Locator,
    pub threads: u32,
    pub chunk_size: u64,
    /// Only passed on when `threads > 1`.
    pub pool_size: Option<u32>,
    pub output_dir: PathBuf,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
    pub resume: bool,
}

impl DownloadRequest {
    /// A request with the fast defaults: 16 threads, 1 MiB chunks, pool of 8.
    pub fn new(locator: Locator) -> Self {
        Self {
            locator,
            threads: DEFAULT_THREADS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            pool_size: Some(DEFAULT_POOL_SIZE),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            include: Vec::new(),
            exclude: Vec::new(),
            min_size: None,
            max_size: None,
            resume: false,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn videos_only(mut self) -> Self {
        for pattern in VIDEO_PATTERNS {
            if !self.include.iter().any(|p| p == pattern) {
                self.include.push(pattern.to_string());
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.threads < 1 {
            return Err(Error::invalid("thread count must be at least 1"));
        }
        if self.threads > MAX_THREADS {
            return Err(Error::invalid(format!(
                "thread count {} exceeds the maximum of {MAX_THREADS}",
                self.threads
            )));
        }
        if self.chunk_size == 0 {
            return Err(Error::invalid("chunk size must be positive"));
        }
        if self.pool_size == Some(0) {
            return Err(Error::invalid("pool size must be positive"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(Error::invalid("output directory cannot be empty"));
        }
        if let (Some(min), Some(max)) = (self.min_size, self.max_size) {
            if min > max {
                return Err(Error::invalid(format!(
                    "minimum size {min} is larger than maximum size {max}"
                )));
            }
        }
        if self.include.iter().chain(&self.exclude).any(|p| p.trim().is_empty()) {
            return Err(Error::invalid("file patterns cannot be empty"));
        }
        Ok(())
    }
}

/// Outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadResult {
    pub succeeded: bool,
    pub message: String,
}

impl DownloadResult {
    pub fn success(output_dir: &Path) -> Self {
        Self {
            succeeded: true,
            message: format!("downloaded successfully to {}", output_dir.display()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            message: message.into(),
        }
    }

    pub fn into_result(self) -> Result<String> {
        if self.succeeded {
            Ok(self.message)
        } else {
            Err(Error::ExternalFailure(self.message))
        }
    }
}

/// Where the tool lives and how long it may run. Building one does no I/O;
/// see [`TdlConfig::open`].
#[derive(Debug, Clone)]
pub struct TdlConfig {
    pub program: String,
    pub output_dir: PathBuf,
    pub timeout: Option<Duration>,
    pub preflight_timeout: Duration,
}

impl Default for TdlConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            timeout: None,
            preflight_timeout: PREFLIGHT_TIMEOUT,
        }
    }
}

impl TdlConfig {
    /// Creates the output directory and checks that the tool answers
    /// `version` before handing out a [`Tdl`].
    pub async fn open<R: ProcessRunner>(self, runner: R) -> Result<Tdl<R>> {
        Tdl::open(self, runner).await
    }

    pub fn request(&self, locator: Locator) -> DownloadRequest {
        DownloadRequest::new(locator).with_output_dir(self.output_dir.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> DownloadRequest {
        DownloadRequest::new(Locator::url("https://t.me/c/1/2"))
    }

    #[test]
    fn defaults_are_the_fast_profile() {
        let req = request();
        assert_eq!(req.threads, 16);
        assert_eq!(req.chunk_size, 1_048_576);
        assert_eq!(req.pool_size, Some(8));
        assert_eq!(req.output_dir, PathBuf::from("downloads"));
        assert!(!req.resume);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_numbers() {
        let cases = [
            DownloadRequest { threads: 0, ..request() },
            DownloadRequest { threads: MAX_THREADS + 1, ..request() },
            DownloadRequest { chunk_size: 0, ..request() },
            DownloadRequest { pool_size: Some(0), ..request() },
            DownloadRequest { min_size: Some(100), max_size: Some(50), ..request() },
            DownloadRequest { include: vec![" ".into()], ..request() },
        ];
        for case in cases {
            assert!(matches!(case.validate(), Err(Error::InvalidInput(_))), "{case:?}");
        }
    }

    #[test]
    fn equal_size_bounds_are_fine() {
        let req = DownloadRequest {
            min_size: Some(0),
            max_size: Some(0),
            ..request()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn videos_only_does_not_duplicate_patterns() {
        let req = DownloadRequest {
            include: vec!["*.mp4".into()],
            ..request()
        }
        .videos_only();
        assert_eq!(req.include, VIDEO_PATTERNS.to_vec());
    }

    #[test]
    fn failed_result_becomes_external_failure() {
        let err = DownloadResult::failure("boom").into_result().unwrap_err();
        assert!(matches!(err, Error::ExternalFailure(ref m) if m == "boom"));
        let ok = DownloadResult::success(Path::new("out")).into_result().unwrap();
        assert!(ok.contains("out"));
    }

    #[test]
    fn config_request_uses_configured_directory() {
        let config = TdlConfig {
            output_dir: PathBuf::from("media"),
            ..TdlConfig::default()
        };
        let req = config.request(Locator::url("https://t.me/x/1"));
        assert_eq!(req.output_dir, PathBuf::from("media"));
    }
}

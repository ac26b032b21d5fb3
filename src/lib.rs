//! Drive the `tdl` Telegram downloader from Rust: build validated `tdl dl`
//! invocations, run them and classify the outcome.

pub mod cli;
pub mod error;
pub mod locator;
pub mod menu;
pub mod progress;
pub mod tdl;
pub mod util;

pub use error::{Error, Result};
pub use locator::{resolve_locator, Locator, MessageSelector};
pub use tdl::{DownloadRequest, DownloadResult, Tdl, TdlConfig};

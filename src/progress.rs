use std::io::Write;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::tdl::DownloadResult;

const SPINNER_TICK: Duration = Duration::from_millis(120);
const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {msg} [{elapsed}]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Quiet,
    Text,
    Json,
}

/// Shows that a child is still running. The tool's own progress output is
/// captured, so this only tracks elapsed time.
pub struct ProgressReporter {
    mode: ProgressMode,
    spinner: Option<ProgressBar>,
    start: Instant,
}

impl ProgressReporter {
    pub fn start(mode: ProgressMode, label: &str) -> Option<Self> {
        let spinner = match mode {
            ProgressMode::Quiet => return None,
            ProgressMode::Text => Some(spawn_spinner(label)),
            ProgressMode::Json => {
                emit(&JsonEvent::started(label));
                None
            }
        };
        Some(Self {
            mode,
            spinner,
            start: Instant::now(),
        })
    }

    pub fn finish(mut self, result: &DownloadResult) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
        if self.mode == ProgressMode::Json {
            emit(&JsonEvent::finished(result, self.start.elapsed()));
        }
    }

    /// Closes the report for a run that never produced an outcome, e.g. a
    /// spawn failure or a timeout.
    pub fn abort(self, reason: &str) {
        self.finish(&DownloadResult::failure(reason));
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

fn spawn_spinner(label: &str) -> ProgressBar {
    let style = ProgressStyle::with_template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let spinner = ProgressBar::new_spinner().with_style(style);
    spinner.set_message(label.to_string());
    spinner.enable_steady_tick(SPINNER_TICK);
    spinner
}

fn emit(event: &JsonEvent<'_>) {
    if let Ok(serialized) = serde_json::to_string(event) {
        println!("{}", serialized);
        let _ = std::io::stdout().flush();
    }
}

#[derive(Debug, Serialize)]
struct JsonEvent<'a> {
    event: &'static str,
    timestamp_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_ms: Option<u128>,
    #[serde(flatten)]
    result: Option<&'a DownloadResult>,
}

impl<'a> JsonEvent<'a> {
    fn started(label: &'a str) -> Self {
        Self {
            event: "started",
            timestamp_ms: now_ms(),
            label: Some(label),
            elapsed_ms: None,
            result: None,
        }
    }

    fn finished(result: &'a DownloadResult, elapsed: Duration) -> Self {
        Self {
            event: if result.succeeded { "complete" } else { "failed" },
            timestamp_ms: now_ms(),
            label: None,
            elapsed_ms: Some(elapsed.as_millis()),
            result: Some(result),
        }
    }
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

use std::fmt;
use std::future::Future;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use log::debug;
use tokio::process::Command;
use tokio::time::timeout;

use crate::tdl::DownloadResult;

const UNKNOWN_ERROR: &str = "unknown error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    /// Collect stdout and stderr.
    Captured,
    /// Hand the terminal to the child, for flows that prompt the user.
    Inherited,
}

/// A fully described child process: program, arguments and extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
    pub stdio: StdioMode,
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            envs: Vec::new(),
            stdio: StdioMode::Captured,
            timeout: None,
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn inherit_stdio(mut self) -> Self {
        self.stdio = StdioMode::Inherited;
        self
    }

    pub fn timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }
}

impl fmt::Display for Invocation {
    /// Renders a shell-pasteable command line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Best diagnostic text: stderr, then stdout, then a generic fallback.
    pub fn diagnostic(&self) -> String {
        [&self.stderr, &self.stdout]
            .into_iter()
            .map(|text| text.trim_end())
            .find(|text| !text.trim().is_empty())
            .unwrap_or(UNKNOWN_ERROR)
            .to_string()
    }

    pub fn into_download_result(self, output_dir: &Path) -> DownloadResult {
        if self.success() {
            DownloadResult::success(output_dir)
        } else {
            DownloadResult::failure(self.diagnostic())
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Spawns one child and waits for it. Implemented by [`SystemRunner`] and by
/// test doubles.
pub trait ProcessRunner {
    fn run(&self, invocation: &Invocation) -> impl Future<Output = io::Result<ProcessOutput>>;
}

/// Runs invocations as real child processes resolved through `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
        debug!("spawning {invocation}");
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args).kill_on_drop(true);
        for (key, value) in &invocation.envs {
            command.env(key, value);
        }
        if !invocation.envs.is_empty() {
            let keys: Vec<&str> = invocation.envs.iter().map(|(k, _)| k.as_str()).collect();
            debug!("environment overrides: {}", keys.join(", "));
        }

        let output = match invocation.stdio {
            StdioMode::Captured => {
                command
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped());
                wait_with_limit(command.output(), invocation.timeout).await?
            }
            StdioMode::Inherited => {
                let mut child = command.spawn()?;
                let status = wait_with_limit(child.wait(), invocation.timeout).await?;
                return Ok(ProcessOutput {
                    code: status.code(),
                    ..ProcessOutput::default()
                });
            }
        };

        debug!("{} exited with {:?}", invocation.program, output.status.code());
        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

async fn wait_with_limit<F, T>(fut: F, limit: Option<Duration>) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match limit {
        Some(limit) => timeout(limit, fut).await.map_err(|_| {
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!("child did not exit within {}s", limit.as_secs_f64()),
            )
        })?,
        None => fut.await,
    }
}

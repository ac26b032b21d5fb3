use std::io;

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::tdl::command::build_download_args;
use crate::tdl::runner::{Invocation, ProcessRunner};
use crate::tdl::{DownloadRequest, DownloadResult, TdlConfig, APP_HASH_ENV, APP_ID_ENV};
use crate::util::{ensure_dir, format_bytes};

const VERSION_SUBCOMMAND: &str = "version";
const LOGIN_SUBCOMMAND: &str = "login";
const CHAT_LIST_ARGS: [&str; 2] = ["chat", "ls"];

/// Handle on a tool that passed its preflight check.
pub struct Tdl<R> {
    config: TdlConfig,
    runner: R,
}

impl<R: ProcessRunner> Tdl<R> {
    pub(crate) async fn open(config: TdlConfig, runner: R) -> Result<Self> {
        ensure_dir(&config.output_dir).await?;
        let tdl = Self { config, runner };
        tdl.preflight().await?;
        Ok(tdl)
    }

    pub fn config(&self) -> &TdlConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    async fn preflight(&self) -> Result<()> {
        let invocation = Invocation::new(&self.config.program, [VERSION_SUBCOMMAND])
            .timeout(Some(self.config.preflight_timeout));
        let output = self.runner.run(&invocation).await.map_err(|err| {
            if err.kind() == io::ErrorKind::TimedOut {
                Error::ToolNotAvailable {
                    program: self.config.program.clone(),
                    reason: format!("`{invocation}` did not answer: {err}"),
                }
            } else {
                self.spawn_error(err)
            }
        })?;
        if !output.success() {
            return Err(Error::ToolNotAvailable {
                program: self.config.program.clone(),
                reason: format!("`{invocation}` exited with {:?}", output.code),
            });
        }
        debug!("{} version: {}", self.config.program, output.stdout.trim());
        Ok(())
    }

    /// Builds the invocation for a request without running it.
    pub fn download_invocation(&self, request: &DownloadRequest) -> Result<Invocation> {
        let args = build_download_args(request)?;
        Ok(Invocation::new(&self.config.program, args).timeout(self.config.timeout))
    }

    /// Runs one download. A nonzero exit is reported in the returned
    /// [`DownloadResult`], not as an error.
    pub async fn download(&self, request: &DownloadRequest) -> Result<DownloadResult> {
        let invocation = self.download_invocation(request)?;
        ensure_dir(&request.output_dir).await?;

        info!(
            "downloading {} with {} threads, {} chunks into {}",
            invocation.args[2],
            request.threads,
            format_bytes(request.chunk_size),
            request.output_dir.display()
        );
        if let Some(min) = request.min_size {
            info!("skipping files smaller than {}", format_bytes(min));
        }
        if let Some(max) = request.max_size {
            info!("skipping files larger than {}", format_bytes(max));
        }

        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|err| self.spawn_error(err))?;
        let result = output.into_download_result(&request.output_dir);
        if !result.succeeded {
            warn!(
                "{} failed: {}",
                self.config.program,
                result.message.lines().next().unwrap_or_default()
            );
        }
        Ok(result)
    }

    /// Runs the interactive login flow on the caller's terminal. Credentials
    /// are only injected when given; otherwise the tool prompts for them.
    pub async fn login(&self, app_id: Option<&str>, app_hash: Option<&str>) -> Result<bool> {
        let mut invocation =
            Invocation::new(&self.config.program, [LOGIN_SUBCOMMAND]).inherit_stdio();
        if let Some(id) = app_id.filter(|v| !v.is_empty()) {
            invocation = invocation.env(APP_ID_ENV, id);
        }
        if let Some(hash) = app_hash.filter(|v| !v.is_empty()) {
            invocation = invocation.env(APP_HASH_ENV, hash);
        }

        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|err| self.spawn_error(err))?;
        if !output.success() {
            warn!("login exited with {:?}", output.code);
        }
        Ok(output.success())
    }

    /// Raw `chat ls` output, one record per non-blank line. Only a missing
    /// tool is an error; any other failure yields an empty list.
    pub async fn list_chats(&self) -> Result<Vec<String>> {
        let invocation = Invocation::new(&self.config.program, CHAT_LIST_ARGS)
            .timeout(self.config.timeout);
        let output = match self.runner.run(&invocation).await {
            Ok(output) => output,
            Err(err) => match self.spawn_error(err) {
                err @ Error::ToolNotAvailable { .. } => return Err(err),
                err => {
                    warn!("listing chats failed: {err}");
                    return Ok(Vec::new());
                }
            },
        };
        if !output.success() {
            warn!("listing chats failed: {}", output.diagnostic());
            return Ok(Vec::new());
        }
        Ok(output.lines())
    }

    fn spawn_error(&self, err: io::Error) -> Error {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => Error::ToolNotAvailable {
                program: self.config.program.clone(),
                reason: err.to_string(),
            },
            _ => Error::ProcessError(err),
        }
    }
}

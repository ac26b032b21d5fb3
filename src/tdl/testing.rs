use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use crate::tdl::runner::{Invocation, ProcessOutput, ProcessRunner};
use crate::tdl::TdlConfig;

/// Replays canned outputs and records every invocation.
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    calls: Mutex<Vec<Invocation>>,
    replies: Mutex<VecDeque<io::Result<ProcessOutput>>>,
}

impl ScriptedRunner {
    /// Starts with a passing `version` preflight queued.
    pub(crate) fn new() -> Self {
        Self::default().then_exit(0, "tdl v0.17.0", "")
    }

    pub(crate) fn then_exit(self, code: i32, stdout: &str, stderr: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(ProcessOutput {
            code: Some(code),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }));
        self
    }

    pub(crate) fn then_error(self, kind: io::ErrorKind) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(io::Error::new(kind, "scripted")));
        self
    }

    pub(crate) fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
        self.calls.lock().unwrap().push(invocation.clone());
        let reply = self.replies.lock().unwrap().pop_front();
        reply.unwrap_or_else(|| {
            Ok(ProcessOutput {
                code: Some(0),
                ..ProcessOutput::default()
            })
        })
    }
}

pub(crate) fn config_in(dir: &Path) -> TdlConfig {
    TdlConfig {
        output_dir: dir.join("downloads"),
        ..TdlConfig::default()
    }
}

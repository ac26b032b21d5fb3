use std::io;

use thiserror::Error;

pub const INSTALL_HINT: &str = "go install github.com/iyear/tdl@latest";

#[derive(Error, Debug)]
pub enum Error {
    /// Rejected before anything was spawned.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{program} is not available ({reason}); install it with: {}", INSTALL_HINT)]
    ToolNotAvailable { program: String, reason: String },

    /// The tool ran and exited nonzero. Carries its diagnostic text verbatim.
    #[error("{0}")]
    ExternalFailure(String),

    #[error("local process failure: {0}")]
    ProcessError(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }

    /// Exit status the binary reports for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidInput(_) => 2,
            Error::ToolNotAvailable { .. } => 127,
            Error::ExternalFailure(_) | Error::ProcessError(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_not_available_mentions_install_hint() {
        let err = Error::ToolNotAvailable {
            program: "tdl".to_string(),
            reason: "not found".to_string(),
        };
        let text = err.to_string();
        assert!(text.starts_with("tdl is not available"));
        assert!(text.contains(INSTALL_HINT));
    }

    #[test]
    fn external_failure_is_verbatim() {
        let err = Error::ExternalFailure("FLOOD_WAIT_30".to_string());
        assert_eq!(err.to_string(), "FLOOD_WAIT_30");
    }

    #[test]
    fn exit_codes_distinguish_missing_tool() {
        assert_eq!(Error::invalid("x").exit_code(), 2);
        assert_eq!(
            Error::ToolNotAvailable {
                program: "tdl".into(),
                reason: "gone".into()
            }
            .exit_code(),
            127
        );
        assert_eq!(Error::ExternalFailure("boom".into()).exit_code(), 1);
        let io_err = io::Error::new(io::ErrorKind::Other, "fork failed");
        assert_eq!(Error::from(io_err).exit_code(), 1);
    }
}

//!A mod for the error types
use std::fmt::Debug;

///Common error type when building ports and devices from configuration.
pub enum PortBuildError {
    Message(String),
    Messages(Vec<String>),
}

impl PortBuildError {
    pub fn from_string(msg: String) -> Self {
        PortBuildError::Message(msg)
    }
    pub fn from_errs(errs: Vec<PortBuildError>) -> Self {
        let mut messages = Vec::with_capacity(errs.len());
        for err in errs {
            match err {
                Self::Message(msg) => messages.push(msg),
                Self::Messages(mut msgs) => messages.append(&mut msgs),
            }
        }
        Self::Messages(messages)
    }
    pub fn message(msg: &str) -> Self {
        PortBuildError::Message(msg.to_string())
    }
}

impl Debug for PortBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(message) => f.write_fmt(format_args!("PortBuildError: {}", message)),
            Self::Messages(messages) => f.write_fmt(format_args!(
                "PortBuildError (multiple): \n{}",
                messages.join("\n")
            )),
        }
    }
}

///Runtime error for port and register operations.
///
///`Config` means the caller violated a static contract; these are raised
///before any transfer is attempted. `Io` means the underlying transport
///failed; these are propagated unmodified and never retried here.
pub enum PortError {
    Config(String),
    Io(String),
}

impl PortError {
    pub fn config(msg: impl Into<String>) -> Self {
        PortError::Config(msg.into())
    }
    pub fn io(msg: impl Into<String>) -> Self {
        PortError::Io(msg.into())
    }
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl Debug for PortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(message) => f.write_fmt(format_args!("configuration error: {}", message)),
            Self::Io(message) => f.write_fmt(format_args!("i/o error: {}", message)),
        }
    }
}

impl From<PortError> for PortBuildError {
    fn from(err: PortError) -> Self {
        PortBuildError::from_string(format!("{:?}", err))
    }
}

//! Miette-based error diagnostics for CLI error presentation.
//!
//! Maps crate errors onto diagnostics with a stable code and a help line
//! pointing at the most likely fix.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::error::{ConfigError, Error};

/// Configuration file error with source location context.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(release_tagger::config))]
pub struct ConfigFileError {
    pub message: String,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("here")]
    pub span: SourceSpan,

    #[help]
    pub help: Option<String>,
}

impl ConfigFileError {
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        name: impl AsRef<str>,
        src: impl Into<String>,
        offset: usize,
        len: usize,
    ) -> Self {
        Self {
            message: message.into(),
            src: NamedSource::new(name, src.into()),
            span: (offset, len).into(),
            help: None,
        }
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// A failed command, classified for the operator.
#[derive(Debug, Error, Diagnostic)]
pub enum CommandError {
    #[error("{0}")]
    #[diagnostic(
        code(release_tagger::session),
        help("check vcenter.url, vcenter.username and the VCENTER_PASSWORD environment variable")
    )]
    Session(String),

    #[error("{0}")]
    #[diagnostic(
        code(release_tagger::catalog),
        help("check the catalog location, or pass a local copy with --catalog")
    )]
    Catalog(String),

    #[error("{0}")]
    #[diagnostic(
        code(release_tagger::scope),
        help("check the --scope identifier; disconnected hosts are never tagged")
    )]
    EmptyScope(String),

    #[error("{0}")]
    #[diagnostic(
        code(release_tagger::tagging),
        help("the account needs permission to create tags and assign them to hosts")
    )]
    Tagging(String),

    #[error("{0}")]
    #[diagnostic(
        code(release_tagger::partial),
        help("re-run to retry the failed hosts; tagged hosts are left unchanged")
    )]
    Partial(String),

    #[error("{0}")]
    #[diagnostic(code(release_tagger::config))]
    Config(String),

    #[error("{0}")]
    #[diagnostic(code(release_tagger::error))]
    Other(String),
}

impl From<&Error> for CommandError {
    fn from(err: &Error) -> Self {
        let message = err.to_string();
        match err {
            Error::NotConnected | Error::Connection(_) => Self::Session(message),
            Error::Catalog(_) => Self::Catalog(message),
            Error::EmptyHostSet { .. } => Self::EmptyScope(message),
            Error::TagService { .. } => Self::Tagging(message),
            Error::HostFailures { .. } => Self::Partial(message),
            Error::Config(_) => Self::Config(message),
            _ => Self::Other(message),
        }
    }
}

/// Diagnostic for a config file that failed to parse, pointing at the span.
///
/// Returns `None` when the error carries no position.
#[must_use]
pub fn config_parse_error(name: &str, content: &str, err: &ConfigError) -> Option<ConfigFileError> {
    let ConfigError::Parse(parse) = err else {
        return None;
    };
    let span = parse.span()?;
    Some(
        ConfigFileError::new(parse.message(), name, content, span.start, span.len())
            .with_help("see the [vcenter], [catalog], [tagging] and [logging] sections"),
    )
}

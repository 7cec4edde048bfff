//! Error adapter for converting CLI errors to miette diagnostics.
//!
//! Configuration parse errors carry the file content and the byte span of
//! the offending value, so the rendered report shows the faulty snippet.
//! Other errors are rendered as plain reports with a code.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, NamedSource, SourceSpan};

use scorescan::ScorescanError;

use crate::error::{CliError, ConfigError};

/// Adapter rendering a [`CliError`] through miette.
pub struct ErrorAdapter<'a> {
    err: &'a CliError,
    source: Option<NamedSource<String>>,
}

impl<'a> ErrorAdapter<'a> {
    pub fn new(err: &'a CliError) -> Self {
        let source = match err {
            CliError::Config(ConfigError::Parse { path, content, .. }) => {
                Some(NamedSource::new(path.display().to_string(), content.clone()))
            }
            _ => None,
        };
        Self { err, source }
    }
}

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.err, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.err, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.err)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.err {
            CliError::Config(_) => "scorescan::config",
            CliError::Scorescan(ScorescanError::Grid(_)) => "scorescan::grid",
            CliError::Scorescan(ScorescanError::Sig(_)) => "scorescan::sig",
            CliError::Scorescan(ScorescanError::Config(_)) => "scorescan::config",
            CliError::Scorescan(ScorescanError::Json(_)) | CliError::Json(_) => "scorescan::json",
            CliError::Scorescan(ScorescanError::Io(_)) | CliError::Io(_) => "scorescan::io",
            CliError::Image(_) => "scorescan::image",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.err {
            CliError::Config(ConfigError::MissingFile(_)) => "check the --config path",
            CliError::Scorescan(ScorescanError::Sig(_)) => {
                "inter ids must be unique and relations must refer to existing inters"
            }
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.source
            .as_ref()
            .map(|source| source as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let CliError::Config(ConfigError::Parse {
            message,
            span: Some(span),
            ..
        }) = self.err
        else {
            return None;
        };
        let span = SourceSpan::from(span.clone());
        Some(Box::new(std::iter::once(LabeledSpan::new_primary_with_span(
            Some(message.clone()),
            span,
        ))))
    }
}

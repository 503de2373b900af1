//! Error rendering using ariadne.
//!
//! Compilation diagnostics are drawn against the expression text with the
//! offending span underlined. Other errors are written as a single line.

use crate::{Diagnostic, Error, Severity};
use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use std::io::Write;

/// Character set for rendering error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharSet {
    #[default]
    Unicode,
    Ascii,
}

/// Configuration for error rendering.
#[derive(Debug, Clone)]
pub struct RenderConfig<'a> {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
    /// Name shown in the report header. Defaults to `<expression>`.
    pub filename: Option<&'a str>,
    pub charset: CharSet,
}

impl Default for RenderConfig<'_> {
    fn default() -> Self {
        Self {
            color: true,
            filename: None,
            charset: CharSet::Unicode,
        }
    }
}

/// Renders an error to stderr using the default configuration.
pub fn render_error(error: &Error) {
    render_error_to(error, &mut std::io::stderr(), &RenderConfig::default()).ok();
}

/// Renders an error to a writer with the given configuration.
///
/// # Example
/// ```
/// use quill::{Diagnostic, Error, RenderConfig, render_error_to};
///
/// let error = Error::Compilation {
///     text: "total +".to_string(),
///     diagnostics: vec![Diagnostic::error("unexpected end of input")],
/// };
/// let mut buf = Vec::new();
/// let config = RenderConfig { color: false, ..Default::default() };
/// render_error_to(&error, &mut buf, &config).unwrap();
/// assert_eq!(String::from_utf8(buf).unwrap(), "error: unexpected end of input\n");
/// ```
pub fn render_error_to(
    error: &Error,
    writer: &mut dyn Write,
    config: &RenderConfig,
) -> std::io::Result<()> {
    let filename = config.filename.unwrap_or("<expression>");

    match error {
        Error::Compilation { text, diagnostics } => {
            render_diagnostics(text, diagnostics, writer, config, filename)
        }
        other => writeln!(writer, "{}", other),
    }
}

fn render_diagnostics(
    text: &str,
    diagnostics: &[Diagnostic],
    writer: &mut dyn Write,
    config: &RenderConfig,
    filename: &str,
) -> std::io::Result<()> {
    for diag in diagnostics {
        // Without a span there is nothing to point at.
        let Some(span) = diag.span.clone() else {
            match &diag.code {
                Some(code) => writeln!(writer, "[{}] {}: {}", code, diag.severity, diag.message)?,
                None => writeln!(writer, "{}: {}", diag.severity, diag.message)?,
            }
            continue;
        };

        let mut colors = ColorGenerator::new();
        colors.next();

        let kind = match diag.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
            Severity::Info => ReportKind::Advice,
        };

        let ariadne_charset = match config.charset {
            CharSet::Unicode => ariadne::CharSet::Unicode,
            CharSet::Ascii => ariadne::CharSet::Ascii,
        };
        let ariadne_config = ariadne::Config::default()
            .with_color(config.color)
            .with_char_set(ariadne_charset);

        let mut report = Report::build(kind, (filename, span.clone()))
            .with_message(&diag.message)
            .with_config(ariadne_config);

        if let Some(code) = &diag.code {
            report = report.with_code(code);
        }

        report = report.with_label(
            Label::new((filename, span))
                .with_message(&diag.message)
                .with_color(colors.next()),
        );

        report
            .finish()
            .write((filename, Source::from(text)), &mut *writer)?;
    }

    Ok(())
}

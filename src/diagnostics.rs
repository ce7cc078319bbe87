use crate::reader::Location;

use std::fmt;
use std::io;

use termcolor::{Color, ColorSpec, WriteColor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Note => "note",
        }
    }

    fn color(self) -> ColorSpec {
        let mut spec = ColorSpec::new();
        match self {
            Self::Error => spec.set_fg(Some(Color::Red)).set_bold(true),
            Self::Warning => spec.set_fg(Some(Color::Yellow)),
            Self::Note => spec.set_fg(Some(Color::Cyan)),
        };
        spec
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One diagnostic. Notes never stand alone; they follow the error or
/// warning they elaborate on, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub severity: Severity,
    pub location: Location,
    pub text: String,
}

const SOURCE_INDENT: usize = 2;

impl Message {
    pub fn error(location: Location, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            location,
            text: text.into(),
        }
    }

    pub fn warning(location: Location, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            location,
            text: text.into(),
        }
    }

    pub fn note(location: Location, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Note,
            location,
            text: text.into(),
        }
    }

    /// Write the diagnostic with a coloured severity label. The layout must
    /// stay identical to the plain [Display] rendering.
    pub fn write(&self, out: &mut dyn WriteColor) -> io::Result<()> {
        write!(out, "{}: ", self.location)?;
        out.set_color(&self.severity.color())?;
        write!(out, "{}", self.severity)?;
        out.reset()?;
        writeln!(out, ": {}", self.text)?;
        writeln!(out)?;
        writeln!(
            out,
            "{:indent$}{}",
            "",
            self.location.line_contents(),
            indent = SOURCE_INDENT
        )?;
        writeln!(
            out,
            "{:indent$}^",
            "",
            indent = SOURCE_INDENT + self.location.column() as usize - 1
        )
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {}: {}", self.location, self.severity, self.text)?;
        writeln!(f)?;
        writeln!(
            f,
            "{:indent$}{}",
            "",
            self.location.line_contents(),
            indent = SOURCE_INDENT
        )?;
        writeln!(
            f,
            "{:indent$}^",
            "",
            indent = SOURCE_INDENT + self.location.column() as usize - 1
        )
    }
}

pub fn error_count(messages: &[Message]) -> usize {
    messages
        .iter()
        .filter(|m| m.severity == Severity::Error)
        .count()
}

/// Write every message followed by the closing summary line, and return the
/// number of errors among them. Nothing is written for an empty report.
pub fn report(out: &mut dyn WriteColor, messages: &[Message]) -> io::Result<usize> {
    for message in messages {
        message.write(out)?;
    }
    let errors = error_count(messages);
    if !messages.is_empty() {
        let warnings = messages
            .iter()
            .filter(|m| m.severity == Severity::Warning)
            .count();
        writeln!(
            out,
            "Compile finished with {errors} error(s) and {warnings} warning(s)."
        )?;
    }
    Ok(errors)
}

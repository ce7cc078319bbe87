use crate::diagnostics::Message;
use crate::reader::Location;

use std::error;
use std::fmt;

pub type Result<T> = std::result::Result<T, ParseError>;

/// A fatal syntax error. The indentation-sensitive grammar makes recovery
/// unreliable, so the parser stops at the first one.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    message: Message,
}

impl ParseError {
    pub(super) fn new(location: Location, text: impl Into<String>) -> Self {
        Self {
            message: Message::error(location, text),
        }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn location(&self) -> &Location {
        &self.message.location
    }

    pub fn text(&self) -> &str {
        &self.message.text
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.message.location, self.message.text)
    }
}

impl error::Error for ParseError {}

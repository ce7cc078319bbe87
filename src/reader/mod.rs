
use std::fmt;
use std::rc::Rc;

/// A named input together with its full text. Shared between the [Reader]
/// that walks it and every [Location] snapshot taken along the way.
#[derive(Debug)]
pub struct Source {
    input_name: String,
    text: String,
}

/// A position in a [Source]: byte offset plus the 1-based line and column
/// it corresponds to. Snapshots stay valid after the reader moves on.
#[derive(Debug, Clone)]
pub struct Location {
    source: Rc<Source>,
    offset: usize,
    line: u32,
    column: u32,
}

impl Location {
    pub fn input_name(&self) -> &str {
        &self.source.input_name
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    /// Full text of the line this location falls on, without the newline.
    pub fn line_contents(&self) -> &str {
        let text = &self.source.text;
        let line_start = self.offset - (self.column as usize - 1);
        let line_end = text[self.offset..]
            .find('\n')
            .map_or(text.len(), |i| self.offset + i);
        &text[line_start..line_end]
    }
}

// Locations are equal when they name the same offset in the same source,
// not merely the same line and column in equal text.
impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.source, &other.source) && self.offset == other.offset
    }
}

impl Eq for Location {}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.input_name(), self.line, self.column)
    }
}

/// Cursor over a source buffer. All operations are byte-based; advancing
/// scans the consumed bytes for newlines to keep (line, column) current.
/// The reader never fails, exhaustion is observable through [empty](Reader::empty).
#[derive(Debug)]
pub struct Reader {
    source: Rc<Source>,
    offset: usize,
    line: u32,
    column: u32,
}

impl Reader {
    pub fn new(input_name: impl Into<String>, text: impl Into<String>) -> Self {
        let source = Rc::new(Source {
            input_name: input_name.into(),
            text: text.into(),
        });
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn location(&self) -> Location {
        Location {
            source: Rc::clone(&self.source),
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    pub fn remaining(&self) -> &str {
        &self.source.text[self.offset..]
    }

    pub fn prefix(&self, length: usize) -> &str {
        let rest = self.remaining();
        rest.get(..length).unwrap_or(rest)
    }

    pub fn empty(&self) -> bool {
        self.remaining().is_empty()
    }

    pub fn front(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.remaining().starts_with(prefix)
    }

    /// Consume `prefix` if the input starts with it. Does not advance on a
    /// mismatch.
    pub fn consume(&mut self, prefix: &str) -> bool {
        if self.starts_with(prefix) {
            self.advance(prefix.len());
            true
        } else {
            false
        }
    }

    pub fn advance(&mut self, length: usize) {
        for byte in &self.source.text.as_bytes()[self.offset..self.offset + length] {
            if *byte == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset += length;
    }
}

//! # Output Capture
//!
//! Collects the text a command writes back to its sender while it runs on
//! the simulation thread. Handed to work submitted in
//! [`ExecutionMode::BlockingWithOutput`](crate::bridge::ExecutionMode).

/// Marker that starts a formatting code (`§` + one code character).
pub const FORMAT_MARKER: char = '\u{00A7}';

/// Accumulates lines of textual output.
#[derive(Debug, Default, Clone)]
pub struct OutputCapture {
    log: String,
}

impl OutputCapture {
    /// Creates an empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one message followed by a newline.
    pub fn push_line(&mut self, line: &str) {
        self.log.push_str(line);
        self.log.push('\n');
    }

    /// Raw captured text, formatting codes included.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.log
    }

    /// Captured text with formatting codes removed.
    #[must_use]
    pub fn stripped(&self) -> String {
        strip_formatting(&self.log)
    }

    /// True if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Discards everything captured so far.
    pub fn clear(&mut self) {
        self.log.clear();
    }

    /// Consumes the capture, returning the stripped text.
    #[must_use]
    pub fn into_stripped(self) -> String {
        strip_formatting(&self.log)
    }
}

/// Removes color and style codes (`§0`-`§9`, `§a`-`§f`, `§k`-`§o`, `§r`, `§x`).
///
/// A marker followed by any other character is kept verbatim.
#[must_use]
pub fn strip_formatting(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == FORMAT_MARKER {
            if let Some(&next) = chars.peek() {
                if is_format_code(next) {
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

fn is_format_code(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), '0'..='9' | 'a'..='f' | 'k'..='o' | 'r' | 'x')
}

//! Line-oriented input cursor.
//!
//! VRML is read one physical line at a time. The cursor keeps the current line
//! and a scan position into it; comments are stripped lazily, once per line,
//! the first time a significant character is requested.

use std::io::BufRead;

use crate::error::{VrmlError, VrmlResult};

/// Reads lines from a `BufRead` and exposes a scan position.
pub struct LineCursor<R> {
    input: R,
    line: Vec<u8>,
    pos: usize,
    processed: bool,
    line_count: usize,
}

impl<R: BufRead> LineCursor<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            line: Vec::new(),
            pos: 0,
            processed: false,
            line_count: 0,
        }
    }

    /// Number of physical lines read so far (1-based line of the current one).
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Replace the current line with the next physical line.
    pub fn read_raw_line(&mut self) -> VrmlResult<()> {
        self.line.clear();
        self.pos = 0;
        self.processed = false;
        match self.input.read_until(b'\n', &mut self.line) {
            Ok(0) => Err(VrmlError::EndOfFile),
            Ok(_) => {
                self.line_count += 1;
                Ok(())
            }
            Err(err) => Err(VrmlError::Io(err)),
        }
    }

    /// Advance to the next significant character, reading further lines as
    /// needed. Blanks, tabs and commas are separators; `#` starts a comment.
    pub fn next_significant(&mut self) -> VrmlResult<()> {
        loop {
            while let Some(b' ' | b'\t' | b',') = self.line.get(self.pos) {
                self.pos += 1;
            }
            match self.line.get(self.pos) {
                None | Some(b'\n' | b'\r' | b'#') => self.read_raw_line()?,
                Some(_) => break,
            }
        }
        if !self.processed {
            self.strip_comment();
            self.processed = true;
        }
        Ok(())
    }

    /// Cut the line at the first unquoted `#` or line terminator.
    fn strip_comment(&mut self) {
        let mut quoted = false;
        let mut escaped = false;
        for i in self.pos..self.line.len() {
            let c = self.line[i];
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                b'\\' if quoted => escaped = true,
                b'"' => quoted = !quoted,
                b'\n' | b'\r' | b'#' if !quoted => {
                    self.line.truncate(i);
                    return;
                }
                _ => {}
            }
        }
    }

    /// The current byte, if any.
    pub fn peek(&self) -> Option<u8> {
        self.line.get(self.pos).copied()
    }

    /// Unconsumed part of the current line.
    pub fn rest(&self) -> &[u8] {
        self.line.get(self.pos..).unwrap_or_default()
    }

    /// Consume and return the current byte.
    pub fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Skip `n` bytes of the current line.
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.line.len());
    }

    /// Consume `c` if it is the current byte.
    pub fn consume_if(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }
}

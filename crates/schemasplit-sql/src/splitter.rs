//! Statement boundary detection
//!
//! A minimal tokenizer: it knows about quoted runs and comments so that a
//! `;` inside a string literal or a comment never ends a statement. It does
//! not try to understand the grammar beyond that.

use std::iter::Peekable;
use std::str::Chars;

/// Split SQL text into trimmed statements, each keeping its `;` terminator.
///
/// A trailing fragment without a terminator is kept if it is not blank.
pub fn split_statements(text: &str) -> Vec<String> {
    StatementSplitter::new(text).collect()
}

/// Iterator over the statements of a SQL text
pub struct StatementSplitter<'a> {
    chars: Peekable<Chars<'a>>,
    buffer: String,
}

impl<'a> StatementSplitter<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            buffer: String::new(),
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.buffer.push(c);
        Some(c)
    }

    fn read_quoted(&mut self, quote: char) {
        while let Some(c) = self.bump() {
            if c == quote {
                // Doubled quote is an escaped quote
                if self.chars.peek() == Some(&quote) {
                    self.bump();
                } else {
                    return;
                }
            } else if c == '\\' && quote != '`' {
                self.bump();
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\n' {
                return;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        self.bump(); // *
        while let Some(c) = self.bump() {
            if c == '*' && self.chars.peek() == Some(&'/') {
                self.bump();
                return;
            }
        }
    }

    fn take_statement(&mut self) -> Option<String> {
        let statement = self.buffer.trim().to_string();
        self.buffer.clear();
        if statement.trim_end_matches(';').trim().is_empty() {
            None
        } else {
            Some(statement)
        }
    }
}

impl Iterator for StatementSplitter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while let Some(c) = self.bump() {
            match c {
                '\'' | '"' | '`' => self.read_quoted(c),
                '-' if self.chars.peek() == Some(&'-') => self.skip_line_comment(),
                '/' if self.chars.peek() == Some(&'*') => self.skip_block_comment(),
                ';' => {
                    if let Some(statement) = self.take_statement() {
                        return Some(statement);
                    }
                }
                _ => {}
            }
        }

        self.take_statement()
    }
}

mod cursor;
#[cfg(test)]
mod scanner_tests;
mod word;

use crate::diagnostics::{Diag, DiagnosticManager};
use crate::sourceman::{SourceFile, SourceRange};
use cursor::Cursor;
pub use word::{Category, Word};

/// The scanner transforms the stream of characters into a stream of words.
///
/// It never fails destructively: bad input is reported through the
/// diagnostic manager and skipped, and after the end of the text it keeps
/// returning [Category::Eof] words.
pub struct Scanner<'a> {
    source: &'a SourceFile,
    diagman: &'a DiagnosticManager,
    cursor: Cursor<'a>,
}

fn is_letter(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a SourceFile, diagman: &'a DiagnosticManager) -> Self {
        let cursor = Cursor::new(source.contents());
        Self {
            source,
            diagman,
            cursor,
        }
    }

    pub fn get_source(&self) -> &'a SourceFile {
        self.source
    }

    /// Gets the next word in the stream of characters.
    pub fn next_word(&mut self) -> Word {
        loop {
            self.cursor.skip_whitespaces();

            if self.cursor.peek() == Some(b'/') && self.cursor.peek_2nd() == Some(b'*') {
                if self.skip_comment() {
                    continue;
                }
                return Word::eof(self.cursor.location());
            }

            let start = self.cursor.location();
            let Some(peek) = self.cursor.peek() else {
                return Word::eof(start);
            };

            let category = if is_digit(peek) {
                self.lex_number()
            } else if is_letter(peek) {
                Some(self.lex_identifier(start.0))
            } else {
                self.lex_operator()
            };

            match category {
                Some(category) => {
                    let lexeme = SourceRange::new(start.0, self.cursor.location().0);
                    return Word::new(category, lexeme);
                }
                // Already reported; resynchronize on the next word.
                None => continue,
            }
        }
    }

    /// Skips a `/* ... */` comment. Comments do not nest.
    ///
    /// Returns false when the comment is still open at end of input.
    fn skip_comment(&mut self) -> bool {
        let start = self.cursor.location();
        self.cursor.take();
        self.cursor.take();

        while let Some(byte) = self.cursor.take() {
            if byte == b'*' && self.cursor.bump_if(b'/') {
                return true;
            }
        }

        self.diagman.report(start, Diag::LexerUnclosedComment).emit();
        false
    }

    /// `[0-9]+`, rejected when a letter is immediately adjacent.
    fn lex_number(&mut self) -> Option<Category> {
        let start = self.cursor.location();
        while self.cursor.skip_if(is_digit) {}

        if self.cursor.peek().filter(|&b| is_letter(b)).is_some() {
            // Consume the whole run so we do not re-lex its tail.
            while self.cursor.skip_if(|b| is_letter(b) || is_digit(b)) {}
            let range = SourceRange::new(start.0, self.cursor.location().0);
            self.diagman
                .report(start, Diag::LexerBadNumber)
                .range(range)
                .emit();
            return None;
        }

        Some(Category::Number)
    }

    /// `[A-Za-z]+`. A digit terminates the identifier; keywords are
    /// recognized by table lookup after the match.
    fn lex_identifier(&mut self, start: u32) -> Category {
        while self.cursor.skip_if(is_letter) {}
        let lexeme = self
            .source
            .lexeme(SourceRange::new(start, self.cursor.location().0));
        Category::from_keyword(lexeme).unwrap_or(Category::Identifier)
    }

    fn lex_operator(&mut self) -> Option<Category> {
        let start = self.cursor.location();
        let first = self.cursor.take().expect("caller checked for input");
        let category = match first {
            b'+' => Category::Plus,
            b'-' => Category::Minus,
            b'*' => Category::Multiply,
            b'/' => Category::Divide,
            b';' => Category::Semicolon,
            b',' => Category::Comma,
            b'(' => Category::OpenParen,
            b')' => Category::CloseParen,
            b'[' => Category::OpenBracket,
            b']' => Category::CloseBracket,
            b'{' => Category::OpenCurly,
            b'}' => Category::CloseCurly,
            b'<' => {
                if self.cursor.bump_if(b'=') {
                    Category::LessEqual
                } else {
                    Category::Less
                }
            }
            b'>' => {
                if self.cursor.bump_if(b'=') {
                    Category::GreaterEqual
                } else {
                    Category::Greater
                }
            }
            b'=' => {
                if self.cursor.bump_if(b'=') {
                    Category::Equal
                } else {
                    Category::Assign
                }
            }
            b'!' if self.cursor.peek() == Some(b'=') => {
                self.cursor.take();
                Category::NotEqual
            }
            _ => {
                self.diagman.report(start, Diag::LexerBadChar).emit();
                return None;
            }
        };
        Some(category)
    }
}

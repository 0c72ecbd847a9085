use std::iter::Peekable;
use std::str::Chars;

/// One character of CSV text after quote handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Scanned {
    pub ch: char,
    /// True when the character sits inside a quoted section and must be taken
    /// literally.
    pub quoted: bool,
}

/// Left-to-right scan that tracks quote state.
///
/// Quote characters that open or close a quoted section are consumed and never
/// yielded. Inside quotes, `""` yields a single quoted `"`.
pub(crate) struct QuoteScan<'a> {
    chars: Peekable<Chars<'a>>,
    in_quotes: bool,
}

impl<'a> QuoteScan<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            in_quotes: false,
        }
    }

    pub fn in_quotes(&self) -> bool {
        self.in_quotes
    }
}

impl Iterator for QuoteScan<'_> {
    type Item = Scanned;

    fn next(&mut self) -> Option<Scanned> {
        loop {
            let ch = self.chars.next()?;
            if ch != '"' {
                return Some(Scanned {
                    ch,
                    quoted: self.in_quotes,
                });
            }
            if !self.in_quotes {
                self.in_quotes = true;
                continue;
            }
            if self.chars.peek() == Some(&'"') {
                self.chars.next();
                return Some(Scanned { ch, quoted: true });
            }
            self.in_quotes = false;
        }
    }
}

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::error::ParseError;
use crate::import::scan::QuoteScan;

/// Number of leading lines inspected when guessing the delimiter.
pub const SNIFF_SAMPLE_LINES: usize = 12;

/// Field separators the importer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Comma,
    Semicolon,
    Tab,
}

impl Delimiter {
    /// Candidates in tie-break order.
    pub const ALL: [Delimiter; 3] = [Delimiter::Comma, Delimiter::Semicolon, Delimiter::Tab];

    pub fn as_char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Semicolon => ';',
            Delimiter::Tab => '\t',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Delimiter::Comma => "comma",
            Delimiter::Semicolon => "semicolon",
            Delimiter::Tab => "tab",
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the parser picks a delimiter: guessed from the text, or fixed by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DelimiterMode {
    #[default]
    Auto,
    Fixed(Delimiter),
}

impl DelimiterMode {
    pub fn resolve(self, text: &str) -> Delimiter {
        match self {
            DelimiterMode::Auto => sniff(text),
            DelimiterMode::Fixed(d) => d,
        }
    }
}

impl FromStr for DelimiterMode {
    type Err = ParseError;

    /// Accepts `auto`, a delimiter name, or the delimiter character itself.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fixed = match s {
            "auto" => return Ok(DelimiterMode::Auto),
            "comma" | "," => Delimiter::Comma,
            "semicolon" | ";" => Delimiter::Semicolon,
            "tab" | "\t" | "\\t" => Delimiter::Tab,
            other => return Err(ParseError::InvalidDelimiter(other.to_string())),
        };
        Ok(DelimiterMode::Fixed(fixed))
    }
}

/// Guess the delimiter from the first few lines of `text`.
///
/// Counts occurrences of each candidate outside quoted sections and picks the
/// highest total; ties go to the earlier candidate in [`Delimiter::ALL`]. Quote
/// state restarts on every line. This is a heuristic and may guess wrong.
pub fn sniff(text: &str) -> Delimiter {
    let sample: Vec<&str> = text.lines().take(SNIFF_SAMPLE_LINES).collect();

    let mut best = Delimiter::Comma;
    let mut best_count = None;
    for candidate in Delimiter::ALL {
        let target = candidate.as_char();
        let count: usize = sample
            .iter()
            .map(|line| {
                QuoteScan::new(line)
                    .filter(|s| !s.quoted && s.ch == target)
                    .count()
            })
            .sum();
        if best_count.map_or(true, |b| count > b) {
            best = candidate;
            best_count = Some(count);
        }
    }

    debug!(delimiter = %best, count = best_count.unwrap_or(0), "sniffed delimiter");
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_semicolon() {
        assert_eq!(sniff("a;b;c\n1;2;3\n"), Delimiter::Semicolon);
    }

    #[test]
    fn detects_comma() {
        assert_eq!(sniff("a,b\n1,2\n"), Delimiter::Comma);
    }

    #[test]
    fn detects_tab() {
        assert_eq!(sniff("front\tback\r\nhola\thello\r\n"), Delimiter::Tab);
    }

    #[test]
    fn ignores_delimiters_inside_quotes() {
        let text = "front;back\n\"a, b, c, d\";x\n\"e, f\";y\n";
        assert_eq!(sniff(text), Delimiter::Semicolon);
    }

    #[test]
    fn ties_prefer_comma_then_semicolon() {
        assert_eq!(sniff("a,b;c\n"), Delimiter::Comma);
        assert_eq!(sniff("a;b\tc\n"), Delimiter::Semicolon);
        assert_eq!(sniff("just text\n"), Delimiter::Comma);
        assert_eq!(sniff(""), Delimiter::Comma);
    }

    #[test]
    fn only_the_first_lines_are_sampled() {
        let mut text = String::from("a;b\n");
        for _ in 0..20 {
            text.push_str("x,y,z\n");
        }
        // 11 sampled comma lines (22 commas) beat one semicolon
        assert_eq!(sniff(&text), Delimiter::Comma);

        let mut text = String::new();
        for _ in 0..SNIFF_SAMPLE_LINES {
            text.push_str("a;b\n");
        }
        for _ in 0..20 {
            text.push_str("x,y,z,w\n");
        }
        assert_eq!(sniff(&text), Delimiter::Semicolon);
    }

    #[test]
    fn delimiter_mode_from_str() {
        assert_eq!("auto".parse(), Ok(DelimiterMode::Auto));
        assert_eq!("tab".parse(), Ok(DelimiterMode::Fixed(Delimiter::Tab)));
        assert_eq!(";".parse(), Ok(DelimiterMode::Fixed(Delimiter::Semicolon)));
        assert_eq!("comma".parse(), Ok(DelimiterMode::Fixed(Delimiter::Comma)));
        assert_eq!(
            "|".parse::<DelimiterMode>(),
            Err(ParseError::InvalidDelimiter("|".into()))
        );
    }

    #[test]
    fn fixed_mode_skips_sniffing() {
        let mode = DelimiterMode::Fixed(Delimiter::Tab);
        assert_eq!(mode.resolve("a,b,c\n"), Delimiter::Tab);
        assert_eq!(DelimiterMode::Auto.resolve("a;b\n"), Delimiter::Semicolon);
    }
}

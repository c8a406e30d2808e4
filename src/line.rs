//! Whitespace-tokenized log lines.
//!
//! GAMESS prints every section of interest as columns separated by runs of
//! spaces, so a line is handled as an ordered list of tokens. This module
//! provides:
//!
//! - [`TokenizedLine::matches`]: positional keyword matching used to locate
//!   section landmarks
//! - typed peeks ([`TokenizedLine::get_int`], [`TokenizedLine::get_double`])
//! - typed consumption ([`TokenizedLine::pop_int`], [`TokenizedLine::pop_double`]),
//!   which removes the token and shifts the remaining ones left
//!
//! Numeric conversion failures are reported as [`LineError`] and carry the
//! 0-based line number of the offending line.

use thiserror::Error;

/// Error raised when a token is missing or cannot be converted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LineError {
    /// The requested token index is past the end of the line
    #[error("line {line}: expected a token at position {index}")]
    MissingToken {
        /// 0-based line number in the log file
        line: usize,
        /// Requested token position
        index: usize,
    },
    /// The token exists but is not a valid number of the requested kind
    #[error("line {line}: cannot read '{token}' as {expected}")]
    NumericFormat {
        /// 0-based line number in the log file
        line: usize,
        /// The raw token text
        token: String,
        /// "integer" or "real number"
        expected: &'static str,
    },
}

/// One line of the log split into whitespace-separated tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizedLine {
    number: usize,
    tokens: Vec<String>,
}

impl TokenizedLine {
    /// Tokenizes `raw`, remembering its 0-based line `number` in the file.
    ///
    /// # Examples
    ///
    /// ```
    /// use gamess_log::line::TokenizedLine;
    ///
    /// let line = TokenizedLine::new(7, "   TOTAL ENERGY =      -76.0107465155");
    /// assert_eq!(line.len(), 4);
    /// assert!(line.matches(&[("TOTAL", 0), ("ENERGY", 1)], 4));
    /// ```
    pub fn new(number: usize, raw: &str) -> Self {
        Self {
            number,
            tokens: raw.split_ascii_whitespace().map(str::to_string).collect(),
        }
    }

    /// 0-based line number in the source file
    pub fn number(&self) -> usize {
        self.number
    }

    /// Number of tokens left on the line
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True for blank lines
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token at `index`, if any.
    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// Positional keyword match.
    ///
    /// True only when the line has exactly `tokens` tokens and every keyword
    /// sits at its required index.
    pub fn matches(&self, keys: &[(&str, usize)], tokens: usize) -> bool {
        self.tokens.len() == tokens
            && keys
                .iter()
                .all(|(keyword, index)| self.token(*index) == Some(*keyword))
    }

    /// True if the token at `index` reads as an integer.
    pub fn is_int(&self, index: usize) -> bool {
        self.token(index)
            .map(|t| t.parse::<i64>().is_ok())
            .unwrap_or(false)
    }

    /// Reads the token at `index` as an integer without removing it.
    pub fn get_int(&self, index: usize) -> Result<i64, LineError> {
        let token = self.require(index)?;
        token.parse().map_err(|_| LineError::NumericFormat {
            line: self.number,
            token: token.to_string(),
            expected: "integer",
        })
    }

    /// Reads the token at `index` as a real number without removing it.
    pub fn get_double(&self, index: usize) -> Result<f64, LineError> {
        let token = self.require(index)?;
        parse_double(token).ok_or_else(|| LineError::NumericFormat {
            line: self.number,
            token: token.to_string(),
            expected: "real number",
        })
    }

    /// Reads and removes the integer token at `index`.
    pub fn pop_int(&mut self, index: usize) -> Result<i64, LineError> {
        let value = self.get_int(index)?;
        self.tokens.remove(index);
        Ok(value)
    }

    /// Reads and removes the real-number token at `index`.
    pub fn pop_double(&mut self, index: usize) -> Result<f64, LineError> {
        let value = self.get_double(index)?;
        self.tokens.remove(index);
        Ok(value)
    }

    fn require(&self, index: usize) -> Result<&str, LineError> {
        self.token(index).ok_or(LineError::MissingToken {
            line: self.number,
            index,
        })
    }
}

/// Parses a real number, accepting Fortran `D` exponents (`0.25D-01`).
fn parse_double(token: &str) -> Option<f64> {
    token.parse().ok().or_else(|| {
        if token.contains(['D', 'd']) {
            token.replace(['D', 'd'], "E").parse().ok()
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_requires_exact_token_count() {
        let line =
            TokenizedLine::new(0, " ATOM      ATOMIC                      COORDINATES (BOHR)");
        assert!(line.matches(&[("COORDINATES", 2), ("(BOHR)", 3)], 4));
        assert!(!line.matches(&[("COORDINATES", 2), ("(BOHR)", 3)], 5));
        assert!(!line.matches(&[("COORDINATES", 1)], 4));
    }

    #[test]
    fn test_pop_shifts_remaining_tokens() {
        let mut line =
            TokenizedLine::new(3, "  1   S       1           130.7093200    0.154328967295");
        assert_eq!(line.pop_int(0).unwrap(), 1);
        assert_eq!(line.token(0), Some("S"));
        assert!((line.pop_double(2).unwrap() - 130.70932).abs() < 1e-10);
        assert!((line.get_double(2).unwrap() - 0.154328967295).abs() < 1e-14);
        assert_eq!(line.len(), 3);
    }

    #[test]
    fn test_fortran_exponent() {
        let line = TokenizedLine::new(0, "0.25D-01 1.5d+02");
        assert!((line.get_double(0).unwrap() - 0.025).abs() < 1e-15);
        assert!((line.get_double(1).unwrap() - 150.0).abs() < 1e-12);
    }

    #[test]
    fn test_numeric_format_error_carries_line() {
        let line = TokenizedLine::new(42, "O 8.0 abc");
        let err = line.get_double(2).unwrap_err();
        assert_eq!(
            err,
            LineError::NumericFormat {
                line: 42,
                token: "abc".to_string(),
                expected: "real number"
            }
        );
        assert!(matches!(
            line.get_int(5),
            Err(LineError::MissingToken { line: 42, index: 5 })
        ));
    }
}

//! Column-blocked matrix readers for the overlap and eigenvector sections.
//!
//! GAMESS prints square matrices five columns at a time. Each block starts
//! with a header line of column numbers; every row line starts with the
//! 1-based row number followed by three label tokens (atom symbol, atom
//! number, component) and then up to five values:
//!
//! ```text
//!                     1           2
//!
//!     1  O  1  S    1.0000000
//!     2  H  2  S    0.2000000   1.0000000
//! ```
//!
//! Both readers are small state machines fed one line at a time through
//! `consume_line`, so the block format can be tested without any file I/O.

use crate::line::{LineError, TokenizedLine};
use crate::parser::ParseWarning;
use nalgebra::{DMatrix, DVector};

/// Index of the first value on a row line (row number + three labels).
const FIRST_VALUE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OverlapState {
    AwaitHeader,
    Rows,
    Done,
}

/// Rebuilds the packed lower-triangular overlap matrix.
#[derive(Debug)]
pub struct OverlapParser {
    aonum: usize,
    column_base: usize,
    state: OverlapState,
    packed: DVector<f64>,
    dropped: usize,
}

impl OverlapParser {
    /// Creates a reader for an `aonum x aonum` matrix.
    pub fn new(aonum: usize) -> Self {
        Self {
            aonum,
            column_base: 0,
            state: OverlapState::AwaitHeader,
            packed: DVector::zeros(aonum * (aonum + 1) / 2),
            dropped: 0,
        }
    }

    /// True once the last column of the last block has been read.
    pub fn is_done(&self) -> bool {
        self.state == OverlapState::Done
    }

    /// Feeds one body line of the overlap section.
    ///
    /// # Errors
    ///
    /// Returns [`LineError`] if a row carries a malformed number.
    pub fn consume_line(&mut self, line: &TokenizedLine) -> Result<(), LineError> {
        match self.state {
            OverlapState::AwaitHeader if line.is_int(0) => {
                self.column_base = (line.get_int(0)? - 1).max(0) as usize;
                self.state = OverlapState::Rows;
            }
            OverlapState::Rows if line.len() > FIRST_VALUE => {
                let row = (line.get_int(0)? - 1).max(0) as usize;
                let mut column = self.column_base;

                for index in FIRST_VALUE..line.len() {
                    let value = line.get_double(index)?;
                    if row < self.aonum && column <= row {
                        self.packed[column + row * (row + 1) / 2] = value;
                    } else {
                        self.dropped += 1;
                    }
                    column += 1;
                }

                if row + 1 == self.aonum {
                    self.state = if column == self.aonum {
                        OverlapState::Done
                    } else {
                        OverlapState::AwaitHeader
                    };
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Returns the packed matrix and, when incomplete, a warning.
    pub fn finish(self) -> (DVector<f64>, Vec<ParseWarning>) {
        let mut warnings = Vec::new();
        if !self.is_done() {
            warnings.push(ParseWarning::IncompleteMatrix {
                matrix: "overlap",
                detail: format!("last block never reached column {}", self.aonum),
            });
        }
        if self.dropped > 0 {
            warnings.push(ParseWarning::IncompleteMatrix {
                matrix: "overlap",
                detail: format!("{} values fell outside the lower triangle", self.dropped),
            });
        }
        (self.packed, warnings)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VectorState {
    AwaitHeader,
    Energies,
    Symmetry,
    Rows,
}

/// Rebuilds MO coefficients and orbital energies from an eigenvector section.
#[derive(Debug)]
pub struct EigenvectorParser {
    spin: &'static str,
    aonum: usize,
    start_mo: usize,
    state: VectorState,
    blocks: usize,
    energies: Vec<f64>,
    coefficients: DMatrix<f64>,
    columns: usize,
    dropped: usize,
}

/// Orbital energies and coefficients read from one eigenvector section.
#[derive(Debug, Clone)]
pub struct Eigenvectors {
    /// Orbital energies in MO order (Hartree)
    pub energies: Vec<f64>,
    /// AO rows by MO columns
    pub coefficients: DMatrix<f64>,
    /// Highest MO column that received a coefficient
    pub columns: usize,
}

impl EigenvectorParser {
    /// Creates a reader for `aonum` AOs; `spin` names the set in warnings.
    pub fn new(aonum: usize, spin: &'static str) -> Self {
        Self {
            spin,
            aonum,
            start_mo: 1,
            state: VectorState::AwaitHeader,
            blocks: 0,
            energies: Vec::new(),
            coefficients: DMatrix::zeros(aonum, aonum),
            columns: 0,
            dropped: 0,
        }
    }

    /// Feeds one body line of the eigenvector section.
    ///
    /// # Errors
    ///
    /// Returns [`LineError`] if a header, energy or coefficient is malformed.
    pub fn consume_line(&mut self, line: &TokenizedLine) -> Result<(), LineError> {
        if line.is_empty() {
            return Ok(());
        }

        match self.state {
            VectorState::AwaitHeader => {
                if line.is_int(0) {
                    self.start_mo = line.get_int(0)?.max(1) as usize;
                    self.state = VectorState::Energies;
                }
            }
            VectorState::Energies => {
                for index in 0..line.len() {
                    self.energies.push(line.get_double(index)?);
                }
                self.state = VectorState::Symmetry;
            }
            VectorState::Symmetry => self.state = VectorState::Rows,
            VectorState::Rows if line.len() > FIRST_VALUE => {
                let row = line.get_int(0)?.max(1) as usize;

                for (offset, index) in (FIRST_VALUE..line.len()).enumerate() {
                    let value = line.get_double(index)?;
                    let mo = self.start_mo + offset - 1;
                    match self.coefficients.get_mut((row - 1, mo)) {
                        Some(slot) => {
                            *slot = value;
                            self.columns = self.columns.max(mo + 1);
                        }
                        None => self.dropped += 1,
                    }
                }

                if row == self.aonum {
                    self.blocks += 1;
                    self.state = VectorState::AwaitHeader;
                }
            }
            VectorState::Rows => {}
        }
        Ok(())
    }

    /// Returns energies and coefficients, with warnings for a truncated set.
    pub fn finish(self) -> (Eigenvectors, Vec<ParseWarning>) {
        let mut warnings = Vec::new();
        if self.blocks == 0 || self.state != VectorState::AwaitHeader {
            warnings.push(ParseWarning::IncompleteMatrix {
                matrix: self.spin,
                detail: format!(
                    "{} complete blocks, section ended while reading block at MO {}",
                    self.blocks, self.start_mo
                ),
            });
        }
        if self.dropped > 0 {
            warnings.push(ParseWarning::IncompleteMatrix {
                matrix: self.spin,
                detail: format!("{} coefficients fell outside {} AOs", self.dropped, self.aonum),
            });
        }
        (
            Eigenvectors {
                energies: self.energies,
                coefficients: self.coefficients,
                columns: self.columns,
            },
            warnings,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::LineBuffer;

    fn feed_overlap(aonum: usize, text: &str) -> (DVector<f64>, Vec<ParseWarning>) {
        let mut parser = OverlapParser::new(aonum);
        for line in LineBuffer::from_text(text).lines() {
            parser.consume_line(line).unwrap();
        }
        parser.finish()
    }

    fn feed_vectors(aonum: usize, text: &str) -> (Eigenvectors, Vec<ParseWarning>) {
        let mut parser = EigenvectorParser::new(aonum, "alpha");
        for line in LineBuffer::from_text(text).lines() {
            parser.consume_line(line).unwrap();
        }
        parser.finish()
    }

    #[test]
    fn test_overlap_single_block() {
        let (packed, warnings) = feed_overlap(
            2,
            "\n\
             1           2\n\
             \n\
             1  O  1  S    1.0000000\n\
             2  H  2  S    0.2000000   1.0000000\n",
        );
        assert!(warnings.is_empty());
        assert_eq!(packed.as_slice(), &[1.0, 0.2, 1.0]);
    }

    #[test]
    fn test_overlap_two_blocks() {
        // 6 AOs: columns 1-5 then column 6
        let mut text = String::from("1 2 3 4 5\n");
        for r in 1..=6 {
            text.push_str(&format!("{r} C 1 S"));
            for c in 1..=r.min(5) {
                text.push_str(&format!(" {}.{}", r, c));
            }
            text.push('\n');
        }
        text.push_str("6\n6 C 1 S 6.6\n");

        let (packed, warnings) = feed_overlap(6, &text);
        assert!(warnings.is_empty());
        assert_eq!(packed.len(), 21);
        // (5,4) 0-based -> row 6, col 5 printed
        assert_eq!(packed[4 + 5 * 6 / 2], 6.5);
        assert_eq!(packed[5 + 5 * 6 / 2], 6.6);
        assert_eq!(packed[2 + 3 * 4 / 2], 4.3);
    }

    #[test]
    fn test_overlap_incomplete() {
        let (packed, warnings) = feed_overlap(3, "1 2 3\n1 O 1 S 1.0\n");
        assert_eq!(packed[0], 1.0);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_overlap_bad_value_is_fatal() {
        let mut parser = OverlapParser::new(1);
        parser.consume_line(&TokenizedLine::new(0, "1")).unwrap();
        assert!(parser
            .consume_line(&TokenizedLine::new(1, "1 O 1 S 1.0x"))
            .is_err());
    }

    #[test]
    fn test_eigenvectors_identity() {
        let (vectors, warnings) = feed_vectors(
            2,
            "          ------------\n\
             \n\
             1          2\n\
             -20.5        1.5\n\
             A          A\n\
             1  O  1  S    1.000000   0.000000\n\
             2  H  2  S    0.000000   1.000000\n",
        );
        assert!(warnings.is_empty());
        assert_eq!(vectors.energies, vec![-20.5, 1.5]);
        assert_eq!(vectors.coefficients.as_slice(), &[1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_eigenvectors_second_block_offsets_columns() {
        let mut text = String::from("1 2 3 4 5\n-1 -2 -3 -4 -5\nA A A A A\n");
        for r in 1..=6 {
            text.push_str(&format!("{r} C 1 S 0.1 0.2 0.3 0.4 0.5\n"));
        }
        text.push_str("6\n0.6\nA\n");
        for r in 1..=6 {
            text.push_str(&format!("{r} C 1 S {}\n", r as f64));
        }

        let (vectors, warnings) = feed_vectors(6, &text);
        assert!(warnings.is_empty());
        assert_eq!(vectors.energies.len(), 6);
        // MO 6 (0-based 5), AO 3 (0-based 2) -> flat 5*6 + 2
        assert_eq!(vectors.coefficients.as_slice()[5 * 6 + 2], 3.0);
        assert_eq!(vectors.coefficients[(0, 4)], 0.5);
        assert_eq!(vectors.columns, 6);
    }

    #[test]
    fn test_eigenvectors_short_energy_line() {
        let (vectors, _) = feed_vectors(
            2,
            "1          2
             -20.5
             A          A
             1  O  1  S    1.000000   0.000000
             2  H  2  S    0.000000   1.000000
",
        );
        assert_eq!(vectors.energies, vec![-20.5]);
        assert_eq!(vectors.columns, 2);
        assert_eq!(vectors.coefficients[(1, 1)], 1.0);
    }

    #[test]
    fn test_eigenvectors_truncated_block() {
        let (vectors, warnings) = feed_vectors(3, "1\n-1.0\nA\n1 O 1 S 1.0\n");
        assert_eq!(vectors.energies, vec![-1.0]);
        assert_eq!(vectors.columns, 1);
        assert_eq!(warnings.len(), 1);
    }
}

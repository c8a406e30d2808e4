//! GAMESS log parsing: readiness check, phase ordering and diagnostics.
//!
//! This module provides the entry point of the library. A [`GamessLog`] is
//! opened first; opening never fails, it only records a [`Readiness`]
//! state that callers check with [`GamessLog::is_ready`]. [`GamessLog::parse`]
//! then runs the extraction phases in a fixed order:
//!
//! 1. Section scan over the whole file ([`SectionLocator`])
//! 2. Geometry ([`read_atoms`])
//! 3. Basis set ([`BasisCollector`]), or the placeholder basis for
//!    tight-binding runs
//! 4. Overlap matrix ([`OverlapParser`])
//! 5. Alpha and beta eigenvectors ([`EigenvectorParser`])
//! 6. Mulliken charges ([`read_charges`])
//! 7. Finalize: unit conversion, HOMO/LUMO, consistency checks, summary
//!
//! Each phase loads its own bounded buffer from the file, so phases share no
//! read state. Malformed numbers inside a located section abort the parse
//! with [`ParseError::Line`]; missing or truncated sections are collected as
//! [`ParseWarning`]s next to the molecule.
//!
//! # Examples
//!
//! ```no_run
//! use gamess_log::parser::GamessLog;
//!
//! let log = GamessLog::open("water.log");
//! if log.is_ready() {
//!     let parsed = log.parse().unwrap();
//!     println!("{} atoms", parsed.molecule.atom_count());
//! }
//! ```

use crate::basis::{attach_placeholders, attach_shells, BasisCollector};
use crate::buffer::{LineBuffer, LineRange};
use crate::charges::read_charges;
use crate::geometry::read_atoms;
use crate::line::{LineError, TokenizedLine};
use crate::matrix::{EigenvectorParser, Eigenvectors, OverlapParser};
use crate::molecule::Molecule;
use crate::sections::{SectionLocator, SectionMap};
use crate::validation::{check_molecule, ConsistencyIssue};
use log::{debug, error, info, warn};
use nalgebra::{DMatrix, DVector};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default extension of GAMESS output files
pub const DEFAULT_EXTENSION: &str = "log";

/// Fatal error while parsing a log.
#[derive(Error, Debug)]
pub enum ParseError {
    /// I/O error while reading the file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The file could not be opened when the log was checked
    #[error("cannot open {}: {reason}", .path.display())]
    FileUnavailable {
        /// Path of the log
        path: PathBuf,
        /// Reason reported by the operating system
        reason: String,
    },
    /// The file does not carry the expected extension
    #[error("{} is not a .{expected} file", .path.display())]
    WrongFormat {
        /// Path of the log
        path: PathBuf,
        /// Expected extension
        expected: String,
    },
    /// A value inside a located section is malformed
    #[error("malformed log: {0}")]
    Line(#[from] LineError),
}

type Result<T> = std::result::Result<T, ParseError>;

/// Sections and scalar values whose absence is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Coordinate block
    Coordinates,
    /// Atomic basis block
    Basis,
    /// Overlap matrix
    Overlap,
    /// Alpha (or restricted) eigenvectors
    AlphaVectors,
    /// Beta eigenvectors
    BetaVectors,
    /// Mulliken/Lowdin populations
    Charges,
    /// Total energy line
    TotalEnergy,
    /// Electron count line
    ElectronCount,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Coordinates => "coordinates",
            Section::Basis => "atomic basis set",
            Section::Overlap => "overlap matrix",
            Section::AlphaVectors => "alpha eigenvectors",
            Section::BetaVectors => "beta eigenvectors",
            Section::Charges => "Mulliken charges",
            Section::TotalEnergy => "total energy",
            Section::ElectronCount => "number of electrons",
        };
        f.write_str(name)
    }
}

/// Recoverable problem found while parsing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseWarning {
    /// The start landmark of a section never appeared
    #[error("{0} not found")]
    MissingSection(Section),
    /// A section started but its end landmark never appeared
    #[error("{0} has no closing landmark")]
    UnterminatedSection(Section),
    /// A matrix section ended before every value was read
    #[error("incomplete {matrix} matrix: {detail}")]
    IncompleteMatrix {
        /// Which matrix ("overlap", "alpha", "beta")
        matrix: &'static str,
        /// What was missing
        detail: String,
    },
    /// A shell letter outside S, L, P, D, F
    #[error("shell {shell} has unsupported type '{kind}'")]
    UnsupportedShell {
        /// Shell index
        shell: usize,
        /// Letter found in the log
        kind: String,
    },
    /// A primitive line appeared before any atom label
    #[error("shell {shell} appears before any atom label")]
    OrphanShell {
        /// Shell index
        shell: usize,
    },
    /// A shell refers to an atom index past the coordinate block
    #[error("shell {shell} belongs to atom {atom} but only {atoms} atoms were read")]
    AtomOutOfRange {
        /// Shell index
        shell: usize,
        /// 0-based atom index
        atom: usize,
        /// Atoms read from the coordinate block
        atoms: usize,
    },
    /// Charge records and atoms disagree in number
    #[error("{records} charge records for {atoms} atoms")]
    ChargeMismatch {
        /// Charge records read
        records: usize,
        /// Atoms in the molecule
        atoms: usize,
    },
    /// A beta set landmark with no open alpha eigenvector section
    #[error("BETA SET at line {line} has no alpha eigenvectors before it, ignored")]
    IgnoredBetaSet {
        /// 1-based line number
        line: usize,
    },
    /// A structural consistency check failed
    #[error("{0}")]
    Inconsistent(ConsistencyIssue),
}

/// Whether a log can be parsed.
///
/// Availability is checked before the extension, so a missing file is
/// `Unavailable` whatever its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// The file exists, opens and has the expected extension
    Ready,
    /// The file is missing or cannot be opened
    Unavailable(String),
    /// The file has the wrong extension
    WrongFormat,
}

/// Result of a successful parse.
#[derive(Debug, Clone)]
pub struct ParsedLog {
    /// The molecule, in eV and Angstrom
    pub molecule: Molecule,
    /// Recoverable problems in the order they were found
    pub warnings: Vec<ParseWarning>,
}

/// A GAMESS log file checked for readiness.
#[derive(Debug, Clone)]
pub struct GamessLog {
    path: PathBuf,
    extension: String,
    readiness: Readiness,
}

impl GamessLog {
    /// Opens `path`, expecting the default `.log` extension.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::with_extension(path, DEFAULT_EXTENSION)
    }

    /// Opens `path`, expecting `extension` (without the dot).
    pub fn with_extension(path: impl AsRef<Path>, extension: &str) -> Self {
        let path = path.as_ref().to_path_buf();
        let readiness = check_readiness(&path, extension);
        Self {
            path,
            extension: extension.to_string(),
            readiness,
        }
    }

    /// Path of the log
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Readiness recorded when the log was opened
    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    /// True if [`GamessLog::parse`] can run
    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    /// Molecule name: the file stem
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Runs every extraction phase and returns the molecule with its warnings.
    ///
    /// # Errors
    ///
    /// - [`ParseError::FileUnavailable`] / [`ParseError::WrongFormat`] if the
    ///   log was not ready
    /// - [`ParseError::Io`] if the file cannot be read during a phase
    /// - [`ParseError::Line`] if a located section holds a malformed number
    pub fn parse(&self) -> Result<ParsedLog> {
        match &self.readiness {
            Readiness::Ready => {}
            Readiness::Unavailable(reason) => {
                return Err(ParseError::FileUnavailable {
                    path: self.path.clone(),
                    reason: reason.clone(),
                })
            }
            Readiness::WrongFormat => {
                return Err(ParseError::WrongFormat {
                    path: self.path.clone(),
                    expected: self.extension.clone(),
                })
            }
        }

        info!("Parsing GAMESS log {}", self.path.display());
        let mut warnings = Vec::new();

        let (map, found) = SectionLocator::scan(&LineBuffer::whole(&self.path)?)?;
        warnings.extend(found);

        let mut molecule = Molecule::new(self.name());
        molecule.open_shell = map.open_shell;
        molecule.tight_binding = map.tight_binding;
        molecule.electrons = map.electrons.unwrap_or(0);
        molecule.total_energy = map.total_energy.unwrap_or(0.0);

        if let Some(range) = map.coordinates {
            molecule.atoms = read_atoms(&self.section(range)?)?;
            debug!("Read {} atoms", molecule.atoms.len());
        }

        self.read_basis(&map, &mut molecule, &mut warnings)?;
        molecule.aonum = map.ao_count.unwrap_or_else(|| molecule.ao_count());
        debug!("AO count: {}", molecule.aonum);
        let n = molecule.aonum;
        molecule.overlap = DVector::zeros(n * (n + 1) / 2);
        molecule.coefficients = DMatrix::zeros(n, n);

        if let Some(range) = map.overlap {
            let mut reader = OverlapParser::new(molecule.aonum);
            self.feed(range, |line| reader.consume_line(line))?;
            let (packed, found) = reader.finish();
            molecule.overlap = packed;
            warnings.extend(found);
        }

        if let Some(range) = map.alpha_vectors {
            let vectors = self.read_vectors(range, molecule.aonum, "alpha", &mut warnings)?;
            molecule.orbital_energies = vectors.energies;
            molecule.coefficients = vectors.coefficients;
            molecule.mo_columns = vectors.columns;
        }

        if let Some(range) = map.beta_vectors {
            let vectors = self.read_vectors(range, molecule.aonum, "beta", &mut warnings)?;
            molecule.beta_orbital_energies = Some(vectors.energies);
            molecule.beta_coefficients = Some(vectors.coefficients);
        }

        if let Some(range) = map.charges {
            warnings.extend(read_charges(&self.section(range)?, &mut molecule.atoms)?);
        }

        finalize(&mut molecule, map.alpha_occupied, &mut warnings);

        for warning in &warnings {
            warn!("{}: {}", self.path.display(), warning);
        }

        Ok(ParsedLog { molecule, warnings })
    }

    fn read_basis(
        &self,
        map: &SectionMap,
        molecule: &mut Molecule,
        warnings: &mut Vec<ParseWarning>,
    ) -> Result<()> {
        if map.tight_binding {
            debug!("Tight-binding run, using placeholder valence basis");
            attach_placeholders(&mut molecule.atoms);
            return Ok(());
        }

        if let Some(range) = map.basis {
            let mut collector = BasisCollector::new();
            self.feed(range, |line| collector.consume_line(line))?;
            let (shells, found) = collector.finish();
            debug!("Read {} shells", shells.len());
            warnings.extend(found);
            warnings.extend(attach_shells(&mut molecule.atoms, &shells));
        }
        Ok(())
    }

    fn read_vectors(
        &self,
        range: LineRange,
        aonum: usize,
        spin: &'static str,
        warnings: &mut Vec<ParseWarning>,
    ) -> Result<Eigenvectors> {
        let mut reader = EigenvectorParser::new(aonum, spin);
        self.feed(range, |line| reader.consume_line(line))?;
        let (vectors, found) = reader.finish();
        debug!("Read {} {} orbitals", vectors.energies.len(), spin);
        warnings.extend(found);
        Ok(vectors)
    }

    fn section(&self, range: LineRange) -> Result<LineBuffer> {
        Ok(LineBuffer::slice(&self.path, range)?)
    }

    fn feed<F>(&self, range: LineRange, mut consume: F) -> Result<()>
    where
        F: FnMut(&TokenizedLine) -> std::result::Result<(), LineError>,
    {
        for line in self.section(range)?.lines() {
            consume(line)?;
        }
        Ok(())
    }
}

fn check_readiness(path: &Path, extension: &str) -> Readiness {
    if let Err(e) = File::open(path) {
        error!("Cannot open {}: {}", path.display(), e);
        return Readiness::Unavailable(e.to_string());
    }

    let matches = path
        .extension()
        .map_or(false, |e| e.to_string_lossy() == extension);
    if !matches {
        warn!(
            "{} does not have the .{} extension, skipping",
            path.display(),
            extension
        );
        return Readiness::WrongFormat;
    }
    Readiness::Ready
}

/// Last phase: units, frontier orbitals, consistency checks and summary.
fn finalize(
    molecule: &mut Molecule,
    alpha_occupied: Option<usize>,
    warnings: &mut Vec<ParseWarning>,
) {
    molecule.convert_units();

    let occupied = alpha_occupied.unwrap_or_else(|| molecule.occupied_from_electrons());
    molecule.assign_frontier_orbitals(occupied);

    warnings.extend(
        check_molecule(molecule)
            .into_iter()
            .map(ParseWarning::Inconsistent),
    );

    info!("Molecule {}: {} atoms", molecule.name, molecule.atom_count());
    info!("Total energy: {:.6} eV", molecule.total_energy);
    match (molecule.homo, molecule.lumo) {
        (Some(homo), Some(lumo)) => info!(
            "HOMO {} ({:.4} eV), LUMO {} ({:.4} eV)",
            homo.number, homo.energy, lumo.number, lumo.energy
        ),
        (Some(homo), None) => info!("HOMO {} ({:.4} eV), no LUMO", homo.number, homo.energy),
        _ => info!("Frontier orbitals not available"),
    }
    info!("AO count: {}", molecule.aonum);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_log(dir: &TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_readiness_states() {
        let dir = TempDir::new().unwrap();
        let good = write_log(&dir, "a.log", "");
        let wrong = write_log(&dir, "a.out", "");

        assert!(GamessLog::open(&good).is_ready());
        assert_eq!(GamessLog::open(&wrong).readiness(), &Readiness::WrongFormat);
        assert!(GamessLog::with_extension(&wrong, "out").is_ready());
        assert!(matches!(
            GamessLog::open(dir.path().join("missing.log")).readiness(),
            Readiness::Unavailable(_)
        ));
    }

    #[test]
    fn test_missing_file_reported_before_extension() {
        let dir = TempDir::new().unwrap();
        let log = GamessLog::open(dir.path().join("missing.out"));
        assert!(matches!(log.readiness(), Readiness::Unavailable(_)));
        assert!(matches!(
            log.parse(),
            Err(ParseError::FileUnavailable { .. })
        ));
    }

    #[test]
    fn test_parse_not_ready_returns_error() {
        let dir = TempDir::new().unwrap();
        let err = GamessLog::open(dir.path().join("missing.log"))
            .parse()
            .unwrap_err();
        assert!(matches!(err, ParseError::FileUnavailable { .. }));

        let wrong = write_log(&dir, "b.txt", "");
        let err = GamessLog::open(&wrong).parse().unwrap_err();
        assert!(matches!(err, ParseError::WrongFormat { ref expected, .. } if expected == "log"));
    }

    #[test]
    fn test_empty_log_yields_warnings_not_errors() {
        let dir = TempDir::new().unwrap();
        let path = write_log(&dir, "empty.log", "\n\n");
        let parsed = GamessLog::open(&path).parse().unwrap();
        assert_eq!(parsed.molecule.name, "empty");
        assert_eq!(parsed.molecule.atom_count(), 0);
        assert!(parsed
            .warnings
            .contains(&ParseWarning::MissingSection(Section::Coordinates)));
        assert!(parsed
            .warnings
            .iter()
            .any(|w| matches!(w, ParseWarning::Inconsistent(_))));
    }

    #[test]
    fn test_warning_messages() {
        assert_eq!(
            ParseWarning::MissingSection(Section::Overlap).to_string(),
            "overlap matrix not found"
        );
        assert_eq!(
            ParseWarning::ChargeMismatch { records: 2, atoms: 3 }.to_string(),
            "2 charge records for 3 atoms"
        );
    }
}

//! Section location over a whole GAMESS log.
//!
//! One forward scan tests every line against an ordered table of landmark
//! patterns. A pattern is a set of `(keyword, token index)` pairs plus the
//! exact token count of the line, for example:
//!
//! ```text
//!  ATOM      ATOMIC                      COORDINATES (BOHR)      COORDINATES@2 (BOHR)@3, 4 tokens
//!           ------------
//!           EIGENVECTORS                                        EIGENVECTORS@0, 1 token
//!  ...... END OF RHF CALCULATION ......                         END@1 CALCULATION@4, 6 tokens
//! ```
//!
//! The first pattern matching a line wins. Landmarks drive small state
//! machines rather than independent flags:
//!
//! - [`Span`] tracks one start/end pair (`Unseen`, `Open`, `Closed`). Starts
//!   are first-occurrence-wins; an end is recorded once, and only while its
//!   start is open.
//! - [`VectorBlocks`] tracks the alpha and beta eigenvector sections. Once
//!   the beta set opens, "end of calculation" closes beta instead of alpha.
//!
//! The result is a [`SectionMap`] of line ranges and scalar values; the
//! landmark line numbers themselves never leave the parser.

use crate::buffer::{LineBuffer, LineRange};
use crate::line::{LineError, TokenizedLine};
use crate::parser::{ParseWarning, Section};
use log::debug;

/// Landmarks recognised in a GAMESS log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Landmark {
    CoordinatesStart,
    InternuclearDistances,
    AtomicBasisHeader,
    BasisStart,
    BasisShellCount,
    AoCount,
    PcmSolvation,
    OverlapStart,
    OneElectronEnd,
    TightBindingHamiltonian,
    Eigenvectors,
    BetaSet,
    EndOfCalculation,
    ElectronCount,
    AlphaOccupied,
    MullikenStart,
    BondAnalysis,
    SolventEnergy,
    TotalEnergy,
}

struct Pattern {
    landmark: Landmark,
    keys: &'static [(&'static str, usize)],
    tokens: usize,
}

/// Ordered landmark table; the first match wins for a given line.
const PATTERNS: &[Pattern] = &[
    Pattern {
        landmark: Landmark::CoordinatesStart,
        keys: &[("COORDINATES", 2), ("(BOHR)", 3)],
        tokens: 4,
    },
    Pattern {
        landmark: Landmark::InternuclearDistances,
        keys: &[("INTERNUCLEAR", 0), ("(ANGS.)", 2)],
        tokens: 3,
    },
    Pattern {
        landmark: Landmark::AtomicBasisHeader,
        keys: &[("ATOMIC", 0), ("BASIS", 1)],
        tokens: 3,
    },
    Pattern {
        landmark: Landmark::BasisStart,
        keys: &[("SHELL", 0), ("COEFFICIENT(S)", 5)],
        tokens: 6,
    },
    Pattern {
        landmark: Landmark::BasisShellCount,
        keys: &[("BASIS", 3), ("SHELLS", 5)],
        tokens: 8,
    },
    Pattern {
        landmark: Landmark::AoCount,
        keys: &[("BASIS", 4), ("FUNCTIONS", 5)],
        tokens: 8,
    },
    Pattern {
        landmark: Landmark::PcmSolvation,
        keys: &[("PCM", 2), ("SOLVATION", 3)],
        tokens: 5,
    },
    Pattern {
        landmark: Landmark::OverlapStart,
        keys: &[("OVERLAP", 0), ("MATRIX", 1)],
        tokens: 2,
    },
    Pattern {
        landmark: Landmark::OneElectronEnd,
        keys: &[("END", 1), ("ONE-ELECTRON", 3)],
        tokens: 6,
    },
    Pattern {
        landmark: Landmark::TightBindingHamiltonian,
        keys: &[("NCC", 0), ("HAMILTONIAN", 1)],
        tokens: 2,
    },
    Pattern {
        landmark: Landmark::Eigenvectors,
        keys: &[("EIGENVECTORS", 0)],
        tokens: 1,
    },
    Pattern {
        landmark: Landmark::BetaSet,
        keys: &[("BETA", 1), ("SET", 2)],
        tokens: 4,
    },
    Pattern {
        landmark: Landmark::EndOfCalculation,
        keys: &[("END", 1), ("CALCULATION", 4)],
        tokens: 6,
    },
    Pattern {
        landmark: Landmark::ElectronCount,
        keys: &[("NUMBER", 0), ("ELECTRONS", 2)],
        tokens: 5,
    },
    Pattern {
        landmark: Landmark::AlphaOccupied,
        keys: &[("NUMBER", 0), ("OCCUPIED", 2), ("(ALPHA)", 4)],
        tokens: 7,
    },
    Pattern {
        landmark: Landmark::MullikenStart,
        keys: &[("MULLIKEN", 1), ("LOWDIN", 3)],
        tokens: 6,
    },
    Pattern {
        landmark: Landmark::BondAnalysis,
        keys: &[("BOND", 0), ("ANALYSIS", 4)],
        tokens: 8,
    },
    Pattern {
        landmark: Landmark::SolventEnergy,
        keys: &[("SOLVENT", 4), ("A.U.", 7)],
        tokens: 8,
    },
    Pattern {
        landmark: Landmark::TotalEnergy,
        keys: &[("TOTAL", 0), ("ENERGY", 1)],
        tokens: 4,
    },
];

fn classify(line: &TokenizedLine) -> Option<Landmark> {
    PATTERNS
        .iter()
        .find(|p| line.matches(p.keys, p.tokens))
        .map(|p| p.landmark)
}

/// State of one start/end landmark pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Span {
    /// Start landmark not seen yet
    #[default]
    Unseen,
    /// Start seen at this line, end not yet
    Open(usize),
    /// Both landmarks seen
    Closed(LineRange),
}

impl Span {
    /// Records a start landmark unless one was already seen.
    pub fn open(&mut self, line: usize) {
        if *self == Span::Unseen {
            *self = Span::Open(line);
        }
    }

    /// Records an end landmark if the span is open.
    pub fn close(&mut self, line: usize) {
        if let Span::Open(start) = *self {
            *self = Span::Closed(LineRange::new(start, line));
        }
    }

    /// True while the start has been seen and the end has not
    pub fn is_open(&self) -> bool {
        matches!(self, Span::Open(_))
    }

    /// The closed range, if any
    pub fn range(&self) -> Option<LineRange> {
        match self {
            Span::Closed(range) => Some(*range),
            _ => None,
        }
    }

    fn report(&self, section: Section, warnings: &mut Vec<ParseWarning>) -> Option<LineRange> {
        match self {
            Span::Unseen => {
                warnings.push(ParseWarning::MissingSection(section));
                None
            }
            Span::Open(_) => {
                warnings.push(ParseWarning::UnterminatedSection(section));
                None
            }
            Span::Closed(range) => Some(*range),
        }
    }
}

/// Alpha and beta eigenvector sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VectorBlocks {
    /// No `EIGENVECTORS` landmark yet
    #[default]
    Pending,
    /// Alpha section open at this line
    Alpha(usize),
    /// Alpha section closed by end of calculation
    AlphaDone(LineRange),
    /// Beta set open; alpha closed at the beta landmark
    Beta {
        /// Alpha section
        alpha: LineRange,
        /// Line of the beta landmark
        start: usize,
    },
    /// Both sections closed
    BetaDone {
        /// Alpha section
        alpha: LineRange,
        /// Beta section
        beta: LineRange,
    },
}

impl VectorBlocks {
    fn eigenvectors(&mut self, line: usize, solvent: bool) {
        *self = match *self {
            VectorBlocks::Pending => VectorBlocks::Alpha(line),
            VectorBlocks::Alpha(_) | VectorBlocks::AlphaDone(_) if solvent => {
                VectorBlocks::Alpha(line)
            }
            other => other,
        };
    }

    /// Returns false when no alpha section is open to hand over from.
    fn beta_set(&mut self, line: usize) -> bool {
        match *self {
            VectorBlocks::Alpha(start) => {
                *self = VectorBlocks::Beta {
                    alpha: LineRange::new(start, line),
                    start: line,
                };
                true
            }
            VectorBlocks::Pending | VectorBlocks::AlphaDone(_) => false,
            VectorBlocks::Beta { .. } | VectorBlocks::BetaDone { .. } => true,
        }
    }

    fn end_of_calculation(&mut self, line: usize) {
        *self = match *self {
            VectorBlocks::Alpha(start) => VectorBlocks::AlphaDone(LineRange::new(start, line)),
            VectorBlocks::Beta { alpha, start } => VectorBlocks::BetaDone {
                alpha,
                beta: LineRange::new(start, line),
            },
            other => other,
        };
    }

    /// True once the beta set has been opened
    pub fn is_open_shell(&self) -> bool {
        matches!(self, VectorBlocks::Beta { .. } | VectorBlocks::BetaDone { .. })
    }
}

/// Section ranges and scalar values found by the scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionMap {
    /// Coordinate block (Bohr)
    pub coordinates: Option<LineRange>,
    /// Atomic basis block
    pub basis: Option<LineRange>,
    /// Overlap matrix
    pub overlap: Option<LineRange>,
    /// Alpha (or restricted) eigenvectors
    pub alpha_vectors: Option<LineRange>,
    /// Beta eigenvectors
    pub beta_vectors: Option<LineRange>,
    /// Mulliken/Lowdin populations
    pub charges: Option<LineRange>,
    /// PCM solvation was requested
    pub solvent: bool,
    /// A beta set was printed
    pub open_shell: bool,
    /// Tight-binding Hamiltonian closed the overlap section
    pub tight_binding: bool,
    /// AO count stated by the log
    pub ao_count: Option<usize>,
    /// Number of electrons
    pub electrons: Option<usize>,
    /// Number of occupied alpha orbitals
    pub alpha_occupied: Option<usize>,
    /// Total energy in Hartree (solvent phase preferred)
    pub total_energy: Option<f64>,
}

/// Scan state for [`SectionMap`].
#[derive(Debug, Default)]
pub struct SectionLocator {
    coordinates: Span,
    basis: Span,
    overlap: Span,
    charges: Span,
    vectors: VectorBlocks,
    solvent: bool,
    tight_binding: bool,
    ao_count: Option<usize>,
    electrons: Option<usize>,
    alpha_occupied: Option<usize>,
    gas_energy: Option<f64>,
    solvent_energy: Option<f64>,
    ignored_beta: Vec<usize>,
}

impl SectionLocator {
    /// Creates a locator with every section unseen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans every line of `buffer` and returns the resulting map.
    ///
    /// # Errors
    ///
    /// Returns [`LineError`] if a scalar landmark (AO count, electron
    /// count, energy) carries a malformed number.
    pub fn scan(buffer: &LineBuffer) -> Result<(SectionMap, Vec<ParseWarning>), LineError> {
        let mut locator = Self::new();
        for line in buffer.lines() {
            locator.observe(line)?;
        }
        Ok(locator.finish())
    }

    /// Feeds one line of the log.
    pub fn observe(&mut self, line: &TokenizedLine) -> Result<(), LineError> {
        let Some(landmark) = classify(line) else {
            return Ok(());
        };
        let n = line.number();
        debug!("Landmark {:?} at line {}", landmark, n + 1);

        match landmark {
            Landmark::CoordinatesStart => self.coordinates.open(n),
            Landmark::InternuclearDistances | Landmark::AtomicBasisHeader => {
                self.coordinates.close(n)
            }
            Landmark::BasisStart => self.basis.open(n),
            Landmark::BasisShellCount => {
                self.coordinates.close(n);
                self.basis.close(n);
            }
            Landmark::AoCount => {
                if self.ao_count.is_none() {
                    self.ao_count = Some(count(line.get_int(7)?));
                }
            }
            Landmark::PcmSolvation => self.solvent = true,
            Landmark::OverlapStart => self.overlap.open(n),
            Landmark::OneElectronEnd => self.overlap.close(n),
            Landmark::TightBindingHamiltonian => {
                if self.overlap.is_open() {
                    self.overlap.close(n);
                    self.tight_binding = true;
                }
            }
            Landmark::Eigenvectors => self.vectors.eigenvectors(n, self.solvent),
            Landmark::BetaSet => {
                if !self.vectors.beta_set(n) {
                    self.ignored_beta.push(n + 1);
                }
            }
            Landmark::EndOfCalculation => self.vectors.end_of_calculation(n),
            Landmark::ElectronCount => {
                if self.electrons.is_none() {
                    self.electrons = Some(count(line.get_int(4)?));
                }
            }
            Landmark::AlphaOccupied => {
                if self.alpha_occupied.is_none() {
                    self.alpha_occupied = Some(count(line.get_int(6)?));
                }
            }
            Landmark::MullikenStart => self.charges.open(n),
            Landmark::BondAnalysis => self.charges.close(n),
            Landmark::SolventEnergy => self.solvent_energy = Some(line.get_double(6)?),
            Landmark::TotalEnergy => self.gas_energy = Some(line.get_double(3)?),
        }
        Ok(())
    }

    /// Ends the scan, reporting every section that was missing or left open.
    pub fn finish(self) -> (SectionMap, Vec<ParseWarning>) {
        let mut warnings = Vec::new();

        let coordinates = self.coordinates.report(Section::Coordinates, &mut warnings);
        let basis = if self.tight_binding {
            self.basis.range()
        } else {
            self.basis.report(Section::Basis, &mut warnings)
        };
        let overlap = self.overlap.report(Section::Overlap, &mut warnings);
        let charges = self.charges.report(Section::Charges, &mut warnings);

        let (alpha_vectors, beta_vectors) = match self.vectors {
            VectorBlocks::Pending => {
                warnings.push(ParseWarning::MissingSection(Section::AlphaVectors));
                (None, None)
            }
            VectorBlocks::Alpha(_) => {
                warnings.push(ParseWarning::UnterminatedSection(Section::AlphaVectors));
                (None, None)
            }
            VectorBlocks::AlphaDone(alpha) => (Some(alpha), None),
            VectorBlocks::Beta { alpha, .. } => {
                warnings.push(ParseWarning::UnterminatedSection(Section::BetaVectors));
                (Some(alpha), None)
            }
            VectorBlocks::BetaDone { alpha, beta } => (Some(alpha), Some(beta)),
        };

        warnings.extend(
            self.ignored_beta
                .iter()
                .map(|&line| ParseWarning::IgnoredBetaSet { line }),
        );

        let total_energy = self.solvent_energy.or(self.gas_energy);
        if total_energy.is_none() {
            warnings.push(ParseWarning::MissingSection(Section::TotalEnergy));
        }
        if self.electrons.is_none() {
            warnings.push(ParseWarning::MissingSection(Section::ElectronCount));
        }

        let map = SectionMap {
            coordinates,
            basis,
            overlap,
            alpha_vectors,
            beta_vectors,
            charges,
            solvent: self.solvent,
            open_shell: self.vectors.is_open_shell(),
            tight_binding: self.tight_binding,
            ao_count: self.ao_count,
            electrons: self.electrons,
            alpha_occupied: self.alpha_occupied,
            total_energy,
        };
        (map, warnings)
    }
}

fn count(value: i64) -> usize {
    value.max(0) as usize
}

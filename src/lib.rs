#![deny(missing_docs)]

//! gamess-log - Reader for GAMESS quantum-chemistry output
//!
//! gamess-log converts the text output ("log") of the GAMESS program into a
//! structured molecular model: atoms with their Cartesian basis functions, the
//! packed AO overlap matrix, MO coefficients and energies (alpha, and beta for
//! open-shell runs), Mulliken charges and the total energy.
//!
//! # Overview
//!
//! Sections of the log are found by positional keyword matching over
//! whitespace-tokenized lines. A first pass over the whole file records the
//! line range of every section; each extraction phase then reads only its
//! own range. The phases depend on one another:
//!
//! - atom order from the coordinate block anchors basis-function ownership
//! - the basis set fixes the number of atomic orbitals
//! - the number of atomic orbitals sizes the overlap and coefficient matrices
//!
//! # Quick Start
//!
//! ```no_run
//! use gamess_log::parser::GamessLog;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let log = GamessLog::open("water.log");
//!     let parsed = log.parse()?;
//!
//!     let mol = &parsed.molecule;
//!     println!("{} atoms, {} AOs", mol.atom_count(), mol.aonum);
//!     if let Some(homo) = mol.homo {
//!         println!("HOMO {} at {:.3} eV", homo.number, homo.energy);
//!     }
//!     for warning in &parsed.warnings {
//!         println!("warning: {}", warning);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Supported Shells
//!
//! | Shell | Orbitals | Components |
//! |-------|----------|------------|
//! | S | 1 | S |
//! | P | 3 | PX PY PZ |
//! | L (SP) | 4 | S PX PY PZ |
//! | D | 6 | XX YY ZZ XY XZ YZ |
//! | F | 10 | XXX YYY ZZZ XXY XXZ YYX YYZ ZZX ZZY XYZ |
//!
//! Tight-binding runs (NCC Hamiltonian) print no basis; every atom then gets a
//! minimal valence placeholder basis without primitives.
//!
//! # Units
//!
//! Values are read in atomic units and converted in the last phase: energies
//! from Hartree to eV, coordinates from Bohr to Angstrom.
//!
//! # Modules
//!
//! - [`parser`]: entry point, readiness and phase ordering
//! - [`sections`]: landmark scan
//! - [`geometry`], [`basis`], [`matrix`], [`charges`]: extraction phases
//! - [`molecule`]: data model
//! - [`validation`]: consistency checks
//! - [`settings`]: INI configuration
//! - [`snapshot`], [`io`]: JSON and XYZ export

pub mod basis;
pub mod buffer;
pub mod charges;
pub mod geometry;
pub mod io;
pub mod line;
pub mod matrix;
pub mod molecule;
pub mod parser;
pub mod sections;
pub mod settings;
pub mod snapshot;
pub mod validation;

pub use molecule::Molecule;
pub use parser::{GamessLog, ParseError, ParseWarning, ParsedLog};

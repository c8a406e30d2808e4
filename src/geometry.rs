//! Atomic coordinates and unit conversions.
//!
//! This module provides:
//!
//! - Unit conversion constants and helpers for energies (Hartree to eV) and
//!   lengths (Bohr to Angstrom)
//! - [`read_atoms`]: the coordinate-block extractor
//!
//! GAMESS prints the input geometry in Bohr:
//!
//! ```text
//!  ATOM      ATOMIC                      COORDINATES (BOHR)
//!            CHARGE         X                   Y                   Z
//!  O           8.0     0.0000000000        0.0000000000        0.2217971910
//!  H           1.0     0.0000000000        1.4308249289       -0.8871887640
//! ```
//!
//! Each atom line has exactly five tokens: symbol, nuclear charge, x, y, z.

use crate::buffer::LineBuffer;
use crate::line::LineError;
use crate::molecule::Atom;
use nalgebra::Vector3;

/// Unit conversion constants
pub const BOHR_TO_ANGSTROM: f64 = 0.529177210903;
/// Hartree to electronvolt, as used for all reported energies
pub const HARTREE_TO_EV: f64 = 27.2114;

/// Convert a position from Bohrs to Angstroms
pub fn bohr_to_angstrom(position: &Vector3<f64>) -> Vector3<f64> {
    position * BOHR_TO_ANGSTROM
}

/// Convert an energy from Hartree to electronvolt
pub fn hartree_to_ev(energy: f64) -> f64 {
    energy * HARTREE_TO_EV
}

/// Builds the atom list from the body of the coordinate block.
///
/// Lines with a token count other than five (column headers, blank lines)
/// are skipped. The nuclear charge column is not stored. Atoms are returned
/// in file order, which fixes the atom indices used by the basis and charge
/// readers.
///
/// # Errors
///
/// Returns [`LineError::NumericFormat`] if a coordinate cannot be read.
///
/// # Examples
///
/// ```
/// use gamess_log::buffer::LineBuffer;
/// use gamess_log::geometry::read_atoms;
///
/// let body = LineBuffer::from_text(
///     "           CHARGE         X                   Y                   Z\n\
///      O           8.0     0.0     0.0     0.2217971910\n\
///      H           1.0     0.0     1.4308249289     -0.8871887640\n",
/// );
/// let atoms = read_atoms(&body).unwrap();
/// assert_eq!(atoms.len(), 2);
/// assert_eq!(atoms[1].element, "H");
/// ```
pub fn read_atoms(buffer: &LineBuffer) -> Result<Vec<Atom>, LineError> {
    let mut atoms = Vec::new();

    for line in buffer.lines().iter().filter(|l| l.len() == 5) {
        let symbol = line.token(0).unwrap_or_default();
        let position = Vector3::new(line.get_double(2)?, line.get_double(3)?, line.get_double(4)?);
        atoms.push(Atom::new(symbol, position));
    }

    Ok(atoms)
}

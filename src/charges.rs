//! Mulliken charges from the population analysis.
//!
//! ```text
//!           TOTAL MULLIKEN AND LOWDIN ATOMIC POPULATIONS
//!        ATOM         MULL.POP.    CHARGE          LOW.POP.     CHARGE
//!     1 O             8.331862   -0.331862         8.250546   -0.250546
//!     2 H             0.834069    0.165931         0.874727    0.125273
//! ```
//!
//! Each six-token line is one atom, in coordinate-block order; the Mulliken
//! charge is token 3.

use crate::buffer::LineBuffer;
use crate::line::LineError;
use crate::molecule::Atom;
use crate::parser::ParseWarning;

/// Assigns Mulliken charges to `atoms` in file order.
///
/// Returns a warning when the number of charge records differs from the
/// number of atoms; surplus records are ignored.
///
/// # Errors
///
/// Returns [`LineError`] if a charge cannot be read as a number.
pub fn read_charges(
    buffer: &LineBuffer,
    atoms: &mut [Atom],
) -> Result<Vec<ParseWarning>, LineError> {
    let mut records = 0;

    for line in buffer.lines().iter().filter(|l| l.len() == 6) {
        let charge = line.get_double(3)?;
        if let Some(atom) = atoms.get_mut(records) {
            atom.charge = Some(charge);
        }
        records += 1;
    }

    if records != atoms.len() {
        return Ok(vec![ParseWarning::ChargeMismatch {
            records,
            atoms: atoms.len(),
        }]);
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    const POPULATIONS: &str = "\
        ATOM         MULL.POP.    CHARGE          LOW.POP.     CHARGE\n\
        1 O             8.331862   -0.331862         8.250546   -0.250546\n\
        2 H             0.834069    0.165931         0.874727    0.125273\n\
        3 H             0.834069    0.165931         0.874727    0.125273\n";

    fn water() -> Vec<Atom> {
        ["O", "H", "H"]
            .iter()
            .map(|s| Atom::new(*s, Vector3::zeros()))
            .collect()
    }

    #[test]
    fn test_charges_in_order() {
        let mut atoms = water();
        let warnings = read_charges(&LineBuffer::from_text(POPULATIONS), &mut atoms).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(atoms[0].charge, Some(-0.331862));
        assert_eq!(atoms[2].charge, Some(0.165931));
        let total: f64 = atoms.iter().filter_map(|a| a.charge).sum();
        assert!(total.abs() < 1e-6);
    }

    #[test]
    fn test_fewer_atoms_than_records() {
        let mut atoms = water();
        atoms.pop();
        let warnings = read_charges(&LineBuffer::from_text(POPULATIONS), &mut atoms).unwrap();
        assert_eq!(
            warnings,
            vec![ParseWarning::ChargeMismatch {
                records: 3,
                atoms: 2
            }]
        );
        assert_eq!(atoms[1].charge, Some(0.165931));
    }
}

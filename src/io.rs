//! Geometry export.
//!
//! Writes the parsed atoms in the plain XYZ format read by most chemistry
//! viewers.

use crate::geometry::bohr_to_angstrom;
use crate::molecule::{Molecule, UnitSystem};
use std::fs;
use std::io::Result;
use std::path::Path;

/// Writes the molecule's geometry to an XYZ file.
///
/// The XYZ format consists of:
/// 1. Number of atoms
/// 2. A comment line (molecule name and total energy)
/// 3. Lines for each atom: Element X Y Z, in Angstrom
///
/// Coordinates still in Bohr are converted on the fly.
///
/// # Examples
///
/// ```
/// use gamess_log::io;
/// use gamess_log::molecule::{Atom, Molecule};
/// use nalgebra::Vector3;
/// use std::path::Path;
///
/// fn main() -> std::io::Result<()> {
///     let mut mol = Molecule::new("h");
///     mol.atoms.push(Atom::new("H", Vector3::zeros()));
///
///     io::write_xyz(&mol, Path::new("h.xyz"))?;
///     std::fs::remove_file("h.xyz")?;
///     Ok(())
/// }
/// ```
pub fn write_xyz(molecule: &Molecule, path: &Path) -> Result<()> {
    fs::write(path, format_xyz(molecule))
}

/// XYZ text for the molecule's geometry.
pub fn format_xyz(molecule: &Molecule) -> String {
    let energy_unit = match molecule.units {
        UnitSystem::Atomic => "Eh",
        UnitSystem::Chemical => "eV",
    };
    let mut content = format!(
        "{}\n{} E = {:.8} {}\n",
        molecule.atom_count(),
        molecule.name,
        molecule.total_energy,
        energy_unit
    );

    for atom in &molecule.atoms {
        let p = match molecule.units {
            UnitSystem::Atomic => bohr_to_angstrom(&atom.position),
            UnitSystem::Chemical => atom.position,
        };
        content.push_str(&format!(
            "{}  {:.8}  {:.8}  {:.8}\n",
            atom.element, p.x, p.y, p.z
        ));
    }

    content
}

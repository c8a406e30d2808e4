//! Molecular model filled in by the log parser.
//!
//! - [`Primitive`]: one Gaussian term (exponent, contraction coefficient)
//! - [`Component`]: Cartesian component of an atomic orbital (`S`, `PX`, `XX`, `XYZ`, ...)
//! - [`AtomicOrbital`]: a contracted Cartesian Gaussian owned by one atom
//! - [`Atom`]: element, position, Mulliken charge and owned orbitals
//! - [`Molecule`]: atoms plus overlap, MO coefficients, orbital energies and totals
//!
//! # Units
//!
//! Values are stored as printed by GAMESS (Hartree, Bohr) until
//! [`Molecule::convert_units`] runs, after which energies are in eV and
//! coordinates in Angstrom. [`Molecule::units`] records which applies.
//!
//! # Matrix Storage
//!
//! - Overlap: packed lower triangle, element `(r, c)` with `r >= c` at
//!   `c + r*(r+1)/2`.
//! - MO coefficients: `aonum x aonum` column-major matrix with AOs as rows and
//!   MOs as columns, so the flat index of `(mo, ao)` is `mo*aonum + ao`.

use crate::geometry::{bohr_to_angstrom, hartree_to_ev};
use nalgebra::{DMatrix, DVector, Vector3};

/// One primitive Gaussian of a contraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primitive {
    /// Gaussian exponent
    pub exponent: f64,
    /// Contraction coefficient
    pub coefficient: f64,
}

impl Primitive {
    /// Creates a primitive from its exponent and coefficient.
    pub fn new(exponent: f64, coefficient: f64) -> Self {
        Self {
            exponent,
            coefficient,
        }
    }
}

/// Cartesian component of an atomic orbital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    /// `S` (s)
    S,
    /// `PX` (p)
    Px,
    /// `PY` (p)
    Py,
    /// `PZ` (p)
    Pz,
    /// `XX` (d)
    Xx,
    /// `YY` (d)
    Yy,
    /// `ZZ` (d)
    Zz,
    /// `XY` (d)
    Xy,
    /// `XZ` (d)
    Xz,
    /// `YZ` (d)
    Yz,
    /// `XXX` (f)
    Xxx,
    /// `YYY` (f)
    Yyy,
    /// `ZZZ` (f)
    Zzz,
    /// `XXY` (f)
    Xxy,
    /// `XXZ` (f)
    Xxz,
    /// `YYX` (f)
    Yyx,
    /// `YYZ` (f)
    Yyz,
    /// `ZZX` (f)
    Zzx,
    /// `ZZY` (f)
    Zzy,
    /// `XYZ` (f)
    Xyz,
}

impl Component {
    /// Symmetry label as GAMESS prints it.
    pub fn label(self) -> &'static str {
        match self {
            Component::S => "S",
            Component::Px => "PX",
            Component::Py => "PY",
            Component::Pz => "PZ",
            Component::Xx => "XX",
            Component::Yy => "YY",
            Component::Zz => "ZZ",
            Component::Xy => "XY",
            Component::Xz => "XZ",
            Component::Yz => "YZ",
            Component::Xxx => "XXX",
            Component::Yyy => "YYY",
            Component::Zzz => "ZZZ",
            Component::Xxy => "XXY",
            Component::Xxz => "XXZ",
            Component::Yyx => "YYX",
            Component::Yyz => "YYZ",
            Component::Zzx => "ZZX",
            Component::Zzy => "ZZY",
            Component::Xyz => "XYZ",
        }
    }

    /// Cartesian powers `(x, y, z)`.
    pub fn powers(self) -> [u32; 3] {
        match self {
            Component::S => [0, 0, 0],
            Component::Px => [1, 0, 0],
            Component::Py => [0, 1, 0],
            Component::Pz => [0, 0, 1],
            Component::Xx => [2, 0, 0],
            Component::Yy => [0, 2, 0],
            Component::Zz => [0, 0, 2],
            Component::Xy => [1, 1, 0],
            Component::Xz => [1, 0, 1],
            Component::Yz => [0, 1, 1],
            Component::Xxx => [3, 0, 0],
            Component::Yyy => [0, 3, 0],
            Component::Zzz => [0, 0, 3],
            Component::Xxy => [2, 1, 0],
            Component::Xxz => [2, 0, 1],
            Component::Yyx => [1, 2, 0],
            Component::Yyz => [0, 2, 1],
            Component::Zzx => [1, 0, 2],
            Component::Zzy => [0, 1, 2],
            Component::Xyz => [1, 1, 1],
        }
    }

    /// Angular-momentum order (sum of powers)
    pub fn order(self) -> u32 {
        self.powers().iter().sum()
    }

    /// Looks a component up by its printed label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.label() == label)
    }

    /// Every component, in shell-expansion order.
    pub const ALL: [Component; 20] = [
        Component::S,
        Component::Px,
        Component::Py,
        Component::Pz,
        Component::Xx,
        Component::Yy,
        Component::Zz,
        Component::Xy,
        Component::Xz,
        Component::Yz,
        Component::Xxx,
        Component::Yyy,
        Component::Zzz,
        Component::Xxy,
        Component::Xxz,
        Component::Yyx,
        Component::Yyz,
        Component::Zzx,
        Component::Zzy,
        Component::Xyz,
    ];
}

/// A contracted Cartesian Gaussian basis function.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomicOrbital {
    /// Cartesian component (label and powers)
    pub component: Component,
    /// Contraction, in file order
    pub primitives: Vec<Primitive>,
}

impl AtomicOrbital {
    /// Creates an orbital of the given component.
    pub fn new(component: Component, primitives: Vec<Primitive>) -> Self {
        Self {
            component,
            primitives,
        }
    }

    /// Symmetry label (`"S"`, `"PX"`, `"XXY"`, ...)
    pub fn symmetry(&self) -> &'static str {
        self.component.label()
    }

    /// Cartesian powers `(powx, powy, powz)`
    pub fn powers(&self) -> [u32; 3] {
        self.component.powers()
    }

    /// Angular-momentum order
    pub fn order(&self) -> u32 {
        self.component.order()
    }
}

/// An atom with its basis functions.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Element symbol as printed in the coordinate block
    pub element: String,
    /// Cartesian position (Bohr before unit conversion, Angstrom after)
    pub position: Vector3<f64>,
    /// Mulliken partial charge, once read
    pub charge: Option<f64>,
    /// Owned orbitals in basis-listing order
    pub orbitals: Vec<AtomicOrbital>,
}

impl Atom {
    /// Creates an atom without charge or orbitals.
    pub fn new(element: impl Into<String>, position: Vector3<f64>) -> Self {
        Self {
            element: element.into(),
            position,
            charge: None,
            orbitals: Vec::new(),
        }
    }

    /// True for hydrogen (case-insensitive on the printed symbol)
    pub fn is_hydrogen(&self) -> bool {
        self.element.eq_ignore_ascii_case("H")
    }
}

/// Which unit system the stored values use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSystem {
    /// Hartree and Bohr, as printed in the log
    Atomic,
    /// Electronvolt and Angstrom
    Chemical,
}

/// A frontier orbital: 1-based MO number as printed in the log, and energy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontierOrbital {
    /// 1-based MO number
    pub number: usize,
    /// Orbital energy in the molecule's current units
    pub energy: f64,
}

/// Molecular model built from one GAMESS log.
#[derive(Debug, Clone)]
pub struct Molecule {
    /// Name (log file stem)
    pub name: String,
    /// Atoms in coordinate-block order
    pub atoms: Vec<Atom>,
    /// Total energy
    pub total_energy: f64,
    /// Highest occupied MO
    pub homo: Option<FrontierOrbital>,
    /// Lowest unoccupied MO
    pub lumo: Option<FrontierOrbital>,
    /// Alpha (or restricted) orbital energies in MO order
    pub orbital_energies: Vec<f64>,
    /// Beta orbital energies, open-shell only
    pub beta_orbital_energies: Option<Vec<f64>>,
    /// Packed lower-triangular AO overlap
    pub overlap: DVector<f64>,
    /// Alpha MO coefficients, AO rows by MO columns
    pub coefficients: DMatrix<f64>,
    /// Alpha MO columns that actually received coefficients
    pub mo_columns: usize,
    /// Beta MO coefficients, open-shell only
    pub beta_coefficients: Option<DMatrix<f64>>,
    /// Unrestricted calculation with a separate beta set
    pub open_shell: bool,
    /// Tight-binding run with placeholder minimal basis
    pub tight_binding: bool,
    /// Number of electrons
    pub electrons: usize,
    /// Number of atomic orbitals used to size the matrices
    pub aonum: usize,
    /// Units of energies and coordinates
    pub units: UnitSystem,
}

impl Molecule {
    /// Creates an empty molecule in atomic units.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            atoms: Vec::new(),
            total_energy: 0.0,
            homo: None,
            lumo: None,
            orbital_energies: Vec::new(),
            beta_orbital_energies: None,
            overlap: DVector::zeros(0),
            coefficients: DMatrix::zeros(0, 0),
            mo_columns: 0,
            beta_coefficients: None,
            open_shell: false,
            tight_binding: false,
            electrons: 0,
            aonum: 0,
            units: UnitSystem::Atomic,
        }
    }

    /// Number of atoms
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Sum of orbital counts over all atoms
    pub fn ao_count(&self) -> usize {
        self.atoms.iter().map(|a| a.orbitals.len()).sum()
    }

    /// Number of alpha MOs read from the log
    pub fn orbital_count(&self) -> usize {
        self.orbital_energies.len()
    }

    /// Packed index of overlap element `(row, col)`, mirrored onto the lower triangle.
    pub fn packed_index(row: usize, col: usize) -> usize {
        let (r, c) = if row >= col { (row, col) } else { (col, row) };
        c + r * (r + 1) / 2
    }

    /// Overlap element `(row, col)`, either triangle.
    pub fn overlap(&self, row: usize, col: usize) -> Option<f64> {
        self.overlap.get(Self::packed_index(row, col)).copied()
    }

    /// Full symmetric overlap matrix unpacked from the lower triangle.
    pub fn overlap_matrix(&self) -> DMatrix<f64> {
        let n = self.aonum;
        DMatrix::from_fn(n, n, |r, c| self.overlap(r, c).unwrap_or(0.0))
    }

    /// Alpha coefficient of AO `ao` in MO `mo` (both 0-based).
    pub fn coefficient(&self, mo: usize, ao: usize) -> Option<f64> {
        self.coefficients.get((ao, mo)).copied()
    }

    /// Converts Hartree to eV and Bohr to Angstrom. No-op when already converted.
    pub fn convert_units(&mut self) {
        if self.units == UnitSystem::Chemical {
            return;
        }

        self.total_energy = hartree_to_ev(self.total_energy);
        for energy in self.orbital_energies.iter_mut() {
            *energy = hartree_to_ev(*energy);
        }
        if let Some(beta) = self.beta_orbital_energies.as_mut() {
            for energy in beta.iter_mut() {
                *energy = hartree_to_ev(*energy);
            }
        }
        for frontier in [self.homo.as_mut(), self.lumo.as_mut()].into_iter().flatten() {
            frontier.energy = hartree_to_ev(frontier.energy);
        }
        for atom in self.atoms.iter_mut() {
            atom.position = bohr_to_angstrom(&atom.position);
        }

        self.units = UnitSystem::Chemical;
    }

    /// Sets HOMO and LUMO from the number of occupied alpha orbitals.
    ///
    /// Either is left `None` when the alpha energy list does not reach it.
    pub fn assign_frontier_orbitals(&mut self, occupied: usize) {
        let frontier = |number: usize| {
            number
                .checked_sub(1)
                .and_then(|i| self.orbital_energies.get(i))
                .map(|&energy| FrontierOrbital { number, energy })
        };
        let homo = frontier(occupied);
        let lumo = frontier(occupied + 1);
        self.homo = homo;
        self.lumo = lumo;
    }

    /// Number of occupied alpha orbitals implied by the electron count.
    pub fn occupied_from_electrons(&self) -> usize {
        (self.electrons + 1) / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water_like() -> Molecule {
        let mut mol = Molecule::new("test");
        mol.atoms.push(Atom::new("O", Vector3::new(0.0, 0.0, 1.0)));
        mol.atoms.push(Atom::new("H", Vector3::new(0.0, 1.0, 0.0)));
        mol.total_energy = -1.0;
        mol.orbital_energies = vec![-0.5, 0.25];
        mol
    }

    #[test]
    fn test_component_powers_match_order() {
        for component in Component::ALL {
            let label_len = if component == Component::S {
                0
            } else if component.label().starts_with('P') {
                1
            } else {
                component.label().len() as u32
            };
            assert_eq!(component.order(), label_len, "{}", component.label());
        }
        assert_eq!(Component::from_label("YYZ"), Some(Component::Yyz));
        assert_eq!(Component::Yyz.powers(), [0, 2, 1]);
        assert_eq!(Component::Xyz.powers(), [1, 1, 1]);
    }

    #[test]
    fn test_packed_index_is_symmetric() {
        assert_eq!(Molecule::packed_index(0, 0), 0);
        assert_eq!(Molecule::packed_index(1, 0), 1);
        assert_eq!(Molecule::packed_index(0, 1), 1);
        assert_eq!(Molecule::packed_index(1, 1), 2);
        assert_eq!(Molecule::packed_index(3, 2), 8);
    }

    #[test]
    fn test_convert_units_once() {
        let mut mol = water_like();
        mol.convert_units();
        mol.convert_units();

        assert_eq!(mol.units, UnitSystem::Chemical);
        assert!((mol.total_energy + 27.2114).abs() < 1e-4);
        assert!((mol.orbital_energies[1] - 0.25 * 27.2114).abs() < 1e-4);
        assert!((mol.atoms[0].position.z - 0.529177).abs() < 1e-4);
    }

    #[test]
    fn test_frontier_orbitals() {
        let mut mol = water_like();
        mol.assign_frontier_orbitals(1);
        assert_eq!(mol.homo.unwrap().number, 1);
        assert_eq!(mol.lumo.unwrap().energy, 0.25);

        mol.assign_frontier_orbitals(2);
        assert!(mol.homo.is_some());
        assert!(mol.lumo.is_none());

        mol.assign_frontier_orbitals(0);
        assert!(mol.homo.is_none());
    }

    #[test]
    fn test_occupied_rounds_up_for_odd_electrons() {
        let mut mol = water_like();
        mol.electrons = 9;
        assert_eq!(mol.occupied_from_electrons(), 5);
        mol.electrons = 10;
        assert_eq!(mol.occupied_from_electrons(), 5);
    }
}

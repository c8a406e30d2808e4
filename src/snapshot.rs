//! JSON snapshots of a parsed molecule.
//!
//! A snapshot stores everything a [`Molecule`] holds so downstream tools can
//! reload it without re-reading the log. nalgebra matrices and vectors are
//! converted to plain `Vec`s by serializable wrapper types:
//!
//! - [`SerializableAtom`]: position as `[f64; 3]`, orbitals by label
//! - [`MoleculeSnapshot`]: overlap as the packed `Vec<f64>`, coefficient
//!   matrices as rows of AO coefficients
//!
//! # Usage
//!
//! ```no_run
//! use gamess_log::parser::GamessLog;
//! use gamess_log::snapshot::MoleculeSnapshot;
//! use std::path::Path;
//!
//! let parsed = GamessLog::open("water.log").parse().unwrap();
//! MoleculeSnapshot::from(&parsed.molecule)
//!     .save(Path::new("water.json"))
//!     .unwrap();
//! let molecule = MoleculeSnapshot::load(Path::new("water.json")).unwrap();
//! ```

use crate::molecule::{
    Atom, AtomicOrbital, Component, FrontierOrbital, Molecule, Primitive, UnitSystem,
};
use nalgebra::{DMatrix, DVector, Vector3};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Error while saving or loading a snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// I/O error on the snapshot file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// An orbital label that names no Cartesian component
    #[error("unknown orbital component '{0}'")]
    UnknownComponent(String),
    /// A matrix whose rows differ in length
    #[error("ragged {0} matrix")]
    RaggedMatrix(&'static str),
}

/// Serializable wrapper for [`AtomicOrbital`].
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SerializableOrbital {
    /// Symmetry label, e.g. `"PX"`
    label: String,
    /// `(exponent, coefficient)` pairs
    primitives: Vec<(f64, f64)>,
}

/// Serializable wrapper for [`Atom`].
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SerializableAtom {
    element: String,
    position: [f64; 3],
    charge: Option<f64>,
    orbitals: Vec<SerializableOrbital>,
}

impl From<&Atom> for SerializableAtom {
    fn from(atom: &Atom) -> Self {
        Self {
            element: atom.element.clone(),
            position: [atom.position.x, atom.position.y, atom.position.z],
            charge: atom.charge,
            orbitals: atom
                .orbitals
                .iter()
                .map(|o| SerializableOrbital {
                    label: o.symmetry().to_string(),
                    primitives: o
                        .primitives
                        .iter()
                        .map(|p| (p.exponent, p.coefficient))
                        .collect(),
                })
                .collect(),
        }
    }
}

impl TryFrom<SerializableAtom> for Atom {
    type Error = SnapshotError;

    fn try_from(ser: SerializableAtom) -> Result<Self, Self::Error> {
        let [x, y, z] = ser.position;
        let mut atom = Atom::new(ser.element, Vector3::new(x, y, z));
        atom.charge = ser.charge;
        for orbital in ser.orbitals {
            let component = Component::from_label(&orbital.label)
                .ok_or_else(|| SnapshotError::UnknownComponent(orbital.label.clone()))?;
            let primitives = orbital
                .primitives
                .into_iter()
                .map(|(exponent, coefficient)| Primitive::new(exponent, coefficient))
                .collect();
            atom.orbitals.push(AtomicOrbital::new(component, primitives));
        }
        Ok(atom)
    }
}

/// Complete serializable state of a [`Molecule`].
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MoleculeSnapshot {
    /// Molecule name
    pub name: String,
    atoms: Vec<SerializableAtom>,
    /// Total energy in the snapshot's units
    pub total_energy: f64,
    homo: Option<(usize, f64)>,
    lumo: Option<(usize, f64)>,
    orbital_energies: Vec<f64>,
    beta_orbital_energies: Option<Vec<f64>>,
    overlap: Vec<f64>,
    coefficients: Vec<Vec<f64>>,
    #[serde(default)]
    mo_columns: usize,
    beta_coefficients: Option<Vec<Vec<f64>>>,
    open_shell: bool,
    tight_binding: bool,
    electrons: usize,
    aonum: usize,
    /// True when energies are in eV and coordinates in Angstrom
    pub chemical_units: bool,
}

fn matrix_rows(matrix: &DMatrix<f64>) -> Vec<Vec<f64>> {
    matrix
        .row_iter()
        .map(|row| row.iter().cloned().collect())
        .collect()
}

fn matrix_from_rows(
    rows: Vec<Vec<f64>>,
    name: &'static str,
) -> Result<DMatrix<f64>, SnapshotError> {
    let nrows = rows.len();
    let ncols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != ncols) {
        return Err(SnapshotError::RaggedMatrix(name));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Ok(DMatrix::from_row_slice(nrows, ncols, &flat))
}

fn frontier(orbital: Option<FrontierOrbital>) -> Option<(usize, f64)> {
    orbital.map(|o| (o.number, o.energy))
}

impl From<&Molecule> for MoleculeSnapshot {
    fn from(mol: &Molecule) -> Self {
        Self {
            name: mol.name.clone(),
            atoms: mol.atoms.iter().map(SerializableAtom::from).collect(),
            total_energy: mol.total_energy,
            homo: frontier(mol.homo),
            lumo: frontier(mol.lumo),
            orbital_energies: mol.orbital_energies.clone(),
            beta_orbital_energies: mol.beta_orbital_energies.clone(),
            overlap: mol.overlap.data.as_vec().clone(),
            coefficients: matrix_rows(&mol.coefficients),
            mo_columns: mol.mo_columns,
            beta_coefficients: mol.beta_coefficients.as_ref().map(matrix_rows),
            open_shell: mol.open_shell,
            tight_binding: mol.tight_binding,
            electrons: mol.electrons,
            aonum: mol.aonum,
            chemical_units: mol.units == UnitSystem::Chemical,
        }
    }
}

impl TryFrom<MoleculeSnapshot> for Molecule {
    type Error = SnapshotError;

    fn try_from(snap: MoleculeSnapshot) -> Result<Self, Self::Error> {
        let mut mol = Molecule::new(snap.name);
        mol.atoms = snap
            .atoms
            .into_iter()
            .map(Atom::try_from)
            .collect::<Result<_, _>>()?;
        mol.total_energy = snap.total_energy;
        mol.homo = snap.homo.map(|(number, energy)| FrontierOrbital { number, energy });
        mol.lumo = snap.lumo.map(|(number, energy)| FrontierOrbital { number, energy });
        mol.orbital_energies = snap.orbital_energies;
        mol.beta_orbital_energies = snap.beta_orbital_energies;
        mol.overlap = DVector::from_vec(snap.overlap);
        mol.coefficients = matrix_from_rows(snap.coefficients, "alpha")?;
        mol.mo_columns = snap.mo_columns;
        mol.beta_coefficients = snap
            .beta_coefficients
            .map(|rows| matrix_from_rows(rows, "beta"))
            .transpose()?;
        mol.open_shell = snap.open_shell;
        mol.tight_binding = snap.tight_binding;
        mol.electrons = snap.electrons;
        mol.aonum = snap.aonum;
        mol.units = if snap.chemical_units {
            UnitSystem::Chemical
        } else {
            UnitSystem::Atomic
        };
        Ok(mol)
    }
}

impl MoleculeSnapshot {
    /// Writes the snapshot as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Reads a snapshot file and rebuilds the molecule.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a snapshot, names
    /// an unknown orbital component or holds a ragged matrix.
    pub fn load(path: &Path) -> Result<Molecule, SnapshotError> {
        let content = fs::read_to_string(path)?;
        let snapshot: MoleculeSnapshot = serde_json::from_str(&content)?;
        Molecule::try_from(snapshot)
    }
}

//! Structural consistency checks on a parsed molecule.
//!
//! The checks never halt parsing. Each problem found is returned as a
//! [`ConsistencyIssue`] with a category for programmatic handling and, where
//! one exists, a suggestion pointing at the likely cause in the log.
//!
//! # Checks
//!
//! - The molecule has atoms
//! - The orbitals attached to atoms add up to `aonum`
//! - The alpha orbital energies match the coefficient columns actually read
//! - The beta set, when present, has as many orbitals as the alpha set
//! - Every atom received a Mulliken charge
//! - The overlap diagonal is close to 1 (skipped for tight-binding runs)
//! - The electron count is non-zero

use crate::molecule::Molecule;
use std::fmt;

/// Largest accepted deviation of an overlap diagonal element from 1.
const DIAGONAL_TOLERANCE: f64 = 1e-3;

/// One structural problem found in a parsed molecule.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsistencyIssue {
    /// Issue category for programmatic handling
    pub category: IssueCategory,
    /// Human-readable description
    pub message: String,
    /// Optional hint about the cause
    pub suggestion: Option<String>,
}

/// Categories of consistency issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueCategory {
    /// No atoms were read
    NoAtoms,
    /// Attached orbitals disagree with the AO count
    AoCountMismatch,
    /// Orbital energies disagree with coefficient columns
    OrbitalCountMismatch,
    /// Beta set sized differently from the alpha set
    SpinSetMismatch,
    /// Atoms left without a Mulliken charge
    MissingCharges,
    /// Overlap diagonal not normalised
    OverlapNotNormalised,
    /// Electron count missing or zero
    NoElectrons,
}

impl fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        Ok(())
    }
}

impl ConsistencyIssue {
    fn new(category: IssueCategory, message: String) -> Self {
        Self {
            category,
            message,
            suggestion: None,
        }
    }

    fn suggest(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }
}

/// Runs every consistency check on `molecule`.
///
/// # Examples
///
/// ```
/// use gamess_log::molecule::Molecule;
/// use gamess_log::validation::{check_molecule, IssueCategory};
///
/// let issues = check_molecule(&Molecule::new("empty"));
/// assert!(issues.iter().any(|i| i.category == IssueCategory::NoAtoms));
/// ```
pub fn check_molecule(molecule: &Molecule) -> Vec<ConsistencyIssue> {
    let mut issues = Vec::new();

    if molecule.atoms.is_empty() {
        issues.push(
            ConsistencyIssue::new(IssueCategory::NoAtoms, "no atoms were read".to_string())
                .suggest("check that the log contains a COORDINATES (BOHR) block"),
        );
    }

    let attached = molecule.ao_count();
    if attached != molecule.aonum {
        issues.push(
            ConsistencyIssue::new(
                IssueCategory::AoCountMismatch,
                format!(
                    "atoms carry {} orbitals but the AO count is {}",
                    attached, molecule.aonum
                ),
            )
            .suggest("the basis block may contain unsupported shells"),
        );
    }

    check_orbital_counts(molecule, &mut issues);

    let uncharged = molecule.atoms.iter().filter(|a| a.charge.is_none()).count();
    if uncharged > 0 {
        issues.push(ConsistencyIssue::new(
            IssueCategory::MissingCharges,
            format!("{} atoms have no Mulliken charge", uncharged),
        ));
    }

    if !molecule.tight_binding {
        check_overlap_diagonal(molecule, &mut issues);
    }

    if molecule.electrons == 0 {
        issues.push(ConsistencyIssue::new(
            IssueCategory::NoElectrons,
            "electron count is zero".to_string(),
        ));
    }

    issues
}

fn check_orbital_counts(molecule: &Molecule, issues: &mut Vec<ConsistencyIssue>) {
    let alpha = molecule.orbital_energies.len();
    if alpha != molecule.mo_columns {
        issues.push(
            ConsistencyIssue::new(
                IssueCategory::OrbitalCountMismatch,
                format!(
                    "{} orbital energies but {} coefficient columns",
                    alpha, molecule.mo_columns
                ),
            )
            .suggest("an energy line may be shorter than its block"),
        );
    }

    if let Some(beta) = &molecule.beta_orbital_energies {
        if beta.len() != alpha {
            issues.push(
                ConsistencyIssue::new(
                    IssueCategory::SpinSetMismatch,
                    format!("beta set has {} orbitals, alpha set has {}", beta.len(), alpha),
                )
                .suggest("the beta eigenvectors may be truncated"),
            );
        }
    }
}

fn check_overlap_diagonal(molecule: &Molecule, issues: &mut Vec<ConsistencyIssue>) {
    let off = (0..molecule.aonum)
        .filter(|&i| {
            molecule
                .overlap(i, i)
                .map_or(true, |s| (s - 1.0).abs() > DIAGONAL_TOLERANCE)
        })
        .count();

    if off > 0 {
        issues.push(
            ConsistencyIssue::new(
                IssueCategory::OverlapNotNormalised,
                format!("{} overlap diagonal elements differ from 1", off),
            )
            .suggest("the overlap matrix may be incomplete"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::{Atom, AtomicOrbital, Component};
    use nalgebra::{DMatrix, DVector, Vector3};

    fn consistent() -> Molecule {
        let mut mol = Molecule::new("h2");
        for z in [0.0, 1.4] {
            let mut atom = Atom::new("H", Vector3::new(0.0, 0.0, z));
            atom.orbitals.push(AtomicOrbital::new(Component::S, Vec::new()));
            atom.charge = Some(0.0);
            mol.atoms.push(atom);
        }
        mol.aonum = 2;
        mol.electrons = 2;
        mol.overlap = DVector::from_vec(vec![1.0, 0.6, 1.0]);
        mol.orbital_energies = vec![-0.6, 0.7];
        mol.coefficients = DMatrix::identity(2, 2);
        mol.mo_columns = 2;
        mol
    }

    fn categories(mol: &Molecule) -> Vec<IssueCategory> {
        check_molecule(mol).into_iter().map(|i| i.category).collect()
    }

    #[test]
    fn test_consistent_molecule_has_no_issues() {
        assert!(check_molecule(&consistent()).is_empty());
    }

    #[test]
    fn test_ao_mismatch_and_missing_charge() {
        let mut mol = consistent();
        mol.aonum = 3;
        mol.overlap = DVector::from_vec(vec![1.0, 0.6, 1.0, 0.0, 0.0, 1.0]);
        mol.atoms[1].charge = None;
        let found = categories(&mol);
        assert!(found.contains(&IssueCategory::AoCountMismatch));
        assert!(found.contains(&IssueCategory::MissingCharges));
    }

    #[test]
    fn test_energies_fewer_than_columns() {
        let mut mol = consistent();
        mol.orbital_energies = vec![-0.6];
        assert_eq!(categories(&mol), vec![IssueCategory::OrbitalCountMismatch]);

        mol.orbital_energies = vec![-0.6, 0.7, 0.9];
        assert_eq!(categories(&mol), vec![IssueCategory::OrbitalCountMismatch]);
    }

    #[test]
    fn test_beta_size_mismatch() {
        let mut mol = consistent();
        mol.beta_orbital_energies = Some(vec![-0.5]);
        assert_eq!(categories(&mol), vec![IssueCategory::SpinSetMismatch]);
    }

    #[test]
    fn test_overlap_diagonal_skipped_for_tight_binding() {
        let mut mol = consistent();
        mol.overlap = DVector::zeros(3);
        assert_eq!(categories(&mol), vec![IssueCategory::OverlapNotNormalised]);
        mol.tight_binding = true;
        assert!(categories(&mol).is_empty());
    }

    #[test]
    fn test_display_includes_suggestion() {
        let issues = check_molecule(&Molecule::new("empty"));
        let text = issues[0].to_string();
        assert!(text.starts_with("no atoms were read"));
        assert!(text.contains("suggestion"));
    }
}

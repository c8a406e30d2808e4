//! Basis set reconstruction from the `ATOMIC BASIS SET` block.
//!
//! GAMESS lists contracted shells atom by atom:
//!
//! ```text
//!   SHELL TYPE  PRIMITIVE        EXPONENT          CONTRACTION COEFFICIENT(S)
//!
//!  O
//!
//!       1   S       1           130.7093200    0.154328967295
//!       1   S       2            23.8088610    0.535328142282
//!
//!       2   L       4             5.0331513   -0.099967229187    0.155916274999
//! ```
//!
//! A one-token line is an atom label and moves ownership to the next atom.
//! Five-token lines are primitives of an S, P, D or F shell; six-token lines
//! are primitives of a combined L (S+P) shell carrying a second coefficient.
//!
//! # Shell Expansion
//!
//! | Shell | Orbitals | Coefficient |
//! |-------|----------|-------------|
//! | S | S | primary |
//! | L | S, PX, PY, PZ | S primary, P secondary |
//! | P | PX, PY, PZ | secondary if printed, else the only one |
//! | D | XX YY ZZ XY XZ YZ | primary |
//! | F | XXX YYY ZZZ XXY XXZ YYX YYZ ZZX ZZY XYZ | primary |
//!
//! All orbitals of one shell share its exponents. In tight-binding runs the
//! block is not expanded at all; see [`placeholder_orbitals`].

use crate::line::{LineError, TokenizedLine};
use crate::molecule::{Atom, AtomicOrbital, Component, Primitive};
use crate::parser::ParseWarning;

/// Angular-momentum type of a contracted shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellType {
    /// s shell
    S,
    /// Combined s+p shell sharing exponents
    L,
    /// p shell
    P,
    /// Cartesian d shell
    D,
    /// Cartesian f shell
    F,
}

impl ShellType {
    /// Parses the shell letter printed in the basis block.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "S" => Some(ShellType::S),
            "L" | "SP" => Some(ShellType::L),
            "P" => Some(ShellType::P),
            "D" => Some(ShellType::D),
            "F" => Some(ShellType::F),
            _ => None,
        }
    }

    /// Cartesian components emitted for this shell, in order.
    pub fn components(self) -> &'static [Component] {
        const S: [Component; 1] = [Component::S];
        const L: [Component; 4] = [Component::S, Component::Px, Component::Py, Component::Pz];
        const P: [Component; 3] = [Component::Px, Component::Py, Component::Pz];
        const D: [Component; 6] = [
            Component::Xx,
            Component::Yy,
            Component::Zz,
            Component::Xy,
            Component::Xz,
            Component::Yz,
        ];
        const F: [Component; 10] = [
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
        match self {
            ShellType::S => &S,
            ShellType::L => &L,
            ShellType::P => &P,
            ShellType::D => &D,
            ShellType::F => &F,
        }
    }
}

/// One primitive line of the basis block.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveRecord {
    /// 1-based shell index
    pub shell: usize,
    /// Shell letter as printed
    pub kind: String,
    /// Index of the owning atom
    pub atom: usize,
    /// Gaussian exponent
    pub exponent: f64,
    /// First (s or only) contraction coefficient
    pub coefficient: f64,
    /// Second contraction coefficient (p part of L shells)
    pub secondary: Option<f64>,
}

/// A contracted shell: consecutive primitive records with one shell index.
#[derive(Debug, Clone, PartialEq)]
pub struct Shell {
    /// 1-based shell index
    pub index: usize,
    /// Angular-momentum type
    pub kind: ShellType,
    /// Index of the owning atom
    pub atom: usize,
    /// `(exponent, primary, secondary)` per primitive
    pub primitives: Vec<(f64, f64, Option<f64>)>,
}

impl Shell {
    /// Expands the shell into its Cartesian atomic orbitals.
    ///
    /// One template orbital is built per coefficient stream; siblings are
    /// copies of the template with their own component.
    pub fn expand(&self) -> Vec<AtomicOrbital> {
        let primary: Vec<Primitive> = self
            .primitives
            .iter()
            .map(|&(exponent, c, _)| Primitive::new(exponent, c))
            .collect();
        let secondary: Vec<Primitive> = self
            .primitives
            .iter()
            .map(|&(exponent, c, p)| Primitive::new(exponent, p.unwrap_or(c)))
            .collect();

        let s_template = AtomicOrbital::new(Component::S, primary);
        let p_template = AtomicOrbital::new(Component::Px, secondary);

        self.kind
            .components()
            .iter()
            .map(|&component| {
                let template = match (self.kind, component.order()) {
                    (ShellType::L, 1) | (ShellType::P, _) => &p_template,
                    _ => &s_template,
                };
                AtomicOrbital {
                    component,
                    ..template.clone()
                }
            })
            .collect()
    }
}

/// Accumulates primitive records while scanning the basis block.
#[derive(Debug, Default)]
pub struct BasisCollector {
    atom_cursor: Option<usize>,
    records: Vec<PrimitiveRecord>,
    warnings: Vec<ParseWarning>,
}

impl BasisCollector {
    /// Creates an empty collector positioned before the first atom label.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one body line of the basis block.
    ///
    /// # Errors
    ///
    /// Returns [`LineError`] if a primitive line carries a malformed number.
    pub fn consume_line(&mut self, line: &TokenizedLine) -> Result<(), LineError> {
        match line.len() {
            1 => {
                self.atom_cursor = Some(self.atom_cursor.map_or(0, |a| a + 1));
            }
            5 | 6 => {
                let shell = line.get_int(0)?;
                let exponent = line.get_double(3)?;
                let coefficient = line.get_double(4)?;
                let secondary = if line.len() == 6 {
                    Some(line.get_double(5)?)
                } else {
                    None
                };

                let Some(atom) = self.atom_cursor else {
                    self.warnings.push(ParseWarning::OrphanShell {
                        shell: shell.max(0) as usize,
                    });
                    return Ok(());
                };

                self.records.push(PrimitiveRecord {
                    shell: shell.max(0) as usize,
                    kind: line.token(1).unwrap_or_default().to_string(),
                    atom,
                    exponent,
                    coefficient,
                    secondary,
                });
            }
            _ => {}
        }
        Ok(())
    }

    /// Groups records into shells ordered by shell index.
    ///
    /// Records of one shell are consecutive in the block. Shells with an
    /// unknown letter are dropped with a warning.
    pub fn finish(mut self) -> (Vec<Shell>, Vec<ParseWarning>) {
        let mut shells: Vec<Shell> = Vec::new();
        let mut skipped: Option<usize> = None;

        for record in &self.records {
            if let Some(last) = shells.last_mut() {
                if last.index == record.shell {
                    last.primitives
                        .push((record.exponent, record.coefficient, record.secondary));
                    continue;
                }
            }
            if skipped == Some(record.shell) {
                continue;
            }

            match ShellType::from_symbol(&record.kind) {
                Some(kind) => shells.push(Shell {
                    index: record.shell,
                    kind,
                    atom: record.atom,
                    primitives: vec![(record.exponent, record.coefficient, record.secondary)],
                }),
                None => {
                    skipped = Some(record.shell);
                    self.warnings.push(ParseWarning::UnsupportedShell {
                        shell: record.shell,
                        kind: record.kind.clone(),
                    });
                }
            }
        }

        shells.sort_by_key(|s| s.index);
        (shells, self.warnings)
    }
}

/// Appends the expanded orbitals of every shell to its owning atom.
///
/// Returns a warning for each shell whose atom index has no atom.
pub fn attach_shells(atoms: &mut [Atom], shells: &[Shell]) -> Vec<ParseWarning> {
    let mut warnings = Vec::new();

    for shell in shells {
        match atoms.get_mut(shell.atom) {
            Some(atom) => atom.orbitals.extend(shell.expand()),
            None => warnings.push(ParseWarning::AtomOutOfRange {
                shell: shell.index,
                atom: shell.atom,
                atoms: atoms.len(),
            }),
        }
    }

    warnings
}

/// Minimal valence basis used for tight-binding runs.
///
/// Hydrogen gets one `S`; every other element gets `S PX PY PZ`. The
/// orbitals carry no primitives.
pub fn placeholder_orbitals(atom: &Atom) -> Vec<AtomicOrbital> {
    let kind = if atom.is_hydrogen() {
        ShellType::S
    } else {
        ShellType::L
    };
    kind.components()
        .iter()
        .map(|&component| AtomicOrbital::new(component, Vec::new()))
        .collect()
}

/// Replaces every atom's orbitals with the tight-binding placeholder basis.
pub fn attach_placeholders(atoms: &mut [Atom]) {
    for atom in atoms.iter_mut() {
        atom.orbitals = placeholder_orbitals(atom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::LineBuffer;
    use nalgebra::Vector3;

    fn collect(text: &str) -> (Vec<Shell>, Vec<ParseWarning>) {
        let mut collector = BasisCollector::new();
        for line in LineBuffer::from_text(text).lines() {
            collector.consume_line(line).unwrap();
        }
        collector.finish()
    }

    fn bare_atoms(symbols: &[&str]) -> Vec<Atom> {
        symbols
            .iter()
            .map(|s| Atom::new(*s, Vector3::zeros()))
            .collect()
    }

    #[test]
    fn test_s_shells_group_by_index() {
        let (shells, warnings) = collect(
            " O\n\
             \n\
             1   S       1           130.7093200    0.154328967295\n\
             1   S       2            23.8088610    0.535328142282\n\
             1   S       3             6.4436083    0.444634542185\n\
             H\n\
             2   S       4             3.4252509    0.154328967295\n",
        );
        assert!(warnings.is_empty());
        assert_eq!(shells.len(), 2);
        assert_eq!(shells[0].primitives.len(), 3);
        assert_eq!(shells[0].atom, 0);
        assert_eq!(shells[1].atom, 1);
    }

    #[test]
    fn test_l_shell_uses_both_coefficients() {
        let (shells, _) = collect(
            " C\n\
             2   L       4             5.0331513   -0.099967229187    0.155916274999\n\
             2   L       5             1.1695961    0.399512826089    0.607683718598\n",
        );
        let orbitals = shells[0].expand();
        let labels: Vec<_> = orbitals.iter().map(|o| o.symmetry()).collect();
        assert_eq!(labels, ["S", "PX", "PY", "PZ"]);
        assert_eq!(orbitals[0].primitives[1].coefficient, 0.399512826089);
        assert_eq!(orbitals[3].primitives[0].coefficient, 0.155916274999);
        assert_eq!(orbitals[2].primitives[1].exponent, 1.1695961);
        assert_eq!(orbitals[1].powers(), [1, 0, 0]);
    }

    #[test]
    fn test_p_shell_uses_its_only_coefficient() {
        let (shells, _) = collect(
            " N\n\
             3   P       6             0.8         0.5\n",
        );
        let orbitals = shells[0].expand();
        assert_eq!(orbitals.len(), 3);
        assert!(orbitals.iter().all(|o| o.primitives[0].coefficient == 0.5));
        assert_eq!(orbitals[2].powers(), [0, 0, 1]);
    }

    #[test]
    fn test_d_and_f_expansion() {
        let (shells, _) = collect(
            " Fe\n\
             1   D       1             1.2    1.0\n\
             2   F       2             0.7    1.0\n",
        );
        let d = shells[0].expand();
        let f = shells[1].expand();
        assert_eq!(d.len(), 6);
        assert_eq!(f.len(), 10);
        assert!(d.iter().all(|o| o.order() == 2));
        assert!(f.iter().all(|o| o.order() == 3));
        let f_labels: Vec<_> = f.iter().map(|o| o.symmetry()).collect();
        assert_eq!(
            f_labels,
            ["XXX", "YYY", "ZZZ", "XXY", "XXZ", "YYX", "YYZ", "ZZX", "ZZY", "XYZ"]
        );
        assert_eq!(d[3].powers(), [1, 1, 0]);
    }

    #[test]
    fn test_unknown_shell_is_skipped() {
        let (shells, warnings) = collect(
            " Au\n\
             1   S       1             1.0    1.0\n\
             2   G       2             0.5    1.0\n\
             2   G       3             0.2    1.0\n",
        );
        assert_eq!(shells.len(), 1);
        assert_eq!(
            warnings,
            vec![ParseWarning::UnsupportedShell {
                shell: 2,
                kind: "G".to_string()
            }]
        );
    }

    #[test]
    fn test_record_before_atom_label() {
        let (shells, warnings) = collect(" 1   S       1             1.0    1.0\n");
        assert!(shells.is_empty());
        assert_eq!(warnings, vec![ParseWarning::OrphanShell { shell: 1 }]);
    }

    #[test]
    fn test_attach_shells_to_atoms() {
        let (shells, _) = collect(
            " O\n\
             1   S       1   1.0    1.0\n\
             2   L       2   0.5    0.3    0.4\n\
             H\n\
             3   S       3   0.2    1.0\n",
        );
        let mut atoms = bare_atoms(&["O", "H"]);
        assert!(attach_shells(&mut atoms, &shells).is_empty());
        assert_eq!(atoms[0].orbitals.len(), 5);
        assert_eq!(atoms[1].orbitals.len(), 1);

        let mut oxygen_only = bare_atoms(&["O"]);
        let warnings = attach_shells(&mut oxygen_only, &shells);
        assert_eq!(
            warnings,
            vec![ParseWarning::AtomOutOfRange {
                shell: 3,
                atom: 1,
                atoms: 1
            }]
        );
    }

    #[test]
    fn test_placeholder_basis() {
        let mut atoms = bare_atoms(&["O", "H", "h", "C"]);
        attach_placeholders(&mut atoms);
        let counts: Vec<_> = atoms.iter().map(|a| a.orbitals.len()).collect();
        assert_eq!(counts, [4, 1, 1, 4]);
        assert!(atoms
            .iter()
            .flat_map(|a| a.orbitals.iter())
            .all(|o| o.primitives.is_empty()));
    }
}

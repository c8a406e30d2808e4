use gamess_log::io::write_xyz;
use gamess_log::molecule::UnitSystem;
use gamess_log::parser::GamessLog;
use gamess_log::snapshot::{MoleculeSnapshot, SnapshotError};
use std::fs;
use tempfile::TempDir;

const LOG: &str = r#"
 ATOM      ATOMIC                      COORDINATES (BOHR)
           CHARGE         X                   Y                   Z
 C           6.0     0.0000000000        0.0000000000        0.0000000000
 H           1.0     0.0000000000        0.0000000000        2.0000000000
          INTERNUCLEAR DISTANCES (ANGS.)
  SHELL TYPE  PRIMITIVE        EXPONENT          CONTRACTION COEFFICIENT(S)
 C
      1   L       1             2.9412494   -0.099967229187    0.155916274999
      1   L       2             0.6834831    0.399512826089    0.607683718598
 H
      2   S       3             3.4252509    0.154328967295
 TOTAL NUMBER OF BASIS SET SHELLS             =    2
 NUMBER OF ELECTRONS                          =    7
                       TOTAL ENERGY =      -38.1000000000
"#;

#[test]
fn test_snapshot_round_trip_of_parsed_log() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("ch.log");
    fs::write(&log_path, LOG).unwrap();

    let mol = GamessLog::open(&log_path).parse().unwrap().molecule;
    assert_eq!(mol.aonum, 5);
    assert_eq!(mol.atoms[0].orbitals.len(), 4);
    // L shell: S keeps the first coefficient, P the second
    assert_eq!(mol.atoms[0].orbitals[0].primitives[1].coefficient, 0.399512826089);
    assert_eq!(mol.atoms[0].orbitals[3].primitives[1].coefficient, 0.607683718598);

    let json = dir.path().join("ch.json");
    MoleculeSnapshot::from(&mol).save(&json).unwrap();
    let loaded = MoleculeSnapshot::load(&json).unwrap();

    assert_eq!(loaded.name, mol.name);
    assert_eq!(loaded.atoms, mol.atoms);
    assert_eq!(loaded.total_energy, mol.total_energy);
    assert_eq!(loaded.electrons, 7);
    assert_eq!(loaded.aonum, mol.aonum);
    assert_eq!(loaded.homo, mol.homo);
    assert_eq!(loaded.overlap, mol.overlap);
    assert_eq!(loaded.coefficients, mol.coefficients);
    assert_eq!(loaded.mo_columns, mol.mo_columns);
    assert_eq!(loaded.units, UnitSystem::Chemical);
}

#[test]
fn test_load_rejects_non_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, "{\"name\": 3}").unwrap();
    assert!(matches!(
        MoleculeSnapshot::load(&path),
        Err(SnapshotError::Json(_))
    ));
}

#[test]
fn test_xyz_export_of_parsed_log() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("ch.log");
    fs::write(&log_path, LOG).unwrap();
    let mol = GamessLog::open(&log_path).parse().unwrap().molecule;

    let xyz = dir.path().join("ch.xyz");
    write_xyz(&mol, &xyz).unwrap();
    let text = fs::read_to_string(&xyz).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "2");
    assert_eq!(lines[3], "H  0.00000000  0.00000000  1.05835442");
}

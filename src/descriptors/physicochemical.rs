// src/descriptors/physicochemical.rs
//! Physicochemical descriptors commonly used in QSAR.
//!
//! - **MW** – molecular weight (monoisotopic masses, implicit hydrogens included)
//! - **SLogP** – Crippen-style atom-contribution LogP
//! - **TopoPSA** – topological polar surface area (Ertl contributions for N and O)
//! - **nHBDon / nHBAcc** – hydrogen bond donors and acceptors
//! - **Lipinski / GhoseFilter** – drug-likeness rule flags
//!
//! # Examples
//!
//! ```
//! use qsar_delta::descriptors::physicochemical::{ertl_tpsa, h_bond_donors, molecular_weight};
//! use qsar_delta::structure::parse_smiles;
//!
//! let glycine = parse_smiles("NCC(=O)O").unwrap();
//! assert!((molecular_weight(&glycine).unwrap() - 75.032).abs() < 1e-3);
//! assert!((ertl_tpsa(&glycine) - 63.32).abs() < 1e-6);
//! assert_eq!(h_bond_donors(&glycine), 2);
//! ```

use super::{atomic_weights, DescriptorError};
use crate::structure::{BondOrder, Molecule};

// ---------------------------------------------------------------------------
// 1. Molecular weight
// ---------------------------------------------------------------------------

/// Sum of atomic masses including attached hydrogens.
///
/// # Errors
///
/// `DescriptorError::UnknownElement` if an element has no entry in the mass table.
pub fn molecular_weight(molecule: &Molecule) -> Result<f64, DescriptorError> {
    let weights = atomic_weights();
    let hydrogen = weights["H"];
    let mut total = 0.0;
    for atom in molecule.atoms() {
        let mass = weights
            .get(atom.symbol())
            .ok_or_else(|| DescriptorError::UnknownElement(atom.symbol().to_string()))?;
        total += mass + f64::from(atom.hydrogens) * hydrogen;
    }
    Ok(total)
}

// ---------------------------------------------------------------------------
// 2. Crippen-style LogP
// ---------------------------------------------------------------------------

/// Heavy-atom contributions keyed by (element, aromatic).
static HEAVY: &[(&str, bool, f64)] = &[
    ("C", false, 0.1441),
    ("C", true, 0.1581),
    ("N", false, -0.7096),
    ("N", true, -0.4806),
    ("O", false, -0.2893),
    ("O", true, 0.1552),
    ("S", false, 0.6482),
    ("S", true, 0.6237),
    ("P", false, 0.8612),
    ("F", false, 0.4202),
    ("Cl", false, 0.6895),
    ("Br", false, 0.8456),
    ("I", false, 0.8857),
    ("H", false, 0.1230),
];

fn hydrogen_contribution(host: &str) -> f64 {
    match host {
        "N" => 0.2142,
        "O" => -0.2677,
        _ => 0.1230,
    }
}

/// Atom-contribution LogP: one term per heavy atom and one per attached
/// hydrogen, the latter depending on the host element.
///
/// # Errors
///
/// `DescriptorError::MissingContribution` for an atom type outside the table.
pub fn crippen_logp(molecule: &Molecule) -> Result<f64, DescriptorError> {
    let mut logp = 0.0;
    for (index, atom) in molecule.atoms().iter().enumerate() {
        let base = HEAVY
            .iter()
            .find(|(symbol, aromatic, _)| *symbol == atom.symbol() && *aromatic == atom.aromatic)
            .map(|&(_, _, value)| value)
            .ok_or_else(|| DescriptorError::MissingContribution {
                index,
                symbol: if atom.aromatic {
                    atom.symbol().to_lowercase()
                } else {
                    atom.symbol().to_string()
                },
            })?;
        logp += base + f64::from(atom.hydrogens) * hydrogen_contribution(atom.symbol());
    }
    Ok(logp)
}

// ---------------------------------------------------------------------------
// 3. Ertl TPSA (N and O only, no S/P)
// ---------------------------------------------------------------------------

/// Topological polar surface area in Å².
pub fn ertl_tpsa(molecule: &Molecule) -> f64 {
    (0..molecule.atom_count())
        .map(|idx| polar_contribution(molecule, idx))
        .sum()
}

fn polar_contribution(molecule: &Molecule, idx: usize) -> f64 {
    let atom = molecule.atom(idx);
    let heavy = molecule.degree(idx);
    let h = atom.hydrogens;
    let (mut double, mut triple) = (0, 0);
    for (_, bond) in molecule.neighbors(idx) {
        match bond.order {
            BondOrder::Double => double += 1,
            BondOrder::Triple => triple += 1,
            _ => {}
        }
    }

    match (atom.symbol(), atom.aromatic, atom.charge) {
        ("N", false, 0) => match (heavy, h, double, triple) {
            (3, 0, 0, 0) => 3.24,
            (2, 1, 0, 0) => 12.03,
            (1, 2, 0, 0) => 26.02,
            (2, 0, 1, 0) => 12.36,
            (1, 1, 1, 0) => 23.85,
            (1, 0, 0, 1) => 23.79,
            (3, 0, 2, 0) => 11.68,
            _ => 0.0,
        },
        ("N", false, 1) => match (heavy, h) {
            (4, 0) => 0.0,
            (3, 1) => 4.44,
            (2, 2) => 16.61,
            (1, 3) => 27.64,
            _ => 3.01,
        },
        ("N", true, _) => match (heavy, h) {
            (2, 0) => 12.89,
            (2, 1) => 15.79,
            (3, 0) => 4.41,
            _ => 0.0,
        },
        ("O", false, 0) => match (heavy, h, double) {
            (1, 1, 0) => 20.23,
            (2, 0, 0) => 9.23,
            (1, 0, 1) => 17.07,
            (0, 2, 0) => 20.23,
            _ => 0.0,
        },
        ("O", false, -1) => 23.06,
        ("O", true, _) => 13.14,
        _ => 0.0,
    }
}

// ---------------------------------------------------------------------------
// 4. & 5. H-bond donors and acceptors
// ---------------------------------------------------------------------------

/// N and O atoms carrying at least one hydrogen.
pub fn h_bond_donors(molecule: &Molecule) -> usize {
    molecule
        .atoms()
        .iter()
        .filter(|a| matches!(a.symbol(), "N" | "O") && a.hydrogens > 0)
        .count()
}

/// Non-cationic N and O atoms, plus F.
pub fn h_bond_acceptors(molecule: &Molecule) -> usize {
    molecule
        .atoms()
        .iter()
        .filter(|a| match a.symbol() {
            "N" | "O" => a.charge <= 0,
            "F" => true,
            _ => false,
        })
        .count()
}

// ---------------------------------------------------------------------------
// 6. Rule flags
// ---------------------------------------------------------------------------

/// Lipinski rule of five: every criterion satisfied.
pub fn lipinski(mw: f64, logp: f64, donors: usize, acceptors: usize) -> bool {
    donors <= 5 && acceptors <= 10 && mw <= 500.0 && logp <= 5.0
}

/// Ghose filter on MW, LogP and total atom count. The molar refractivity window
/// is not applied.
pub fn ghose_filter(mw: f64, logp: f64, n_atoms: usize) -> bool {
    (160.0..=480.0).contains(&mw) && (-0.4..=5.6).contains(&logp) && (20..=70).contains(&n_atoms)
}

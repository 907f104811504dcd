// src/descriptors/topological.rs
//! Topological descriptors: graph-theoretical indices for QSAR.
//!
//! Computed on the hydrogen-suppressed molecular graph.
//!
//! | Index        | Feature    | Meaning                                        |
//! |--------------|------------|------------------------------------------------|
//! | Wiener Index | `WPath`    | Sum of all shortest path distances             |
//! | Balaban J    | `BalabanJ` | Distance-based connectivity index              |
//! | Zagreb M1    | `Zagreb1`  | Sum of (degree²) over all atoms                |
//! | Zagreb M2    | `Zagreb2`  | Sum of (degᵢ × degⱼ) over all bonds            |
//! | Randić (χ)   | `Randic`   | Connectivity index (∑ 1/√(dᵢ×dⱼ))              |
//!
//! The distance-based indices are only defined for connected graphs with at
//! least two atoms; [`distance_matrix`] reports anything else as an error.
//!
//! # Real-World Examples
//!
//! ```
//! use qsar_delta::descriptors::topological::{balaban_j, distance_matrix, wiener_index};
//! use qsar_delta::structure::parse_smiles;
//! use approx::assert_relative_eq;
//!
//! // n-Hexane (linear)
//! let hexane = parse_smiles("CCCCCC").unwrap();
//! let d = distance_matrix(&hexane).unwrap();
//! assert_eq!(wiener_index(&d), 35);
//!
//! // Propane
//! let propane = parse_smiles("CCC").unwrap();
//! let d = distance_matrix(&propane).unwrap();
//! assert_relative_eq!(balaban_j(&propane, &d).unwrap(), 1.6330, epsilon = 1e-4);
//! ```

use std::collections::VecDeque;

use super::DescriptorError;
use crate::structure::Molecule;

/// Degree-based indices; always defined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopologicalDescriptors {
    /// First Zagreb index: Σ(degree²)
    pub zagreb_m1: u32,
    /// Second Zagreb index: Σ(degᵢ × degⱼ) over bonds
    pub zagreb_m2: u32,
    /// Randić connectivity index (χ)
    pub randic: f64,
}

/// Compute the degree-based indices.
pub fn topological_descriptors(molecule: &Molecule) -> TopologicalDescriptors {
    let degree = |i: usize| molecule.degree(i) as u32;

    let zagreb_m1 = (0..molecule.atom_count()).map(|i| degree(i) * degree(i)).sum();
    let mut zagreb_m2 = 0;
    let mut randic = 0.0;
    for bond in molecule.bonds() {
        let product = degree(bond.begin) * degree(bond.end);
        zagreb_m2 += product;
        randic += 1.0 / f64::from(product).sqrt();
    }

    TopologicalDescriptors {
        zagreb_m1,
        zagreb_m2,
        randic,
    }
}

/// All-pairs shortest path lengths by breadth-first search from every atom.
///
/// # Errors
///
/// `TooSmall` for fewer than two atoms, `Disconnected` when some pair has no path.
pub fn distance_matrix(molecule: &Molecule) -> Result<Vec<Vec<u32>>, DescriptorError> {
    let n = molecule.atom_count();
    if n < 2 {
        return Err(DescriptorError::TooSmall(n));
    }
    let fragments = molecule.fragment_count();
    if fragments > 1 {
        return Err(DescriptorError::Disconnected(fragments));
    }

    let mut dist = vec![vec![u32::MAX; n]; n];
    let mut queue = VecDeque::new();
    for (source, row) in dist.iter_mut().enumerate() {
        row[source] = 0;
        queue.push_back(source);
        while let Some(atom) = queue.pop_front() {
            for (nb, _) in molecule.neighbors(atom) {
                if row[nb] == u32::MAX {
                    row[nb] = row[atom] + 1;
                    queue.push_back(nb);
                }
            }
        }
    }
    Ok(dist)
}

/// Wiener index: sum of distances over unordered atom pairs.
pub fn wiener_index(distances: &[Vec<u32>]) -> u32 {
    distances.iter().flatten().sum::<u32>() / 2
}

/// Balaban J = m / (μ + 1) · Σ_bonds (sᵢ sⱼ)^(-1/2), with sᵢ the distance sum of
/// atom i and μ the cyclomatic number.
///
/// # Errors
///
/// `TooSmall` when the molecule has no bonds.
pub fn balaban_j(molecule: &Molecule, distances: &[Vec<u32>]) -> Result<f64, DescriptorError> {
    let m = molecule.bond_count();
    if m == 0 {
        return Err(DescriptorError::TooSmall(molecule.atom_count()));
    }
    let sums: Vec<f64> = distances
        .iter()
        .map(|row| f64::from(row.iter().sum::<u32>()))
        .collect();
    let mu = (m + 1).saturating_sub(molecule.atom_count()) as f64;

    let total: f64 = molecule
        .bonds()
        .iter()
        .map(|b| 1.0 / (sums[b.begin] * sums[b.end]).sqrt())
        .sum();
    Ok(m as f64 / (mu + 1.0) * total)
}

// ————————————————————————————————————————————————————————————————————————
// Tests: with known literature values
// ————————————————————————————————————————————————————————————————————————

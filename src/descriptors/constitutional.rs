// src/descriptors/constitutional.rs
//! Constitutional descriptors: simple, fast, interpretable counts.
//!
//! | Descriptor   | Field                 | Meaning                                              |
//! |--------------|-----------------------|------------------------------------------------------|
//! | `nAtom`      | `n_atoms`             | All atoms, hydrogens included                        |
//! | `nHeavyAtom` | `heavy_atom_count`    | Non-hydrogen atoms                                   |
//! | `nHetero`    | `num_heteroatoms`     | Heavy atoms other than carbon                        |
//! | `nAromAtom`  | `num_aromatic_atoms`  | Atoms flagged aromatic                               |
//! | `nRing`      | `num_rings`           | Independent rings (bonds − atoms + fragments)        |
//! | `nRot`       | `num_rotatable_bonds` | Acyclic single bonds between two non-terminal atoms  |
//!
//! # Quick Start
//!
//! ```
//! use qsar_delta::descriptors::constitutional::constitutional_descriptors;
//! use qsar_delta::structure::parse_smiles;
//!
//! let desc = constitutional_descriptors(&parse_smiles("c1ccccc1CCO").unwrap());
//! assert_eq!(desc.heavy_atom_count, 9);
//! assert_eq!(desc.num_rotatable_bonds, 2);
//! assert_eq!(desc.num_rings, 1);
//! assert_eq!(desc.num_heteroatoms, 1);
//! ```

use crate::structure::{BondOrder, Molecule, CARBON, HYDROGEN};

/// Container for the constitutional counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstitutionalDescriptors {
    /// Number of atoms including hydrogens
    pub n_atoms: usize,
    /// Number of non-hydrogen atoms
    pub heavy_atom_count: usize,
    /// Number of heavy atoms that are not carbon
    pub num_heteroatoms: usize,
    /// Number of aromatic atoms
    pub num_aromatic_atoms: usize,
    /// Number of independent rings
    pub num_rings: usize,
    /// Number of rotatable bonds
    pub num_rotatable_bonds: usize,
}

/// Compute all constitutional descriptors of a molecule.
pub fn constitutional_descriptors(molecule: &Molecule) -> ConstitutionalDescriptors {
    let attached: usize = molecule.atoms().iter().map(|a| a.hydrogens as usize).sum();
    let heavy_atom_count = molecule.heavy_atom_count();

    ConstitutionalDescriptors {
        n_atoms: molecule.atom_count() + attached,
        heavy_atom_count,
        num_heteroatoms: molecule
            .atoms()
            .iter()
            .filter(|a| a.element != CARBON && a.element != HYDROGEN)
            .count(),
        num_aromatic_atoms: molecule.atoms().iter().filter(|a| a.aromatic).count(),
        num_rings: ring_count(molecule),
        num_rotatable_bonds: count_rotatable_bonds(molecule),
    }
}

// ————————————————————————————————————————————————————————————————————————
// Internal helpers
// ————————————————————————————————————————————————————————————————————————

fn ring_count(molecule: &Molecule) -> usize {
    (molecule.bond_count() + molecule.fragment_count()).saturating_sub(molecule.atom_count())
}

fn count_rotatable_bonds(molecule: &Molecule) -> usize {
    let in_ring = molecule.ring_bonds();
    molecule
        .bonds()
        .iter()
        .zip(in_ring)
        .filter(|(bond, ring)| {
            bond.order == BondOrder::Single
                && !ring
                && molecule.degree(bond.begin) > 1
                && molecule.degree(bond.end) > 1
        })
        .count()
}

// ————————————————————————————————————————————————————————————————————————
// Tests
// ————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::parse_smiles;

    fn describe(smiles: &str) -> ConstitutionalDescriptors {
        constitutional_descriptors(&parse_smiles(smiles).unwrap())
    }

    #[test]
    fn benzene() {
        let d = describe("c1ccccc1");
        assert_eq!(d.n_atoms, 12);
        assert_eq!(d.heavy_atom_count, 6);
        assert_eq!(d.num_aromatic_atoms, 6);
        assert_eq!(d.num_rings, 1);
        assert_eq!(d.num_heteroatoms, 0);
        assert_eq!(d.num_rotatable_bonds, 0);
    }

    #[test]
    fn hexane() {
        let d = describe("CCCCCC");
        assert_eq!(d.heavy_atom_count, 6);
        // terminal C-C bonds do not rotate anything
        assert_eq!(d.num_rotatable_bonds, 3);
        assert_eq!(d.num_rings, 0);
    }

    #[test]
    fn aspirin() {
        let d = describe("CC(=O)Oc1ccccc1C(=O)O");
        assert_eq!(d.heavy_atom_count, 13);
        assert_eq!(d.num_rotatable_bonds, 3);
        assert_eq!(d.num_aromatic_atoms, 6);
        assert_eq!(d.num_heteroatoms, 4);
        assert_eq!(d.n_atoms, 21);
    }

    #[test]
    fn fused_and_disconnected_rings() {
        assert_eq!(describe("c1ccc2ccccc2c1").num_rings, 2);
        assert_eq!(describe("C1CC1.C1CC1").num_rings, 2);
    }

    #[test]
    fn glycine_and_its_carbamate() {
        let parent = describe("NCC(=O)O");
        let child = describe("OC(=O)NCC(=O)O");
        assert_eq!(child.heavy_atom_count - parent.heavy_atom_count, 3);
        assert_eq!(child.num_heteroatoms - parent.num_heteroatoms, 2);
        assert_eq!(child.n_atoms - parent.n_atoms, 3);
    }
}

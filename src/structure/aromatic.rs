//! Aromaticity perception for Kekulé input.
//!
//! Five- and six-membered rings are checked for a Hückel sextet. Carbon and
//! nitrogen with one in-ring double bond give one electron each; in a
//! five-membered ring exactly one N (three connections), O or S gives its lone
//! pair. Fused systems are handled by repeating the pass: a ring atom already
//! perceived aromatic through another ring counts one electron.

use super::{BondOrder, Molecule};

struct Cycle {
    atoms: Vec<usize>,
    bonds: Vec<usize>,
}

/// Mark atoms and bonds of every aromatic ring written in Kekulé form.
/// Rings already written aromatic are left alone.
pub(super) fn perceive(mol: &mut Molecule) {
    let cycles = small_cycles(mol);
    loop {
        let mut changed = false;
        for cycle in &cycles {
            if cycle.atoms.iter().all(|&a| mol.atoms[a].aromatic) {
                continue;
            }
            if pi_electrons(mol, cycle) != Some(6) {
                continue;
            }
            for &a in &cycle.atoms {
                mol.atoms[a].aromatic = true;
            }
            for &b in &cycle.bonds {
                mol.bonds[b].order = BondOrder::Aromatic;
            }
            changed = true;
        }
        if !changed {
            return;
        }
    }
}

fn pi_electrons(mol: &Molecule, cycle: &Cycle) -> Option<usize> {
    let mut total = 0;
    let mut lone_pairs = 0;
    for &a in &cycle.atoms {
        let atom = &mol.atoms[a];
        if atom.charge != 0 {
            return None;
        }

        let mut doubles = 0;
        let mut double_in_ring = false;
        let mut fused = false;
        for &(_, bi) in &mol.adjacency[a] {
            match mol.bonds[bi].order {
                BondOrder::Double => {
                    doubles += 1;
                    double_in_ring |= cycle.bonds.contains(&bi);
                }
                BondOrder::Triple => return None,
                BondOrder::Aromatic => fused |= !cycle.bonds.contains(&bi),
                BondOrder::Single => {}
            }
        }

        let z = atom.element.atomic_number;
        let connections = mol.degree(a) + atom.hydrogens as usize;
        total += match doubles {
            1 if double_in_ring && (z == 6 || z == 7) => 1,
            0 if atom.aromatic && fused && z == 6 => 1,
            0 if !atom.aromatic && ((z == 7 && connections == 3) || ((z == 8 || z == 16) && connections == 2)) => {
                lone_pairs += 1;
                2
            }
            _ => return None,
        };
    }
    (lone_pairs <= 1).then_some(total)
}

/// Simple cycles of five or six atoms over ring bonds, each listed once.
fn small_cycles(mol: &Molecule) -> Vec<Cycle> {
    let in_ring = mol.ring_bonds();
    let mut cycles = Vec::new();
    for start in 0..mol.atom_count() {
        let mut path = vec![start];
        let mut bonds = Vec::new();
        extend(mol, &in_ring, &mut path, &mut bonds, &mut cycles);
    }
    cycles
}

fn extend(mol: &Molecule, in_ring: &[bool], path: &mut Vec<usize>, bonds: &mut Vec<usize>, out: &mut Vec<Cycle>) {
    let start = path[0];
    let last = path[path.len() - 1];
    for &(nb, bi) in &mol.adjacency[last] {
        if !in_ring[bi] {
            continue;
        }
        // path[1] < last keeps one of the two directions
        if nb == start && path.len() >= 5 && path[1] < last {
            let mut closed = bonds.clone();
            closed.push(bi);
            out.push(Cycle {
                atoms: path.clone(),
                bonds: closed,
            });
        } else if nb > start && path.len() < 6 && !path.contains(&nb) {
            path.push(nb);
            bonds.push(bi);
            extend(mol, in_ring, path, bonds, out);
            path.pop();
            bonds.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::structure::{parse_smiles, BondOrder};

    fn aromatic_atoms(smiles: &str) -> usize {
        parse_smiles(smiles).unwrap().atoms().iter().filter(|a| a.aromatic).count()
    }

    #[test]
    fn kekule_rings_become_aromatic() {
        assert_eq!(aromatic_atoms("C1=CC=CC=C1"), 6);
        assert_eq!(aromatic_atoms("C1=CC=NC=C1"), 6);
        assert_eq!(aromatic_atoms("C1=CNC=C1"), 5);
        assert_eq!(aromatic_atoms("C1=COC=C1"), 5);
        assert_eq!(aromatic_atoms("C1=CSC=C1"), 5);
        assert_eq!(aromatic_atoms("CN1C=CC=C1"), 5);
    }

    #[test]
    fn fused_rings_are_found_over_passes() {
        assert_eq!(aromatic_atoms("C1=CC=C2C=CC=CC2=C1"), 10);
        assert_eq!(aromatic_atoms("C1=CC=C2C(=C1)C=CN2"), 9);
    }

    #[test]
    fn non_aromatic_rings_stay_kekule() {
        assert_eq!(aromatic_atoms("C1=CCCCC1"), 0);
        assert_eq!(aromatic_atoms("C1=CC=CC1"), 0);
        assert_eq!(aromatic_atoms("O=C1C=CC(=O)C=C1"), 0);
        assert_eq!(aromatic_atoms("C1CCNCC1"), 0);
    }

    #[test]
    fn ring_bonds_switch_to_aromatic_order() {
        let mol = parse_smiles("CC1=CC=CC=C1").unwrap();
        let aromatic = mol.bonds().iter().filter(|b| b.order == BondOrder::Aromatic).count();
        assert_eq!(aromatic, 6);
        assert_eq!(mol.bonds()[0].order, BondOrder::Single);
    }
}

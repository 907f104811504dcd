//! Canonical SMILES writer.
//!
//! Atoms are ranked from local invariants, the ranks are refined over
//! neighbourhoods until stable and remaining ties are broken one at a time.
//! The molecule is then walked depth-first in rank order; ring closures are
//! found in a first pass so digits can be placed while writing.

use super::{Bond, BondOrder, Molecule};

/// Canonical SMILES for `mol`. Equivalent inputs give identical output and
/// re-parsing the output reproduces the same string.
///
/// ```
/// use qsar_delta::structure::{canonical_smiles, parse_smiles};
///
/// let a = parse_smiles("OCC").unwrap();
/// let b = parse_smiles("C(O)C").unwrap();
/// assert_eq!(canonical_smiles(&a), canonical_smiles(&b));
/// ```
pub fn canonical_smiles(mol: &Molecule) -> String {
    let n = mol.atom_count();
    if n == 0 {
        return String::new();
    }
    let ranks = canonical_ranks(mol);

    let mut walk = Walk::new(mol, &ranks);
    let mut starts: Vec<usize> = (0..n).collect();
    starts.sort_by_key(|&i| ranks[i]);

    let mut roots = Vec::new();
    for start in starts {
        if !walk.visited[start] {
            walk.visit(start);
            roots.push(start);
        }
    }

    let mut writer = Writer {
        mol,
        walk: &walk,
        digits: vec![None; mol.bond_count()],
        in_use: Vec::new(),
        out: String::new(),
    };
    for (i, root) in roots.into_iter().enumerate() {
        if i > 0 {
            writer.out.push('.');
        }
        writer.write(root, None);
    }
    writer.out
}

fn canonical_ranks(mol: &Molecule) -> Vec<usize> {
    let n = mol.atom_count();
    let invariants: Vec<_> = (0..n)
        .map(|i| {
            let atom = mol.atom(i);
            // degree first so the walk starts at a chain end
            (
                mol.degree(i),
                atom.element.atomic_number,
                atom.hydrogens,
                atom.charge,
                atom.isotope.unwrap_or(0),
                atom.aromatic,
            )
        })
        .collect();

    let mut ranks = refine(mol, rank_by(&invariants));
    while class_count(&ranks) < n {
        let tied = lowest_tied_rank(&ranks);
        let chosen = ranks.iter().position(|&r| r == tied).unwrap_or(0);
        let keys: Vec<(usize, bool)> = (0..n).map(|i| (ranks[i], i != chosen)).collect();
        ranks = refine(mol, rank_by(&keys));
    }
    ranks
}

/// Dense ranks: equal keys share a rank, ranks are 0..classes.
fn rank_by<K: Ord>(keys: &[K]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));

    let mut ranks = vec![0; keys.len()];
    let mut rank = 0;
    for (pos, &idx) in order.iter().enumerate() {
        if pos > 0 && keys[order[pos - 1]] != keys[idx] {
            rank += 1;
        }
        ranks[idx] = rank;
    }
    ranks
}

fn refine(mol: &Molecule, mut ranks: Vec<usize>) -> Vec<usize> {
    loop {
        let classes = class_count(&ranks);
        let keys: Vec<(usize, Vec<(usize, BondOrder)>)> = (0..mol.atom_count())
            .map(|i| {
                let mut around: Vec<_> = mol.neighbors(i).map(|(j, b)| (ranks[j], b.order)).collect();
                around.sort();
                (ranks[i], around)
            })
            .collect();
        let next = rank_by(&keys);
        if class_count(&next) == classes {
            return next;
        }
        ranks = next;
    }
}

fn class_count(ranks: &[usize]) -> usize {
    ranks.iter().max().map_or(0, |&m| m + 1)
}

fn lowest_tied_rank(ranks: &[usize]) -> usize {
    let mut counts = vec![0usize; class_count(ranks)];
    for &r in ranks {
        counts[r] += 1;
    }
    counts.iter().position(|&c| c > 1).unwrap_or(0)
}

/// Spanning-tree walk: children in rank order and ring-closure bonds, each
/// recorded at the atom written first (`opens`) and the atom that closes it.
struct Walk<'a> {
    mol: &'a Molecule,
    ranks: &'a [usize],
    visited: Vec<bool>,
    used_bond: Vec<bool>,
    children: Vec<Vec<(usize, usize)>>,
    opens: Vec<Vec<usize>>,
    closes: Vec<Vec<usize>>,
}

impl<'a> Walk<'a> {
    fn new(mol: &'a Molecule, ranks: &'a [usize]) -> Self {
        let n = mol.atom_count();
        Walk {
            mol,
            ranks,
            visited: vec![false; n],
            used_bond: vec![false; mol.bond_count()],
            children: vec![Vec::new(); n],
            opens: vec![Vec::new(); n],
            closes: vec![Vec::new(); n],
        }
    }

    fn visit(&mut self, atom: usize) {
        self.visited[atom] = true;
        let mut around = self.mol.adjacency[atom].clone();
        around.sort_by_key(|&(nb, _)| self.ranks[nb]);

        for (nb, bi) in around {
            if self.used_bond[bi] {
                continue;
            }
            self.used_bond[bi] = true;
            if self.visited[nb] {
                // back edge to an ancestor still on the stack
                self.opens[nb].push(bi);
                self.closes[atom].push(bi);
            } else {
                self.children[atom].push((nb, bi));
                self.visit(nb);
            }
        }
    }
}

struct Writer<'a> {
    mol: &'a Molecule,
    walk: &'a Walk<'a>,
    digits: Vec<Option<u16>>,
    in_use: Vec<u16>,
    out: String,
}

impl Writer<'_> {
    fn write(&mut self, atom: usize, via: Option<usize>) {
        let walk = self.walk;
        if let Some(bi) = via {
            self.out.push_str(bond_symbol(self.mol, self.mol.bonds()[bi]));
        }
        self.out.push_str(&atom_text(self.mol, atom));

        let mut released = Vec::new();
        for &bi in &walk.closes[atom] {
            if let Some(digit) = self.digits[bi] {
                push_digit(&mut self.out, digit);
                released.push(digit);
            }
        }
        for &bi in &walk.opens[atom] {
            let digit = (1..).find(|d| !self.in_use.contains(d)).unwrap_or(1);
            self.in_use.push(digit);
            self.digits[bi] = Some(digit);
            self.out.push_str(bond_symbol(self.mol, self.mol.bonds()[bi]));
            push_digit(&mut self.out, digit);
        }
        self.in_use.retain(|d| !released.contains(d));

        let children = &walk.children[atom];
        for (pos, &(child, bi)) in children.iter().enumerate() {
            if pos + 1 < children.len() {
                self.out.push('(');
                self.write(child, Some(bi));
                self.out.push(')');
            } else {
                self.write(child, Some(bi));
            }
        }
    }
}

fn push_digit(out: &mut String, digit: u16) {
    if digit < 10 {
        out.push_str(&digit.to_string());
    } else {
        out.push_str(&format!("%{digit:02}"));
    }
}

fn bond_symbol(mol: &Molecule, bond: Bond) -> &'static str {
    let both_aromatic = mol.atom(bond.begin).aromatic && mol.atom(bond.end).aromatic;
    match bond.order {
        BondOrder::Single if both_aromatic => "-",
        BondOrder::Single => "",
        BondOrder::Double => "=",
        BondOrder::Triple => "#",
        BondOrder::Aromatic if both_aromatic => "",
        BondOrder::Aromatic => ":",
    }
}

const ORGANIC_SUBSET: &[&str] = &["B", "C", "N", "O", "P", "S", "F", "Cl", "Br", "I"];
const AROMATIC_SUBSET: &[&str] = &["B", "C", "N", "O", "P", "S"];

fn atom_text(mol: &Molecule, idx: usize) -> String {
    let atom = mol.atom(idx);
    let symbol = if atom.aromatic {
        atom.symbol().to_ascii_lowercase()
    } else {
        atom.symbol().to_string()
    };

    let subset = if atom.aromatic { AROMATIC_SUBSET } else { ORGANIC_SUBSET };
    let bare = subset.contains(&atom.symbol())
        && atom.charge == 0
        && atom.isotope.is_none()
        && atom.hydrogens == mol.implicit_hydrogens(idx);
    if bare {
        return symbol;
    }

    let mut text = String::from("[");
    if let Some(isotope) = atom.isotope {
        text.push_str(&isotope.to_string());
    }
    text.push_str(&symbol);
    match atom.hydrogens {
        0 => {}
        1 => text.push('H'),
        h => text.push_str(&format!("H{h}")),
    }
    match atom.charge {
        0 => {}
        1 => text.push('+'),
        -1 => text.push('-'),
        c if c > 0 => text.push_str(&format!("+{c}")),
        c => text.push_str(&format!("-{}", -(c as i16))),
    }
    text.push(']');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::parse_smiles;

    fn canon(smiles: &str) -> String {
        canonical_smiles(&parse_smiles(smiles).unwrap())
    }

    #[test]
    fn simple_chain() {
        assert_eq!(canon("OCC"), "CCO");
        assert_eq!(canon("C(O)C"), "CCO");
    }

    #[test]
    fn walk_starts_at_a_chain_end() {
        assert_eq!(canon("C(C(=O)O)N"), "NCC(=O)O");
    }

    #[test]
    fn equivalent_spellings_agree() {
        assert_eq!(canon("NCC(=O)O"), canon("OC(=O)CN"));
        assert_eq!(canon("Oc1ccccc1"), canon("c1ccc(O)cc1"));
        assert_eq!(canon("C1CCNCC1"), canon("N1CCCCC1"));
        assert_eq!(canon("CC(C)N"), canon("NC(C)C"));
        assert_eq!(canon("NCC"), canon("[H]NCC"));
        assert_eq!(canon("[H]N([H])CC"), canon("CCN"));
    }

    #[test]
    fn kekule_and_aromatic_spellings_agree() {
        assert_eq!(canon("C1=CC=CC=C1"), "c1ccccc1");
        assert_eq!(canon("C1=CC=NC=C1"), canon("c1ccncc1"));
        assert_eq!(canon("C1=CNC=C1"), canon("c1cc[nH]c1"));
        assert_eq!(canon("C1=COC=C1"), canon("c1ccoc1"));
        assert_eq!(canon("C1=CC=C2C(=C1)C=CN2"), canon("c1ccc2[nH]ccc2c1"));
        assert_eq!(canon("OC1=CC=CC=C1"), canon("Oc1ccccc1"));
    }

    #[test]
    fn distinct_structures_differ() {
        assert_ne!(canon("CCO"), canon("COC"));
        assert_ne!(canon("NCCC(=O)O"), canon("CC(N)C(=O)O"));
    }

    #[test]
    fn output_reparses_to_itself() {
        for smiles in [
            "CC(=O)Nc1ccc(O)cc1",
            "C1CC2CCC1CC2",
            "c1ccc2[nH]ccc2c1",
            "[NH4+].[Cl-]",
            "OC(=O)N1CCCCC1",
            "c1ccc(-c2ccccc2)cc1",
            "[13CH4]",
            "C#N",
        ] {
            let once = canon(smiles);
            assert_eq!(canon(&once), once, "not stable for {smiles}");
        }
    }

    #[test]
    fn bracket_atoms_survive() {
        assert!(canon("c1cc[nH]c1").contains("[nH]"));
        assert!(canon("[NH4+]").contains("[NH4+]"));
        assert!(canon("[O-]C").contains("[O-]"));
    }
}

//! Molecular graph and the SMILES codec used to move structures in and out of
//! the pipeline.
//!
//! A [`Molecule`] is immutable once built: the parser and the transformation
//! engine construct new molecules, nothing edits one in place. Text conversion
//! goes through the [`StructureParser`] trait so the pipeline can be driven by
//! another toolkit; [`Smiles`] is the built-in implementation.

mod aromatic;
mod canon;
mod smiles;

pub use canon::canonical_smiles;
pub use smiles::parse_smiles;

use thiserror::Error;

/// Errors produced while parsing a SMILES string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    /// The input contained no atoms.
    #[error("empty structure")]
    Empty,

    /// A character that is not valid at this position.
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar {
        /// Offending character.
        ch: char,
        /// Byte offset in the input.
        pos: usize,
    },

    /// An element symbol the parser does not know.
    #[error("unknown element '{0}'")]
    UnknownElement(String),

    /// A bracket atom that is not terminated or is otherwise malformed.
    #[error("malformed bracket atom at position {0}")]
    BracketAtom(usize),

    /// A bond symbol with no atom following it.
    #[error("bond symbol without a following atom at position {0}")]
    DanglingBond(usize),

    /// Parentheses do not balance.
    #[error("unbalanced branch parentheses")]
    UnbalancedBranch,

    /// Ring-closure digits that were opened but never closed.
    #[error("unclosed ring bond(s): {0:?}")]
    UnclosedRing(Vec<u16>),
}

/// A chemical element known to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Element {
    /// Atomic number.
    pub atomic_number: u8,
    /// Element symbol with canonical capitalisation.
    pub symbol: &'static str,
}

/// Hydrogen.
pub const HYDROGEN: Element = Element { atomic_number: 1, symbol: "H" };
/// Carbon.
pub const CARBON: Element = Element { atomic_number: 6, symbol: "C" };
/// Nitrogen.
pub const NITROGEN: Element = Element { atomic_number: 7, symbol: "N" };
/// Oxygen.
pub const OXYGEN: Element = Element { atomic_number: 8, symbol: "O" };

static ELEMENTS: &[Element] = &[
    HYDROGEN,
    Element { atomic_number: 3, symbol: "Li" },
    Element { atomic_number: 5, symbol: "B" },
    CARBON,
    NITROGEN,
    OXYGEN,
    Element { atomic_number: 9, symbol: "F" },
    Element { atomic_number: 11, symbol: "Na" },
    Element { atomic_number: 12, symbol: "Mg" },
    Element { atomic_number: 13, symbol: "Al" },
    Element { atomic_number: 14, symbol: "Si" },
    Element { atomic_number: 15, symbol: "P" },
    Element { atomic_number: 16, symbol: "S" },
    Element { atomic_number: 17, symbol: "Cl" },
    Element { atomic_number: 19, symbol: "K" },
    Element { atomic_number: 20, symbol: "Ca" },
    Element { atomic_number: 26, symbol: "Fe" },
    Element { atomic_number: 29, symbol: "Cu" },
    Element { atomic_number: 30, symbol: "Zn" },
    Element { atomic_number: 33, symbol: "As" },
    Element { atomic_number: 34, symbol: "Se" },
    Element { atomic_number: 35, symbol: "Br" },
    Element { atomic_number: 53, symbol: "I" },
];

/// Look up an element by its symbol (case-sensitive, e.g. `"Cl"`).
pub fn element_by_symbol(symbol: &str) -> Option<Element> {
    ELEMENTS.iter().copied().find(|e| e.symbol == symbol)
}

/// Default valences, lowest first. Elements without an entry never receive
/// implicit hydrogens.
fn default_valences(symbol: &str) -> Option<&'static [u8]> {
    match symbol {
        "B" => Some(&[3]),
        "C" => Some(&[4]),
        "N" => Some(&[3, 5]),
        "O" => Some(&[2]),
        "P" => Some(&[3, 5]),
        "S" => Some(&[2, 4, 6]),
        "F" | "Cl" | "Br" | "I" => Some(&[1]),
        _ => None,
    }
}

/// Bond order classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondOrder {
    /// Single bond.
    Single,
    /// Double bond.
    Double,
    /// Triple bond.
    Triple,
    /// Aromatic bond.
    Aromatic,
}

impl BondOrder {
    /// Contribution of the bond to an atom's valence.
    pub fn valence(self) -> f64 {
        match self {
            BondOrder::Single => 1.0,
            BondOrder::Double => 2.0,
            BondOrder::Triple => 3.0,
            BondOrder::Aromatic => 1.5,
        }
    }
}

/// An atom of a molecular graph. `hydrogens` is the total number of attached
/// hydrogens, implicit or bracket-specified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    /// Element of the atom.
    pub element: Element,
    /// Formal charge.
    pub charge: i8,
    /// Mass number when given explicitly.
    pub isotope: Option<u16>,
    /// Aromatic flag (lowercase in SMILES).
    pub aromatic: bool,
    /// Number of attached hydrogens.
    pub hydrogens: u8,
}

impl Atom {
    /// A neutral, non-aromatic atom with no hydrogens.
    pub fn new(element: Element) -> Self {
        Atom {
            element,
            charge: 0,
            isotope: None,
            aromatic: false,
            hydrogens: 0,
        }
    }

    /// Element symbol.
    pub fn symbol(&self) -> &'static str {
        self.element.symbol
    }

    /// Set the hydrogen count (builder style).
    pub fn with_hydrogens(mut self, hydrogens: u8) -> Self {
        self.hydrogens = hydrogens;
        self
    }
}

/// A bond between two atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    /// First atom index.
    pub begin: usize,
    /// Second atom index.
    pub end: usize,
    /// Bond order.
    pub order: BondOrder,
}

impl Bond {
    /// Create a bond.
    pub fn new(begin: usize, end: usize, order: BondOrder) -> Self {
        Bond { begin, end, order }
    }
}

/// An immutable molecular graph with adjacency information.
#[derive(Debug, Clone)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    /// adjacency[atom] = (neighbour atom, bond index)
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl Molecule {
    /// Build a molecule from atoms and bonds. Bond endpoints must be valid atom
    /// indices.
    pub fn new(atoms: Vec<Atom>, bonds: Vec<Bond>) -> Self {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (bi, bond) in bonds.iter().enumerate() {
            adjacency[bond.begin].push((bond.end, bi));
            adjacency[bond.end].push((bond.begin, bi));
        }
        Molecule {
            atoms,
            bonds,
            adjacency,
        }
    }

    /// All atoms.
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// All bonds.
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Atom at `idx`.
    pub fn atom(&self, idx: usize) -> &Atom {
        &self.atoms[idx]
    }

    /// Number of graph atoms (hydrogens are not graph atoms).
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Number of bonds.
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// `(neighbour, bond)` pairs of an atom.
    pub fn neighbors(&self, idx: usize) -> impl Iterator<Item = (usize, &Bond)> + '_ {
        self.adjacency[idx].iter().map(move |&(n, bi)| (n, &self.bonds[bi]))
    }

    /// Number of bonded graph neighbours.
    pub fn degree(&self, idx: usize) -> usize {
        self.adjacency[idx].len()
    }

    /// Sum of bond valences around an atom, hydrogens excluded.
    pub fn bond_order_sum(&self, idx: usize) -> f64 {
        self.neighbors(idx).map(|(_, b)| b.order.valence()).sum()
    }

    /// Number of non-hydrogen graph atoms.
    pub fn heavy_atom_count(&self) -> usize {
        self.atoms.iter().filter(|a| a.element != HYDROGEN).count()
    }

    /// Total hydrogen count, attached and explicit.
    pub fn total_hydrogens(&self) -> usize {
        let explicit = self.atoms.iter().filter(|a| a.element == HYDROGEN).count();
        let attached: usize = self.atoms.iter().map(|a| a.hydrogens as usize).sum();
        explicit + attached
    }

    /// Number of connected components.
    pub fn fragment_count(&self) -> usize {
        let n = self.atom_count();
        let mut seen = vec![false; n];
        let mut fragments = 0;
        for start in 0..n {
            if seen[start] {
                continue;
            }
            fragments += 1;
            let mut stack = vec![start];
            seen[start] = true;
            while let Some(a) = stack.pop() {
                for &(nb, _) in &self.adjacency[a] {
                    if !seen[nb] {
                        seen[nb] = true;
                        stack.push(nb);
                    }
                }
            }
        }
        fragments
    }

    /// For every bond, whether it lies on a ring (i.e. is not a bridge).
    pub fn ring_bonds(&self) -> Vec<bool> {
        let n = self.atom_count();
        let mut state = BridgeSearch {
            order: vec![usize::MAX; n],
            low: vec![0; n],
            counter: 0,
            in_ring: vec![true; self.bond_count()],
        };
        for start in 0..n {
            if state.order[start] == usize::MAX {
                self.bridge_dfs(start, None, &mut state);
            }
        }
        state.in_ring
    }

    fn bridge_dfs(&self, atom: usize, via: Option<usize>, state: &mut BridgeSearch) {
        state.order[atom] = state.counter;
        state.low[atom] = state.counter;
        state.counter += 1;
        for &(nb, bi) in &self.adjacency[atom] {
            if Some(bi) == via {
                continue;
            }
            if state.order[nb] == usize::MAX {
                self.bridge_dfs(nb, Some(bi), state);
                state.low[atom] = state.low[atom].min(state.low[nb]);
                if state.low[nb] > state.order[atom] {
                    state.in_ring[bi] = false;
                }
            } else {
                state.low[atom] = state.low[atom].min(state.order[nb]);
            }
        }
    }

    /// Hydrogens an organic-subset atom would carry if written without
    /// brackets, given its current bonds.
    pub(crate) fn implicit_hydrogens(&self, idx: usize) -> u8 {
        let atom = &self.atoms[idx];
        let Some(valences) = default_valences(atom.symbol()) else {
            return 0;
        };
        if atom.aromatic {
            // one valence electron sits in the pi system
            let available = valences[0].saturating_sub(1) as usize;
            return available.saturating_sub(self.degree(idx)) as u8;
        }
        let used = self.bond_order_sum(idx).round() as usize;
        valences
            .iter()
            .map(|&v| v as usize)
            .find(|&v| v >= used)
            .map(|v| (v - used) as u8)
            .unwrap_or(0)
    }
}

struct BridgeSearch {
    order: Vec<usize>,
    low: Vec<usize>,
    counter: usize,
    in_ring: Vec<bool>,
}

/// Text codec for structures.
///
/// `to_text` must be canonical: two inputs describing the same structure map to
/// the same text, and `to_text(parse(to_text(m)))` equals `to_text(m)`.
pub trait StructureParser {
    /// Parse text into a structure.
    fn parse(&self, text: &str) -> Result<Molecule, StructureError>;

    /// Canonical text of a structure.
    fn to_text(&self, molecule: &Molecule) -> String;
}

/// SMILES codec backed by [`parse_smiles`] and [`canonical_smiles`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Smiles;

impl StructureParser for Smiles {
    fn parse(&self, text: &str) -> Result<Molecule, StructureError> {
        parse_smiles(text)
    }

    fn to_text(&self, molecule: &Molecule) -> String {
        canonical_smiles(molecule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_lookup() {
        assert_eq!(element_by_symbol("Cl").map(|e| e.atomic_number), Some(17));
        assert_eq!(element_by_symbol("N"), Some(NITROGEN));
        assert!(element_by_symbol("Xx").is_none());
    }

    #[test]
    fn ring_bonds_of_methylcyclohexane() {
        let mol = parse_smiles("CC1CCCCC1").unwrap();
        let ring = mol.ring_bonds();
        assert_eq!(ring.iter().filter(|&&r| r).count(), 6);
        // the methyl bond is a bridge
        assert!(!ring[0]);
    }

    #[test]
    fn fragments_and_hydrogens() {
        let mol = parse_smiles("CCO.[Na+]").unwrap();
        assert_eq!(mol.fragment_count(), 2);
        assert_eq!(mol.heavy_atom_count(), 4);
        assert_eq!(mol.total_hydrogens(), 6);
    }

    #[test]
    fn implicit_hydrogens_follow_valence() {
        let mol = parse_smiles("CC(=O)N").unwrap();
        assert_eq!(mol.implicit_hydrogens(0), 3);
        assert_eq!(mol.implicit_hydrogens(1), 0);
        assert_eq!(mol.implicit_hydrogens(2), 0);
        assert_eq!(mol.implicit_hydrogens(3), 2);
    }
}

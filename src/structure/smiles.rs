//! SMILES parser.

use std::collections::BTreeMap;

use super::aromatic;
use super::{element_by_symbol, Atom, Bond, BondOrder, Element, Molecule, StructureError, HYDROGEN};

/// Parse a SMILES string into a [`Molecule`].
///
/// Organic-subset atoms receive implicit hydrogens from their default valence;
/// bracket atoms carry exactly the hydrogens written inside the brackets.
/// A plain `[H]` on a single heavy atom is folded into that atom's hydrogen
/// count, and rings written in Kekulé form are perceived as aromatic, so
/// different spellings of one structure give the same graph.
/// Stereo markers (`@`, `/`, `\`) are accepted and dropped.
///
/// ```
/// use qsar_delta::structure::parse_smiles;
///
/// let glycine = parse_smiles("NCC(=O)O").unwrap();
/// assert_eq!(glycine.atom_count(), 5);
/// assert_eq!(glycine.atom(0).hydrogens, 2);
/// ```
pub fn parse_smiles(smiles: &str) -> Result<Molecule, StructureError> {
    let mut parser = Parser::new(smiles);
    parser.parse()?;
    parser.finish()
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    /// organic[i] is true when atom i was written without brackets
    organic: Vec<bool>,
    /// ring number -> (opening atom, bond order written at the opening)
    open_rings: BTreeMap<u16, (usize, Option<BondOrder>)>,
    branches: Vec<usize>,
    prev: Option<usize>,
    pending: Option<(BondOrder, usize)>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser {
            input: input.as_bytes(),
            pos: 0,
            atoms: Vec::new(),
            bonds: Vec::new(),
            organic: Vec::new(),
            open_rings: BTreeMap::new(),
            branches: Vec::new(),
            prev: None,
            pending: None,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn unexpected(&self, at: usize) -> StructureError {
        StructureError::UnexpectedChar {
            ch: self.input.get(at).map(|&b| b as char).unwrap_or('\0'),
            pos: at,
        }
    }

    fn parse(&mut self) -> Result<(), StructureError> {
        while let Some(ch) = self.peek() {
            match ch {
                b'(' => {
                    let prev = self.prev.ok_or_else(|| self.unexpected(self.pos))?;
                    self.advance();
                    self.branches.push(prev);
                }
                b')' => {
                    if let Some((_, at)) = self.pending {
                        return Err(StructureError::DanglingBond(at));
                    }
                    self.advance();
                    self.prev = Some(self.branches.pop().ok_or(StructureError::UnbalancedBranch)?);
                }
                b'-' | b'/' | b'\\' => self.bond_symbol(BondOrder::Single)?,
                b'=' => self.bond_symbol(BondOrder::Double)?,
                b'#' => self.bond_symbol(BondOrder::Triple)?,
                b':' => self.bond_symbol(BondOrder::Aromatic)?,
                b'.' => {
                    if let Some((_, at)) = self.pending {
                        return Err(StructureError::DanglingBond(at));
                    }
                    self.advance();
                    self.prev = None;
                }
                b'%' => {
                    let at = self.pos;
                    self.advance();
                    let tens = self.advance().filter(u8::is_ascii_digit);
                    let ones = self.advance().filter(u8::is_ascii_digit);
                    match (tens, ones) {
                        (Some(t), Some(o)) => {
                            self.ring_closure((t - b'0') as u16 * 10 + (o - b'0') as u16, at)?
                        }
                        _ => return Err(self.unexpected(at)),
                    }
                }
                b'0'..=b'9' => {
                    let at = self.pos;
                    self.advance();
                    self.ring_closure((ch - b'0') as u16, at)?;
                }
                b'[' => self.bracket_atom()?,
                _ => self.organic_atom()?,
            }
        }
        Ok(())
    }

    fn bond_symbol(&mut self, order: BondOrder) -> Result<(), StructureError> {
        if self.prev.is_none() || self.pending.is_some() {
            return Err(self.unexpected(self.pos));
        }
        self.pending = Some((order, self.pos));
        self.advance();
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<(), StructureError> {
        let at = self.pos;
        let ch = self.advance().ok_or(StructureError::Empty)?;
        let next = self.peek();
        let (symbol, aromatic) = match ch {
            b'B' if next == Some(b'r') => ("Br", false),
            b'C' if next == Some(b'l') => ("Cl", false),
            b'B' => ("B", false),
            b'C' => ("C", false),
            b'N' => ("N", false),
            b'O' => ("O", false),
            b'P' => ("P", false),
            b'S' => ("S", false),
            b'F' => ("F", false),
            b'I' => ("I", false),
            b'b' => ("B", true),
            b'c' => ("C", true),
            b'n' => ("N", true),
            b'o' => ("O", true),
            b'p' => ("P", true),
            b's' => ("S", true),
            _ => return Err(self.unexpected(at)),
        };
        if symbol.len() == 2 {
            self.advance();
        }
        let element = element_by_symbol(symbol)
            .ok_or_else(|| StructureError::UnknownElement(symbol.to_string()))?;
        let atom = Atom {
            aromatic,
            ..Atom::new(element)
        };
        self.push_atom(atom, true)
    }

    fn bracket_atom(&mut self) -> Result<(), StructureError> {
        let open = self.pos;
        self.advance();

        let out_of_range = |_| StructureError::BracketAtom(open);
        let isotope = self.number().map(u16::try_from).transpose().map_err(out_of_range)?;
        let (element, aromatic) = self.bracket_element(open)?;

        while self.peek() == Some(b'@') {
            self.advance();
        }

        let mut hydrogens = 0u8;
        if self.peek() == Some(b'H') {
            self.advance();
            hydrogens = match self.number() {
                Some(n) => u8::try_from(n).map_err(out_of_range)?,
                None => 1,
            };
        }

        let mut charge: i8 = 0;
        if let Some(sign @ (b'+' | b'-')) = self.peek() {
            self.advance();
            let unit: i8 = if sign == b'+' { 1 } else { -1 };
            let magnitude = match self.number() {
                Some(n) => i8::try_from(n).map_err(out_of_range)?,
                None => {
                    let mut count = 1i8;
                    while self.peek() == Some(sign) {
                        self.advance();
                        count = count.checked_add(1).ok_or(StructureError::BracketAtom(open))?;
                    }
                    count
                }
            };
            charge = magnitude.checked_mul(unit).ok_or(StructureError::BracketAtom(open))?;
        }

        // atom-map class, e.g. [NH2:1]
        if self.peek() == Some(b':') {
            self.advance();
            self.number().ok_or(StructureError::BracketAtom(open))?;
        }

        if self.advance() != Some(b']') {
            return Err(StructureError::BracketAtom(open));
        }

        let atom = Atom {
            element,
            charge,
            isotope,
            aromatic,
            hydrogens,
        };
        self.push_atom(atom, false)
    }

    fn bracket_element(&mut self, open: usize) -> Result<(Element, bool), StructureError> {
        let first = self.advance().ok_or(StructureError::BracketAtom(open))?;
        if !first.is_ascii_alphabetic() {
            return Err(StructureError::BracketAtom(open));
        }
        let aromatic = first.is_ascii_lowercase();
        let upper = first.to_ascii_uppercase() as char;

        if let Some(second) = self.peek().filter(u8::is_ascii_lowercase) {
            let two = format!("{upper}{}", second as char);
            if let Some(element) = element_by_symbol(&two) {
                self.advance();
                return Ok((element, aromatic));
            }
        }
        let one = upper.to_string();
        element_by_symbol(&one)
            .map(|e| (e, aromatic))
            .ok_or(StructureError::UnknownElement(one))
    }

    fn number(&mut self) -> Option<u32> {
        let mut value: Option<u32> = None;
        while let Some(d) = self.peek().filter(u8::is_ascii_digit) {
            self.advance();
            value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add((d - b'0') as u32));
        }
        value
    }

    fn push_atom(&mut self, atom: Atom, organic: bool) -> Result<(), StructureError> {
        let idx = self.atoms.len();
        self.atoms.push(atom);
        self.organic.push(organic);
        if let Some(prev) = self.prev {
            let order = self.bond_order_to(prev, idx, None);
            self.bonds.push(Bond::new(prev, idx, order));
        }
        self.pending = None;
        self.prev = Some(idx);
        Ok(())
    }

    /// Order for a bond to `idx`: the pending symbol, else the one recorded at
    /// a ring opening, else aromatic between aromatic atoms, else single.
    fn bond_order_to(&self, from: usize, idx: usize, recorded: Option<BondOrder>) -> BondOrder {
        self.pending
            .map(|(order, _)| order)
            .or(recorded)
            .unwrap_or(if self.atoms[from].aromatic && self.atoms[idx].aromatic {
                BondOrder::Aromatic
            } else {
                BondOrder::Single
            })
    }

    fn ring_closure(&mut self, number: u16, at: usize) -> Result<(), StructureError> {
        let current = self.prev.ok_or_else(|| self.unexpected(at))?;
        match self.open_rings.remove(&number) {
            Some((open, recorded)) => {
                let duplicate = self.bonds.iter().any(|b| {
                    (b.begin == open && b.end == current) || (b.begin == current && b.end == open)
                });
                if open == current || duplicate {
                    return Err(self.unexpected(at));
                }
                let order = self.bond_order_to(open, current, recorded);
                self.bonds.push(Bond::new(open, current, order));
            }
            None => {
                let recorded = self.pending.map(|(order, _)| order);
                self.open_rings.insert(number, (current, recorded));
            }
        }
        self.pending = None;
        Ok(())
    }

    fn finish(self) -> Result<Molecule, StructureError> {
        if let Some((_, at)) = self.pending {
            return Err(StructureError::DanglingBond(at));
        }
        if !self.branches.is_empty() {
            return Err(StructureError::UnbalancedBranch);
        }
        if !self.open_rings.is_empty() {
            return Err(StructureError::UnclosedRing(self.open_rings.keys().copied().collect()));
        }
        if self.atoms.is_empty() {
            return Err(StructureError::Empty);
        }

        let organic = self.organic;
        let mut molecule = Molecule::new(self.atoms, self.bonds);
        for (idx, _) in organic.iter().enumerate().filter(|(_, &o)| o) {
            molecule.atoms[idx].hydrogens = molecule.implicit_hydrogens(idx);
        }
        let mut molecule = fold_explicit_hydrogens(molecule);
        aromatic::perceive(&mut molecule);
        Ok(molecule)
    }
}

/// Move neutral, unlabelled `[H]` atoms with one single bond to a heavy atom
/// into that atom's hydrogen count.
fn fold_explicit_hydrogens(mol: Molecule) -> Molecule {
    let foldable: Vec<bool> = (0..mol.atom_count())
        .map(|i| {
            let atom = &mol.atoms[i];
            atom.element == HYDROGEN
                && atom.charge == 0
                && atom.isotope.is_none()
                && atom.hydrogens == 0
                && mol.degree(i) == 1
                && mol
                    .neighbors(i)
                    .all(|(nb, bond)| bond.order == BondOrder::Single && mol.atoms[nb].element != HYDROGEN)
        })
        .collect();
    if !foldable.contains(&true) {
        return mol;
    }

    let Molecule {
        mut atoms,
        bonds,
        adjacency,
    } = mol;
    for (i, _) in foldable.iter().enumerate().filter(|(_, &f)| f) {
        for &(nb, _) in &adjacency[i] {
            atoms[nb].hydrogens = atoms[nb].hydrogens.saturating_add(1);
        }
    }

    let mut index = vec![usize::MAX; atoms.len()];
    let mut kept = Vec::with_capacity(atoms.len());
    for (i, atom) in atoms.into_iter().enumerate() {
        if !foldable[i] {
            index[i] = kept.len();
            kept.push(atom);
        }
    }
    let bonds = bonds
        .into_iter()
        .filter(|b| !foldable[b.begin] && !foldable[b.end])
        .map(|b| Bond::new(index[b.begin], index[b.end], b.order))
        .collect();
    Molecule::new(kept, bonds)
}

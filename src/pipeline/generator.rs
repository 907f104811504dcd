//! Derivative generation with parent tracking.

use std::collections::BTreeMap;

use tracing::debug;

use crate::structure::{Molecule, StructureParser};
use crate::transform::{TransformationEngine, TransformationRule};

/// Derivatives of a parent list, flattened.
///
/// The three vectors are parallel: entry `i` is one derivative, its canonical
/// text and the index of the parent it came from. All derivatives of parent `k`
/// precede those of parent `k + 1`; within a parent they are ordered by
/// canonical text.
#[derive(Debug, Clone, Default)]
pub struct Derivatives {
    /// Derivative structures.
    pub structures: Vec<Molecule>,
    /// Canonical text of each derivative.
    pub texts: Vec<String>,
    /// Parent index of each derivative.
    pub parent_index: Vec<usize>,
}

impl Derivatives {
    /// Number of derivatives.
    pub fn len(&self) -> usize {
        self.structures.len()
    }

    /// Whether no derivative was produced.
    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }
}

/// Apply `rules` to every parent, dropping duplicate products per parent.
///
/// A parent without matching sites contributes nothing.
pub fn generate<P, T>(
    parser: &P,
    engine: &T,
    rules: &[TransformationRule],
    parents: &[Molecule],
) -> Derivatives
where
    P: StructureParser,
    T: TransformationEngine,
{
    let mut out = Derivatives::default();
    for (parent, molecule) in parents.iter().enumerate() {
        let mut unique: BTreeMap<String, Molecule> = BTreeMap::new();
        for product in engine.apply(rules, molecule) {
            unique.entry(parser.to_text(&product)).or_insert(product);
        }
        debug!(parent, derivatives = unique.len(), "generated derivatives");

        for (text, structure) in unique {
            out.structures.push(structure);
            out.texts.push(text);
            out.parent_index.push(parent);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::Smiles;
    use crate::transform::{default_rules, SiteRewriter};

    fn parents(smiles: &[&str]) -> Vec<Molecule> {
        smiles.iter().map(|s| Smiles.parse(s).unwrap()).collect()
    }

    #[test]
    fn parent_index_is_grouped_and_valid() {
        let parents = parents(&["NCCNC", "c1ccccc1", "NCC(=O)O"]);
        let d = generate(&Smiles, &SiteRewriter, &default_rules(), &parents);
        assert_eq!(d.len(), 3);
        assert_eq!(d.parent_index, vec![0, 0, 2]);
        assert_eq!(d.texts.len(), d.len());
        assert!(d.parent_index.iter().all(|&p| p < parents.len()));
    }

    #[test]
    fn duplicates_collapse_and_order_is_sorted() {
        // both amines of ethylenediamine give the same product
        let d = generate(&Smiles, &SiteRewriter, &default_rules(), &parents(&["NCCN"]));
        assert_eq!(d.len(), 1);

        let d = generate(&Smiles, &SiteRewriter, &default_rules(), &parents(&["NCCNC"]));
        let mut sorted = d.texts.clone();
        sorted.sort();
        assert_eq!(d.texts, sorted);
    }

    #[test]
    fn texts_match_structures() {
        let d = generate(&Smiles, &SiteRewriter, &default_rules(), &parents(&["C1CCNCC1", "c1cc[nH]c1"]));
        for (structure, text) in d.structures.iter().zip(&d.texts) {
            assert_eq!(&Smiles.to_text(structure), text);
        }
    }

    #[test]
    fn generation_is_idempotent() {
        let parents = parents(&["NCC(=O)O", "CNC", "c1ccc2[nH]ccc2c1"]);
        let rules = default_rules();
        let a = generate(&Smiles, &SiteRewriter, &rules, &parents);
        let b = generate(&Smiles, &SiteRewriter, &rules, &parents);
        assert_eq!(a.texts, b.texts);
        assert_eq!(a.parent_index, b.parent_index);
    }
}

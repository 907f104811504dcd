//! Nitrogen-site transformation rules.
//!
//! Each rule turns an N-H site into an N-carboxyl site (CO2 adduct). A rule
//! applied to a molecule yields one product per matching site.

use crate::structure::{Atom, Bond, BondOrder, Molecule, CARBON, NITROGEN, OXYGEN};

/// Condition a nitrogen atom must meet to be rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NitrogenSite {
    /// Whether the nitrogen is aromatic.
    pub aromatic: bool,
    /// Hydrogens on the nitrogen before the rewrite.
    pub hydrogens: u8,
    /// Required number of single-bonded non-oxygen neighbours, when constrained.
    pub substituents: Option<usize>,
}

/// A named transformation with the reaction template it implements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformationRule {
    /// Short identifier.
    pub name: &'static str,
    /// Reaction SMIRKS the rule implements.
    pub smirks: &'static str,
    /// Site condition.
    pub site: NitrogenSite,
}

/// The fixed rule set: primary amine, secondary amine and aromatic NH.
pub fn default_rules() -> Vec<TransformationRule> {
    vec![
        TransformationRule {
            name: "primary_amine",
            smirks: "[!O;*:2]-[Nv3&H2:1]>>[!O;*:2]-[Nv3&H1:1]-C(=O)-O",
            site: NitrogenSite {
                aromatic: false,
                hydrogens: 2,
                substituents: Some(1),
            },
        },
        TransformationRule {
            name: "secondary_amine",
            smirks: "[Nv3&H1:1](-[!O;*:2])-[!O;*:3]>>O-C(=O)-[Nv3&H0:1](-[!O;*:2])-[*:3]",
            site: NitrogenSite {
                aromatic: false,
                hydrogens: 1,
                substituents: Some(2),
            },
        },
        TransformationRule {
            name: "aromatic_nh",
            smirks: "[nv3&H1:1]>>O-C(=O)-[nv3&H0:1]",
            site: NitrogenSite {
                aromatic: true,
                hydrogens: 1,
                substituents: None,
            },
        },
    ]
}

/// Applies transformation rules to a structure.
pub trait TransformationEngine {
    /// Every product of every rule, in rule order then site order. Duplicates
    /// are allowed; a structure with no matching site yields an empty list.
    fn apply(&self, rules: &[TransformationRule], molecule: &Molecule) -> Vec<Molecule>;
}

/// Graph rewriter for [`NitrogenSite`] rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct SiteRewriter;

impl SiteRewriter {
    /// Atom indices matching `site`, ascending.
    pub fn sites(&self, site: &NitrogenSite, molecule: &Molecule) -> Vec<usize> {
        (0..molecule.atom_count())
            .filter(|&idx| site_matches(site, molecule, idx))
            .collect()
    }
}

impl TransformationEngine for SiteRewriter {
    fn apply(&self, rules: &[TransformationRule], molecule: &Molecule) -> Vec<Molecule> {
        rules
            .iter()
            .flat_map(|rule| {
                self.sites(&rule.site, molecule)
                    .into_iter()
                    .map(move |idx| carboxylate(molecule, idx))
            })
            .collect()
    }
}

fn site_matches(site: &NitrogenSite, molecule: &Molecule, idx: usize) -> bool {
    let atom = molecule.atom(idx);
    if atom.element != NITROGEN
        || atom.charge != 0
        || atom.aromatic != site.aromatic
        || atom.hydrogens != site.hydrogens
    {
        return false;
    }

    if site.aromatic {
        // nv3 with one H: two ring neighbours
        return molecule.degree(idx) == 2;
    }

    let valence = molecule.bond_order_sum(idx) + f64::from(atom.hydrogens);
    if (valence - 3.0).abs() > f64::EPSILON {
        return false;
    }
    let mut substituents = 0;
    for (nb, bond) in molecule.neighbors(idx) {
        let neighbour = molecule.atom(nb);
        if bond.order != BondOrder::Single || (neighbour.element == OXYGEN && !neighbour.aromatic) {
            return false;
        }
        substituents += 1;
    }
    site.substituents.map_or(true, |n| n == substituents)
}

/// Copy of `molecule` with one hydrogen on `site` replaced by `C(=O)O`.
fn carboxylate(molecule: &Molecule, site: usize) -> Molecule {
    let mut atoms = molecule.atoms().to_vec();
    let mut bonds = molecule.bonds().to_vec();
    atoms[site].hydrogens -= 1;

    let carbon = atoms.len();
    atoms.push(Atom::new(CARBON));
    atoms.push(Atom::new(OXYGEN));
    atoms.push(Atom::new(OXYGEN).with_hydrogens(1));

    bonds.push(Bond::new(site, carbon, BondOrder::Single));
    bonds.push(Bond::new(carbon, carbon + 1, BondOrder::Double));
    bonds.push(Bond::new(carbon, carbon + 2, BondOrder::Single));
    Molecule::new(atoms, bonds)
}

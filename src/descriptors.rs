//! Molecular descriptor engine.
//!
//! Descriptors are computed from the molecular graph built by
//! [`crate::structure`]. A single structure can fail for some descriptors and
//! not others, so the engine never returns an error: it reports every feature
//! it knows, with [`RawValue::Missing`] standing in for a failed calculation.
//! Turning raw values into numbers is the aligner's job.
//!
//! | Group             | Features                                                        |
//! |-------------------|-----------------------------------------------------------------|
//! | physicochemical   | `MW`, `SLogP`, `TopoPSA`, `nHBDon`, `nHBAcc`, `Lipinski`, `GhoseFilter` |
//! | constitutional    | `nAtom`, `nHeavyAtom`, `nHetero`, `nAromAtom`, `nRing`, `nRot`   |
//! | topological       | `WPath`, `Zagreb1`, `Zagreb2`, `Randic`, `BalabanJ`              |
//!
//! # Example
//!
//! ```
//! use qsar_delta::descriptors::{DescriptorEngine, RawValue, StandardDescriptors};
//! use qsar_delta::structure::parse_smiles;
//!
//! let ethanol = parse_smiles("CCO").unwrap();
//! let raw = StandardDescriptors.compute(&ethanol);
//! assert_eq!(raw["nHeavyAtom"], RawValue::Number(3.0));
//! assert_eq!(raw["nHBDon"], RawValue::Number(1.0));
//! ```

pub mod constitutional;
pub mod physicochemical;
pub mod topological;

use std::collections::HashMap;

use indexmap::IndexMap;
use thiserror::Error;

use crate::structure::Molecule;

/// Errors returned by individual descriptor calculations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DescriptorError {
    /// An element was found for which we don't have an atomic weight.
    #[error("unknown element: {0}")]
    UnknownElement(String),

    /// An atom type with no logP contribution.
    #[error("no logP contribution for atom {index} ({symbol})")]
    MissingContribution {
        /// Atom index.
        index: usize,
        /// Element symbol (lowercase when aromatic).
        symbol: String,
    },

    /// Distance-based indices need a connected graph.
    #[error("graph is disconnected ({0} fragments)")]
    Disconnected(usize),

    /// Distance-based indices need at least two atoms.
    #[error("graph has {0} atom(s), at least 2 required")]
    TooSmall(usize),
}

/// A descriptor value as reported by an engine, before numeric coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// A numeric value (may be NaN or infinite).
    Number(f64),
    /// A boolean rule flag.
    Flag(bool),
    /// A textual value; numeric only if it parses.
    Text(String),
    /// The calculation failed; the string says why.
    Missing(String),
}

impl From<Result<f64, DescriptorError>> for RawValue {
    fn from(value: Result<f64, DescriptorError>) -> Self {
        match value {
            Ok(v) => RawValue::Number(v),
            Err(e) => RawValue::Missing(e.to_string()),
        }
    }
}

/// Feature name → raw value, in the engine's reporting order.
pub type RawDescriptors = IndexMap<String, RawValue>;

/// Features reported by [`StandardDescriptors`], in order.
pub const FEATURE_NAMES: [&str; 18] = [
    "MW",
    "SLogP",
    "TopoPSA",
    "nHBDon",
    "nHBAcc",
    "nAtom",
    "nHeavyAtom",
    "nHetero",
    "nAromAtom",
    "nRing",
    "nRot",
    "WPath",
    "Zagreb1",
    "Zagreb2",
    "Randic",
    "BalabanJ",
    "Lipinski",
    "GhoseFilter",
];

/// Computes a raw descriptor mapping for a structure.
///
/// Implementations must be `Sync`; the aligner may call them from several
/// threads at once.
pub trait DescriptorEngine: Sync {
    /// Descriptors for one structure. A feature that could not be computed is
    /// reported as [`RawValue::Missing`]; a feature the engine does not know is
    /// simply absent.
    fn compute(&self, molecule: &Molecule) -> RawDescriptors;
}

/// The built-in descriptor set (see [`FEATURE_NAMES`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDescriptors;

impl DescriptorEngine for StandardDescriptors {
    fn compute(&self, molecule: &Molecule) -> RawDescriptors {
        let mw = physicochemical::molecular_weight(molecule);
        let logp = physicochemical::crippen_logp(molecule);
        let tpsa = physicochemical::ertl_tpsa(molecule);
        let donors = physicochemical::h_bond_donors(molecule);
        let acceptors = physicochemical::h_bond_acceptors(molecule);
        let cons = constitutional::constitutional_descriptors(molecule);
        let topo = topological::topological_descriptors(molecule);
        let distances = topological::distance_matrix(molecule);

        let wiener = distances
            .as_ref()
            .map(|d| f64::from(topological::wiener_index(d)))
            .map_err(|e| e.clone());
        let balaban = distances.and_then(|d| topological::balaban_j(molecule, &d));

        let rule_flags = match (&mw, &logp) {
            (Ok(mw), Ok(logp)) => (
                RawValue::Flag(physicochemical::lipinski(*mw, *logp, donors, acceptors)),
                RawValue::Flag(physicochemical::ghose_filter(*mw, *logp, cons.n_atoms)),
            ),
            (Err(e), _) | (_, Err(e)) => (RawValue::Missing(e.to_string()), RawValue::Missing(e.to_string())),
        };

        let values: [RawValue; 18] = [
            mw.into(),
            logp.into(),
            RawValue::Number(tpsa),
            RawValue::Number(donors as f64),
            RawValue::Number(acceptors as f64),
            RawValue::Number(cons.n_atoms as f64),
            RawValue::Number(cons.heavy_atom_count as f64),
            RawValue::Number(cons.num_heteroatoms as f64),
            RawValue::Number(cons.num_aromatic_atoms as f64),
            RawValue::Number(cons.num_rings as f64),
            RawValue::Number(cons.num_rotatable_bonds as f64),
            wiener.into(),
            RawValue::Number(f64::from(topo.zagreb_m1)),
            RawValue::Number(f64::from(topo.zagreb_m2)),
            RawValue::Number(topo.randic),
            balaban.into(),
            rule_flags.0,
            rule_flags.1,
        ];

        FEATURE_NAMES
            .iter()
            .map(|name| name.to_string())
            .zip(values)
            .collect()
    }
}

/// Monoisotopic atomic masses for the elements we support.
pub(crate) fn atomic_weights() -> HashMap<&'static str, f64> {
    HashMap::from([
        ("H", 1.00782503223),
        ("C", 12.0),
        ("N", 14.00307400443),
        ("O", 15.99491461956),
        ("S", 31.9720711744),
        ("P", 30.97376199842),
        ("F", 18.998403163),
        ("Cl", 34.968852682),
        ("Br", 78.9183376),
        ("I", 126.90447),
        ("B", 11.00930536),
        ("Si", 27.976926532),
    ])
}

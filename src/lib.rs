#![warn(missing_docs)]
//! qsar-delta: derivative generation and delta-descriptor scoring for QSAR
//! binding-affinity models.
//!
//! Given parent structures as SMILES, the crate proposes CO2-adduct derivatives
//! at nitrogen sites, computes the same descriptor set for parents and
//! derivatives, subtracts them feature by feature and scores each delta with a
//! scaled regression model.
//!
//! - **structure**: molecule graph, SMILES parser, canonical SMILES writer
//! - **transform**: nitrogen-site rules and the graph rewriter that applies them
//! - **descriptors**: physicochemical, constitutional and topological descriptors
//! - **pipeline**: generator, aligner, delta assembler and scorer
//! - **models**: standard scalers, linear model and the JSON model bundle
//! - **data_io**: input lines in, CSV predictions out
//! - **config**: environment-driven run settings
//!
//! # Quick examples
//!
//! ### Canonical SMILES
//! ```
//! use qsar_delta::structure::{canonical_smiles, parse_smiles};
//!
//! let a = parse_smiles("OCC").unwrap();
//! let b = parse_smiles("C(O)C").unwrap();
//! assert_eq!(canonical_smiles(&a), canonical_smiles(&b));
//! ```
//!
//! ### Descriptors for one structure
//! ```
//! use qsar_delta::descriptors::{DescriptorEngine, StandardDescriptors};
//! use qsar_delta::structure::parse_smiles;
//!
//! let glycine = parse_smiles("NCC(=O)O").unwrap();
//! let raw = StandardDescriptors.compute(&glycine);
//! println!("{:?}", raw.get("TopoPSA"));
//! ```
//!
//! ### Score derivatives of a file of parents
//! ```no_run
//! use qsar_delta::{data_io, ModelBundle, Pipeline};
//!
//! let bundle = ModelBundle::load("model.json")?;
//! let lines = data_io::read_structure_lines("parents.smi")?;
//! let report = Pipeline::standard(bundle).run(&lines)?;
//! data_io::write_predictions(std::io::stdout(), &report.predictions)?;
//! # Ok::<(), qsar_delta::QsarError>(())
//! ```

pub mod config;
pub mod data_io;
pub mod descriptors;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod structure;
pub mod transform;

// ─────────────────────────────────────────────────────────────────────────────
// Convenience re-exports
// ─────────────────────────────────────────────────────────────────────────────
pub use config::PipelineConfig;
pub use descriptors::{DescriptorEngine, RawDescriptors, RawValue, StandardDescriptors};
pub use error::QsarError;
pub use models::{fit_linear_bundle, LinearModel, ModelBundle, Regressor, StandardScaler};
pub use pipeline::{Pipeline, PipelineReport, PredictionResult};
pub use structure::{Molecule, Smiles, StructureParser};
pub use transform::{default_rules, SiteRewriter, TransformationEngine, TransformationRule};

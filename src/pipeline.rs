//! The transformation-and-delta pipeline.
//!
//! Stages, in order:
//! - `generator`: derivatives per parent, with the parent index
//! - `aligner`: descriptors for both sets, reduced to one shared schema
//! - `delta`: derivative minus parent, with typed exclusions
//! - `scoring`: scale, predict, inverse-scale and zip back to text
//!
//! [`Pipeline`] wires the stages to a parser, a transformation engine, a
//! descriptor engine and a model bundle.

pub mod aligner;
pub mod delta;
pub mod generator;
pub mod scoring;

pub use aligner::{describe_and_align, AlignedDescriptors, DescriptorTable, FeatureSchema};
pub use delta::{assemble, DeltaOutcome, DeltaTable, Exclusion, Side};
pub use generator::{generate, Derivatives};
pub use scoring::{predict, zip_predictions, PredictionResult};

use tracing::{info, warn};

use crate::descriptors::{DescriptorEngine, StandardDescriptors};
use crate::error::QsarError;
use crate::models::ModelBundle;
use crate::structure::{Molecule, Smiles, StructureParser};
use crate::transform::{default_rules, SiteRewriter, TransformationEngine, TransformationRule};

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    /// Output rows, in surviving-derivative order.
    pub predictions: Vec<PredictionResult>,
    /// Number of derivatives generated before filtering.
    pub generated: usize,
    /// Derivatives dropped before scoring, with reasons.
    pub exclusions: Vec<(usize, Exclusion)>,
}

/// A configured pipeline. Rules and model are fixed at construction and only
/// borrowed while running.
pub struct Pipeline<P = Smiles, T = SiteRewriter, D = StandardDescriptors> {
    parser: P,
    transformer: T,
    descriptors: D,
    rules: Vec<TransformationRule>,
    bundle: ModelBundle,
    parallel: bool,
}

impl Pipeline {
    /// The built-in parser, rule set and descriptor engine around `bundle`.
    pub fn standard(bundle: ModelBundle) -> Self {
        Pipeline::new(Smiles, SiteRewriter, StandardDescriptors, default_rules(), bundle)
    }
}

impl<P, T, D> Pipeline<P, T, D>
where
    P: StructureParser,
    T: TransformationEngine,
    D: DescriptorEngine,
{
    /// Assemble a pipeline from its collaborators. Descriptor batches run in
    /// parallel unless switched off with [`Pipeline::with_parallel`].
    pub fn new(parser: P, transformer: T, descriptors: D, rules: Vec<TransformationRule>, bundle: ModelBundle) -> Self {
        Pipeline {
            parser,
            transformer,
            descriptors,
            rules,
            bundle,
            parallel: true,
        }
    }

    /// Enable or disable parallel descriptor batches.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The model bundle.
    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    /// Parse every input line; the first failure aborts with its 1-based line number.
    pub fn parse_inputs(&self, lines: &[String]) -> Result<Vec<Molecule>, QsarError> {
        lines
            .iter()
            .enumerate()
            .map(|(i, text)| {
                self.parser
                    .parse(text)
                    .map_err(|source| QsarError::InvalidStructure {
                        line: i + 1,
                        text: text.clone(),
                        source,
                    })
            })
            .collect()
    }

    /// Run every stage over the input lines.
    ///
    /// Row-level failures become exclusions in the report; anything returned
    /// as `Err` aborts the run.
    pub fn run(&self, lines: &[String]) -> Result<PipelineReport, QsarError> {
        let parents = self.parse_inputs(lines)?;
        let parent_texts: Vec<String> = parents.iter().map(|m| self.parser.to_text(m)).collect();
        info!(parents = parents.len(), "parsed input structures");

        let derivatives = generate(&self.parser, &self.transformer, &self.rules, &parents);
        info!(derivatives = derivatives.len(), rules = self.rules.len(), "generated derivatives");

        let aligned = describe_and_align(
            &self.descriptors,
            self.bundle.required_features(),
            &parents,
            &derivatives.structures,
            self.parallel,
        );

        let table = assemble(&aligned, &derivatives.parent_index);
        if !table.exclusions.is_empty() {
            warn!(
                excluded = table.exclusions.len(),
                "derivatives excluded from scoring"
            );
        }

        let scores = predict(
            &table,
            &self.bundle.input_scaler,
            &self.bundle.model,
            &self.bundle.output_scaler,
        )?;
        let predictions = zip_predictions(&table, &scores, &parent_texts, &derivatives)?;

        Ok(PipelineReport {
            predictions,
            generated: derivatives.len(),
            exclusions: table.exclusions,
        })
    }
}

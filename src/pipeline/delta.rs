//! Delta assembly: derivative descriptors minus parent descriptors.

use std::fmt;

use ndarray::Array2;
use thiserror::Error;
use tracing::{debug, info};

use super::aligner::{AlignedDescriptors, FeatureSchema};
use crate::error::QsarError;
use crate::models::to_ndarray;

/// Which table an unavailable value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The parent row.
    Parent,
    /// The derivative row.
    Derivative,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Parent => "parent",
            Side::Derivative => "derivative",
        })
    }
}

/// Why a derivative has no delta row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Exclusion {
    /// The recorded parent index has no parent row.
    #[error("no descriptor row for parent {parent:?}")]
    MissingParent {
        /// Recorded parent index, if any was recorded.
        parent: Option<usize>,
    },

    /// An aligned feature is unavailable on one side.
    #[error("feature {feature} unavailable on the {side} side")]
    Unavailable {
        /// Feature name.
        feature: String,
        /// Side with the gap.
        side: Side,
    },
}

/// Result of forming one delta row.
#[derive(Debug, Clone, PartialEq)]
pub enum DeltaOutcome {
    /// Feature-wise `derivative - parent`, in schema order.
    Computed(Vec<f64>),
    /// The derivative is dropped from scoring.
    Excluded(Exclusion),
}

/// Delta for a single derivative row against its parent row.
///
/// Features are checked in schema order, the derivative value before the
/// parent value; the first gap decides the exclusion reason.
pub fn delta_row(
    schema: &FeatureSchema,
    derivative: &[Option<f64>],
    parent: &[Option<f64>],
) -> DeltaOutcome {
    let mut delta = Vec::with_capacity(schema.len());
    for (i, feature) in schema.names().iter().enumerate() {
        let unavailable = |side| {
            DeltaOutcome::Excluded(Exclusion::Unavailable {
                feature: feature.clone(),
                side,
            })
        };
        let Some(d) = derivative.get(i).copied().flatten() else {
            return unavailable(Side::Derivative);
        };
        let Some(p) = parent.get(i).copied().flatten() else {
            return unavailable(Side::Parent);
        };
        delta.push(d - p);
    }
    DeltaOutcome::Computed(delta)
}

/// Delta rows for every derivative that survived, with an audit trail for the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaTable {
    /// Feature order of every row.
    pub schema: FeatureSchema,
    /// One delta row per surviving derivative.
    pub rows: Vec<Vec<f64>>,
    /// Derivative index of each row, ascending.
    pub surviving: Vec<usize>,
    /// Excluded derivative indices with their reasons, ascending.
    pub exclusions: Vec<(usize, Exclusion)>,
}

impl DeltaTable {
    /// Number of surviving rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no derivative survived.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as an `(n_rows, n_features)` matrix.
    pub fn to_array(&self) -> Result<Array2<f64>, QsarError> {
        to_ndarray(&self.rows, self.schema.len())
    }
}

/// Form a delta row for each derivative of `aligned`, using `parent_index` to
/// find its parent row.
pub fn assemble(aligned: &AlignedDescriptors, parent_index: &[usize]) -> DeltaTable {
    let mut table = DeltaTable {
        schema: aligned.schema.clone(),
        rows: Vec::new(),
        surviving: Vec::new(),
        exclusions: Vec::new(),
    };

    for (i, derivative) in aligned.derivatives.rows().iter().enumerate() {
        let parent = parent_index.get(i).copied();
        let outcome = match parent.and_then(|p| aligned.parents.row(p)) {
            Some(parent_row) => delta_row(&aligned.schema, derivative, parent_row),
            None => DeltaOutcome::Excluded(Exclusion::MissingParent { parent }),
        };
        match outcome {
            DeltaOutcome::Computed(row) => {
                table.rows.push(row);
                table.surviving.push(i);
            }
            DeltaOutcome::Excluded(reason) => {
                debug!(derivative = i, %reason, "derivative excluded");
                table.exclusions.push((i, reason));
            }
        }
    }

    info!(
        surviving = table.surviving.len(),
        excluded = table.exclusions.len(),
        "delta rows assembled"
    );
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::{RawDescriptors, RawValue};
    use crate::pipeline::aligner::align;

    fn raw(values: &[(&str, RawValue)]) -> RawDescriptors {
        values.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn num(v: f64) -> RawValue {
        RawValue::Number(v)
    }

    fn required() -> Vec<String> {
        vec!["a".to_string(), "b".to_string()]
    }

    #[test]
    fn delta_is_derivative_minus_parent() {
        let schema = FeatureSchema::new(required());
        let outcome = delta_row(&schema, &[Some(5.0), Some(1.0)], &[Some(2.0), Some(3.0)]);
        assert_eq!(outcome, DeltaOutcome::Computed(vec![3.0, -2.0]));
    }

    #[test]
    fn derivative_side_is_checked_first() {
        let schema = FeatureSchema::new(required());
        let outcome = delta_row(&schema, &[Some(1.0), None], &[Some(1.0), None]);
        assert_eq!(
            outcome,
            DeltaOutcome::Excluded(Exclusion::Unavailable {
                feature: "b".into(),
                side: Side::Derivative
            })
        );
        let outcome = delta_row(&schema, &[Some(1.0), Some(2.0)], &[None, Some(2.0)]);
        assert_eq!(
            outcome,
            DeltaOutcome::Excluded(Exclusion::Unavailable {
                feature: "a".into(),
                side: Side::Parent
            })
        );
    }

    #[test]
    fn assemble_filters_and_records() {
        let parents = vec![
            raw(&[("a", num(1.0)), ("b", num(1.0))]),
            raw(&[("a", RawValue::Missing("x".into())), ("b", num(0.0))]),
        ];
        let derivatives = vec![
            raw(&[("a", num(2.0)), ("b", num(4.0))]),
            raw(&[("a", num(2.0)), ("b", RawValue::Number(f64::NAN))]),
            raw(&[("a", num(2.0)), ("b", num(4.0))]),
            raw(&[("a", num(3.0)), ("b", num(3.0))]),
        ];
        let aligned = align(&required(), &parents, &derivatives);
        // the last derivative points at a parent that does not exist
        let table = assemble(&aligned, &[0, 0, 1, 7]);

        assert_eq!(table.rows, vec![vec![1.0, 3.0]]);
        assert_eq!(table.surviving, vec![0]);
        assert_eq!(table.exclusions.len(), 3);
        assert_eq!(table.exclusions[0].0, 1);
        assert_eq!(
            table.exclusions[1],
            (2, Exclusion::Unavailable { feature: "a".into(), side: Side::Parent })
        );
        assert_eq!(table.exclusions[2], (3, Exclusion::MissingParent { parent: Some(7) }));
        assert!(table.len() <= aligned.derivatives.len());
    }

    #[test]
    fn short_parent_index_excludes_the_rest() {
        let parents = vec![raw(&[("a", num(1.0)), ("b", num(1.0))])];
        let derivatives = vec![raw(&[("a", num(2.0)), ("b", num(2.0))]); 2];
        let aligned = align(&required(), &parents, &derivatives);
        let table = assemble(&aligned, &[0]);
        assert_eq!(table.surviving, vec![0]);
        assert_eq!(table.exclusions, vec![(1, Exclusion::MissingParent { parent: None })]);
    }

    #[test]
    fn table_to_array() {
        let table = DeltaTable {
            schema: FeatureSchema::new(required()),
            rows: vec![vec![1.0, 2.0], vec![3.0, 4.0]],
            surviving: vec![0, 2],
            exclusions: vec![],
        };
        assert_eq!(table.to_array().unwrap().shape(), &[2, 2]);
    }
}

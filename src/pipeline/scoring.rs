//! Scoring: scaled regression over delta rows, zipped back to text pairs.

use tracing::info;

use super::delta::DeltaTable;
use super::generator::Derivatives;
use crate::error::QsarError;
use crate::models::{scaled_predict, Regressor, StandardScaler};

/// One output line.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    /// Canonical text of the parent.
    pub parent: String,
    /// Canonical text of the derivative.
    pub derivative: String,
    /// Predicted score on the target scale.
    pub score: f64,
}

/// Predict one score per delta row.
///
/// An empty table yields no scores. Otherwise the delta schema must list
/// exactly the input scaler's features, in the same order.
pub fn predict<R: Regressor>(
    table: &DeltaTable,
    input_scaler: &StandardScaler,
    model: &R,
    output_scaler: &StandardScaler,
) -> Result<Vec<f64>, QsarError> {
    if table.is_empty() {
        return Ok(Vec::new());
    }
    if table.schema.names() != input_scaler.feature_names.as_slice() {
        return Err(QsarError::FeatureMismatch {
            expected: input_scaler.feature_names.clone(),
            found: table.schema.names().to_vec(),
        });
    }
    if model.n_features() != table.schema.len() {
        return Err(QsarError::ShapeMismatch {
            expected: table.schema.len(),
            found: model.n_features(),
        });
    }

    let x = table.to_array()?;
    let scores = scaled_predict(input_scaler, model, output_scaler, &x)?;
    info!(rows = scores.len(), "derivatives scored");
    Ok(scores.to_vec())
}

/// Pair each score with its parent and derivative text, in surviving order.
pub fn zip_predictions(
    table: &DeltaTable,
    scores: &[f64],
    parent_texts: &[String],
    derivatives: &Derivatives,
) -> Result<Vec<PredictionResult>, QsarError> {
    if scores.len() != table.surviving.len() {
        return Err(QsarError::ShapeMismatch {
            expected: table.surviving.len(),
            found: scores.len(),
        });
    }

    table
        .surviving
        .iter()
        .zip(scores)
        .map(|(&i, &score)| -> Result<PredictionResult, QsarError> {
            let parent = derivatives
                .parent_index
                .get(i)
                .and_then(|&p| parent_texts.get(p))
                .ok_or(QsarError::ShapeMismatch {
                    expected: parent_texts.len(),
                    found: i,
                })?;
            let derivative = derivatives.texts.get(i).ok_or(QsarError::ShapeMismatch {
                expected: derivatives.len(),
                found: i,
            })?;
            Ok(PredictionResult {
                parent: parent.clone(),
                derivative: derivative.clone(),
                score,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LinearModel;
    use crate::pipeline::aligner::FeatureSchema;
    use approx::assert_relative_eq;

    fn scalers() -> (StandardScaler, StandardScaler) {
        (
            StandardScaler {
                feature_names: vec!["a".into(), "b".into()],
                mean: vec![0.0, 1.0],
                scale: vec![1.0, 2.0],
            },
            StandardScaler {
                feature_names: vec!["score".into()],
                mean: vec![10.0],
                scale: vec![2.0],
            },
        )
    }

    fn model() -> LinearModel {
        LinearModel {
            coefficients: vec![1.0, 1.0],
            intercept: 0.0,
        }
    }

    fn table(names: &[&str], rows: Vec<Vec<f64>>) -> DeltaTable {
        DeltaTable {
            schema: FeatureSchema::new(names.iter().map(|s| s.to_string()).collect()),
            surviving: (0..rows.len()).collect(),
            rows,
            exclusions: vec![],
        }
    }

    #[test]
    fn scales_predicts_and_inverts() {
        let (input, output) = scalers();
        let t = table(&["a", "b"], vec![vec![1.0, 3.0], vec![0.0, 1.0]]);
        let scores = predict(&t, &input, &model(), &output).unwrap();
        // [1, (3-1)/2] -> 2 -> 2*2+10
        assert_relative_eq!(scores[0], 14.0, epsilon = 1e-12);
        assert_relative_eq!(scores[1], 10.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_table_gives_no_scores() {
        let (input, output) = scalers();
        let t = table(&["a"], vec![]);
        assert!(predict(&t, &input, &model(), &output).unwrap().is_empty());
    }

    #[test]
    fn feature_order_must_match() {
        let (input, output) = scalers();
        let t = table(&["b", "a"], vec![vec![1.0, 3.0]]);
        let err = predict(&t, &input, &model(), &output).unwrap_err();
        assert!(matches!(err, QsarError::FeatureMismatch { .. }));

        let t = table(&["a"], vec![vec![1.0]]);
        assert!(matches!(
            predict(&t, &input, &model(), &output),
            Err(QsarError::FeatureMismatch { .. })
        ));
    }

    #[test]
    fn model_width_must_match() {
        let (input, output) = scalers();
        let t = table(&["a", "b"], vec![vec![1.0, 3.0]]);
        let narrow = LinearModel {
            coefficients: vec![1.0],
            intercept: 0.0,
        };
        assert!(matches!(
            predict(&t, &input, &narrow, &output),
            Err(QsarError::ShapeMismatch { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn zip_uses_parent_index() {
        let derivatives = Derivatives {
            structures: Vec::new(),
            texts: vec!["d0".into(), "d1".into(), "d2".into()],
            parent_index: vec![0, 1, 1],
        };
        let mut t = table(&["a"], vec![vec![0.0], vec![0.0]]);
        t.surviving = vec![0, 2];
        let parents = vec!["p0".to_string(), "p1".to_string()];
        let out = zip_predictions(&t, &[1.0, 2.0], &parents, &derivatives).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!((out[1].parent.as_str(), out[1].derivative.as_str()), ("p1", "d2"));
        assert_relative_eq!(out[1].score, 2.0);

        assert!(zip_predictions(&t, &[1.0], &parents, &derivatives).is_err());
    }
}

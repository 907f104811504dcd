//! Model artifacts: standard scalers, the linear regressor and the JSON bundle
//! that ties them together.
//!
//! This module contains:
//! - `StandardScaler`: per-feature `(x - mean) / scale`, with the feature order it was fitted on.
//! - `Regressor` / `LinearModel`: the prediction seam and its built-in implementation.
//! - `ModelBundle`: model plus input and output scalers, loaded from and saved to JSON.
//! - `to_ndarray`: convert row vectors into an `ndarray::Array2<f64>`.
//! - `fit_linear_bundle`: fit both scalers and a `linfa_linear::LinearRegression`.

use std::fs;
use std::path::Path;

use linfa::traits::Fit;
use linfa::Dataset;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::QsarError;

/// Standardisation parameters for a fixed, ordered feature set.
///
/// A `scale` of zero is treated as one, so constant features pass through
/// centred but unscaled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Feature names in the order the scaler was fitted on.
    pub feature_names: Vec<String>,
    /// Per-feature mean.
    pub mean: Vec<f64>,
    /// Per-feature standard deviation.
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit on the columns of `data` (population standard deviation).
    pub fn fit(feature_names: Vec<String>, data: &Array2<f64>) -> Result<Self, QsarError> {
        if feature_names.len() != data.ncols() {
            return Err(QsarError::ShapeMismatch {
                expected: feature_names.len(),
                found: data.ncols(),
            });
        }
        if data.nrows() == 0 {
            return Err(QsarError::Fit("cannot fit a scaler on zero samples".into()));
        }
        let mean = data.mean_axis(Axis(0)).map(|m| m.to_vec()).unwrap_or_default();
        let scale = data.std_axis(Axis(0), 0.0).to_vec();
        Ok(StandardScaler {
            feature_names,
            mean,
            scale,
        })
    }

    /// Number of features.
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn effective_scale(&self) -> Array1<f64> {
        self.scale
            .iter()
            .map(|&s| if s == 0.0 { 1.0 } else { s })
            .collect()
    }

    fn check_width(&self, x: &Array2<f64>) -> Result<(), QsarError> {
        if x.ncols() != self.n_features() {
            return Err(QsarError::ShapeMismatch {
                expected: self.n_features(),
                found: x.ncols(),
            });
        }
        Ok(())
    }

    /// `(x - mean) / scale`, column-wise.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, QsarError> {
        self.check_width(x)?;
        let mean = Array1::from(self.mean.clone());
        Ok((x - &mean) / &self.effective_scale())
    }

    /// `x * scale + mean`, column-wise.
    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, QsarError> {
        self.check_width(x)?;
        let mean = Array1::from(self.mean.clone());
        Ok(x * &self.effective_scale() + &mean)
    }

    fn validate(&self, role: &str) -> Result<(), QsarError> {
        let n = self.mean.len();
        if self.scale.len() != n {
            return Err(QsarError::InvalidModel(format!(
                "{role} scaler has {n} means but {} scales",
                self.scale.len()
            )));
        }
        if !self.feature_names.is_empty() && self.feature_names.len() != n {
            return Err(QsarError::InvalidModel(format!(
                "{role} scaler names {} features but has {n} means",
                self.feature_names.len()
            )));
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(QsarError::InvalidModel(format!("{role} scaler has a non-finite mean")));
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(QsarError::InvalidModel(format!(
                "{role} scaler has a negative or non-finite scale"
            )));
        }
        Ok(())
    }
}

/// A fitted regression model over scaled features.
pub trait Regressor {
    /// Number of input features the model expects.
    fn n_features(&self) -> usize;

    /// One prediction per row of `x`.
    fn predict(&self, x: &Array2<f64>) -> Array1<f64>;
}

/// `y = x · coefficients + intercept`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    /// One coefficient per feature.
    pub coefficients: Vec<f64>,
    /// Constant term.
    pub intercept: f64,
}

impl Regressor for LinearModel {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        let coefficients = Array1::from(self.coefficients.clone());
        x.dot(&coefficients) + self.intercept
    }
}

/// Model and scalers, serialized together as one JSON artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    /// Regressor over scaled features.
    pub model: LinearModel,
    /// Scaler for the delta features; its names fix the feature order.
    pub input_scaler: StandardScaler,
    /// One-dimensional scaler for the predicted score.
    pub output_scaler: StandardScaler,
}

impl ModelBundle {
    /// Read and validate a bundle from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, QsarError> {
        let path = path.as_ref();
        let artifact = |reason: String| QsarError::ModelArtifact {
            path: path.to_path_buf(),
            reason,
        };
        let text = fs::read_to_string(path).map_err(|e| artifact(e.to_string()))?;
        let bundle: ModelBundle = serde_json::from_str(&text).map_err(|e| artifact(e.to_string()))?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Write the bundle as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), QsarError> {
        let path = path.as_ref();
        let artifact = |reason: String| QsarError::ModelArtifact {
            path: path.to_path_buf(),
            reason,
        };
        let text = serde_json::to_string_pretty(self).map_err(|e| artifact(e.to_string()))?;
        fs::write(path, text).map_err(|e| artifact(e.to_string()))
    }

    /// Check that the three parts agree with each other.
    pub fn validate(&self) -> Result<(), QsarError> {
        self.input_scaler.validate("input")?;
        self.output_scaler.validate("output")?;
        let n = self.input_scaler.n_features();
        if self.input_scaler.feature_names.len() != n || n == 0 {
            return Err(QsarError::InvalidModel(
                "input scaler must name at least one feature".into(),
            ));
        }
        if self.output_scaler.n_features() != 1 {
            return Err(QsarError::InvalidModel(format!(
                "output scaler must be one-dimensional, found {} dimensions",
                self.output_scaler.n_features()
            )));
        }
        if self.model.n_features() != n {
            return Err(QsarError::InvalidModel(format!(
                "model has {} coefficients for {n} features",
                self.model.n_features()
            )));
        }
        if !self.model.intercept.is_finite() || self.model.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(QsarError::InvalidModel("model has non-finite parameters".into()));
        }
        Ok(())
    }

    /// Feature names the input scaler was fitted on, in order.
    pub fn required_features(&self) -> &[String] {
        &self.input_scaler.feature_names
    }

    /// Scores for unscaled feature rows.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, QsarError> {
        scaled_predict(&self.input_scaler, &self.model, &self.output_scaler, x)
    }
}

/// Scale `x`, predict, and map predictions back to the target scale.
pub fn scaled_predict<R: Regressor>(
    input_scaler: &StandardScaler,
    model: &R,
    output_scaler: &StandardScaler,
    x: &Array2<f64>,
) -> Result<Array1<f64>, QsarError> {
    if model.n_features() != input_scaler.n_features() {
        return Err(QsarError::ShapeMismatch {
            expected: input_scaler.n_features(),
            found: model.n_features(),
        });
    }
    let scaled = input_scaler.transform(x)?;
    let raw = model.predict(&scaled).insert_axis(Axis(1));
    let scores = output_scaler.inverse_transform(&raw)?;
    Ok(scores.column(0).to_owned())
}

/// Convert row vectors into an `(n_rows, n_features)` array.
///
/// Every row must have exactly `n_features` values; zero rows give an empty
/// `(0, n_features)` array.
pub fn to_ndarray(rows: &[Vec<f64>], n_features: usize) -> Result<Array2<f64>, QsarError> {
    let mut flat: Vec<f64> = Vec::with_capacity(rows.len() * n_features);
    for row in rows {
        if row.len() != n_features {
            return Err(QsarError::ShapeMismatch {
                expected: n_features,
                found: row.len(),
            });
        }
        flat.extend_from_slice(row);
    }
    Array2::from_shape_vec((rows.len(), n_features), flat).map_err(|e| QsarError::Fit(e.to_string()))
}

/// Fit input and output scalers and an ordinary least squares model on the
/// scaled data.
pub fn fit_linear_bundle(
    feature_names: Vec<String>,
    x: &Array2<f64>,
    y: &Array1<f64>,
) -> Result<ModelBundle, QsarError> {
    if x.nrows() != y.len() {
        return Err(QsarError::ShapeMismatch {
            expected: x.nrows(),
            found: y.len(),
        });
    }
    let input_scaler = StandardScaler::fit(feature_names, x)?;
    let y_column = y.clone().insert_axis(Axis(1));
    let output_scaler = StandardScaler::fit(vec!["score".to_string()], &y_column)?;

    let xs = input_scaler.transform(x)?;
    let ys = output_scaler.transform(&y_column)?.column(0).to_owned();

    let dataset = Dataset::new(xs, ys);
    let fitted = LinearRegression::default()
        .fit(&dataset)
        .map_err(|e| QsarError::Fit(e.to_string()))?;

    let bundle = ModelBundle {
        model: LinearModel {
            coefficients: fitted.params().to_vec(),
            intercept: fitted.intercept(),
        },
        input_scaler,
        output_scaler,
    };
    bundle.validate()?;
    Ok(bundle)
}

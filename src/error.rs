//! Crate-level error type.
//!
//! Every variant here is fatal for a run. Row-level problems (a descriptor that
//! could not be computed, a delta that could not be formed) never surface as a
//! `QsarError`; they are recorded as exclusions by the delta assembler.
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::structure::StructureError;

/// Fatal errors raised while loading inputs, loading the model or scoring.
#[derive(Debug, Error)]
pub enum QsarError {
    /// The input structure file could not be opened or read.
    #[error("cannot read input file {path}: {source}")]
    InputFile {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },

    /// A line of the input could not be parsed as a structure.
    #[error("line {line}: cannot parse structure '{text}': {source}")]
    InvalidStructure {
        /// 1-based line number in the input.
        line: usize,
        /// The offending text.
        text: String,
        /// Parser diagnostic.
        source: StructureError,
    },

    /// The model artifact could not be read or decoded.
    #[error("cannot load model artifact {path}: {reason}")]
    ModelArtifact {
        /// Path of the artifact.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The model bundle decoded but is internally inconsistent.
    #[error("invalid model bundle: {0}")]
    InvalidModel(String),

    /// The delta feature order does not match what the input scaler was fitted on.
    #[error("delta features do not match the scaler schema: expected {expected:?}, found {found:?}")]
    FeatureMismatch {
        /// Feature names in scaler order.
        expected: Vec<String>,
        /// Feature names carried by the delta table.
        found: Vec<String>,
    },

    /// A matrix or vector did not have the width/length the next stage needs.
    #[error("shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch {
        /// Expected length.
        expected: usize,
        /// Observed length.
        found: usize,
    },

    /// Fitting a model bundle failed.
    #[error("model fitting failed: {0}")]
    Fit(String),

    /// Writing predictions failed.
    #[error("failed to write predictions: {0}")]
    Output(#[from] csv::Error),
}

use std::error::Error;
use std::fs;

use approx::assert_relative_eq;
use qsar_delta::descriptors::FEATURE_NAMES;
use qsar_delta::pipeline::{Exclusion, Side};
use qsar_delta::structure::{canonical_smiles, parse_smiles};
use qsar_delta::{
    data_io, default_rules, DescriptorEngine, LinearModel, ModelBundle, Molecule, Pipeline, QsarError,
    RawDescriptors, RawValue, SiteRewriter, Smiles, StandardDescriptors, StandardScaler,
};

fn bundle() -> ModelBundle {
    let features = ["MW", "SLogP", "TopoPSA", "nHBDon"];
    ModelBundle {
        model: LinearModel {
            coefficients: vec![0.5, -1.0, 0.25, 2.0],
            intercept: 0.1,
        },
        input_scaler: StandardScaler {
            feature_names: features.iter().map(|s| s.to_string()).collect(),
            mean: vec![40.0, 0.0, 30.0, 0.0],
            scale: vec![10.0, 1.0, 20.0, 1.0],
        },
        output_scaler: StandardScaler {
            feature_names: vec!["pKd".into()],
            mean: vec![6.0],
            scale: vec![1.5],
        },
    }
}

fn lines(smiles: &[&str]) -> Vec<String> {
    smiles.iter().map(|s| s.to_string()).collect()
}

/// Standard descriptors, except that TopoPSA fails for one structure.
struct FailingTpsa {
    target: String,
}

impl DescriptorEngine for FailingTpsa {
    fn compute(&self, molecule: &Molecule) -> RawDescriptors {
        let mut raw = StandardDescriptors.compute(molecule);
        if canonical_smiles(molecule) == self.target {
            raw.insert("TopoPSA".into(), RawValue::Missing("polar surface unavailable".into()));
        }
        raw
    }
}

#[test]
fn glycine_end_to_end_through_files() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let model_path = dir.path().join("model.json");
    let input_path = dir.path().join("parents.smi");
    bundle().save(&model_path)?;
    fs::write(&input_path, "NCC(=O)O\n")?;

    let loaded = ModelBundle::load(&model_path)?;
    assert_eq!(loaded, bundle());

    let inputs = data_io::read_structure_lines(&input_path)?;
    let report = Pipeline::standard(loaded).run(&inputs)?;
    assert_eq!(report.predictions.len(), 1);

    let result = &report.predictions[0];
    assert_eq!(result.parent, canonical_smiles(&parse_smiles("NCC(=O)O")?));
    let expected = canonical_smiles(&parse_smiles("OC(=O)CNC(=O)O")?);
    assert_eq!(result.derivative, expected);
    assert!(result.score.is_finite());

    let mut out = Vec::new();
    data_io::write_predictions(&mut out, &report.predictions)?;
    let text = String::from_utf8(out)?;
    assert_eq!(text.lines().count(), 1);
    let fields: Vec<&str> = text.trim_end().split(',').collect();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[1], expected);
    assert_eq!(fields[2].split('.').nth(1).map(str::len), Some(6));
    Ok(())
}

#[test]
fn no_matching_site_gives_no_output() -> Result<(), Box<dyn Error>> {
    let report = Pipeline::standard(bundle()).run(&lines(&["c1ccccc1"]))?;
    assert_eq!(report.generated, 0);
    assert!(report.predictions.is_empty());

    let mut out = Vec::new();
    data_io::write_predictions(&mut out, &report.predictions)?;
    assert!(out.is_empty());
    Ok(())
}

#[test]
fn unparsable_line_aborts_the_run() {
    let err = Pipeline::standard(bundle())
        .run(&lines(&["NCC(=O)O", "C(C", "CCN"]))
        .unwrap_err();
    assert!(matches!(err, QsarError::InvalidStructure { line: 2, .. }));
}

#[test]
fn blank_line_is_a_parse_error() {
    let inputs = data_io::read_structure_lines_from_reader("CCN\n\nNCC\n".as_bytes()).unwrap();
    let err = Pipeline::standard(bundle()).run(&inputs).unwrap_err();
    assert!(matches!(err, QsarError::InvalidStructure { line: 2, .. }));
}

#[test]
fn missing_model_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = ModelBundle::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, QsarError::ModelArtifact { .. }));
}

#[test]
fn descriptor_failure_excludes_only_that_derivative() -> Result<(), Box<dyn Error>> {
    let secondary_product = canonical_smiles(&parse_smiles("NCCCN(C)C(=O)O")?);
    let primary_product = canonical_smiles(&parse_smiles("OC(=O)NCCCNC")?);

    let engine = FailingTpsa {
        target: secondary_product.clone(),
    };
    let pipeline = Pipeline::new(Smiles, SiteRewriter, engine, default_rules(), bundle()).with_parallel(false);
    let report = pipeline.run(&lines(&["NCCCNC", "NCC(=O)O"]))?;

    assert_eq!(report.generated, 3);
    assert_eq!(report.exclusions.len(), 1);
    assert_eq!(
        report.exclusions[0].1,
        Exclusion::Unavailable {
            feature: "TopoPSA".into(),
            side: Side::Derivative,
        }
    );

    let derivatives: Vec<&str> = report.predictions.iter().map(|p| p.derivative.as_str()).collect();
    assert_eq!(report.predictions.len(), 2);
    assert!(derivatives.contains(&primary_product.as_str()));
    assert!(!derivatives.contains(&secondary_product.as_str()));
    Ok(())
}

#[test]
fn parent_texts_are_consistent() -> Result<(), Box<dyn Error>> {
    let inputs = lines(&["C1CCNCC1", "NCCN", "c1ccc2[nH]ccc2c1", "CCO"]);
    let report = Pipeline::standard(bundle()).run(&inputs)?;
    let parents: Vec<String> = inputs
        .iter()
        .map(|s| parse_smiles(s).map(|m| canonical_smiles(&m)))
        .collect::<Result<_, _>>()?;

    assert!(report.predictions.len() <= report.generated);
    for p in &report.predictions {
        assert!(parents.contains(&p.parent));
        assert_ne!(p.parent, p.derivative);
    }
    // piperidine, ethylenediamine (one unique product), indole
    assert_eq!(report.generated, 3);
    Ok(())
}

#[test]
fn serial_and_parallel_runs_agree() -> Result<(), Box<dyn Error>> {
    let inputs = lines(&["NCCCNC", "C1CCNCC1", "NCC(=O)O"]);
    let serial = Pipeline::standard(bundle()).with_parallel(false).run(&inputs)?;
    let parallel = Pipeline::standard(bundle()).with_parallel(true).run(&inputs)?;
    assert_eq!(serial, parallel);
    Ok(())
}

#[test]
fn fitted_bundle_drives_the_pipeline() -> Result<(), Box<dyn Error>> {
    let names: Vec<String> = ["MW", "nHBDon"].iter().map(|s| s.to_string()).collect();
    let x = ndarray::array![[10.0, 0.0], [20.0, 1.0], [30.0, 0.0], [40.0, 2.0]];
    let y = ndarray::array![1.0, 3.0, 3.0, 6.0];
    let bundle = qsar_delta::fit_linear_bundle(names, &x, &y)?;

    let scores = bundle.predict(&x)?;
    for (s, t) in scores.iter().zip(y.iter()) {
        assert_relative_eq!(*s, *t, epsilon = 1e-6);
    }
    assert!(FEATURE_NAMES.contains(&"MW"));

    let report = Pipeline::standard(bundle).run(&lines(&["NCC(=O)O"]))?;
    assert_eq!(report.predictions.len(), 1);
    Ok(())
}

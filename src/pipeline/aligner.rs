//! Descriptor computation and column alignment.
//!
//! Availability is tracked at two levels. A feature the engine does not report
//! for some row is dropped as a column. A feature that is reported but whose
//! value is missing or not numeric stays as a column and is marked unavailable
//! for that row; the delta assembler decides what to do with it.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::descriptors::{DescriptorEngine, RawDescriptors, RawValue};
use crate::structure::Molecule;

/// Numeric value of a raw descriptor, `None` when unavailable.
pub fn coerce(value: &RawValue) -> Option<f64> {
    match value {
        RawValue::Number(v) if v.is_finite() => Some(*v),
        RawValue::Number(_) => None,
        RawValue::Flag(b) => Some(if *b { 1.0 } else { 0.0 }),
        RawValue::Text(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        RawValue::Missing(_) => None,
    }
}

/// The ordered feature set shared by descriptor tables, delta rows and the
/// scoring stage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    /// Schema with the given feature order.
    pub fn new(names: Vec<String>) -> Self {
        FeatureSchema { names }
    }

    /// Feature names in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the schema has no features.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Numeric descriptors, one row per structure; `None` marks an unavailable value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DescriptorTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

impl DescriptorTable {
    /// Build a table from raw engine output.
    ///
    /// Columns are the `required` features, in that order, that every row
    /// reports. With no rows every required feature is kept.
    pub fn from_raw(required: &[String], raw: &[RawDescriptors]) -> Self {
        let columns: Vec<String> = required
            .iter()
            .filter(|name| raw.iter().all(|row| row.contains_key(name.as_str())))
            .cloned()
            .collect();
        let rows = raw
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|name| row.get(name.as_str()).and_then(coerce))
                    .collect()
            })
            .collect();
        DescriptorTable { columns, rows }
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows.
    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.rows
    }

    /// Row `idx`, if it exists.
    pub fn row(&self, idx: usize) -> Option<&[Option<f64>]> {
        self.rows.get(idx).map(Vec::as_slice)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Project onto `schema`. Schema features missing from the table come out
    /// unavailable.
    pub fn select(&self, schema: &FeatureSchema) -> Self {
        let positions: Vec<Option<usize>> = schema
            .names()
            .iter()
            .map(|name| self.columns.iter().position(|c| c == name))
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| positions.iter().map(|p| p.and_then(|i| row[i])).collect())
            .collect();
        DescriptorTable {
            columns: schema.names().to_vec(),
            rows,
        }
    }
}

/// Parent and derivative tables restricted to one shared schema.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedDescriptors {
    /// Features common to both tables, in required order.
    pub schema: FeatureSchema,
    /// One row per parent.
    pub parents: DescriptorTable,
    /// One row per derivative.
    pub derivatives: DescriptorTable,
}

/// Run the engine over a batch, preserving input order.
pub fn describe<D: DescriptorEngine>(engine: &D, molecules: &[Molecule], parallel: bool) -> Vec<RawDescriptors> {
    if parallel {
        molecules.par_iter().map(|m| engine.compute(m)).collect()
    } else {
        molecules.iter().map(|m| engine.compute(m)).collect()
    }
}

/// Intersect the columns of both raw batches with `required`.
pub fn align(required: &[String], parents: &[RawDescriptors], derivatives: &[RawDescriptors]) -> AlignedDescriptors {
    let parent_table = DescriptorTable::from_raw(required, parents);
    let derivative_table = DescriptorTable::from_raw(required, derivatives);

    let schema = FeatureSchema::new(
        parent_table
            .columns()
            .iter()
            .filter(|name| derivative_table.columns().contains(*name))
            .cloned()
            .collect(),
    );
    let dropped: Vec<&String> = required.iter().filter(|name| !schema.names().contains(*name)).collect();
    if !dropped.is_empty() {
        debug!(?dropped, "features not reported for every structure");
    }

    AlignedDescriptors {
        parents: parent_table.select(&schema),
        derivatives: derivative_table.select(&schema),
        schema,
    }
}

/// Describe parents and derivatives, then align them on `required`.
pub fn describe_and_align<D: DescriptorEngine>(
    engine: &D,
    required: &[String],
    parents: &[Molecule],
    derivatives: &[Molecule],
    parallel: bool,
) -> AlignedDescriptors {
    let parent_raw = describe(engine, parents, parallel);
    let derivative_raw = describe(engine, derivatives, parallel);
    let aligned = align(required, &parent_raw, &derivative_raw);
    info!(
        features = aligned.schema.len(),
        required = required.len(),
        parallel,
        "descriptors aligned"
    );
    aligned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, RawValue)]) -> RawDescriptors {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn coercion_rules() {
        assert_eq!(coerce(&RawValue::Number(2.5)), Some(2.5));
        assert_eq!(coerce(&RawValue::Number(f64::NAN)), None);
        assert_eq!(coerce(&RawValue::Number(f64::INFINITY)), None);
        assert_eq!(coerce(&RawValue::Flag(true)), Some(1.0));
        assert_eq!(coerce(&RawValue::Flag(false)), Some(0.0));
        assert_eq!(coerce(&RawValue::Text(" 3.25 ".into())), Some(3.25));
        assert_eq!(coerce(&RawValue::Text("n/a".into())), None);
        assert_eq!(coerce(&RawValue::Missing("boom".into())), None);
    }

    #[test]
    fn columns_follow_required_order() {
        let rows = vec![raw(&[("b", RawValue::Number(2.0)), ("a", RawValue::Number(1.0))])];
        let table = DescriptorTable::from_raw(&names(&["a", "b", "c"]), &rows);
        assert_eq!(table.columns(), &names(&["a", "b"])[..]);
        assert_eq!(table.row(0), Some(&[Some(1.0), Some(2.0)][..]));
    }

    #[test]
    fn unreported_feature_leaves_the_schema() {
        let parents = vec![raw(&[("a", RawValue::Number(1.0)), ("b", RawValue::Number(2.0))])];
        let derivatives = vec![
            raw(&[("a", RawValue::Number(1.5)), ("b", RawValue::Number(2.5))]),
            raw(&[("a", RawValue::Number(1.7))]),
        ];
        let aligned = align(&names(&["a", "b"]), &parents, &derivatives);
        assert_eq!(aligned.schema.names(), &names(&["a"])[..]);
        assert_eq!(aligned.parents.columns(), aligned.schema.names());
        assert_eq!(aligned.derivatives.len(), 2);
    }

    #[test]
    fn missing_value_keeps_the_column() {
        let parents = vec![raw(&[("a", RawValue::Number(1.0)), ("b", RawValue::Number(2.0))])];
        let derivatives = vec![raw(&[("a", RawValue::Missing("x".into())), ("b", RawValue::Flag(true))])];
        let aligned = align(&names(&["a", "b"]), &parents, &derivatives);
        assert_eq!(aligned.schema.len(), 2);
        assert_eq!(aligned.derivatives.row(0), Some(&[None, Some(1.0)][..]));
    }

    #[test]
    fn removing_a_feature_only_shrinks_the_schema() {
        let full = vec![raw(&[
            ("a", RawValue::Number(1.0)),
            ("b", RawValue::Number(2.0)),
            ("c", RawValue::Number(3.0)),
        ])];
        let mut partial = full.clone();
        partial[0].shift_remove("b");

        let required = names(&["a", "b", "c"]);
        let before = align(&required, &full, &full);
        let after = align(&required, &full, &partial);
        assert!(after.schema.names().iter().all(|n| before.schema.names().contains(n)));
        assert_eq!(after.schema.names(), &names(&["a", "c"])[..]);
    }

    #[test]
    fn parallel_and_serial_agree() {
        use crate::descriptors::StandardDescriptors;
        use crate::structure::parse_smiles;

        let molecules: Vec<Molecule> = ["CCO", "NCC(=O)O", "c1ccccc1", "C1CCNCC1"]
            .iter()
            .map(|s| parse_smiles(s).unwrap())
            .collect();
        assert_eq!(
            describe(&StandardDescriptors, &molecules, true),
            describe(&StandardDescriptors, &molecules, false)
        );
    }
}

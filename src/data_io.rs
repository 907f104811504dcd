//! Input and output helpers.
//!
//! Inputs are plain text, one SMILES per line. Predictions go out as header-less
//! CSV rows `parent,derivative,score` with six decimal places.
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use crate::error::QsarError;
use crate::pipeline::PredictionResult;

/// Read structure lines from a file.
///
/// Line terminators (`\n`, `\r\n`) are stripped; no other trimming happens and
/// blank lines are kept so the parser can reject them with a line number.
///
/// ```no_run
/// use qsar_delta::data_io::read_structure_lines;
/// let lines = read_structure_lines("inputs.smi")?;
/// # Ok::<(), qsar_delta::QsarError>(())
/// ```
pub fn read_structure_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>, QsarError> {
    let path = path.as_ref();
    let input_error = |source: io::Error| QsarError::InputFile {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(input_error)?;
    read_structure_lines_from_reader(BufReader::new(file)).map_err(input_error)
}

/// Convenience: read structure lines from any buffered reader (useful for tests and in-memory data).
pub fn read_structure_lines_from_reader(reader: impl BufRead) -> io::Result<Vec<String>> {
    reader.lines().collect()
}

/// Write one CSV row per prediction.
pub fn write_predictions<W: Write>(writer: W, results: &[PredictionResult]) -> Result<(), QsarError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    for result in results {
        let score = format!("{:.6}", result.score);
        wtr.write_record([result.parent.as_str(), result.derivative.as_str(), score.as_str()])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

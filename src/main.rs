use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use qsar_delta::{data_io, ModelBundle, Pipeline, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "qsar-delta")]
#[command(about = "Score CO2-adduct derivatives of parent structures with a delta-descriptor model", long_about = None)]
struct Cli {
    /// Text file with one parent SMILES per line
    input: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries predictions only
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("qsar_delta=info,warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = PipelineConfig::from_env();
    info!(model = %config.model_path.display(), parallel = config.parallel, "starting run");

    let bundle = ModelBundle::load(&config.model_path)
        .with_context(|| format!("loading model bundle {}", config.model_path.display()))?;
    let lines = data_io::read_structure_lines(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;

    let report = Pipeline::standard(bundle)
        .with_parallel(config.parallel)
        .run(&lines)
        .context("pipeline run failed")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    data_io::write_predictions(&mut out, &report.predictions).context("writing predictions")?;
    out.flush().context("flushing stdout")?;

    info!(
        parents = lines.len(),
        generated = report.generated,
        scored = report.predictions.len(),
        excluded = report.exclusions.len(),
        "run complete"
    );
    Ok(())
}

use cowichan_chain::options::{Backend, ChainCli};
use cowichan_chain::printer::print_report;
use cowichan_chain::record::RunRecord;
use cowichan_chain::{launch_local, run_chain, ChainError, ChainRun, WorkerGroup};

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn run(cli: &ChainCli) -> Result<Vec<ChainRun>, ChainError> {
    match cli.backend {
        Backend::Local => launch_local(cli.num_pes, |group| run_chain(group, || cli.intake())),
        Backend::Lamellar => {
            let group = lamellar_group()?;
            let _span = tracing::info_span!("pe", pe = group.my_pe()).entered();
            Ok(vec![run_chain(&group, || cli.intake())?])
        }
    }
}

#[cfg(feature = "lamellar")]
fn lamellar_group() -> Result<WorkerGroup, ChainError> {
    WorkerGroup::lamellar()
}

#[cfg(not(feature = "lamellar"))]
fn lamellar_group() -> Result<WorkerGroup, ChainError> {
    Err(ChainError::configuration(
        "the lamellar backend requires building with `--features lamellar`",
    ))
}

fn report(cli: &ChainCli, run: &ChainRun) {
    cli.describe(&run.params, run.num_pes);
    for (stage, secs) in run.stages.named() {
        tracing::info!("{stage}: {:.9}", secs.as_secs_f64());
    }
    print_report(
        run.my_pe,
        &run.params,
        run.num_pes,
        run.elapsed,
        cli.is_bench,
        run.result.as_deref(),
    );
    if let Some(dir) = &cli.record {
        let mut record = RunRecord::new();
        record.with_run(run);
        let path = record.default_output_path(dir);
        if let Err(e) = record.write(&path) {
            tracing::warn!("unable to write run record {}: {e}", path.display());
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = ChainCli::parse();
    match run(&cli) {
        Ok(runs) => {
            if let Some(root) = runs.iter().find(|run| run.my_pe == 0) {
                report(&cli, root);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("chain: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

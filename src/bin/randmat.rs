use cowichan_chain::collective::collect;
use cowichan_chain::options::{Backend, RandmatCli};
use cowichan_chain::randmat::{format_rows, randmat};
use cowichan_chain::{launch_local, ChainError, WorkerGroup, ROOT_PE};

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Generate the matrix and gather it on the root PE, which gets `Some(cells)`.
fn generate(group: &WorkerGroup, cli: &RandmatCli) -> Result<Option<Vec<u32>>, ChainError> {
    let (nrows, ncols) = (cli.nrows as usize, cli.ncols as usize);
    let matrix = randmat(group, nrows, ncols, cli.seed);
    let mut cells = vec![0u32; if group.is_root() { nrows * ncols } else { 0 }];
    collect(group, &matrix, &mut cells, ROOT_PE)?;
    Ok(group.is_root().then_some(cells))
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

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = RandmatCli::parse();
    let gathered = match cli.backend {
        Backend::Local => launch_local(cli.num_pes, |group| generate(group, &cli)),
        Backend::Lamellar => {
            lamellar_group().and_then(|group| generate(&group, &cli).map(|cells| vec![cells]))
        }
    };
    match gathered {
        Ok(gathered) => {
            if let Some(cells) = gathered.into_iter().flatten().next() {
                print!("{}", format_rows(&cells, cli.ncols as usize));
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("randmat: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

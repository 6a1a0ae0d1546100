use crate::error::ChainError;
use crate::params::PipelineParameters;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// every pe is a thread of this process
    Local,
    /// one pe per process, launched through the lamellar runtime
    Lamellar,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "randmat -> thresh -> winnow -> outer -> product", long_about = None)]
pub struct ChainCli {
    /// rows and columns of the generated matrix
    #[arg(short = 'n', long)]
    pub nelts: Option<u32>,

    /// seed of the row generators
    #[arg(short = 's', long)]
    pub seed: Option<u32>,

    /// percentage of the value range kept by the threshold
    #[arg(short = 't', long)]
    pub thresh: Option<u32>,

    /// number of cells selected by winnowing
    #[arg(short = 'w', long)]
    pub winnow_nelts: Option<u32>,

    /// read `nelts seed thresh winnow_nelts` from stdin on pe 0
    #[arg(long, conflicts_with_all = ["nelts", "seed", "thresh", "winnow_nelts"])]
    pub stdin: bool,

    /// only print the timing line
    #[arg(long = "is_bench")]
    pub is_bench: bool,

    /// number of thread pes for the local backend
    #[arg(short = 'p', long, env = "CHAIN_NUM_PES", default_value_t = 1)]
    pub num_pes: usize,

    #[arg(short, long, value_enum, default_value_t = Backend::Local)]
    pub backend: Backend,

    /// append a JSON run record to a file in this directory
    #[arg(long, value_name = "DIR")]
    pub record: Option<PathBuf>,
}

impl ChainCli {
    /// Obtain the parameters. Only the root PE calls this.
    pub fn intake(&self) -> Result<PipelineParameters, ChainError> {
        if self.stdin {
            let input = std::io::read_to_string(std::io::stdin())
                .map_err(|e| ChainError::configuration(format!("unable to read stdin: {e}")))?;
            return PipelineParameters::parse(&input);
        }
        let defaults = PipelineParameters::default();
        Ok(PipelineParameters {
            nelts: self.nelts.unwrap_or(defaults.nelts),
            seed: self.seed.unwrap_or(defaults.seed),
            thresh_percent: self.thresh.unwrap_or(defaults.thresh_percent),
            winnow_nelts: self.winnow_nelts.unwrap_or(defaults.winnow_nelts),
        })
    }

    pub fn describe(&self, params: &PipelineParameters, num_pes: usize) {
        tracing::info!("backend: {:?}", self.backend);
        tracing::info!("num pes: {num_pes}");
        tracing::info!("matrix: {0}x{0}", params.nelts);
        tracing::info!("seed: {}", params.seed);
        tracing::info!("thresh percent: {}", params.thresh_percent);
        tracing::info!("winnow nelts: {}", params.winnow_nelts);
        tracing::info!("bench: {}", self.is_bench);
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "print the Cowichan random matrix", long_about = None)]
pub struct RandmatCli {
    pub nrows: u32,

    pub ncols: u32,

    pub seed: u32,

    /// number of thread pes for the local backend
    #[arg(short = 'p', long, env = "CHAIN_NUM_PES", default_value_t = 1)]
    pub num_pes: usize,

    #[arg(short, long, value_enum, default_value_t = Backend::Local)]
    pub backend: Backend,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = ChainCli::try_parse_from(["chain", "-n", "4", "--thresh", "50", "--is_bench"]).unwrap();
        let params = cli.intake().unwrap();
        assert_eq!(
            params,
            PipelineParameters {
                nelts: 4,
                seed: 2,
                thresh_percent: 50,
                winnow_nelts: 100
            }
        );
        assert!(cli.is_bench);
        assert_eq!(cli.backend, Backend::Local);
    }

    #[test]
    fn test_stdin_conflicts_with_flags() {
        assert!(ChainCli::try_parse_from(["chain", "--stdin", "-n", "4"]).is_err());
    }

    #[test]
    fn test_randmat_needs_three_positionals() {
        assert!(RandmatCli::try_parse_from(["randmat", "4", "4"]).is_err());
        assert!(RandmatCli::try_parse_from(["randmat", "4", "4", "1", "9"]).is_err());
        let cli = RandmatCli::try_parse_from(["randmat", "3", "5", "7"]).unwrap();
        assert_eq!((cli.nrows, cli.ncols, cli.seed), (3, 5, 7));
    }

    #[test]
    fn test_usage_errors_exit_with_two() {
        let err = RandmatCli::try_parse_from(["randmat"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}

//! The chain: parameters -> randmat -> thresh -> winnow -> outer -> product.
//!
//! Every PE runs [`run_chain`] with its own [`WorkerGroup`]. The stages
//! alternate between row-partitioned data, a replicated selection and a
//! block-partitioned result; a barrier separates the stages whose output is
//! consumed under a different partitioning.

use crate::collective::collect;
use crate::error::ChainError;
use crate::group::{WorkerGroup, ROOT_PE};
use crate::kernels::{outer, product};
use crate::params::PipelineParameters;
use crate::randmat::randmat;
use crate::thresh::thresh;
use crate::winnow::select;

use std::time::{Duration, Instant};

/// Monotonic stopwatch whose readings fail instead of going backwards.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    pub fn start() -> Stopwatch {
        Stopwatch {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Result<Duration, ChainError> {
        Instant::now()
            .checked_duration_since(self.start)
            .ok_or_else(|| ChainError::TimingFacility("monotonic clock went backwards".into()))
    }

    /// Elapsed time since the last lap (or start), then restart.
    pub fn lap(&mut self) -> Result<Duration, ChainError> {
        let elapsed = self.elapsed()?;
        self.start = Instant::now();
        Ok(elapsed)
    }
}

/// Per-stage durations as seen by one PE.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageTimes {
    pub randmat: Duration,
    pub thresh: Duration,
    pub winnow: Duration,
    pub outer: Duration,
    pub product: Duration,
}

impl StageTimes {
    pub fn named(&self) -> [(&'static str, Duration); 5] {
        [
            ("randmat", self.randmat),
            ("thresh", self.thresh),
            ("winnow", self.winnow),
            ("outer", self.outer),
            ("product", self.product),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct ChainRun {
    pub params: PipelineParameters,
    pub my_pe: usize,
    pub num_pes: usize,
    /// time between the first and the last barrier of the stage sequence
    pub elapsed: Duration,
    pub stages: StageTimes,
    /// the replicated selection, identical on every PE
    pub selection: Vec<u32>,
    /// the product result; only present on the root PE
    pub result: Option<Vec<f64>>,
}

/// Run the whole chain on this PE. Every PE of the group must call this.
///
/// `intake` is only invoked on the root PE.
pub fn run_chain<F>(group: &WorkerGroup, intake: F) -> Result<ChainRun, ChainError>
where
    F: FnOnce() -> Result<PipelineParameters, ChainError>,
{
    let params = PipelineParameters::replicate(group, intake)?;
    let nelts = params.nelts as usize;
    let winnow_nelts = params.winnow_nelts as usize;
    let mut stages = StageTimes::default();

    group.barrier()?;
    let timer = Stopwatch::start();
    let mut lap = Stopwatch::start();

    let matrix = randmat(group, nelts, nelts, params.seed);
    stages.randmat = lap.lap()?;
    tracing::debug!("randmat: {:?}", stages.randmat);

    let mask = thresh(&matrix, params.thresh_percent);
    stages.thresh = lap.lap()?;
    tracing::debug!("thresh: {:?}", stages.thresh);
    group.barrier()?;

    let selection = select(group, &matrix, &mask, winnow_nelts)?;
    drop(mask);
    drop(matrix);
    group.barrier()?;
    stages.winnow = lap.lap()?;
    tracing::debug!("winnow: {:?}", stages.winnow);

    let outer = outer(&selection);
    stages.outer = lap.lap()?;
    tracing::debug!("outer: {:?}", stages.outer);

    let product = product(group, &outer)?;
    let mut result = vec![0.0; if group.is_root() { winnow_nelts } else { 0 }];
    collect(group, &product, &mut result, ROOT_PE)?;
    stages.product = lap.lap()?;
    tracing::debug!("product: {:?}", stages.product);

    group.barrier()?;
    let elapsed = timer.elapsed()?;

    Ok(ChainRun {
        params,
        my_pe: group.my_pe(),
        num_pes: group.num_pes(),
        elapsed,
        stages,
        selection,
        result: group.is_root().then_some(result),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::launch_local;

    #[test]
    fn test_stopwatch_laps_are_monotonic() {
        let mut watch = Stopwatch::start();
        let first = watch.elapsed().unwrap();
        let second = watch.elapsed().unwrap();
        assert!(second >= first);
        let lap = watch.lap().unwrap();
        assert!(lap >= second);
    }

    #[test]
    fn test_only_root_holds_the_result() {
        let params = PipelineParameters {
            nelts: 6,
            seed: 1,
            thresh_percent: 100,
            winnow_nelts: 5,
        };
        let runs = launch_local(3, |group| run_chain(group, || Ok(params))).unwrap();
        assert_eq!(runs[0].result.as_ref().map(Vec::len), Some(5));
        assert!(runs[1..].iter().all(|run| run.result.is_none()));
        assert!(runs.iter().all(|run| run.num_pes == 3 && run.params == params));
    }

    #[test]
    fn test_insufficient_selection_aborts_the_run() {
        let params = PipelineParameters {
            nelts: 4,
            seed: 2,
            thresh_percent: 10,
            winnow_nelts: 3,
        };
        let err = launch_local(2, |group| run_chain(group, || Ok(params))).unwrap_err();
        assert_eq!(
            err,
            ChainError::InsufficientSelection {
                requested: 3,
                available: 2
            }
        );
    }
}

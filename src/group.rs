//! The worker group every component receives explicitly.

use crate::error::ChainError;
use crate::transport::local::LocalTransport;
use crate::transport::Transport;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Rank that reads the parameters and reports the result.
pub const ROOT_PE: usize = 0;

/// One PE's view of the group: its rank, the group size, and the transport
/// used for collectives. Cheap to clone.
#[derive(Clone)]
pub struct WorkerGroup {
    my_pe: usize,
    num_pes: usize,
    transport: Arc<dyn Transport>,
}

impl WorkerGroup {
    pub fn new(transport: Arc<dyn Transport>) -> WorkerGroup {
        WorkerGroup {
            my_pe: transport.my_pe(),
            num_pes: transport.num_pes(),
            transport,
        }
    }

    /// Join the lamellar world of this process launch.
    #[cfg(feature = "lamellar")]
    pub fn lamellar() -> Result<WorkerGroup, ChainError> {
        let transport = crate::transport::lamellar::LamellarTransport::new()?;
        Ok(WorkerGroup::new(Arc::new(transport)))
    }

    pub fn my_pe(&self) -> usize {
        self.my_pe
    }

    pub fn num_pes(&self) -> usize {
        self.num_pes
    }

    pub fn is_root(&self) -> bool {
        self.my_pe == ROOT_PE
    }

    pub fn barrier(&self) -> Result<(), ChainError> {
        self.transport.barrier()
    }

    pub(crate) fn exchange(&self, outgoing: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, ChainError> {
        self.transport.exchange(outgoing)
    }

    pub(crate) fn abandon(&self) {
        self.transport.abandon()
    }
}

impl std::fmt::Debug for WorkerGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerGroup")
            .field("my_pe", &self.my_pe)
            .field("num_pes", &self.num_pes)
            .finish()
    }
}

/// Run `f` on `num_pes` thread-workers sharing one in-process transport.
///
/// Returns every PE's value in rank order, or the error of the lowest rank
/// that failed. A PE that fails or panics closes the group so peers blocked in a
/// collective return a transport error instead of waiting forever.
pub fn launch_local<T, F>(num_pes: usize, f: F) -> Result<Vec<T>, ChainError>
where
    T: Send,
    F: Fn(&WorkerGroup) -> Result<T, ChainError> + Sync,
{
    if num_pes == 0 {
        return Err(ChainError::configuration("the worker group needs at least one pe"));
    }
    let groups = LocalTransport::group(num_pes)
        .into_iter()
        .map(|t| WorkerGroup::new(Arc::new(t)))
        .collect::<Vec<_>>();

    let results = std::thread::scope(|scope| {
        let handles = groups
            .iter()
            .map(|group| {
                let f = &f;
                scope.spawn(move || {
                    let span = tracing::info_span!("pe", pe = group.my_pe());
                    let _enter = span.enter();
                    match std::panic::catch_unwind(AssertUnwindSafe(|| f(group))) {
                        Ok(Err(e)) => {
                            tracing::debug!("leaving group: {e}");
                            group.abandon();
                            Err(e)
                        }
                        Ok(result) => result,
                        Err(panic) => {
                            group.abandon();
                            std::panic::resume_unwind(panic)
                        }
                    }
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect::<Vec<_>>()
    });
    results.into_iter().collect()
}

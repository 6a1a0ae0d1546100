//! Cowichan "chain" pipeline over an explicit SPMD worker group.
//!
//! A [`WorkerGroup`] is handed to every stage; there is no process-global
//! runtime state. The group talks through a [`transport::Transport`], either
//! threads of this process or, with the `lamellar` feature, a lamellar world.

pub mod array;
pub mod collective;
pub mod distribution;
pub mod error;
pub mod group;
pub mod kernels;
pub mod options;
pub mod params;
pub mod pipeline;
pub mod printer;
pub mod randmat;
pub mod record;
pub mod thresh;
pub mod transport;
pub mod winnow;

pub use array::{DistributedMask, DistributedMatrix, DistributedVector, Partitioned};
pub use error::ChainError;
pub use group::{launch_local, WorkerGroup, ROOT_PE};
pub use params::PipelineParameters;
pub use pipeline::{run_chain, ChainRun};

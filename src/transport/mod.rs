//! Point of contact between the chain and whatever moves bytes between PEs.
//!
//! A transport only has to provide a barrier and a personalized all-to-all
//! byte exchange; every typed collective in [`crate::collective`] is built
//! on those two calls, so every backend gets the same size checks.

pub mod local;

#[cfg(feature = "lamellar")]
pub mod lamellar;

use crate::error::ChainError;

pub trait Transport: Send + Sync {
    fn my_pe(&self) -> usize;

    fn num_pes(&self) -> usize;

    /// Blocks until every PE of the group has entered the barrier.
    fn barrier(&self) -> Result<(), ChainError>;

    /// Personalized all-to-all. `outgoing[pe]` is delivered to `pe`; the
    /// returned vector holds, for every source PE, the bytes it sent to us.
    /// Every PE must call this, and no PE returns before all have called it.
    fn exchange(&self, outgoing: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, ChainError>;

    /// Called when this PE leaves the group early with an error.
    fn abandon(&self) {}
}

pub(crate) fn check_outgoing(outgoing: &[Vec<u8>], num_pes: usize) -> Result<(), ChainError> {
    if outgoing.len() != num_pes {
        return Err(ChainError::transport(format!(
            "exchange needs one message per pe: got {} for {} pes",
            outgoing.len(),
            num_pes
        )));
    }
    Ok(())
}

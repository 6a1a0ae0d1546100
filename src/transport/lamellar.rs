//! Multi-process transport on the lamellar runtime: one PE per process.
//!
//! Messages travel as active messages into a per-PE inbox; a `wait_all`
//! followed by a world barrier marks the end of the delivery phase.

use super::{check_outgoing, Transport};
use crate::error::ChainError;

use lamellar::active_messaging::prelude::*;
use lamellar::darc::prelude::*;

#[lamellar::AmData]
struct DeliverAm {
    inbox: LocalRwDarc<Vec<Vec<u8>>>,
    src: usize,
    data: Vec<u8>,
}

#[lamellar::am]
impl LamellarAM for DeliverAm {
    async fn exec(self) {
        self.inbox.write().await[self.src] = self.data.clone();
    }
}

pub struct LamellarTransport {
    world: LamellarWorld,
    my_pe: usize,
    num_pes: usize,
    inbox: LocalRwDarc<Vec<Vec<u8>>>,
}

impl LamellarTransport {
    /// Collective: every PE of the launch must call this.
    pub fn new() -> Result<LamellarTransport, ChainError> {
        let world = lamellar::LamellarWorldBuilder::new().build();
        let my_pe = world.my_pe();
        let num_pes = world.num_pes();
        let inbox = LocalRwDarc::new(&world, vec![Vec::new(); num_pes])
            .map_err(|e| ChainError::transport(format!("unable to create inbox darc: {e:?}")))?;
        world.barrier();
        Ok(LamellarTransport {
            world,
            my_pe,
            num_pes,
            inbox,
        })
    }
}

impl Transport for LamellarTransport {
    fn my_pe(&self) -> usize {
        self.my_pe
    }

    fn num_pes(&self) -> usize {
        self.num_pes
    }

    fn barrier(&self) -> Result<(), ChainError> {
        self.world.barrier();
        Ok(())
    }

    fn exchange(&self, outgoing: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, ChainError> {
        check_outgoing(&outgoing, self.num_pes)?;
        for (pe, data) in outgoing.into_iter().enumerate() {
            let _ = self.world.exec_am_pe(
                pe,
                DeliverAm {
                    inbox: self.inbox.clone(),
                    src: self.my_pe,
                    data,
                },
            );
        }
        self.world.wait_all();
        self.world.barrier();

        let incoming = {
            let mut inbox = self.world.block_on(self.inbox.write());
            std::mem::replace(&mut *inbox, vec![Vec::new(); self.num_pes])
        };
        // nobody may deliver the next round before everyone drained this one
        self.world.barrier();
        Ok(incoming)
    }
}

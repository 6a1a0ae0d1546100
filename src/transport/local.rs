//! In-process transport: every PE is a thread and all PEs share one rendezvous.

use super::{check_outgoing, Transport};
use crate::error::ChainError;

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

struct RoundState {
    arrived: usize,
    departed: usize,
    // set once every PE has deposited its messages for the current round
    ready: bool,
    // first PE that left the group early
    closed: Option<usize>,
    // mailboxes[dst][src]
    mailboxes: Vec<Vec<Vec<u8>>>,
}

struct Rendezvous {
    num_pes: usize,
    state: Mutex<RoundState>,
    round_cv: Condvar,
}

impl Rendezvous {
    fn new(num_pes: usize) -> Rendezvous {
        Rendezvous {
            num_pes,
            state: Mutex::new(RoundState {
                arrived: 0,
                departed: 0,
                ready: false,
                closed: None,
                mailboxes: vec![vec![Vec::new(); num_pes]; num_pes],
            }),
            round_cv: Condvar::new(),
        }
    }
}

fn peer_left(pe: usize) -> ChainError {
    ChainError::transport(format!("pe {pe} left the group before the collective completed"))
}

pub struct LocalTransport {
    my_pe: usize,
    shared: Arc<Rendezvous>,
}

impl LocalTransport {
    /// One transport handle per PE, all attached to the same rendezvous.
    pub fn group(num_pes: usize) -> Vec<LocalTransport> {
        assert!(num_pes > 0, "a group has at least one pe");
        let shared = Arc::new(Rendezvous::new(num_pes));
        (0..num_pes)
            .map(|my_pe| LocalTransport {
                my_pe,
                shared: shared.clone(),
            })
            .collect()
    }
}

impl Transport for LocalTransport {
    fn my_pe(&self) -> usize {
        self.my_pe
    }

    fn num_pes(&self) -> usize {
        self.shared.num_pes
    }

    fn barrier(&self) -> Result<(), ChainError> {
        self.exchange(vec![Vec::new(); self.shared.num_pes])
            .map(|_| ())
    }

    fn exchange(&self, outgoing: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, ChainError> {
        let num_pes = self.shared.num_pes;
        check_outgoing(&outgoing, num_pes)?;

        let mut state = self.shared.state.lock();
        // the previous round is still being drained by slower PEs
        while state.ready && state.closed.is_none() {
            self.shared.round_cv.wait(&mut state);
        }
        if let Some(pe) = state.closed {
            return Err(peer_left(pe));
        }

        for (dst, msg) in outgoing.into_iter().enumerate() {
            state.mailboxes[dst][self.my_pe] = msg;
        }
        state.arrived += 1;
        if state.arrived == num_pes {
            state.ready = true;
            self.shared.round_cv.notify_all();
        } else {
            while !state.ready && state.closed.is_none() {
                self.shared.round_cv.wait(&mut state);
            }
            if !state.ready {
                return Err(peer_left(state.closed.unwrap_or(self.my_pe)));
            }
        }

        let incoming = std::mem::replace(
            &mut state.mailboxes[self.my_pe],
            vec![Vec::new(); num_pes],
        );
        state.departed += 1;
        if state.departed == num_pes {
            state.ready = false;
            state.arrived = 0;
            state.departed = 0;
            self.shared.round_cv.notify_all();
        }
        Ok(incoming)
    }

    fn abandon(&self) {
        let mut state = self.shared.state.lock();
        state.closed.get_or_insert(self.my_pe);
        self.shared.round_cv.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_group<T: Send>(
        num_pes: usize,
        f: impl Fn(&LocalTransport) -> T + Sync,
    ) -> Vec<T> {
        let transports = LocalTransport::group(num_pes);
        std::thread::scope(|scope| {
            let handles = transports
                .iter()
                .map(|t| scope.spawn(|| f(t)))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|h| h.join().expect("worker thread panicked"))
                .collect()
        })
    }

    #[test]
    fn test_exchange_routes_by_destination() {
        let results = run_group(4, |t| {
            let outgoing = (0..t.num_pes())
                .map(|dst| vec![t.my_pe() as u8, dst as u8])
                .collect();
            t.exchange(outgoing).unwrap()
        });
        for (me, incoming) in results.iter().enumerate() {
            assert_eq!(incoming.len(), 4);
            for (src, msg) in incoming.iter().enumerate() {
                assert_eq!(msg, &vec![src as u8, me as u8]);
            }
        }
    }

    #[test]
    fn test_back_to_back_rounds_do_not_mix() {
        let results = run_group(3, |t| {
            let mut seen = Vec::new();
            for round in 0..50u8 {
                let incoming = t
                    .exchange(vec![vec![round, t.my_pe() as u8]; t.num_pes()])
                    .unwrap();
                for (src, msg) in incoming.iter().enumerate() {
                    assert_eq!(msg, &vec![round, src as u8]);
                }
                seen.push(round);
                t.barrier().unwrap();
            }
            seen.len()
        });
        assert_eq!(results, vec![50, 50, 50]);
    }

    #[test]
    fn test_wrong_message_count_is_rejected() {
        let t = LocalTransport::group(1).pop().unwrap();
        assert!(matches!(
            t.exchange(vec![Vec::new(), Vec::new()]),
            Err(ChainError::Transport(_))
        ));
        // the failed call did not enter the rendezvous
        assert_eq!(t.exchange(vec![vec![7]]).unwrap(), vec![vec![7]]);
    }

    #[test]
    fn test_abandon_releases_waiting_peers() {
        let results = run_group(3, |t| {
            if t.my_pe() == 2 {
                t.abandon();
                return Ok(());
            }
            t.barrier()
        });
        assert!(matches!(results[0], Err(ChainError::Transport(_))));
        assert!(matches!(results[1], Err(ChainError::Transport(_))));
    }
}

//! Halo transport between partitions.
//!
//! Every ordered pair of ranks gets an unbounded channel, so posting a
//! send never blocks and messages between two ranks arrive in FIFO order.
//! Each pipeline stage posts exactly one message per neighbour and
//! receives exactly one, which pairs the n-th receive with the peer's
//! n-th send.

use crate::backend::KernelError;
use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use std::collections::BTreeMap;

/// One direction-pair of channels between this rank and a peer.
#[derive(Clone, Debug)]
pub struct HaloLink {
    peer: usize,
    tx: Sender<Vec<f64>>,
    rx: Receiver<Vec<f64>>,
}

impl HaloLink {
    pub fn peer(&self) -> usize {
        self.peer
    }

    /// Post a message to the peer without blocking.
    pub fn post(&self, data: &[f64]) -> Result<(), KernelError> {
        self.tx
            .send(data.to_vec())
            .map_err(|_| KernelError::Disconnected(self.peer))
    }

    /// Take the next message if it has arrived.
    pub fn try_take(&self) -> Result<Option<Vec<f64>>, KernelError> {
        match self.rx.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(KernelError::Disconnected(self.peer)),
        }
    }

    /// Block until the next message arrives.
    pub fn take(&self) -> Result<Vec<f64>, KernelError> {
        self.rx
            .recv()
            .map_err(|_| KernelError::Disconnected(self.peer))
    }
}

/// A rank's view of the network: one link per peer.
#[derive(Clone, Debug, Default)]
pub struct HaloEndpoint {
    rank: usize,
    links: BTreeMap<usize, HaloLink>,
}

impl HaloEndpoint {
    /// Endpoint with no peers, for single-partition runs.
    pub fn detached(rank: usize) -> Self {
        Self {
            rank,
            links: BTreeMap::new(),
        }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn link(&self, peer: usize) -> Option<&HaloLink> {
        self.links.get(&peer)
    }

    pub fn peers(&self) -> impl Iterator<Item = usize> + '_ {
        self.links.keys().copied()
    }
}

/// Builder of fully connected in-process networks.
pub struct HaloNetwork;

impl HaloNetwork {
    /// Endpoints for `n_ranks` ranks, indexed by rank.
    pub fn connect(n_ranks: usize) -> Vec<HaloEndpoint> {
        let mut endpoints: Vec<HaloEndpoint> = (0..n_ranks).map(HaloEndpoint::detached).collect();
        for a in 0..n_ranks {
            for b in (a + 1)..n_ranks {
                let (tx_ab, rx_ab) = unbounded();
                let (tx_ba, rx_ba) = unbounded();
                endpoints[a].links.insert(
                    b,
                    HaloLink {
                        peer: b,
                        tx: tx_ab,
                        rx: rx_ba,
                    },
                );
                endpoints[b].links.insert(
                    a,
                    HaloLink {
                        peer: a,
                        tx: tx_ba,
                        rx: rx_ab,
                    },
                );
            }
        }
        endpoints
    }
}

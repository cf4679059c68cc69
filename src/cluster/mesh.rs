//! Inter-island communication fabric.
//!
//! Islands never share population memory; all genetic material moves over
//! bounded channels built here before any island starts. Every unordered
//! island pair gets its own capacity-1 channel pair for the per-generation
//! migration exchange, rank 0 holds the receiving end of a gather channel
//! for best-chromosome reductions, and a leader-coordinated token barrier
//! closes each migration phase so no island breeds while a peer is still
//! exchanging.

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::evolve::Chromosome;

/// Communication failures between islands.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    /// A peer island hung up. Its run ended (or its thread died) while
    /// others were still exchanging; the whole run unwinds rather than
    /// stalling on a channel that can never deliver.
    #[error("Peer island disconnected mid-run")]
    Disconnected,
}

/// One island's local best, gathered to the leader during a reduction.
#[derive(Debug, Clone, PartialEq)]
pub struct BestReport {
    pub rank: usize,
    pub chromosome: Chromosome,
}

/// Both directions of one migration pair.
struct PeerLink {
    tx: Sender<Chromosome>,
    rx: Receiver<Chromosome>,
}

/// The barrier as seen from one island. The leader collects one arrival
/// token per member, then releases each member individually; members that
/// raced ahead block on the release, so a wait can never consume tokens
/// from a later round.
enum BarrierSide {
    Leader {
        arrive_rx: Receiver<()>,
        release_tx: Vec<Sender<()>>,
    },
    Member {
        arrive_tx: Sender<()>,
        release_rx: Receiver<()>,
    },
}

/// The reduction gather as seen from one island.
enum GatherSide {
    Leader(Receiver<BestReport>),
    Member(Sender<BestReport>),
}

/// One island's handle on the mesh: its peer channels, its side of the
/// barrier and its side of the reduction gather.
pub struct IslandLinks {
    rank: usize,
    world: usize,
    peers: Vec<Option<PeerLink>>,
    barrier: BarrierSide,
    gather: GatherSide,
}

impl IslandLinks {
    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    #[inline]
    pub fn world(&self) -> usize {
        self.world
    }

    #[inline]
    pub fn is_leader(&self) -> bool {
        self.rank == 0
    }

    /// Every other rank, ascending. Migration visits peers in this order on
    /// every island, which keeps the pairwise exchanges deadlock-free.
    pub fn peer_ranks(&self) -> Vec<usize> {
        (0..self.world).filter(|&r| r != self.rank).collect()
    }

    /// Blocking two-way exchange with `peer`: send one chromosome, receive
    /// one. Capacity-1 channels make the send immediate (the peer consumed
    /// last generation's message before reaching this phase) while the
    /// receive blocks until the peer sends its half.
    pub fn exchange(&self, peer: usize, outgoing: Chromosome) -> Result<Chromosome, MeshError> {
        let link = self.peers[peer]
            .as_ref()
            .expect("exchange with self or unknown peer");
        link.tx.send(outgoing).map_err(|_| MeshError::Disconnected)?;
        link.rx.recv().map_err(|_| MeshError::Disconnected)
    }

    /// Block until every island in the mesh has reached this barrier.
    pub fn barrier(&self) -> Result<(), MeshError> {
        match &self.barrier {
            BarrierSide::Leader {
                arrive_rx,
                release_tx,
            } => {
                for _ in 0..self.world - 1 {
                    arrive_rx.recv().map_err(|_| MeshError::Disconnected)?;
                }
                for tx in release_tx {
                    tx.send(()).map_err(|_| MeshError::Disconnected)?;
                }
                Ok(())
            }
            BarrierSide::Member {
                arrive_tx,
                release_rx,
            } => {
                arrive_tx.send(()).map_err(|_| MeshError::Disconnected)?;
                release_rx.recv().map_err(|_| MeshError::Disconnected)
            }
        }
    }

    /// Send this island's elected best to the leader (members only).
    pub fn send_best(&self, report: BestReport) -> Result<(), MeshError> {
        match &self.gather {
            GatherSide::Member(tx) => tx.send(report).map_err(|_| MeshError::Disconnected),
            GatherSide::Leader(_) => panic!("leader island sends no best report"),
        }
    }

    /// Receive every member's best, ordered by rank (leader only). Sorting
    /// makes the leader's fold deterministic regardless of arrival order.
    pub fn collect_bests(&self) -> Result<Vec<BestReport>, MeshError> {
        match &self.gather {
            GatherSide::Leader(rx) => {
                let mut reports = Vec::with_capacity(self.world - 1);
                for _ in 0..self.world - 1 {
                    reports.push(rx.recv().map_err(|_| MeshError::Disconnected)?);
                }
                reports.sort_by_key(|r| r.rank);
                Ok(reports)
            }
            GatherSide::Member(_) => panic!("member island collects no best reports"),
        }
    }
}

/// Build the full mesh for `world` islands: one [`IslandLinks`] per rank,
/// index = rank. Every channel is created here, before any island runs, so
/// a resource failure aborts before the first generation.
pub fn build_mesh(world: usize) -> Vec<IslandLinks> {
    assert!(world > 0);

    // Pairwise migration channels, capacity 1 in each direction.
    let mut peers: Vec<Vec<Option<PeerLink>>> = (0..world)
        .map(|_| (0..world).map(|_| None).collect())
        .collect();
    for a in 0..world {
        for b in a + 1..world {
            let (a_tx, b_rx) = bounded(1);
            let (b_tx, a_rx) = bounded(1);
            peers[a][b] = Some(PeerLink { tx: a_tx, rx: a_rx });
            peers[b][a] = Some(PeerLink { tx: b_tx, rx: b_rx });
        }
    }

    // Barrier: members arrive on one shared channel, each gets its own
    // release channel back from the leader.
    let (arrive_tx, arrive_rx) = bounded(world.saturating_sub(1).max(1));
    let mut release_tx = Vec::with_capacity(world.saturating_sub(1));
    let mut release_rx = Vec::with_capacity(world.saturating_sub(1));
    for _ in 1..world {
        let (tx, rx) = bounded(1);
        release_tx.push(tx);
        release_rx.push(rx);
    }

    // Reduction gather to rank 0.
    let (gather_tx, gather_rx) = bounded(world);

    let mut links = Vec::with_capacity(world);
    let mut release_rx = release_rx.into_iter();
    for (rank, peer_row) in peers.into_iter().enumerate() {
        let barrier = if rank == 0 {
            BarrierSide::Leader {
                arrive_rx: arrive_rx.clone(),
                release_tx: release_tx.clone(),
            }
        } else {
            BarrierSide::Member {
                arrive_tx: arrive_tx.clone(),
                release_rx: release_rx.next().expect("one release channel per member"),
            }
        };
        let gather = if rank == 0 {
            GatherSide::Leader(gather_rx.clone())
        } else {
            GatherSide::Member(gather_tx.clone())
        };
        links.push(IslandLinks {
            rank,
            world,
            peers: peer_row,
            barrier,
            gather,
        });
    }
    links
}

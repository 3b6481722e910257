//! Simplified Kademlia routing table

use rand::seq::SliceRandom;
use tracing::{debug, trace};

use crate::common::{ClosestNodes, Id, KBucket, Node, Touch, ID_BITS};
use crate::config::Config;
use crate::liveness::{Liveness, LivenessCheck};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
/// The result of [RoutingTable::add].
pub enum Insert {
    /// The node has the local [Id].
    Ignored,
    /// The node was new and its bucket had room for it.
    Inserted,
    /// The node was already known and is now the most recently seen in its bucket.
    Refreshed,
    /// The bucket is full, check the liveness of [PendingEviction::tail] and pass
    /// the verdict to [RoutingTable::resolve].
    Full(PendingEviction),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A node waiting for the least recently seen node of its bucket to be checked.
pub struct PendingEviction {
    incoming: Node,
    tail: Node,
}

impl PendingEviction {
    /// The node that wants in.
    pub fn incoming(&self) -> &Node {
        &self.incoming
    }

    /// The least recently seen node, to be checked for liveness.
    pub fn tail(&self) -> &Node {
        &self.tail
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The final outcome of adding a node to the routing table.
pub enum AddOutcome {
    /// The node has the local [Id], nothing changed.
    Ignored,
    /// The node was inserted in a bucket with room for it.
    Inserted,
    /// The node was already known, it moved to the head of its bucket.
    Refreshed,
    /// The node replaced an unreachable node, which is returned.
    Evicted(Node),
    /// The bucket is full and its least recently seen node was not found unreachable.
    NotAdmitted,
}

impl AddOutcome {
    /// Returns `true` if the node is in the routing table after this outcome.
    pub fn is_admitted(&self) -> bool {
        matches!(
            self,
            AddOutcome::Inserted | AddOutcome::Refreshed | AddOutcome::Evicted(_)
        )
    }
}

#[derive(Debug, Clone)]
/// Simplified Kademlia routing table
///
/// Keeps one [KBucket] per distance class, where bucket `i` holds the nodes whose
/// XOR distance to the local [Id] has its highest set bit at position `i`.
pub struct RoutingTable {
    id: Id,
    buckets: Vec<KBucket>,
    config: Config,
}

impl RoutingTable {
    /// Create a new [RoutingTable] with a given id and the default [Config].
    ///
    /// Returns [Error::ZeroId] if `id` is all zeros.
    pub fn new(id: Id) -> Result<Self> {
        Self::with_config(id, Config::default())
    }

    /// Create a new [RoutingTable] with a given id and [Config].
    pub fn with_config(id: Id, config: Config) -> Result<Self> {
        if id.is_zero() {
            return Err(Error::ZeroId);
        }
        config.validate()?;

        let buckets = (0..ID_BITS)
            .map(|_| KBucket::new().with_size(config.bucket_size))
            .collect();

        Ok(RoutingTable {
            id,
            buckets,
            config,
        })
    }

    // === Getters ===

    /// Returns the [Id] of this node, where the distance is measured from.
    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // === Public Methods ===

    /// Record a contact with a node.
    ///
    /// Never evicts anything by itself; if the node's bucket is full, returns
    /// [Insert::Full] and leaves the eviction decision to [Self::resolve].
    pub fn add(&mut self, node: Node) -> Insert {
        let class = match self.id.distance_class(node.id()) {
            Some(class) => class,
            // Do not add self to the routing_table
            None => return Insert::Ignored,
        };

        match self.buckets[class as usize].touch(node.clone()) {
            Touch::Inserted => {
                trace!(id = ?node.id(), bucket = class, "Inserted node");
                Insert::Inserted
            }
            Touch::Refreshed => Insert::Refreshed,
            Touch::Full(tail) => Insert::Full(PendingEviction {
                incoming: node,
                tail,
            }),
        }
    }

    /// Apply the liveness verdict of the tail of a full bucket.
    ///
    /// Only [Liveness::Unreachable] evicts. If the bucket changed since
    /// [Self::add] returned the pending eviction, the incoming node is added
    /// again without evicting anything.
    pub fn resolve(&mut self, pending: PendingEviction, liveness: Liveness) -> AddOutcome {
        let PendingEviction { incoming, tail } = pending;

        let class = match self.id.distance_class(incoming.id()) {
            Some(class) => class,
            None => return AddOutcome::Ignored,
        };
        let bucket = &mut self.buckets[class as usize];

        match liveness {
            Liveness::Unreachable => {
                if let Some(evicted) = bucket.replace_tail(tail.id(), incoming.clone()) {
                    debug!(
                        evicted = ?evicted.id(),
                        incoming = ?incoming.id(),
                        bucket = class,
                        "Evicted unreachable node"
                    );
                    return AddOutcome::Evicted(evicted);
                }

                match bucket.touch(incoming) {
                    Touch::Inserted => AddOutcome::Inserted,
                    Touch::Refreshed => AddOutcome::Refreshed,
                    Touch::Full(_) => AddOutcome::NotAdmitted,
                }
            }
            Liveness::Reachable => {
                if self.config.refresh_on_reachable {
                    bucket.refresh(tail.id());
                }
                trace!(incoming = ?incoming.id(), bucket = class, "Bucket full, dropped node");

                AddOutcome::NotAdmitted
            }
            Liveness::Unknown => {
                trace!(tail = ?tail.id(), bucket = class, "Unknown liveness, keeping node");

                AddOutcome::NotAdmitted
            }
        }
    }

    /// [Self::add] a node, running `check` on the tail of its bucket if it is full.
    pub fn add_with<C>(&mut self, node: Node, check: &C) -> AddOutcome
    where
        C: LivenessCheck + ?Sized,
    {
        match self.add(node) {
            Insert::Ignored => AddOutcome::Ignored,
            Insert::Inserted => AddOutcome::Inserted,
            Insert::Refreshed => AddOutcome::Refreshed,
            Insert::Full(pending) => {
                let liveness = check.check(pending.tail());
                self.resolve(pending, liveness)
            }
        }
    }

    /// Remove a node from this routing table, returning it if it was there.
    pub fn remove(&mut self, node_id: &Id) -> Option<Node> {
        let class = self.id.distance_class(node_id)?;

        self.buckets[class as usize].remove(node_id)
    }

    /// Up to `count` random nodes, none of which is in `exclude`.
    ///
    /// Buckets are visited from the closest to the local node to the furthest,
    /// nodes within each bucket are picked in random order.
    pub fn random_nodes(&self, count: usize, exclude: &[Id]) -> Vec<Node> {
        let mut rng = rand::thread_rng();
        let mut result = Vec::with_capacity(count.min(self.size()));

        for bucket in &self.buckets {
            if result.len() >= count {
                break;
            }

            let mut eligible: Vec<&Node> = bucket
                .iter()
                .filter(|node| !exclude.contains(node.id()))
                .collect();

            let (chosen, _) = eligible.partial_shuffle(&mut rng, count - result.len());

            result.extend(chosen.iter().map(|node| (*node).clone()));
        }

        result
    }

    /// Return up to `limit` nodes closest to the target, sorted by distance.
    pub fn closest(&self, target: &Id, limit: usize) -> Vec<Node> {
        let mut closest = ClosestNodes::with_max(*target, limit);

        closest.extend(self.nodes().cloned());

        closest.into_iter().collect()
    }

    /// Returns `true` if this routing table is empty.
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|bucket| bucket.is_empty())
    }

    /// Return the number of nodes in this routing table.
    pub fn size(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.len()).sum()
    }

    pub fn contains(&self, node_id: &Id) -> bool {
        self.get(node_id).is_some()
    }

    pub fn get(&self, node_id: &Id) -> Option<&Node> {
        let class = self.id.distance_class(node_id)?;

        self.buckets[class as usize].get(node_id)
    }

    /// Returns an iterator over the nodes in this routing table, from the
    /// closest bucket to the furthest.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.buckets.iter().flat_map(|bucket| bucket.iter())
    }

    /// Owned copy of the nodes in the bucket of a distance class, from the most
    /// to the least recently seen.
    pub fn bucket(&self, class: u8) -> Vec<Node> {
        self.buckets[class as usize].entries()
    }

    /// Distance classes of non empty buckets and their sizes.
    pub fn bucket_sizes(&self) -> Vec<(u8, usize)> {
        self.buckets
            .iter()
            .enumerate()
            .filter(|(_, bucket)| !bucket.is_empty())
            .map(|(class, bucket)| (class as u8, bucket.len()))
            .collect()
    }
}
